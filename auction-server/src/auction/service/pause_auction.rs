use {
    super::Service,
    crate::{
        api::{
            ws::UpdateEvent,
            RestError,
        },
        auction::entities,
    },
};

pub struct PauseAuctionInput {
    pub auction_id: entities::AuctionId,
}

impl Service {
    #[tracing::instrument(skip_all, fields(auction_id = %input.auction_id), err(level = tracing::Level::TRACE))]
    pub async fn pause_auction(
        &self,
        input: PauseAuctionInput,
    ) -> Result<entities::Auction, RestError> {
        let auction_lock = self.repo.get_or_create_auction_lock(input.auction_id).await;
        let _lock_guard = auction_lock.lock().await;

        let auction = self.get_auction_for_update(input.auction_id).await?;
        if !auction.status.is_live() {
            return Err(RestError::InvalidState("Auction is not live".to_string()));
        }

        self.repo
            .update_auction_status(input.auction_id, entities::AuctionStatus::Paused, None)
            .await?;

        let auction = self.repo.get_auction(input.auction_id).await?;
        self.broadcast_update(UpdateEvent::AuctionUpdated(auction.clone()));
        Ok(auction)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            auction::{
                repository::{
                    AuctionStatus as RowStatus,
                    MockDatabase,
                },
                service::tests::auction_row,
            },
            team::repository::MockDatabase as MockTeamDatabase,
        },
        uuid::Uuid,
    };

    #[tokio::test]
    async fn pausing_a_scheduled_auction_is_rejected() {
        let auction_id = Uuid::new_v4();

        let mut db = MockDatabase::new();
        let row = auction_row(
            auction_id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            RowStatus::Scheduled,
            "100",
        );
        db.expect_get_auction().returning(move |_| Ok(row.clone()));
        db.expect_get_bids().returning(|_| Ok(vec![]));

        let (service, _events) = Service::new_with_mocks(db, MockTeamDatabase::new());
        let result = service.pause_auction(PauseAuctionInput { auction_id }).await;
        match result {
            Err(RestError::InvalidState(msg)) => assert_eq!(msg, "Auction is not live"),
            other => panic!("expected InvalidState, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn operations_on_a_completed_auction_leave_no_lock_entry_behind() {
        let auction_id = Uuid::new_v4();

        let mut db = MockDatabase::new();
        let row = auction_row(
            auction_id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            RowStatus::Completed,
            "100",
        );
        db.expect_get_auction().returning(move |_| Ok(row.clone()));
        db.expect_get_bids().returning(|_| Ok(vec![]));

        let (service, _events) = Service::new_with_mocks(db, MockTeamDatabase::new());
        let result = service.pause_auction(PauseAuctionInput { auction_id }).await;
        assert!(matches!(result, Err(RestError::InvalidState(_))));
        assert!(service
            .repo
            .in_memory_store
            .auction_locks
            .lock()
            .await
            .is_empty());
    }
}
