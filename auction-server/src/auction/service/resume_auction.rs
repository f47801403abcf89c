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

pub struct ResumeAuctionInput {
    pub auction_id: entities::AuctionId,
}

impl Service {
    #[tracing::instrument(skip_all, fields(auction_id = %input.auction_id), err(level = tracing::Level::TRACE))]
    pub async fn resume_auction(
        &self,
        input: ResumeAuctionInput,
    ) -> Result<entities::Auction, RestError> {
        let auction_lock = self.repo.get_or_create_auction_lock(input.auction_id).await;
        let _lock_guard = auction_lock.lock().await;

        let auction = self.get_auction_for_update(input.auction_id).await?;
        if auction.status != entities::AuctionStatus::Paused {
            return Err(RestError::InvalidState("Auction is not paused".to_string()));
        }

        self.repo
            .update_auction_status(input.auction_id, entities::AuctionStatus::Live, None)
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
    async fn resuming_a_paused_auction_succeeds() {
        let auction_id = Uuid::new_v4();

        let mut db = MockDatabase::new();
        let paused = auction_row(
            auction_id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            RowStatus::Paused,
            "100",
        );
        let mut live = paused.clone();
        live.status = RowStatus::Live;
        db.expect_get_auction()
            .times(1)
            .returning(move |_| Ok(paused.clone()));
        db.expect_get_auction()
            .times(1)
            .returning(move |_| Ok(live.clone()));
        db.expect_get_bids().returning(|_| Ok(vec![]));
        db.expect_update_auction_status()
            .withf(|_, status, ended_at| *status == RowStatus::Live && ended_at.is_none())
            .times(1)
            .returning(|_, _, _| Ok(()));

        let (service, mut events) = Service::new_with_mocks(db, MockTeamDatabase::new());
        let auction = service
            .resume_auction(ResumeAuctionInput { auction_id })
            .await
            .unwrap();
        assert_eq!(auction.status, entities::AuctionStatus::Live);
        assert!(matches!(
            events.try_recv().unwrap(),
            UpdateEvent::AuctionUpdated(_)
        ));
    }

    #[tokio::test]
    async fn resuming_a_live_auction_is_rejected() {
        let auction_id = Uuid::new_v4();

        let mut db = MockDatabase::new();
        let row = auction_row(
            auction_id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            RowStatus::Live,
            "100",
        );
        db.expect_get_auction().returning(move |_| Ok(row.clone()));
        db.expect_get_bids().returning(|_| Ok(vec![]));

        let (service, _events) = Service::new_with_mocks(db, MockTeamDatabase::new());
        let result = service
            .resume_auction(ResumeAuctionInput { auction_id })
            .await;
        match result {
            Err(RestError::InvalidState(msg)) => assert_eq!(msg, "Auction is not paused"),
            other => panic!("expected InvalidState, got {:?}", other),
        }
    }
}
