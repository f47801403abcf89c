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

pub struct UpdateTimerInput {
    pub auction_id: entities::AuctionId,
    pub seconds:    i32,
}

impl Service {
    /// Sets the remaining timer. The countdown itself is driven by the
    /// auctioneer client, so no status check here.
    #[tracing::instrument(skip_all, fields(auction_id = %input.auction_id), err(level = tracing::Level::TRACE))]
    pub async fn update_timer(
        &self,
        input: UpdateTimerInput,
    ) -> Result<entities::Auction, RestError> {
        if input.seconds < 0 {
            return Err(RestError::BadParameters(
                "timer seconds cannot be negative".to_string(),
            ));
        }

        let auction_lock = self.repo.get_or_create_auction_lock(input.auction_id).await;
        let _lock_guard = auction_lock.lock().await;

        // Existence check before the blind update.
        self.get_auction_for_update(input.auction_id).await?;
        self.repo
            .update_timer(input.auction_id, input.seconds)
            .await?;

        let auction = self.repo.get_auction(input.auction_id).await?;
        self.broadcast_update(UpdateEvent::TimerUpdated(auction.clone()));
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
    async fn timer_update_is_stored_and_broadcast() {
        let auction_id = Uuid::new_v4();

        let mut db = MockDatabase::new();
        let row = auction_row(
            auction_id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            RowStatus::Live,
            "100",
        );
        let mut updated = row.clone();
        updated.timer_seconds = 15;
        db.expect_get_auction()
            .times(1)
            .returning(move |_| Ok(row.clone()));
        db.expect_get_auction()
            .times(1)
            .returning(move |_| Ok(updated.clone()));
        db.expect_get_bids().returning(|_| Ok(vec![]));
        db.expect_update_timer()
            .withf(|_, seconds| *seconds == 15)
            .times(1)
            .returning(|_, _| Ok(()));

        let (service, mut events) = Service::new_with_mocks(db, MockTeamDatabase::new());
        let auction = service
            .update_timer(UpdateTimerInput {
                auction_id,
                seconds: 15,
            })
            .await
            .unwrap();
        assert_eq!(auction.timer_seconds, 15);
        assert!(matches!(
            events.try_recv().unwrap(),
            UpdateEvent::TimerUpdated(_)
        ));
    }

    #[tokio::test]
    async fn negative_timer_is_rejected_before_touching_the_db() {
        let (service, _events) =
            Service::new_with_mocks(MockDatabase::new(), MockTeamDatabase::new());
        let result = service
            .update_timer(UpdateTimerInput {
                auction_id: Uuid::new_v4(),
                seconds:    -1,
            })
            .await;
        assert!(matches!(result, Err(RestError::BadParameters(_))));
    }
}
