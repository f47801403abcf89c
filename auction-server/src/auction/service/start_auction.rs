use {
    super::Service,
    crate::{
        api::{
            ws::UpdateEvent,
            RestError,
        },
        auction::entities,
        team::service::get_league::GetLeagueInput,
    },
    time::OffsetDateTime,
};

pub struct StartAuctionInput {
    pub auction_id: entities::AuctionId,
}

impl Service {
    #[tracing::instrument(skip_all, fields(auction_id = %input.auction_id), err(level = tracing::Level::TRACE))]
    pub async fn start_auction(
        &self,
        input: StartAuctionInput,
    ) -> Result<entities::Auction, RestError> {
        let auction_lock = self.repo.get_or_create_auction_lock(input.auction_id).await;
        let _lock_guard = auction_lock.lock().await;

        let auction = self.get_auction_for_update(input.auction_id).await?;
        if auction.status != entities::AuctionStatus::Scheduled {
            return Err(RestError::InvalidState(
                "Auction can only be started from scheduled status".to_string(),
            ));
        }

        // The timer is re-seeded from the league at start time.
        let league = self
            .team_service
            .get_league(GetLeagueInput {
                league_id: auction.league_id,
            })
            .await?;
        self.repo
            .start_auction(
                input.auction_id,
                OffsetDateTime::now_utc(),
                league.auction_timer_seconds,
            )
            .await?;

        let auction = self.repo.get_auction(input.auction_id).await?;
        self.broadcast_update(UpdateEvent::AuctionStarted(auction.clone()));
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
                service::tests::{
                    auction_row,
                    league_row,
                    primitive_now,
                },
            },
            team::repository::MockDatabase as MockTeamDatabase,
        },
        uuid::Uuid,
    };

    #[tokio::test]
    async fn starting_seeds_timer_from_league() {
        let auction_id = Uuid::new_v4();
        let league_id = Uuid::new_v4();

        let mut db = MockDatabase::new();
        let scheduled = auction_row(
            auction_id,
            league_id,
            Uuid::new_v4(),
            RowStatus::Scheduled,
            "100",
        );
        let mut live = scheduled.clone();
        live.status = RowStatus::Live;
        live.timer_seconds = 45;
        live.started_at = Some(primitive_now());
        db.expect_get_auction()
            .times(1)
            .returning(move |_| Ok(scheduled.clone()));
        db.expect_get_auction()
            .times(1)
            .returning(move |_| Ok(live.clone()));
        db.expect_get_bids().returning(|_| Ok(vec![]));
        db.expect_start_auction()
            .withf(|_, _, timer_seconds| *timer_seconds == 45)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut team_db = MockTeamDatabase::new();
        team_db.expect_get_league().returning(move |_| {
            let mut league = league_row(league_id);
            league.auction_timer_seconds = 45;
            Ok(league)
        });

        let (service, mut events) = Service::new_with_mocks(db, team_db);
        let auction = service
            .start_auction(StartAuctionInput { auction_id })
            .await
            .unwrap();
        assert_eq!(auction.status, entities::AuctionStatus::Live);
        assert_eq!(auction.timer_seconds, 45);
        assert!(matches!(
            events.try_recv().unwrap(),
            UpdateEvent::AuctionStarted(_)
        ));
    }

    #[tokio::test]
    async fn starting_a_live_auction_is_rejected() {
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
        let result = service.start_auction(StartAuctionInput { auction_id }).await;
        match result {
            Err(RestError::InvalidState(msg)) => {
                assert_eq!(msg, "Auction can only be started from scheduled status")
            }
            other => panic!("expected InvalidState, got {:?}", other),
        }
    }
}
