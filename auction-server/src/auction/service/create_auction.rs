use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
        team::service::get_league::GetLeagueInput,
    },
};

pub struct CreateAuctionInput {
    pub create: entities::AuctionCreate,
}

impl Service {
    /// The timer starts out at the league default; `start_auction` resets it
    /// in case the league configuration changed in between.
    #[tracing::instrument(skip_all, fields(league_id = %input.create.league_id), err(level = tracing::Level::TRACE))]
    pub async fn create_auction(
        &self,
        input: CreateAuctionInput,
    ) -> Result<entities::Auction, RestError> {
        let league = self
            .team_service
            .get_league(GetLeagueInput {
                league_id: input.create.league_id,
            })
            .await?;
        let auction = entities::Auction::new(input.create, league.auction_timer_seconds);
        self.repo.add_auction(&auction).await?;
        Ok(auction)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            auction::{
                repository::MockDatabase,
                service::tests::league_row,
            },
            team::repository::MockDatabase as MockTeamDatabase,
        },
        uuid::Uuid,
    };

    #[tokio::test]
    async fn new_auction_is_scheduled_at_starting_price() {
        let league_id = Uuid::new_v4();

        let mut db = MockDatabase::new();
        db.expect_add_auction()
            .withf(|auction| {
                auction.status == entities::AuctionStatus::Scheduled
                    && auction.current_price == auction.starting_price
                    && auction.timer_seconds == 30
                    && auction.winning_team_id.is_none()
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut team_db = MockTeamDatabase::new();
        team_db
            .expect_get_league()
            .returning(move |_| Ok(league_row(league_id)));

        let (service, _events) = Service::new_with_mocks(db, team_db);
        let auction = service
            .create_auction(CreateAuctionInput {
                create: entities::AuctionCreate {
                    league_id,
                    player_id: Uuid::new_v4(),
                    starting_price: "100".parse().unwrap(),
                },
            })
            .await
            .unwrap();
        assert_eq!(auction.status, entities::AuctionStatus::Scheduled);
        assert!(auction.bids.is_empty());
    }

    #[tokio::test]
    async fn unknown_league_is_rejected() {
        let mut team_db = MockTeamDatabase::new();
        team_db
            .expect_get_league()
            .returning(|_| Err(RestError::LeagueNotFound));

        let (service, _events) = Service::new_with_mocks(MockDatabase::new(), team_db);
        let result = service
            .create_auction(CreateAuctionInput {
                create: entities::AuctionCreate {
                    league_id:      Uuid::new_v4(),
                    player_id:      Uuid::new_v4(),
                    starting_price: "100".parse().unwrap(),
                },
            })
            .await;
        assert!(matches!(result, Err(RestError::LeagueNotFound)));
    }
}
