use {
    super::{
        verification,
        Service,
    },
    crate::{
        api::{
            ws::UpdateEvent,
            RestError,
        },
        auction::entities,
        team::service::{
            get_league::GetLeagueInput,
            get_team::GetTeamInput,
        },
    },
};

pub struct PlaceBidInput {
    pub bid_create: entities::BidCreate,
}

impl Service {
    /// Validates and records a bid. The per-auction lock is held across the
    /// whole load-validate-write sequence, so two concurrent bids at the same
    /// amount resolve to exactly one winner and one rejection.
    #[tracing::instrument(skip_all, fields(auction_id = %input.bid_create.auction_id), err(level = tracing::Level::TRACE))]
    pub async fn place_bid(&self, input: PlaceBidInput) -> Result<entities::Bid, RestError> {
        let auction_lock = self
            .repo
            .get_or_create_auction_lock(input.bid_create.auction_id)
            .await;
        let _lock_guard = auction_lock.lock().await;

        let auction = self
            .get_auction_for_update(input.bid_create.auction_id)
            .await?;
        verification::verify_auction_is_biddable(&auction)?;

        let league = self
            .team_service
            .get_league(GetLeagueInput {
                league_id: auction.league_id,
            })
            .await?;
        verification::verify_bid_amount(&auction, &league, &input.bid_create.amount)?;

        let team = self
            .team_service
            .get_team(GetTeamInput {
                team_id: input.bid_create.team_id,
            })
            .await?;
        verification::verify_team_can_afford(&team, &input.bid_create.amount)?;
        verification::verify_roster_capacity(&team, &league)?;

        let bid = entities::Bid::new(input.bid_create);
        self.repo.add_winning_bid(&bid).await?;
        tracing::info!(
            bid_id = bid.id.to_string(),
            amount = bid.amount.to_string(),
            "Accepted bid"
        );

        let auction = self.repo.get_auction(bid.auction_id).await?;
        self.broadcast_update(UpdateEvent::BidPlaced {
            bid:     bid.clone(),
            auction,
        });
        Ok(bid)
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
                    team_row,
                },
            },
            team::repository::MockDatabase as MockTeamDatabase,
        },
        bigdecimal::BigDecimal,
        std::sync::{
            Arc,
            Mutex,
        },
        uuid::Uuid,
    };

    fn bid_create(auction_id: Uuid, team_id: Uuid, amount: &str) -> entities::BidCreate {
        entities::BidCreate {
            auction_id,
            team_id,
            user_id: Uuid::new_v4(),
            amount: amount.parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn accepted_bid_updates_price_and_broadcasts() {
        let auction_id = Uuid::new_v4();
        let league_id = Uuid::new_v4();
        let player_id = Uuid::new_v4();
        let team_id = Uuid::new_v4();

        let mut db = MockDatabase::new();
        let before = auction_row(auction_id, league_id, player_id, RowStatus::Live, "100");
        let mut after = auction_row(auction_id, league_id, player_id, RowStatus::Live, "100.25");
        after.winning_team_id = Some(team_id);
        db.expect_get_auction()
            .times(1)
            .returning(move |_| Ok(before.clone()));
        db.expect_get_auction()
            .times(1)
            .returning(move |_| Ok(after.clone()));
        db.expect_get_bids().returning(|_| Ok(vec![]));
        db.expect_add_winning_bid()
            .withf(move |bid| {
                bid.is_winning
                    && bid.team_id == team_id
                    && bid.amount == "100.25".parse::<BigDecimal>().unwrap()
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut team_db = MockTeamDatabase::new();
        team_db
            .expect_get_league()
            .returning(move |_| Ok(league_row(league_id)));
        team_db
            .expect_get_team()
            .returning(move |_| Ok(team_row(team_id, league_id, "1000", "0", 0)));

        let (service, mut events) = Service::new_with_mocks(db, team_db);
        let bid = service
            .place_bid(PlaceBidInput {
                bid_create: bid_create(auction_id, team_id, "100.25"),
            })
            .await
            .unwrap();
        assert!(bid.is_winning);

        match events.try_recv().unwrap() {
            UpdateEvent::BidPlaced {
                bid: event_bid,
                auction,
            } => {
                assert_eq!(event_bid.id, bid.id);
                assert_eq!(
                    auction.current_price,
                    "100.25".parse::<BigDecimal>().unwrap()
                );
                assert_eq!(auction.winning_team_id, Some(team_id));
            }
            other => panic!("expected BidPlaced, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn bid_below_minimum_is_rejected() {
        let auction_id = Uuid::new_v4();
        let league_id = Uuid::new_v4();

        let mut db = MockDatabase::new();
        let row = auction_row(auction_id, league_id, Uuid::new_v4(), RowStatus::Live, "100");
        db.expect_get_auction().returning(move |_| Ok(row.clone()));
        db.expect_get_bids().returning(|_| Ok(vec![]));

        let mut team_db = MockTeamDatabase::new();
        team_db
            .expect_get_league()
            .returning(move |_| Ok(league_row(league_id)));

        let (service, _events) = Service::new_with_mocks(db, team_db);
        let result = service
            .place_bid(PlaceBidInput {
                bid_create: bid_create(auction_id, Uuid::new_v4(), "100.20"),
            })
            .await;
        match result {
            Err(RestError::InvalidBid(msg)) => {
                assert_eq!(
                    msg,
                    "Bid must be at least 100.25 (current: 100 + increment: 0.25)"
                );
            }
            other => panic!("expected InvalidBid, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn bid_on_scheduled_auction_is_rejected() {
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
        let result = service
            .place_bid(PlaceBidInput {
                bid_create: bid_create(auction_id, Uuid::new_v4(), "100.25"),
            })
            .await;
        match result {
            Err(RestError::InvalidState(msg)) => assert_eq!(msg, "Auction is not live"),
            other => panic!("expected InvalidState, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn bid_exceeding_available_purse_is_rejected() {
        let auction_id = Uuid::new_v4();
        let league_id = Uuid::new_v4();
        let team_id = Uuid::new_v4();

        let mut db = MockDatabase::new();
        let row = auction_row(auction_id, league_id, Uuid::new_v4(), RowStatus::Live, "100");
        db.expect_get_auction().returning(move |_| Ok(row.clone()));
        db.expect_get_bids().returning(|_| Ok(vec![]));

        let mut team_db = MockTeamDatabase::new();
        team_db
            .expect_get_league()
            .returning(move |_| Ok(league_row(league_id)));
        // Purse 150, spent 50: only 100 available against a 100.25 minimum.
        team_db
            .expect_get_team()
            .returning(move |_| Ok(team_row(team_id, league_id, "150", "50", 0)));

        let (service, _events) = Service::new_with_mocks(db, team_db);
        let result = service
            .place_bid(PlaceBidInput {
                bid_create: bid_create(auction_id, team_id, "100.25"),
            })
            .await;
        assert!(matches!(result, Err(RestError::InsufficientFunds)));
    }

    #[tokio::test]
    async fn bid_from_full_roster_is_rejected() {
        let auction_id = Uuid::new_v4();
        let league_id = Uuid::new_v4();
        let team_id = Uuid::new_v4();

        let mut db = MockDatabase::new();
        let row = auction_row(auction_id, league_id, Uuid::new_v4(), RowStatus::Live, "100");
        db.expect_get_auction().returning(move |_| Ok(row.clone()));
        db.expect_get_bids().returning(|_| Ok(vec![]));

        let mut team_db = MockTeamDatabase::new();
        team_db
            .expect_get_league()
            .returning(move |_| Ok(league_row(league_id)));
        team_db
            .expect_get_team()
            .returning(move |_| Ok(team_row(team_id, league_id, "1000", "0", 11)));

        let (service, _events) = Service::new_with_mocks(db, team_db);
        let result = service
            .place_bid(PlaceBidInput {
                bid_create: bid_create(auction_id, team_id, "100.25"),
            })
            .await;
        assert!(matches!(result, Err(RestError::RosterFull)));
    }

    #[tokio::test]
    async fn higher_bid_supersedes_previous_winner() {
        let auction_id = Uuid::new_v4();
        let league_id = Uuid::new_v4();
        let player_id = Uuid::new_v4();

        let current_price = Arc::new(Mutex::new("100".parse::<BigDecimal>().unwrap()));
        let accepted_amounts = Arc::new(Mutex::new(Vec::<BigDecimal>::new()));

        let mut db = MockDatabase::new();
        let read_price = current_price.clone();
        db.expect_get_auction().returning(move |_| {
            let mut row = auction_row(auction_id, league_id, player_id, RowStatus::Live, "100");
            row.current_price = read_price.lock().unwrap().clone();
            Ok(row)
        });
        db.expect_get_bids().returning(|_| Ok(vec![]));
        let write_price = current_price.clone();
        let record_amounts = accepted_amounts.clone();
        db.expect_add_winning_bid().times(2).returning(move |bid| {
            *write_price.lock().unwrap() = bid.amount.clone();
            record_amounts.lock().unwrap().push(bid.amount.clone());
            Ok(())
        });

        let mut team_db = MockTeamDatabase::new();
        team_db
            .expect_get_league()
            .returning(move |_| Ok(league_row(league_id)));
        team_db
            .expect_get_team()
            .returning(move |id| Ok(team_row(id, league_id, "1000", "0", 0)));

        let (service, _events) = Service::new_with_mocks(db, team_db);
        service
            .place_bid(PlaceBidInput {
                bid_create: bid_create(auction_id, Uuid::new_v4(), "105"),
            })
            .await
            .unwrap();
        service
            .place_bid(PlaceBidInput {
                bid_create: bid_create(auction_id, Uuid::new_v4(), "110"),
            })
            .await
            .unwrap();

        let amounts = accepted_amounts.lock().unwrap();
        assert_eq!(
            *amounts,
            vec![
                "105".parse::<BigDecimal>().unwrap(),
                "110".parse::<BigDecimal>().unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn concurrent_equal_bids_resolve_to_one_winner() {
        let auction_id = Uuid::new_v4();
        let league_id = Uuid::new_v4();
        let player_id = Uuid::new_v4();

        // The current price lives behind a mutex so the mock behaves like a
        // real database: whoever writes first moves the minimum for the other.
        let current_price = Arc::new(Mutex::new("100".parse::<BigDecimal>().unwrap()));

        let mut db = MockDatabase::new();
        let read_price = current_price.clone();
        db.expect_get_auction().returning(move |_| {
            let mut row = auction_row(auction_id, league_id, player_id, RowStatus::Live, "100");
            row.current_price = read_price.lock().unwrap().clone();
            Ok(row)
        });
        db.expect_get_bids().returning(|_| Ok(vec![]));
        let write_price = current_price.clone();
        db.expect_add_winning_bid().times(1).returning(move |bid| {
            *write_price.lock().unwrap() = bid.amount.clone();
            Ok(())
        });

        let mut team_db = MockTeamDatabase::new();
        team_db
            .expect_get_league()
            .returning(move |_| Ok(league_row(league_id)));
        team_db
            .expect_get_team()
            .returning(move |id| Ok(team_row(id, league_id, "1000", "0", 0)));

        let (service, _events) = Service::new_with_mocks(db, team_db);
        let first = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .place_bid(PlaceBidInput {
                        bid_create: bid_create(auction_id, Uuid::new_v4(), "100.25"),
                    })
                    .await
            })
        };
        let second = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .place_bid(PlaceBidInput {
                        bid_create: bid_create(auction_id, Uuid::new_v4(), "100.25"),
                    })
                    .await
            })
        };
        let results = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
        let rejection = results
            .iter()
            .find(|result| result.is_err())
            .unwrap()
            .as_ref()
            .unwrap_err();
        assert!(matches!(rejection, RestError::InvalidBid(_)));
    }
}
