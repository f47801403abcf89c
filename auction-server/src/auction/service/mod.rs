use {
    super::repository::{
        self,
        Repository,
    },
    crate::{
        api::{
            ws::UpdateEvent,
            RestError,
        },
        auction::entities,
        team::service::Service as TeamService,
    },
    std::sync::Arc,
    tokio::sync::broadcast,
};

pub mod cancel_auction;
pub mod create_auction;
pub mod end_auction;
pub mod get_auction;
pub mod get_auctions;
pub mod pause_auction;
pub mod place_bid;
pub mod resume_auction;
pub mod start_auction;
pub mod update_timer;
pub mod verification;

pub struct ServiceInner {
    repo:         Arc<Repository>,
    team_service: Arc<TeamService>,
    event_sender: broadcast::Sender<UpdateEvent>,
}

#[derive(Clone)]
pub struct Service(Arc<ServiceInner>);
impl std::ops::Deref for Service {
    type Target = ServiceInner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Service {
    pub fn new(
        db: impl repository::Database,
        team_service: Arc<TeamService>,
        event_sender: broadcast::Sender<UpdateEvent>,
    ) -> Self {
        Self(Arc::new(ServiceInner {
            repo: Arc::new(Repository::new(db)),
            team_service,
            event_sender,
        }))
    }
}

impl ServiceInner {
    /// Loads an auction for a caller holding its write lock. Terminal and
    /// unknown auctions never get mutated again, so their lock entries are
    /// pruned here rather than left to accumulate in the lock map.
    async fn get_auction_for_update(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<entities::Auction, RestError> {
        match self.repo.get_auction(auction_id).await {
            Ok(auction) => {
                if auction.status.is_terminal() {
                    self.repo.remove_auction_lock(auction_id).await;
                }
                Ok(auction)
            }
            Err(e) => {
                self.repo.remove_auction_lock(auction_id).await;
                Err(e)
            }
        }
    }

    /// Pushes an accepted state change to the websocket fan-out. Losing an
    /// update because nobody is subscribed is fine.
    fn broadcast_update(&self, event: UpdateEvent) {
        if self.event_sender.receiver_count() == 0 {
            return;
        }
        if let Err(e) = self.event_sender.send(event) {
            tracing::error!(error = e.to_string(), "Failed to broadcast update");
        }
    }
}

#[cfg(test)]
pub mod tests {
    use {
        super::*,
        crate::{
            auction::entities,
            team::repository::{
                self as team_repository,
                MockDatabase as MockTeamDatabase,
            },
        },
        repository::MockDatabase,
        time::{
            OffsetDateTime,
            PrimitiveDateTime,
        },
        uuid::Uuid,
    };

    impl Service {
        pub fn new_with_mocks(
            db: MockDatabase,
            team_db: MockTeamDatabase,
        ) -> (Self, broadcast::Receiver<UpdateEvent>) {
            let (event_sender, event_receiver) = broadcast::channel(100);
            let team_service = Arc::new(TeamService::new(team_db));
            (
                Service::new(db, team_service, event_sender),
                event_receiver,
            )
        }
    }

    pub fn primitive_now() -> PrimitiveDateTime {
        let now = OffsetDateTime::now_utc();
        PrimitiveDateTime::new(now.date(), now.time())
    }

    pub fn auction_row(
        id: entities::AuctionId,
        league_id: Uuid,
        player_id: Uuid,
        status: repository::AuctionStatus,
        current_price: &str,
    ) -> repository::Auction {
        repository::Auction {
            id,
            league_id,
            player_id,
            status,
            starting_price: "100".parse().unwrap(),
            current_price: current_price.parse().unwrap(),
            winning_team_id: None,
            timer_seconds: 30,
            started_at: None,
            ended_at: None,
            creation_time: primitive_now(),
        }
    }

    pub fn league_row(id: Uuid) -> team_repository::League {
        team_repository::League {
            id,
            name: "Premier League".to_string(),
            base_purse: "1000".parse().unwrap(),
            auction_timer_seconds: 30,
            min_bid_increment: "0.25".parse().unwrap(),
            max_players_per_team: 11,
        }
    }

    pub fn team_row(
        id: Uuid,
        league_id: Uuid,
        purse: &str,
        spent: &str,
        player_count: i32,
    ) -> team_repository::Team {
        team_repository::Team {
            id,
            league_id,
            name: "Strikers".to_string(),
            purse: purse.parse().unwrap(),
            spent: spent.parse().unwrap(),
            player_count,
        }
    }
}
