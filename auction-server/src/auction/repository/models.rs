#[cfg(test)]
use mockall::automock;
use {
    super::entities,
    crate::{
        api::RestError,
        kernel::db::DB,
        team::entities::{
            LeagueId,
            TeamId,
        },
    },
    axum::async_trait,
    sqlx::{
        types::BigDecimal,
        FromRow,
    },
    std::fmt::Debug,
    time::{
        OffsetDateTime,
        PrimitiveDateTime,
    },
    tracing::instrument,
    uuid::Uuid,
};

#[derive(Clone, Copy, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "auction_status", rename_all = "lowercase")]
pub enum AuctionStatus {
    Scheduled,
    Live,
    Paused,
    Completed,
    Cancelled,
}

impl From<entities::AuctionStatus> for AuctionStatus {
    fn from(status: entities::AuctionStatus) -> Self {
        match status {
            entities::AuctionStatus::Scheduled => AuctionStatus::Scheduled,
            entities::AuctionStatus::Live => AuctionStatus::Live,
            entities::AuctionStatus::Paused => AuctionStatus::Paused,
            entities::AuctionStatus::Completed => AuctionStatus::Completed,
            entities::AuctionStatus::Cancelled => AuctionStatus::Cancelled,
        }
    }
}

impl From<AuctionStatus> for entities::AuctionStatus {
    fn from(status: AuctionStatus) -> Self {
        match status {
            AuctionStatus::Scheduled => entities::AuctionStatus::Scheduled,
            AuctionStatus::Live => entities::AuctionStatus::Live,
            AuctionStatus::Paused => entities::AuctionStatus::Paused,
            AuctionStatus::Completed => entities::AuctionStatus::Completed,
            AuctionStatus::Cancelled => entities::AuctionStatus::Cancelled,
        }
    }
}

fn to_primitive(time: OffsetDateTime) -> PrimitiveDateTime {
    PrimitiveDateTime::new(time.date(), time.time())
}

#[derive(Clone, FromRow, Debug)]
pub struct Auction {
    pub id:              entities::AuctionId,
    pub league_id:       Uuid,
    pub player_id:       Uuid,
    pub status:          AuctionStatus,
    pub starting_price:  BigDecimal,
    pub current_price:   BigDecimal,
    pub winning_team_id: Option<Uuid>,
    pub timer_seconds:   i32,
    pub started_at:      Option<PrimitiveDateTime>,
    pub ended_at:        Option<PrimitiveDateTime>,
    pub creation_time:   PrimitiveDateTime,
}

impl Auction {
    pub fn get_auction_entity(self, bids: Vec<entities::Bid>) -> entities::Auction {
        entities::Auction {
            id: self.id,
            league_id: self.league_id,
            player_id: self.player_id,
            status: self.status.into(),
            starting_price: self.starting_price,
            current_price: self.current_price,
            winning_team_id: self.winning_team_id,
            timer_seconds: self.timer_seconds,
            started_at: self.started_at.map(|t| t.assume_utc()),
            ended_at: self.ended_at.map(|t| t.assume_utc()),
            creation_time: self.creation_time.assume_utc(),
            bids,
        }
    }
}

#[derive(Clone, FromRow, Debug)]
pub struct Bid {
    pub id:            entities::BidId,
    pub auction_id:    entities::AuctionId,
    pub team_id:       Uuid,
    pub user_id:       Uuid,
    pub amount:        BigDecimal,
    pub is_winning:    bool,
    pub creation_time: PrimitiveDateTime,
}

impl Bid {
    pub fn get_bid_entity(self) -> entities::Bid {
        entities::Bid {
            id:            self.id,
            auction_id:    self.auction_id,
            team_id:       self.team_id,
            user_id:       self.user_id,
            amount:        self.amount,
            is_winning:    self.is_winning,
            creation_time: self.creation_time.assume_utc(),
        }
    }
}

/// Everything that has to land atomically when a completed auction has a
/// winner: the purse debit, the roster addition, and the transaction log row.
#[derive(Clone, Debug, PartialEq)]
pub struct PurchaseCommit {
    pub team_id:     TeamId,
    pub player_id:   entities::PlayerId,
    pub amount:      BigDecimal,
    pub description: String,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Database: Debug + Send + Sync + 'static {
    async fn add_auction(&self, auction: &entities::Auction) -> Result<(), RestError>;
    async fn get_auction(&self, auction_id: entities::AuctionId) -> Result<Auction, RestError>;
    async fn get_auctions(&self, league_id: Option<LeagueId>) -> Result<Vec<Auction>, RestError>;
    async fn get_bids(&self, auction_id: entities::AuctionId) -> Result<Vec<Bid>, RestError>;
    async fn add_winning_bid(&self, bid: &entities::Bid) -> Result<(), RestError>;
    async fn start_auction(
        &self,
        auction_id: entities::AuctionId,
        started_at: OffsetDateTime,
        timer_seconds: i32,
    ) -> Result<(), RestError>;
    async fn update_auction_status(
        &self,
        auction_id: entities::AuctionId,
        status: AuctionStatus,
        ended_at: Option<OffsetDateTime>,
    ) -> Result<(), RestError>;
    async fn update_timer(
        &self,
        auction_id: entities::AuctionId,
        seconds: i32,
    ) -> Result<(), RestError>;
    async fn conclude_auction(
        &self,
        auction_id: entities::AuctionId,
        ended_at: OffsetDateTime,
        purchase: Option<PurchaseCommit>,
    ) -> Result<(), RestError>;
}

#[async_trait]
impl Database for DB {
    #[instrument(
        target = "metrics",
        name = "db_add_auction",
        fields(category = "db_queries", result = "success", name = "add_auction"),
        skip_all
    )]
    async fn add_auction(&self, auction: &entities::Auction) -> Result<(), RestError> {
        sqlx::query(
            "INSERT INTO auction (id, league_id, player_id, status, starting_price, current_price, timer_seconds, creation_time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(auction.id)
        .bind(auction.league_id)
        .bind(auction.player_id)
        .bind(AuctionStatus::from(auction.status))
        .bind(&auction.starting_price)
        .bind(&auction.current_price)
        .bind(auction.timer_seconds)
        .bind(to_primitive(auction.creation_time))
        .execute(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), auction = ?auction, "DB: Failed to insert auction");
            RestError::TemporarilyUnavailable
        })?;
        Ok(())
    }

    #[instrument(
        target = "metrics",
        name = "db_get_auction",
        fields(category = "db_queries", result = "success", name = "get_auction"),
        skip_all
    )]
    async fn get_auction(&self, auction_id: entities::AuctionId) -> Result<Auction, RestError> {
        sqlx::query_as("SELECT * FROM auction WHERE id = $1")
            .bind(auction_id)
            .fetch_one(self)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => RestError::AuctionNotFound,
                _ => {
                    tracing::Span::current().record("result", "error");
                    tracing::error!(
                        error = e.to_string(),
                        auction_id = auction_id.to_string(),
                        "Failed to get auction from db"
                    );
                    RestError::TemporarilyUnavailable
                }
            })
    }

    #[instrument(
        target = "metrics",
        name = "db_get_auctions",
        fields(category = "db_queries", result = "success", name = "get_auctions"),
        skip_all
    )]
    async fn get_auctions(&self, league_id: Option<LeagueId>) -> Result<Vec<Auction>, RestError> {
        let query = match league_id {
            Some(league_id) => {
                sqlx::query_as("SELECT * FROM auction WHERE league_id = $1 ORDER BY creation_time DESC")
                    .bind(league_id)
            }
            None => sqlx::query_as("SELECT * FROM auction ORDER BY creation_time DESC"),
        };
        query.fetch_all(self).await.map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), "Failed to get auctions from db");
            RestError::TemporarilyUnavailable
        })
    }

    #[instrument(
        target = "metrics",
        name = "db_get_bids",
        fields(category = "db_queries", result = "success", name = "get_bids"),
        skip_all
    )]
    async fn get_bids(&self, auction_id: entities::AuctionId) -> Result<Vec<Bid>, RestError> {
        sqlx::query_as("SELECT * FROM bid WHERE auction_id = $1 ORDER BY creation_time DESC")
            .bind(auction_id)
            .fetch_all(self)
            .await
            .map_err(|e| {
                tracing::Span::current().record("result", "error");
                tracing::error!(
                    error = e.to_string(),
                    auction_id = auction_id.to_string(),
                    "Failed to get bids from db"
                );
                RestError::TemporarilyUnavailable
            })
    }

    // The winning flag flip, the bid insert, and the price/winner update have
    // to be visible together, so they share one transaction.
    #[instrument(
        target = "metrics",
        name = "db_add_winning_bid",
        fields(category = "db_queries", result = "success", name = "add_winning_bid"),
        skip_all
    )]
    async fn add_winning_bid(&self, bid: &entities::Bid) -> Result<(), RestError> {
        let mut tx = self.begin().await.map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), "DB: Failed to begin bid transaction");
            RestError::TemporarilyUnavailable
        })?;

        let result: Result<(), sqlx::Error> = async {
            sqlx::query("UPDATE bid SET is_winning = false WHERE auction_id = $1 AND is_winning = true")
                .bind(bid.auction_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query(
                "INSERT INTO bid (id, auction_id, team_id, user_id, amount, is_winning, creation_time) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(bid.id)
            .bind(bid.auction_id)
            .bind(bid.team_id)
            .bind(bid.user_id)
            .bind(&bid.amount)
            .bind(bid.is_winning)
            .bind(to_primitive(bid.creation_time))
            .execute(&mut *tx)
            .await?;
            sqlx::query("UPDATE auction SET current_price = $1, winning_team_id = $2 WHERE id = $3")
                .bind(&bid.amount)
                .bind(bid.team_id)
                .bind(bid.auction_id)
                .execute(&mut *tx)
                .await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => tx.commit().await.map_err(|e| {
                tracing::Span::current().record("result", "error");
                tracing::error!(error = e.to_string(), bid = ?bid, "DB: Failed to commit bid transaction");
                RestError::TemporarilyUnavailable
            }),
            Err(e) => {
                tracing::Span::current().record("result", "error");
                tracing::error!(error = e.to_string(), bid = ?bid, "DB: Failed to insert winning bid");
                Err(RestError::TemporarilyUnavailable)
            }
        }
    }

    #[instrument(
        target = "metrics",
        name = "db_start_auction",
        fields(category = "db_queries", result = "success", name = "start_auction"),
        skip_all
    )]
    async fn start_auction(
        &self,
        auction_id: entities::AuctionId,
        started_at: OffsetDateTime,
        timer_seconds: i32,
    ) -> Result<(), RestError> {
        sqlx::query(
            "UPDATE auction SET status = $1, started_at = $2, timer_seconds = $3 WHERE id = $4",
        )
        .bind(AuctionStatus::Live)
        .bind(to_primitive(started_at))
        .bind(timer_seconds)
        .bind(auction_id)
        .execute(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(
                error = e.to_string(),
                auction_id = auction_id.to_string(),
                "DB: Failed to start auction"
            );
            RestError::TemporarilyUnavailable
        })?;
        Ok(())
    }

    #[instrument(
        target = "metrics",
        name = "db_update_auction_status",
        fields(category = "db_queries", result = "success", name = "update_auction_status"),
        skip_all
    )]
    async fn update_auction_status(
        &self,
        auction_id: entities::AuctionId,
        status: AuctionStatus,
        ended_at: Option<OffsetDateTime>,
    ) -> Result<(), RestError> {
        sqlx::query("UPDATE auction SET status = $1, ended_at = COALESCE($2, ended_at) WHERE id = $3")
            .bind(status)
            .bind(ended_at.map(to_primitive))
            .bind(auction_id)
            .execute(self)
            .await
            .map_err(|e| {
                tracing::Span::current().record("result", "error");
                tracing::error!(
                    error = e.to_string(),
                    auction_id = auction_id.to_string(),
                    "DB: Failed to update auction status"
                );
                RestError::TemporarilyUnavailable
            })?;
        Ok(())
    }

    #[instrument(
        target = "metrics",
        name = "db_update_timer",
        fields(category = "db_queries", result = "success", name = "update_timer"),
        skip_all
    )]
    async fn update_timer(
        &self,
        auction_id: entities::AuctionId,
        seconds: i32,
    ) -> Result<(), RestError> {
        sqlx::query("UPDATE auction SET timer_seconds = $1 WHERE id = $2")
            .bind(seconds)
            .bind(auction_id)
            .execute(self)
            .await
            .map_err(|e| {
                tracing::Span::current().record("result", "error");
                tracing::error!(
                    error = e.to_string(),
                    auction_id = auction_id.to_string(),
                    "DB: Failed to update auction timer"
                );
                RestError::TemporarilyUnavailable
            })?;
        Ok(())
    }

    // Completion and the purchase commit are one transaction: a purse debit
    // without the roster row (or vice versa) would break the team invariant.
    // The debit itself is guarded against overdrawing the purse, since bids on
    // other auctions may have validated against the same balance.
    #[instrument(
        target = "metrics",
        name = "db_conclude_auction",
        fields(category = "db_queries", result = "success", name = "conclude_auction"),
        skip_all
    )]
    async fn conclude_auction(
        &self,
        auction_id: entities::AuctionId,
        ended_at: OffsetDateTime,
        purchase: Option<PurchaseCommit>,
    ) -> Result<(), RestError> {
        let mut tx = self.begin().await.map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), "DB: Failed to begin conclude transaction");
            RestError::TemporarilyUnavailable
        })?;

        let result: Result<(), sqlx::Error> = async {
            sqlx::query("UPDATE auction SET status = $1, ended_at = $2 WHERE id = $3")
                .bind(AuctionStatus::Completed)
                .bind(to_primitive(ended_at))
                .bind(auction_id)
                .execute(&mut *tx)
                .await?;
            if let Some(purchase) = &purchase {
                let debit = sqlx::query(
                    "UPDATE team SET spent = spent + $1, player_count = player_count + 1 \
                     WHERE id = $2 AND spent + $1 <= purse",
                )
                .bind(&purchase.amount)
                .bind(purchase.team_id)
                .execute(&mut *tx)
                .await?;
                if debit.rows_affected() == 0 {
                    return Err(sqlx::Error::RowNotFound);
                }
                sqlx::query(
                    "INSERT INTO team_player (id, team_id, player_id, price, creation_time) \
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(Uuid::new_v4())
                .bind(purchase.team_id)
                .bind(purchase.player_id)
                .bind(&purchase.amount)
                .bind(to_primitive(ended_at))
                .execute(&mut *tx)
                .await?;
                sqlx::query(
                    "INSERT INTO team_transaction (id, team_id, kind, amount, description, auction_id, creation_time) \
                     VALUES ($1, $2, 'purchase', $3, $4, $5, $6)",
                )
                .bind(Uuid::new_v4())
                .bind(purchase.team_id)
                .bind(&purchase.amount)
                .bind(&purchase.description)
                .bind(auction_id)
                .bind(to_primitive(ended_at))
                .execute(&mut *tx)
                .await?;
            }
            Ok(())
        }
        .await;

        match result {
            Ok(()) => tx.commit().await.map_err(|e| {
                tracing::Span::current().record("result", "error");
                tracing::error!(
                    error = e.to_string(),
                    auction_id = auction_id.to_string(),
                    "DB: Failed to commit conclude transaction"
                );
                RestError::TemporarilyUnavailable
            }),
            Err(sqlx::Error::RowNotFound) => {
                tracing::Span::current().record("result", "error");
                tracing::warn!(
                    auction_id = auction_id.to_string(),
                    "DB: Purchase would overdraw the team purse; conclude rolled back"
                );
                Err(RestError::InsufficientFunds)
            }
            Err(e) => {
                tracing::Span::current().record("result", "error");
                tracing::error!(
                    error = e.to_string(),
                    auction_id = auction_id.to_string(),
                    "DB: Failed to conclude auction"
                );
                Err(RestError::TemporarilyUnavailable)
            }
        }
    }
}
