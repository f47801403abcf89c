#[cfg(test)]
use mockall::automock;
use {
    super::super::entities,
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
    tracing::instrument,
    uuid::Uuid,
};

#[derive(Clone, FromRow, Debug)]
pub struct Team {
    pub id:           Uuid,
    pub name:         String,
    pub league_id:    Uuid,
    pub purse:        BigDecimal,
    pub spent:        BigDecimal,
    pub player_count: i32,
}

impl Team {
    pub fn get_team_entity(self) -> entities::Team {
        entities::Team {
            id:           self.id,
            name:         self.name,
            league_id:    self.league_id,
            purse:        self.purse,
            spent:        self.spent,
            player_count: self.player_count,
        }
    }
}

#[derive(Clone, FromRow, Debug)]
pub struct League {
    pub id:                    Uuid,
    pub name:                  String,
    pub base_purse:            BigDecimal,
    pub auction_timer_seconds: i32,
    pub min_bid_increment:     BigDecimal,
    pub max_players_per_team:  i32,
}

impl League {
    pub fn get_league_entity(self) -> entities::League {
        entities::League {
            id:                    self.id,
            name:                  self.name,
            base_purse:            self.base_purse,
            auction_timer_seconds: self.auction_timer_seconds,
            min_bid_increment:     self.min_bid_increment,
            max_players_per_team:  self.max_players_per_team,
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Database: Debug + Send + Sync + 'static {
    async fn get_team(&self, team_id: TeamId) -> Result<Team, RestError>;
    async fn get_league(&self, league_id: LeagueId) -> Result<League, RestError>;
}

#[async_trait]
impl Database for DB {
    #[instrument(
        target = "metrics",
        name = "db_get_team",
        fields(category = "db_queries", result = "success", name = "get_team"),
        skip_all
    )]
    async fn get_team(&self, team_id: TeamId) -> Result<Team, RestError> {
        sqlx::query_as(
            "SELECT id, name, league_id, purse, spent, player_count FROM team WHERE id = $1",
        )
        .bind(team_id)
        .fetch_one(self)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => RestError::TeamNotFound,
            _ => {
                tracing::Span::current().record("result", "error");
                tracing::error!(
                    error = e.to_string(),
                    team_id = team_id.to_string(),
                    "Failed to get team from db"
                );
                RestError::TemporarilyUnavailable
            }
        })
    }

    #[instrument(
        target = "metrics",
        name = "db_get_league",
        fields(category = "db_queries", result = "success", name = "get_league"),
        skip_all
    )]
    async fn get_league(&self, league_id: LeagueId) -> Result<League, RestError> {
        sqlx::query_as(
            "SELECT id, name, base_purse, auction_timer_seconds, min_bid_increment, max_players_per_team FROM league WHERE id = $1",
        )
        .bind(league_id)
        .fetch_one(self)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => RestError::LeagueNotFound,
            _ => {
                tracing::Span::current().record("result", "error");
                tracing::error!(
                    error = e.to_string(),
                    league_id = league_id.to_string(),
                    "Failed to get league from db"
                );
                RestError::TemporarilyUnavailable
            }
        })
    }
}
