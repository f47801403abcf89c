use {
    super::bid::Bid,
    crate::team::entities::{
        LeagueId,
        TeamId,
    },
    bigdecimal::BigDecimal,
    std::sync::Arc,
    time::OffsetDateTime,
    tokio::sync::Mutex,
    uuid::Uuid,
};

pub type AuctionId = Uuid;
pub type PlayerId = Uuid;
/// Serializes all mutating operations on one auction. Held for the whole
/// load-validate-write sequence so no bid ever validates against a stale price.
pub type AuctionLock = Arc<Mutex<()>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuctionStatus {
    Scheduled,
    Live,
    Paused,
    Completed,
    Cancelled,
}

impl AuctionStatus {
    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// Permitted edges: Scheduled -> Live <-> Paused -> Completed, with
    /// Cancelled reachable from Scheduled and Live only.
    pub fn permits(&self, next: AuctionStatus) -> bool {
        matches!(
            (self, next),
            (AuctionStatus::Scheduled, AuctionStatus::Live)
                | (AuctionStatus::Live, AuctionStatus::Paused)
                | (AuctionStatus::Paused, AuctionStatus::Live)
                | (AuctionStatus::Live, AuctionStatus::Completed)
                | (AuctionStatus::Paused, AuctionStatus::Completed)
                | (AuctionStatus::Scheduled, AuctionStatus::Cancelled)
                | (AuctionStatus::Live, AuctionStatus::Cancelled)
        )
    }

    pub fn is_live(&self) -> bool {
        matches!(self, AuctionStatus::Live)
    }

    /// Live or Paused; the only states an auction can be ended from.
    pub fn is_active(&self) -> bool {
        matches!(self, AuctionStatus::Live | AuctionStatus::Paused)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AuctionStatus::Completed | AuctionStatus::Cancelled)
    }
}

#[derive(Clone, Debug)]
pub struct Auction {
    pub id:              AuctionId,
    pub league_id:       LeagueId,
    pub player_id:       PlayerId,
    pub status:          AuctionStatus,
    pub starting_price:  BigDecimal,
    pub current_price:   BigDecimal,
    pub winning_team_id: Option<TeamId>,
    pub timer_seconds:   i32,
    pub started_at:      Option<OffsetDateTime>,
    pub ended_at:        Option<OffsetDateTime>,
    pub creation_time:   OffsetDateTime,

    /// Bid history, newest first.
    pub bids: Vec<Bid>,
}

#[derive(Clone, Debug)]
pub struct AuctionCreate {
    pub league_id:      LeagueId,
    pub player_id:      PlayerId,
    pub starting_price: BigDecimal,
}

impl Auction {
    pub fn new(create: AuctionCreate, timer_seconds: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            league_id: create.league_id,
            player_id: create.player_id,
            status: AuctionStatus::Scheduled,
            current_price: create.starting_price.clone(),
            starting_price: create.starting_price,
            winning_team_id: None,
            timer_seconds,
            started_at: None,
            ended_at: None,
            creation_time: OffsetDateTime::now_utc(),
            bids: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AuctionStatus::*;

    #[test]
    fn permitted_edges_only() {
        let all = [Scheduled, Live, Paused, Completed, Cancelled];
        let permitted = [
            (Scheduled, Live),
            (Live, Paused),
            (Paused, Live),
            (Live, Completed),
            (Paused, Completed),
            (Scheduled, Cancelled),
            (Live, Cancelled),
        ];
        for from in all {
            for to in all {
                assert_eq!(
                    from.permits(to),
                    permitted.contains(&(from, to)),
                    "{:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn terminal_states_permit_nothing() {
        let all = [Scheduled, Live, Paused, Completed, Cancelled];
        for to in all {
            assert!(!Completed.permits(to));
            assert!(!Cancelled.permits(to));
        }
    }
}
