use {
    super::auction::AuctionId,
    crate::team::entities::TeamId,
    bigdecimal::BigDecimal,
    time::OffsetDateTime,
    uuid::Uuid,
};

pub type BidId = Uuid;
pub type UserId = Uuid;

/// An accepted bid. Immutable once written except for clearing the winning
/// flag when a later bid supersedes it.
#[derive(Clone, Debug, PartialEq)]
pub struct Bid {
    pub id:            BidId,
    pub auction_id:    AuctionId,
    pub team_id:       TeamId,
    pub user_id:       UserId,
    pub amount:        BigDecimal,
    pub is_winning:    bool,
    pub creation_time: OffsetDateTime,
}

#[derive(Clone, Debug)]
pub struct BidCreate {
    pub auction_id: AuctionId,
    pub team_id:    TeamId,
    pub user_id:    UserId,
    pub amount:     BigDecimal,
}

impl Bid {
    /// A freshly accepted bid is the winning bid by definition.
    pub fn new(create: BidCreate) -> Self {
        Self {
            id:            Uuid::new_v4(),
            auction_id:    create.auction_id,
            team_id:       create.team_id,
            user_id:       create.user_id,
            amount:        create.amount,
            is_winning:    true,
            creation_time: OffsetDateTime::now_utc(),
        }
    }
}
