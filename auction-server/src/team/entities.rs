use {
    bigdecimal::BigDecimal,
    uuid::Uuid,
};

pub type TeamId = Uuid;
pub type LeagueId = Uuid;

#[derive(Clone, Debug)]
pub struct Team {
    pub id:           TeamId,
    pub name:         String,
    pub league_id:    LeagueId,
    pub purse:        BigDecimal,
    pub spent:        BigDecimal,
    pub player_count: i32,
}

impl Team {
    /// Purse not yet committed to purchases.
    pub fn available_purse(&self) -> BigDecimal {
        &self.purse - &self.spent
    }
}

/// League configuration governing auction parameters.
#[derive(Clone, Debug)]
pub struct League {
    pub id:                   LeagueId,
    pub name:                 String,
    pub base_purse:           BigDecimal,
    pub auction_timer_seconds: i32,
    pub min_bid_increment:    BigDecimal,
    pub max_players_per_team: i32,
}
