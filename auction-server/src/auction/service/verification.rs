use {
    crate::{
        api::RestError,
        auction::entities,
        team::entities::{
            League,
            Team,
        },
    },
    bigdecimal::BigDecimal,
};

pub fn verify_auction_is_biddable(auction: &entities::Auction) -> Result<(), RestError> {
    if !auction.status.is_live() {
        return Err(RestError::InvalidState("Auction is not live".to_string()));
    }
    Ok(())
}

/// A bid has to clear the current price by at least the league increment.
pub fn verify_bid_amount(
    auction: &entities::Auction,
    league: &League,
    amount: &BigDecimal,
) -> Result<(), RestError> {
    let min_bid = &auction.current_price + &league.min_bid_increment;
    if *amount < min_bid {
        return Err(RestError::InvalidBid(format!(
            "Bid must be at least {} (current: {} + increment: {})",
            min_bid, auction.current_price, league.min_bid_increment
        )));
    }
    Ok(())
}

/// Rejects bids the team cannot settle. The purse is only debited when the
/// auction concludes, and the conclude transaction enforces the same bound.
pub fn verify_team_can_afford(team: &Team, amount: &BigDecimal) -> Result<(), RestError> {
    if *amount > team.available_purse() {
        return Err(RestError::InsufficientFunds);
    }
    Ok(())
}

pub fn verify_roster_capacity(team: &Team, league: &League) -> Result<(), RestError> {
    if team.player_count >= league.max_players_per_team {
        return Err(RestError::RosterFull);
    }
    Ok(())
}
