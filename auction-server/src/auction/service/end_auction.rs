use {
    super::Service,
    crate::{
        api::{
            ws::UpdateEvent,
            RestError,
        },
        auction::{
            entities,
            repository::PurchaseCommit,
        },
    },
    time::OffsetDateTime,
};

pub struct EndAuctionInput {
    pub auction_id: entities::AuctionId,
}

impl Service {
    /// Completes an active auction. If a winning bid exists, the purchase is
    /// committed in the same database transaction as the status change: purse
    /// debit, roster addition, and transaction log land together or not at all.
    #[tracing::instrument(skip_all, fields(auction_id = %input.auction_id), err(level = tracing::Level::TRACE))]
    pub async fn end_auction(&self, input: EndAuctionInput) -> Result<entities::Auction, RestError> {
        let auction_lock = self.repo.get_or_create_auction_lock(input.auction_id).await;
        {
            let _lock_guard = auction_lock.lock().await;

            let auction = self.get_auction_for_update(input.auction_id).await?;
            if !auction.status.is_active() {
                return Err(RestError::InvalidState("Auction is not active".to_string()));
            }

            let purchase = auction.winning_team_id.map(|team_id| PurchaseCommit {
                team_id,
                player_id: auction.player_id,
                amount: auction.current_price.clone(),
                description: format!("Purchased player {} in auction", auction.player_id),
            });
            self.repo
                .conclude_auction(input.auction_id, OffsetDateTime::now_utc(), purchase)
                .await?;
        }
        // Terminal status; no further mutations will contend for the lock.
        self.repo.remove_auction_lock(input.auction_id).await;

        let auction = self.repo.get_auction(input.auction_id).await?;
        self.broadcast_update(UpdateEvent::AuctionEnded(auction.clone()));
        Ok(auction)
    }
}
