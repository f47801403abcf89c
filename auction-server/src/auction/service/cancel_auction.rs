use {
    super::Service,
    crate::{
        api::{
            ws::UpdateEvent,
            RestError,
        },
        auction::entities,
    },
    time::OffsetDateTime,
};

pub struct CancelAuctionInput {
    pub auction_id: entities::AuctionId,
}

impl Service {
    /// Cancels an auction without committing any purchase. Paused auctions
    /// have to be resumed first.
    #[tracing::instrument(skip_all, fields(auction_id = %input.auction_id), err(level = tracing::Level::TRACE))]
    pub async fn cancel_auction(
        &self,
        input: CancelAuctionInput,
    ) -> Result<entities::Auction, RestError> {
        let auction_lock = self.repo.get_or_create_auction_lock(input.auction_id).await;
        {
            let _lock_guard = auction_lock.lock().await;

            let auction = self.get_auction_for_update(input.auction_id).await?;
            if !auction.status.permits(entities::AuctionStatus::Cancelled) {
                return Err(RestError::InvalidState(
                    "Auction can only be cancelled from scheduled or live status".to_string(),
                ));
            }

            self.repo
                .update_auction_status(
                    input.auction_id,
                    entities::AuctionStatus::Cancelled,
                    Some(OffsetDateTime::now_utc()),
                )
                .await?;
        }
        self.repo.remove_auction_lock(input.auction_id).await;

        let auction = self.repo.get_auction(input.auction_id).await?;
        self.broadcast_update(UpdateEvent::AuctionEnded(auction.clone()));
        Ok(auction)
    }
}
