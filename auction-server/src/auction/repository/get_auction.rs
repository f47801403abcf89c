use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    pub async fn get_auction(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<entities::Auction, RestError> {
        let auction = self.db.get_auction(auction_id).await?;
        let bids = self
            .db
            .get_bids(auction_id)
            .await?
            .into_iter()
            .map(|bid| bid.get_bid_entity())
            .collect();
        Ok(auction.get_auction_entity(bids))
    }
}
