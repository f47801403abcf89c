use {
    super::{
        PurchaseCommit,
        Repository,
    },
    crate::{
        api::RestError,
        auction::entities,
    },
    time::OffsetDateTime,
};

impl Repository {
    pub async fn conclude_auction(
        &self,
        auction_id: entities::AuctionId,
        ended_at: OffsetDateTime,
        purchase: Option<PurchaseCommit>,
    ) -> Result<(), RestError> {
        self.db
            .conclude_auction(auction_id, ended_at, purchase)
            .await
    }
}
