use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
    time::OffsetDateTime,
};

impl Repository {
    pub async fn update_auction_status(
        &self,
        auction_id: entities::AuctionId,
        status: entities::AuctionStatus,
        ended_at: Option<OffsetDateTime>,
    ) -> Result<(), RestError> {
        self.db
            .update_auction_status(auction_id, status.into(), ended_at)
            .await
    }
}
