use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
    time::OffsetDateTime,
};

impl Repository {
    pub async fn start_auction(
        &self,
        auction_id: entities::AuctionId,
        started_at: OffsetDateTime,
        timer_seconds: i32,
    ) -> Result<(), RestError> {
        self.db
            .start_auction(auction_id, started_at, timer_seconds)
            .await
    }
}
