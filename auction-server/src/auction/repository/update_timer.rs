use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    pub async fn update_timer(
        &self,
        auction_id: entities::AuctionId,
        seconds: i32,
    ) -> Result<(), RestError> {
        self.db.update_timer(auction_id, seconds).await
    }
}
