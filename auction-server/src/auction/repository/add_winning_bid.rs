use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    pub async fn add_winning_bid(&self, bid: &entities::Bid) -> Result<(), RestError> {
        self.db.add_winning_bid(bid).await
    }
}
