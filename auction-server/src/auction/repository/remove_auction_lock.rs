use {
    super::Repository,
    crate::auction::entities,
};

impl Repository {
    pub async fn remove_auction_lock(&self, auction_id: entities::AuctionId) {
        let mut locks = self.in_memory_store.auction_locks.lock().await;
        locks.remove(&auction_id);
    }
}
