use {
    super::entities,
    std::collections::HashMap,
    tokio::sync::Mutex,
};

mod add_auction;
mod add_winning_bid;
mod conclude_auction;
mod get_auction;
mod get_auctions;
mod get_or_create_auction_lock;
mod models;
mod remove_auction_lock;
mod start_auction;
mod update_auction_status;
mod update_timer;

pub use models::*;

/// State that lives only in this process: the per-auction write locks.
/// Everything durable is behind the [`Database`] trait.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    pub auction_locks: Mutex<HashMap<entities::AuctionId, entities::AuctionLock>>,
}

#[derive(Debug)]
pub struct Repository {
    pub in_memory_store: InMemoryStore,
    pub db:              Box<dyn Database>,
}

impl Repository {
    pub fn new(db: impl Database) -> Self {
        Self {
            in_memory_store: InMemoryStore::default(),
            db:              Box::new(db),
        }
    }
}
