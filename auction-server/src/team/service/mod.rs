use {
    super::repository::{
        self,
        Repository,
    },
    std::sync::Arc,
};

pub mod get_league;
pub mod get_team;

pub struct ServiceInner {
    repo: Arc<Repository>,
}

#[derive(Clone)]
pub struct Service(Arc<ServiceInner>);
impl std::ops::Deref for Service {
    type Target = ServiceInner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Service {
    pub fn new(db: impl repository::Database) -> Self {
        Self(Arc::new(ServiceInner {
            repo: Arc::new(Repository::new(db)),
        }))
    }
}
