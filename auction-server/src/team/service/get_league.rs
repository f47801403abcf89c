use {
    super::Service,
    crate::{
        api::RestError,
        team::entities,
    },
};

pub struct GetLeagueInput {
    pub league_id: entities::LeagueId,
}

impl Service {
    #[tracing::instrument(skip_all, fields(league_id = %input.league_id), err(level = tracing::Level::TRACE))]
    pub async fn get_league(&self, input: GetLeagueInput) -> Result<entities::League, RestError> {
        self.repo.get_league(input.league_id).await
    }
}
