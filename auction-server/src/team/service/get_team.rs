use {
    super::Service,
    crate::{
        api::RestError,
        team::entities,
    },
};

pub struct GetTeamInput {
    pub team_id: entities::TeamId,
}

impl Service {
    #[tracing::instrument(skip_all, fields(team_id = %input.team_id), err(level = tracing::Level::TRACE))]
    pub async fn get_team(&self, input: GetTeamInput) -> Result<entities::Team, RestError> {
        self.repo.get_team(input.team_id).await
    }
}
