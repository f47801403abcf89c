use {
    super::Repository,
    crate::{
        api::RestError,
        team::entities,
    },
};

impl Repository {
    pub async fn get_team(&self, team_id: entities::TeamId) -> Result<entities::Team, RestError> {
        Ok(self.db.get_team(team_id).await?.get_team_entity())
    }
}
