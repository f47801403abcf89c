use {
    super::Repository,
    crate::{
        api::RestError,
        team::entities,
    },
};

impl Repository {
    pub async fn get_league(
        &self,
        league_id: entities::LeagueId,
    ) -> Result<entities::League, RestError> {
        Ok(self.db.get_league(league_id).await?.get_league_entity())
    }
}
