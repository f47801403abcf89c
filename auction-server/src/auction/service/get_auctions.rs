use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
        team::entities::LeagueId,
    },
};

pub struct GetAuctionsInput {
    pub league_id: Option<LeagueId>,
}

impl Service {
    pub async fn get_auctions(
        &self,
        input: GetAuctionsInput,
    ) -> Result<Vec<entities::Auction>, RestError> {
        self.repo.get_auctions(input.league_id).await
    }
}
