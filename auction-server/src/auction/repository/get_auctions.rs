use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
        team::entities::LeagueId,
    },
};

impl Repository {
    pub async fn get_auctions(
        &self,
        league_id: Option<LeagueId>,
    ) -> Result<Vec<entities::Auction>, RestError> {
        let rows = self.db.get_auctions(league_id).await?;
        let mut auctions = Vec::with_capacity(rows.len());
        for row in rows {
            let bids = self
                .db
                .get_bids(row.id)
                .await?
                .into_iter()
                .map(|bid| bid.get_bid_entity())
                .collect();
            auctions.push(row.get_auction_entity(bids));
        }
        Ok(auctions)
    }
}
