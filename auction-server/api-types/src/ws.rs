use {
    crate::{
        auction::{
            Auction,
            AuctionId,
            Bid,
            BidCreate,
            BidResult,
        },
        Routable,
    },
    http::Method,
    serde::{
        Deserialize,
        Serialize,
    },
    strum::AsRefStr,
    utoipa::ToSchema,
};

#[derive(Deserialize, Clone, ToSchema, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum ClientMessage {
    #[serde(rename = "subscribe")]
    Subscribe {
        #[schema(value_type = Vec<String>)]
        auction_ids: Vec<AuctionId>,
    },
    #[serde(rename = "unsubscribe")]
    Unsubscribe {
        #[schema(value_type = Vec<String>)]
        auction_ids: Vec<AuctionId>,
    },
    #[serde(rename = "post_bid")]
    PostBid {
        #[schema(value_type = String)]
        auction_id: AuctionId,
        bid:        BidCreate,
    },
}

#[derive(Deserialize, Clone, ToSchema, Serialize)]
pub struct ClientRequest {
    pub id:  String,
    #[serde(flatten)]
    pub msg: ClientMessage,
}

/// This enum is used to send an update to the client for any subscriptions made.
///
/// Every variant carries the full auction snapshot so clients never have to
/// reconcile diffs.
#[derive(Serialize, Clone, ToSchema, Deserialize, Debug)]
#[serde(tag = "type")]
#[allow(clippy::large_enum_variant)]
pub enum ServerUpdateResponse {
    #[serde(rename = "auction_updated")]
    AuctionUpdated { auction: Auction },
    #[serde(rename = "auction_started")]
    AuctionStarted { auction: Auction },
    #[serde(rename = "auction_ended")]
    AuctionEnded { auction: Auction },
    #[serde(rename = "bid_placed")]
    BidPlaced { bid: Bid, auction: Auction },
    #[serde(rename = "timer_updated")]
    TimerUpdated { auction: Auction },
}

#[derive(Serialize, Clone, ToSchema, Deserialize, Debug)]
#[serde(untagged)]
pub enum APIResponse {
    BidResult(BidResult),
}

#[derive(Serialize, Clone, ToSchema, Deserialize, Debug)]
#[serde(tag = "status", content = "result")]
pub enum ServerResultMessage {
    #[serde(rename = "success")]
    Success(Option<APIResponse>),
    #[serde(rename = "error")]
    Err(String),
}

/// This enum is used to send the result for a specific client request with the same id.
/// Id is only None when the client message is invalid.
#[derive(Serialize, ToSchema, Deserialize, Clone, Debug)]
pub struct ServerResultResponse {
    pub id:     Option<String>,
    #[serde(flatten)]
    pub result: ServerResultMessage,
}

#[derive(AsRefStr, Clone)]
#[strum(prefix = "/")]
pub enum Route {
    #[strum(serialize = "ws")]
    Ws,
}

impl Routable for Route {
    fn properties(&self) -> crate::RouteProperties {
        let full_path = format!("{}{}", crate::Route::V1.as_ref(), self.as_ref())
            .trim_end_matches('/')
            .to_string();
        match self {
            Route::Ws => crate::RouteProperties {
                access_level: crate::AccessLevel::Public,
                method: Method::GET,
                full_path,
            },
        }
    }
}
