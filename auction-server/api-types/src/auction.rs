use {
    crate::Routable,
    bigdecimal::BigDecimal,
    http::Method,
    serde::{
        Deserialize,
        Serialize,
    },
    strum::AsRefStr,
    time::OffsetDateTime,
    utoipa::{
        IntoParams,
        ToResponse,
        ToSchema,
    },
    uuid::Uuid,
};

pub type AuctionId = Uuid;
pub type BidId = Uuid;
pub type LeagueId = Uuid;
pub type PlayerId = Uuid;
pub type TeamId = Uuid;
pub type UserId = Uuid;

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    Scheduled,
    Live,
    Paused,
    Completed,
    Cancelled,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct Bid {
    /// The unique id of the bid.
    #[schema(example = "obo3ee3e-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub id:          BidId,
    /// The auction the bid was placed on.
    #[schema(example = "a8a0f834-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub auction_id:  AuctionId,
    /// The team the bid was placed for.
    #[schema(example = "f47ac10b-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub team_id:     TeamId,
    /// The user who submitted the bid.
    #[schema(example = "5b6bbf12-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub user_id:     UserId,
    /// Amount of the bid in league currency units.
    #[schema(example = "105.25", value_type = String)]
    pub amount:      BigDecimal,
    /// Whether this bid is currently the winning bid for its auction.
    pub is_winning:  bool,
    /// Time the bid was accepted by the server.
    #[schema(example = "2024-05-23T21:26:57.329954Z", value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub created_at:  OffsetDateTime,
}

/// Full snapshot of an auction, including its bid history newest first.
///
/// Every server push carries this whole object rather than a diff, so a client
/// that missed updates can always be repaired by the next one.
#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug, PartialEq)]
pub struct Auction {
    #[schema(example = "a8a0f834-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub id:              AuctionId,
    #[schema(example = "b2dc0f42-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub league_id:       LeagueId,
    #[schema(example = "19d40e9c-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub player_id:       PlayerId,
    pub status:          AuctionStatus,
    #[schema(example = "100", value_type = String)]
    pub starting_price:  BigDecimal,
    #[schema(example = "110.25", value_type = String)]
    pub current_price:   BigDecimal,
    /// The team holding the winning bid, if any bid has been accepted.
    #[schema(example = "f47ac10b-58cc-4372-a567-0e02b2c3d479", value_type = Option<String>)]
    pub winning_team_id: Option<TeamId>,
    /// Remaining countdown in seconds. Advanced by an external scheduler.
    #[schema(example = 30)]
    pub timer_seconds:   i32,
    #[schema(value_type = Option<String>)]
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub started_at:      Option<OffsetDateTime>,
    #[schema(value_type = Option<String>)]
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub ended_at:        Option<OffsetDateTime>,
    pub bids:            Vec<Bid>,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct AuctionCreate {
    #[schema(example = "b2dc0f42-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub league_id:      LeagueId,
    #[schema(example = "19d40e9c-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub player_id:      PlayerId,
    #[schema(example = "100", value_type = String)]
    pub starting_price: BigDecimal,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct BidCreate {
    #[schema(example = "f47ac10b-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub team_id: TeamId,
    #[schema(example = "5b6bbf12-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub user_id: UserId,
    #[schema(example = "105.25", value_type = String)]
    pub amount:  BigDecimal,
}

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug)]
pub struct BidResult {
    #[schema(example = "OK")]
    pub status: String,
    /// The unique id of the accepted bid.
    #[schema(example = "obo3ee3e-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub id:     BidId,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct TimerUpdate {
    /// The new countdown value in seconds.
    #[schema(example = 15)]
    pub seconds: i32,
}

#[derive(Serialize, Deserialize, IntoParams, Clone, Debug)]
pub struct GetAuctionsQueryParams {
    /// Restrict the listing to one league.
    #[param(example = "b2dc0f42-58cc-4372-a567-0e02b2c3d479", value_type = Option<String>)]
    pub league_id: Option<LeagueId>,
}

#[derive(AsRefStr, Clone)]
#[strum(prefix = "/")]
pub enum Route {
    #[strum(serialize = "auctions")]
    PostAuction,
    #[strum(serialize = "auctions")]
    GetAuctions,
    #[strum(serialize = "auctions/:auction_id")]
    GetAuction,
    #[strum(serialize = "auctions/:auction_id/start")]
    PostStartAuction,
    #[strum(serialize = "auctions/:auction_id/pause")]
    PostPauseAuction,
    #[strum(serialize = "auctions/:auction_id/resume")]
    PostResumeAuction,
    #[strum(serialize = "auctions/:auction_id/end")]
    PostEndAuction,
    #[strum(serialize = "auctions/:auction_id/cancel")]
    PostCancelAuction,
    #[strum(serialize = "auctions/:auction_id/timer")]
    PostUpdateTimer,
    #[strum(serialize = "auctions/:auction_id/bids")]
    PostBid,
}

impl Routable for Route {
    fn properties(&self) -> crate::RouteProperties {
        let full_path = format!("{}{}", crate::Route::V1.as_ref(), self.as_ref())
            .trim_end_matches('/')
            .to_string();
        let (access_level, method) = match self {
            Route::PostAuction => (crate::AccessLevel::Admin, Method::POST),
            Route::GetAuctions => (crate::AccessLevel::Public, Method::GET),
            Route::GetAuction => (crate::AccessLevel::Public, Method::GET),
            Route::PostStartAuction => (crate::AccessLevel::Admin, Method::POST),
            Route::PostPauseAuction => (crate::AccessLevel::Admin, Method::POST),
            Route::PostResumeAuction => (crate::AccessLevel::Admin, Method::POST),
            Route::PostEndAuction => (crate::AccessLevel::Admin, Method::POST),
            Route::PostCancelAuction => (crate::AccessLevel::Admin, Method::POST),
            Route::PostUpdateTimer => (crate::AccessLevel::Admin, Method::POST),
            Route::PostBid => (crate::AccessLevel::Public, Method::POST),
        };
        crate::RouteProperties {
            access_level,
            method,
            full_path,
        }
    }
}
