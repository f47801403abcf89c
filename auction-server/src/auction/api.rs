use {
    crate::{
        api::{
            RestError,
            WrappedRouter,
        },
        auction::{
            entities,
            service::{
                cancel_auction::CancelAuctionInput,
                create_auction::CreateAuctionInput,
                end_auction::EndAuctionInput,
                get_auction::GetAuctionInput,
                get_auctions::GetAuctionsInput,
                pause_auction::PauseAuctionInput,
                place_bid::PlaceBidInput,
                resume_auction::ResumeAuctionInput,
                start_auction::StartAuctionInput,
                update_timer::UpdateTimerInput,
            },
        },
        state::StoreNew,
    },
    axum::{
        extract::{
            Path,
            Query,
            State,
        },
        Json,
        Router,
    },
    pavilion_api_types::{
        auction::{
            Auction,
            AuctionCreate,
            AuctionId,
            AuctionStatus,
            Bid,
            BidCreate,
            BidResult,
            GetAuctionsQueryParams,
            Route,
            TimerUpdate,
        },
        ErrorBodyResponse,
    },
    std::sync::Arc,
};

impl From<entities::AuctionStatus> for AuctionStatus {
    fn from(status: entities::AuctionStatus) -> Self {
        match status {
            entities::AuctionStatus::Scheduled => AuctionStatus::Scheduled,
            entities::AuctionStatus::Live => AuctionStatus::Live,
            entities::AuctionStatus::Paused => AuctionStatus::Paused,
            entities::AuctionStatus::Completed => AuctionStatus::Completed,
            entities::AuctionStatus::Cancelled => AuctionStatus::Cancelled,
        }
    }
}

impl From<entities::Bid> for Bid {
    fn from(bid: entities::Bid) -> Self {
        Bid {
            id:         bid.id,
            auction_id: bid.auction_id,
            team_id:    bid.team_id,
            user_id:    bid.user_id,
            amount:     bid.amount,
            is_winning: bid.is_winning,
            created_at: bid.creation_time,
        }
    }
}

impl From<entities::Auction> for Auction {
    fn from(auction: entities::Auction) -> Self {
        Auction {
            id:              auction.id,
            league_id:       auction.league_id,
            player_id:       auction.player_id,
            status:          auction.status.into(),
            starting_price:  auction.starting_price,
            current_price:   auction.current_price,
            winning_team_id: auction.winning_team_id,
            timer_seconds:   auction.timer_seconds,
            started_at:      auction.started_at,
            ended_at:        auction.ended_at,
            bids:            auction.bids.into_iter().map(Bid::from).collect(),
        }
    }
}

/// Schedule a new auction for a player.
///
/// The auction starts out in scheduled status with the current price equal to
/// the starting price.
#[utoipa::path(post, path = "/v1/auctions",
    security(("bearerAuth" = [])),
    request_body = AuctionCreate, responses(
    (status = 200, description = "Auction was created successfully", body = Auction),
    (status = 400, response = ErrorBodyResponse),
    (status = 404, description = "League was not found", body = ErrorBodyResponse),
),)]
pub async fn post_auction(
    State(store): State<Arc<StoreNew>>,
    Json(auction_create): Json<AuctionCreate>,
) -> Result<Json<Auction>, RestError> {
    let auction = store
        .auction_service
        .create_auction(CreateAuctionInput {
            create: entities::AuctionCreate {
                league_id:      auction_create.league_id,
                player_id:      auction_create.player_id,
                starting_price: auction_create.starting_price,
            },
        })
        .await?;
    Ok(Json(auction.into()))
}

/// Returns all auctions, newest first, optionally filtered by league.
#[utoipa::path(get, path = "/v1/auctions",
    params(GetAuctionsQueryParams),
    responses(
    (status = 200, description = "Auctions were found successfully", body = Vec<Auction>),
    (status = 400, response = ErrorBodyResponse),
),)]
pub async fn get_auctions(
    State(store): State<Arc<StoreNew>>,
    query: Query<GetAuctionsQueryParams>,
) -> Result<Json<Vec<Auction>>, RestError> {
    let auctions = store
        .auction_service
        .get_auctions(GetAuctionsInput {
            league_id: query.league_id,
        })
        .await?;
    Ok(Json(auctions.into_iter().map(Auction::from).collect()))
}

/// Returns the full snapshot of a single auction, including its bid history.
#[utoipa::path(get, path = "/v1/auctions/{auction_id}",
    params(("auction_id" = String, description = "Auction id to query for")),
    responses(
    (status = 200, description = "Auction was found successfully", body = Auction),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
),)]
pub async fn get_auction(
    State(store): State<Arc<StoreNew>>,
    Path(auction_id): Path<AuctionId>,
) -> Result<Json<Auction>, RestError> {
    let auction = store
        .auction_service
        .get_auction(GetAuctionInput { auction_id })
        .await?;
    Ok(Json(auction.into()))
}

/// Open a scheduled auction for bidding.
#[utoipa::path(post, path = "/v1/auctions/{auction_id}/start",
    security(("bearerAuth" = [])),
    params(("auction_id" = String, description = "Auction id to start")),
    responses(
    (status = 200, description = "Auction was started successfully", body = Auction),
    (status = 400, response = ErrorBodyResponse),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
),)]
pub async fn post_start_auction(
    State(store): State<Arc<StoreNew>>,
    Path(auction_id): Path<AuctionId>,
) -> Result<Json<Auction>, RestError> {
    let auction = store
        .auction_service
        .start_auction(StartAuctionInput { auction_id })
        .await?;
    Ok(Json(auction.into()))
}

/// Pause a live auction. No bids are accepted until it is resumed.
#[utoipa::path(post, path = "/v1/auctions/{auction_id}/pause",
    security(("bearerAuth" = [])),
    params(("auction_id" = String, description = "Auction id to pause")),
    responses(
    (status = 200, description = "Auction was paused successfully", body = Auction),
    (status = 400, response = ErrorBodyResponse),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
),)]
pub async fn post_pause_auction(
    State(store): State<Arc<StoreNew>>,
    Path(auction_id): Path<AuctionId>,
) -> Result<Json<Auction>, RestError> {
    let auction = store
        .auction_service
        .pause_auction(PauseAuctionInput { auction_id })
        .await?;
    Ok(Json(auction.into()))
}

/// Resume a paused auction.
#[utoipa::path(post, path = "/v1/auctions/{auction_id}/resume",
    security(("bearerAuth" = [])),
    params(("auction_id" = String, description = "Auction id to resume")),
    responses(
    (status = 200, description = "Auction was resumed successfully", body = Auction),
    (status = 400, response = ErrorBodyResponse),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
),)]
pub async fn post_resume_auction(
    State(store): State<Arc<StoreNew>>,
    Path(auction_id): Path<AuctionId>,
) -> Result<Json<Auction>, RestError> {
    let auction = store
        .auction_service
        .resume_auction(ResumeAuctionInput { auction_id })
        .await?;
    Ok(Json(auction.into()))
}

/// Complete an active auction.
///
/// If a winning bid exists, the player joins the winning team's roster and
/// the purse debit and transaction log entry are committed atomically with
/// the status change.
#[utoipa::path(post, path = "/v1/auctions/{auction_id}/end",
    security(("bearerAuth" = [])),
    params(("auction_id" = String, description = "Auction id to end")),
    responses(
    (status = 200, description = "Auction was ended successfully", body = Auction),
    (status = 400, response = ErrorBodyResponse),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
),)]
pub async fn post_end_auction(
    State(store): State<Arc<StoreNew>>,
    Path(auction_id): Path<AuctionId>,
) -> Result<Json<Auction>, RestError> {
    let auction = store
        .auction_service
        .end_auction(EndAuctionInput { auction_id })
        .await?;
    Ok(Json(auction.into()))
}

/// Cancel a scheduled or live auction. No purchase is committed.
#[utoipa::path(post, path = "/v1/auctions/{auction_id}/cancel",
    security(("bearerAuth" = [])),
    params(("auction_id" = String, description = "Auction id to cancel")),
    responses(
    (status = 200, description = "Auction was cancelled successfully", body = Auction),
    (status = 400, response = ErrorBodyResponse),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
),)]
pub async fn post_cancel_auction(
    State(store): State<Arc<StoreNew>>,
    Path(auction_id): Path<AuctionId>,
) -> Result<Json<Auction>, RestError> {
    let auction = store
        .auction_service
        .cancel_auction(CancelAuctionInput { auction_id })
        .await?;
    Ok(Json(auction.into()))
}

/// Set the remaining countdown of an auction.
#[utoipa::path(post, path = "/v1/auctions/{auction_id}/timer",
    security(("bearerAuth" = [])),
    params(("auction_id" = String, description = "Auction id to update the timer for")),
    request_body = TimerUpdate, responses(
    (status = 200, description = "Timer was updated successfully", body = Auction),
    (status = 400, response = ErrorBodyResponse),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
),)]
pub async fn post_update_timer(
    State(store): State<Arc<StoreNew>>,
    Path(auction_id): Path<AuctionId>,
    Json(timer_update): Json<TimerUpdate>,
) -> Result<Json<Auction>, RestError> {
    let auction = store
        .auction_service
        .update_timer(UpdateTimerInput {
            auction_id,
            seconds: timer_update.seconds,
        })
        .await?;
    Ok(Json(auction.into()))
}

pub async fn process_bid(
    store: Arc<StoreNew>,
    auction_id: AuctionId,
    bid_create: BidCreate,
) -> Result<Json<BidResult>, RestError> {
    let bid = store
        .auction_service
        .place_bid(PlaceBidInput {
            bid_create: entities::BidCreate {
                auction_id,
                team_id: bid_create.team_id,
                user_id: bid_create.user_id,
                amount: bid_create.amount,
            },
        })
        .await?;
    Ok(Json(BidResult {
        status: "OK".to_string(),
        id:     bid.id,
    }))
}

/// Bid on a live auction.
#[utoipa::path(post, path = "/v1/auctions/{auction_id}/bids",
    params(("auction_id" = String, description = "Auction id to bid on")),
    request_body = BidCreate, responses(
    (status = 200, description = "Bid was placed successfully", body = BidResult),
    (status = 400, response = ErrorBodyResponse),
    (status = 404, description = "Auction or team was not found", body = ErrorBodyResponse),
),)]
pub async fn post_bid(
    State(store): State<Arc<StoreNew>>,
    Path(auction_id): Path<AuctionId>,
    Json(bid_create): Json<BidCreate>,
) -> Result<Json<BidResult>, RestError> {
    process_bid(store, auction_id, bid_create).await
}

pub fn get_routes(store: Arc<StoreNew>) -> Router<Arc<StoreNew>> {
    WrappedRouter::new(store)
        .route(Route::PostAuction, post_auction)
        .route(Route::GetAuctions, get_auctions)
        .route(Route::GetAuction, get_auction)
        .route(Route::PostStartAuction, post_start_auction)
        .route(Route::PostPauseAuction, post_pause_auction)
        .route(Route::PostResumeAuction, post_resume_auction)
        .route(Route::PostEndAuction, post_end_auction)
        .route(Route::PostCancelAuction, post_cancel_auction)
        .route(Route::PostUpdateTimer, post_update_timer)
        .route(Route::PostBid, post_bid)
        .router
}
