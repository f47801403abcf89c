use {
    crate::{
        auction::api as auction_api,
        config::RunOptions,
        server::{
            EXIT_CHECK_INTERVAL,
            SHOULD_EXIT,
        },
        state::StoreNew,
    },
    anyhow::Result,
    axum::{
        async_trait,
        extract::{
            self,
            FromRequestParts,
        },
        http::{
            request::Parts,
            Method,
            StatusCode,
        },
        middleware,
        response::{
            IntoResponse,
            Response,
        },
        routing::{
            get,
            post,
        },
        Json,
        Router,
    },
    axum_extra::{
        headers::{
            authorization::Bearer,
            Authorization,
        },
        TypedHeader,
    },
    axum_prometheus::PrometheusMetricLayerBuilder,
    clap::crate_version,
    pavilion_api_types::{
        auction::{
            Auction,
            AuctionCreate,
            AuctionStatus,
            Bid,
            BidCreate,
            BidResult,
            TimerUpdate,
        },
        ws::{
            APIResponse,
            ClientMessage,
            ClientRequest,
            ServerResultMessage,
            ServerResultResponse,
            ServerUpdateResponse,
        },
        AccessLevel,
        ErrorBodyResponse,
        Routable,
        Route,
    },
    std::sync::{
        atomic::Ordering,
        Arc,
    },
    tower_http::cors::CorsLayer,
    utoipa::OpenApi,
    utoipa_redoc::{
        Redoc,
        Servable,
    },
};

pub mod ws;

async fn root() -> String {
    format!("Pavilion Auction Server API {}", crate_version!())
}

pub async fn live() -> Response {
    (StatusCode::OK, "OK").into_response()
}

#[derive(Debug, Clone)]
pub enum RestError {
    /// The request contained invalid parameters.
    BadParameters(String),
    /// The operation is not allowed in the auction's current status.
    InvalidState(String),
    /// The bid amount is below the minimum acceptable bid.
    InvalidBid(String),
    /// The bid amount exceeds the team's available purse.
    InsufficientFunds,
    /// The team has already reached the league's per-team player cap.
    RosterFull,
    /// The auction was not found.
    AuctionNotFound,
    /// The team was not found.
    TeamNotFound,
    /// The league was not found.
    LeagueNotFound,
    /// The caller is not allowed to perform this operation.
    Unauthorized,
    /// The client has too many open websocket connections.
    TooManyOpenWebsocketConnections,
    /// Internal error occurred during processing the request.
    TemporarilyUnavailable,
}

impl RestError {
    pub fn to_status_and_message(&self) -> (StatusCode, String) {
        match self {
            RestError::BadParameters(msg) => {
                (StatusCode::BAD_REQUEST, format!("Bad parameters: {}", msg))
            }
            RestError::InvalidState(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            RestError::InvalidBid(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            RestError::InsufficientFunds => {
                (StatusCode::BAD_REQUEST, "Insufficient purse".to_string())
            }
            RestError::RosterFull => (
                StatusCode::BAD_REQUEST,
                "Maximum players reached".to_string(),
            ),
            RestError::AuctionNotFound => (
                StatusCode::NOT_FOUND,
                "Auction with the specified id was not found".to_string(),
            ),
            RestError::TeamNotFound => (
                StatusCode::NOT_FOUND,
                "Team with the specified id was not found".to_string(),
            ),
            RestError::LeagueNotFound => (
                StatusCode::NOT_FOUND,
                "League with the specified id was not found".to_string(),
            ),
            RestError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Invalid or missing admin token".to_string(),
            ),
            RestError::TooManyOpenWebsocketConnections => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many open websocket connections".to_string(),
            ),
            RestError::TemporarilyUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "This service is temporarily unavailable".to_string(),
            ),
        }
    }
}

impl std::fmt::Display for RestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_status_and_message().1)
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let (status, msg) = self.to_status_and_message();
        (status, Json(ErrorBodyResponse { error: msg })).into_response()
    }
}

#[derive(Clone, Debug)]
pub enum Auth {
    Admin,
    Unauthorized,
}

#[async_trait]
impl FromRequestParts<Arc<StoreNew>> for Auth {
    type Rejection = RestError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<StoreNew>,
    ) -> Result<Self, Self::Rejection> {
        match TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await {
            Ok(token) if token.token() == state.store.admin_api_key => Ok(Auth::Admin),
            _ => Ok(Auth::Unauthorized),
        }
    }
}

async fn require_admin(auth: Auth, req: extract::Request, next: middleware::Next) -> Response {
    match auth {
        Auth::Admin => next.run(req).await,
        Auth::Unauthorized => RestError::Unauthorized.into_response(),
    }
}

pub struct WrappedRouter {
    pub router: Router<Arc<StoreNew>>,
    store:      Arc<StoreNew>,
}

impl WrappedRouter {
    pub fn new(store: Arc<StoreNew>) -> Self {
        Self {
            router: Router::new(),
            store,
        }
    }

    pub fn route<H, T>(self, route: impl Routable, handler: H) -> Self
    where
        H: axum::handler::Handler<T, Arc<StoreNew>>,
        T: 'static,
    {
        let properties = route.properties();
        let method_router = if properties.method == Method::GET {
            get(handler)
        } else if properties.method == Method::POST {
            post(handler)
        } else {
            // The route tables only declare GET and POST.
            panic!("Unsupported method: {}", properties.method)
        };
        let method_router = if properties.access_level == AccessLevel::Admin {
            method_router.layer(middleware::from_fn_with_state(
                self.store.clone(),
                require_admin,
            ))
        } else {
            method_router
        };
        Self {
            router: self.router.route(&properties.full_path, method_router),
            store:  self.store,
        }
    }
}

pub async fn start_api(run_options: RunOptions, store: Arc<StoreNew>) -> Result<()> {
    // Make sure functions included in the paths section have distinct names, otherwise some api generators will fail
    #[derive(OpenApi)]
    #[openapi(
    paths(
    auction_api::post_auction,
    auction_api::get_auctions,
    auction_api::get_auction,
    auction_api::post_start_auction,
    auction_api::post_pause_auction,
    auction_api::post_resume_auction,
    auction_api::post_end_auction,
    auction_api::post_cancel_auction,
    auction_api::post_update_timer,
    auction_api::post_bid,
    ),
    components(
    schemas(
    Auction,
    AuctionStatus,
    AuctionCreate,
    Bid,
    BidCreate,
    BidResult,
    TimerUpdate,
    ErrorBodyResponse,
    ClientMessage,
    ClientRequest,
    APIResponse,
    ServerResultMessage,
    ServerResultResponse,
    ServerUpdateResponse,
    ),
    responses(
    ErrorBodyResponse,
    Auction,
    BidResult,
    ),
    ),
    tags(
    (name = "Pavilion Auction Server", description = "Pavilion runs live cricket-player auctions. \
    It validates and serializes the bids of competing teams and pushes every accepted state change \
    to all subscribed clients.")
    )
    )]
    struct ApiDoc;

    let (prometheus_layer, _) = PrometheusMetricLayerBuilder::new()
        .with_metrics_from_fn({
            let store = store.clone();
            move || store.store.metrics_recorder.clone()
        })
        .build_pair();

    let v1_routes = auction_api::get_routes(store.clone()).merge(ws::get_routes(store.clone()));

    let app: Router<()> = Router::new()
        .merge(Redoc::with_url(
            Route::Docs.as_ref().to_string(),
            ApiDoc::openapi(),
        ))
        .merge(v1_routes)
        .route(Route::Root.as_ref(), get(root))
        .route(Route::Liveness.as_ref(), get(live))
        .layer(CorsLayer::permissive())
        .layer(prometheus_layer)
        .with_state(store);

    let listener = tokio::net::TcpListener::bind(&run_options.server.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            while !SHOULD_EXIT.load(Ordering::Acquire) {
                tokio::time::sleep(EXIT_CHECK_INTERVAL).await;
            }
            tracing::info!("Shutting down RPC server...");
        })
        .await?;
    Ok(())
}
