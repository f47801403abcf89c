use {
    crate::{
        api,
        api::ws::WsState,
        auction::service::Service as AuctionService,
        config::RunOptions,
        metrics,
        state::{
            Store,
            StoreNew,
        },
        team::service::Service as TeamService,
    },
    anyhow::anyhow,
    axum_prometheus::metrics_exporter_prometheus::PrometheusBuilder,
    futures::future::join_all,
    sqlx::postgres::PgPoolOptions,
    std::sync::{
        atomic::{
            AtomicBool,
            Ordering,
        },
        Arc,
    },
    tokio_util::task::TaskTracker,
};

const NOTIFICATIONS_CHAN_LEN: usize = 1000;
const DATABASE_MAX_CONNECTIONS: u32 = 10;

pub async fn start_server(run_options: RunOptions) -> anyhow::Result<()> {
    tokio::spawn(async move {
        tracing::info!("Registered shutdown signal handler...");
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shut down signal received, waiting for tasks...");
            SHOULD_EXIT.store(true, Ordering::Release);
        }
    });

    let db = PgPoolOptions::new()
        .max_connections(DATABASE_MAX_CONNECTIONS)
        .connect(&run_options.server.database_url)
        .await
        .map_err(|err| anyhow!("Failed to connect to database: {:?}", err))?;
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .map_err(|err| anyhow!("Failed to run database migrations: {:?}", err))?;

    let metrics_recorder = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|err| anyhow!("Failed to install metrics recorder: {:?}", err))?;

    let store = Arc::new(Store {
        ws: WsState::new(
            run_options.server.requester_ip_header_name.clone(),
            NOTIFICATIONS_CHAN_LEN,
        ),
        admin_api_key: run_options.admin_api_key.clone(),
        metrics_recorder,
    });

    let task_tracker = TaskTracker::new();
    let team_service = Arc::new(TeamService::new(db.clone()));
    let auction_service =
        AuctionService::new(db, team_service, store.ws.broadcast_sender.clone());
    let store_new = Arc::new(StoreNew {
        store: store.clone(),
        auction_service,
        task_tracker,
    });

    let server_loop = tokio::spawn(api::start_api(run_options.clone(), store_new));
    let metrics_loop = tokio::spawn(metrics::start_metrics(run_options, store));
    join_all(vec![server_loop, metrics_loop]).await;
    Ok(())
}

// A static exit flag to indicate to running threads that we're shutting down. This is used to
// gracefully shutdown the application.
//
// NOTE: A more idiomatic approach would be to use a tokio::sync::broadcast channel, and to send a
// shutdown signal to all running tasks. However, this is a bit more complicated to implement and
// we don't rely on global state for anything else.
pub(crate) static SHOULD_EXIT: AtomicBool = AtomicBool::new(false);
pub const EXIT_CHECK_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);
