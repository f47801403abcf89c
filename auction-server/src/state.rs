use {
    crate::{
        api::ws::WsState,
        auction::service::Service as AuctionService,
    },
    axum_prometheus::metrics_exporter_prometheus::PrometheusHandle,
    std::sync::Arc,
    tokio_util::task::TaskTracker,
};

pub struct Store {
    pub ws:               WsState,
    pub admin_api_key:    String,
    pub metrics_recorder: PrometheusHandle,
}

pub struct StoreNew {
    pub store:           Arc<Store>,
    pub auction_service: AuctionService,
    pub task_tracker:    TaskTracker,
}
