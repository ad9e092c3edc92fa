use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_customs_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use customs_workflow::config::AppConfig;
use customs_workflow::error::AppError;
use customs_workflow::telemetry;
use customs_workflow::workflows::ceisa::CeisaProxy;
use customs_workflow::workflows::declaration::{
    DeclarationService, InMemoryStore, NotificationFeed,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let proxy = Arc::new(CeisaProxy::from_config(&config.ceisa)?);
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        ceisa_mode: if proxy.is_mock() { "mock" } else { "upstream" },
    };

    let feed = NotificationFeed::default();
    let store = Arc::new(InMemoryStore::default());
    let service = Arc::new(DeclarationService::new(store, Arc::new(feed.clone())));

    let app = with_customs_routes(service, feed, proxy)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "customs workflow service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
