use crate::cli::ServeArgs;
use crate::infra::{demo_org, seed_demo_data, AppState};
use crate::routes::with_tracker_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use project_tracker::config::AppConfig;
use project_tracker::error::AppError;
use project_tracker::telemetry;
use project_tracker::tracker::{MemoryTrackerStore, TrackerService};
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(MemoryTrackerStore::default());
    let service = Arc::new(TrackerService::new(store));

    if config.seed_demo || args.seed {
        let org = demo_org();
        seed_demo_data(&service, &org)?;
        info!(organization = %org.0, "seeded demo organization");
    }

    let app = with_tracker_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "completion tracker ready");

    axum::serve(listener, app).await?;
    Ok(())
}
