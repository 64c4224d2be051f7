use crate::cli::ServeArgs;
use crate::infra::{
    AppState, ConfiguredSettings, InMemoryHousekeepingRepository, InMemoryNotificationPublisher,
};
use crate::routes::with_housekeeping_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use turnover::config::AppConfig;
use turnover::error::AppError;
use turnover::telemetry;
use turnover::workflows::housekeeping::HousekeepingService;

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

    let repository = Arc::new(InMemoryHousekeepingRepository::default());
    let settings = Arc::new(ConfiguredSettings::from_config(&config.housekeeping));
    let notifications = Arc::new(InMemoryNotificationPublisher::default());
    let housekeeping_service = Arc::new(HousekeepingService::new(
        repository,
        settings,
        notifications,
    ));

    let app = with_housekeeping_routes(housekeeping_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "housekeeping turnover service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
