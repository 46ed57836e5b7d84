use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tracing::info;

use dealdesk::config::AppConfig;
use dealdesk::error::AppError;
use dealdesk::telemetry;
use dealdesk::underwriting::{OfferPolicy, ScoringConfig, UnderwritingService};

use crate::cli::ServeArgs;
use crate::infra::{sample_bundle, AppState, InMemoryDealRepository, InMemoryNotificationPublisher};
use crate::routes::with_underwriting_routes;

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

    let repository = Arc::new(InMemoryDealRepository::default());
    // Deal intake lives outside this service; seed two representative
    // deals so the engine endpoints are exercisable immediately.
    repository.seed(sample_bundle("deal-1001", false));
    repository.seed(sample_bundle("deal-1002", true));

    let notifications = Arc::new(InMemoryNotificationPublisher::default());
    let underwriting_service = Arc::new(UnderwritingService::new(
        repository,
        notifications,
        ScoringConfig::default(),
        OfferPolicy::standard(),
    ));

    let app = with_underwriting_routes(underwriting_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "deal desk underwriting service ready (seeded deal-1001, deal-1002)");

    axum::serve(listener, app).await?;
    Ok(())
}
