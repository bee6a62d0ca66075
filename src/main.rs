use latency_monitor::{
    create_router, transport_for, AppState, LatencyIndicator, LatencyMonitor, MonitorConfig,
    Prober,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "latency_monitor=debug,indicator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MonitorConfig::from_env();

    // Shared latency aggregate: the prober writes, the API and indicator read
    let monitor = Arc::new(LatencyMonitor::new());

    // Create the router
    let app = create_router(AppState::new(monitor.clone()));

    // Bind before the prober starts so a self-probe finds the server up
    let addr = config.bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    // Spawn the prober against the configured endpoint
    let transport = match transport_for(&config.probe.endpoint) {
        Ok(transport) => transport,
        Err(e) => {
            tracing::error!("❌ Invalid probe endpoint: {}", e);
            std::process::exit(1);
        }
    };
    let prober = Prober::new(transport, monitor.clone(), config.probe.clone());
    tokio::spawn(prober.run());

    // Spawn the latency indicator
    let indicator = LatencyIndicator::new(monitor, config.probe.probe_interval());
    tokio::spawn(indicator.run());

    tracing::info!("🚀 Latency monitor running on http://{}", addr);
    tracing::info!("📡 Ping endpoint: http://{}/api/ping", addr);
    tracing::info!("📊 Stats: http://{}/api/v1/stats", addr);
    tracing::info!("📚 Swagger UI: http://{}/swagger-ui", addr);
    tracing::info!("🔌 WebSocket: ws://{}/ws", addr);
    tracing::info!("🛰️  Probing: {}", config.probe.endpoint);

    // Start the server
    axum::serve(listener, app).await.unwrap();
}
