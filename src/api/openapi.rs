use utoipa::OpenApi;

use crate::api::handlers;
use crate::api::responses::StatsResponse;
use crate::metrics::RttStats;
use crate::models::PingResponse;

/// OpenAPI specification
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Latency Monitor API",
        version = "1.0.0",
        description = "Ping endpoint and round-trip latency statistics served over REST and WebSocket"
    ),
    paths(
        handlers::ping,
        handlers::health_check,
        handlers::get_stats,
    ),
    components(
        schemas(
            PingResponse,
            StatsResponse,
            RttStats,
        )
    ),
    tags(
        (name = "Ping", description = "Probe target endpoints"),
        (name = "Health", description = "Health check endpoints"),
        (name = "Stats", description = "Prober statistics endpoints"),
    )
)]
pub struct ApiDoc;
