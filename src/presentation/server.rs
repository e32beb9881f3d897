use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::{
    CompressionLevel,
    compression::CompressionLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Config;

/// Mount the identity routes and wrap everything in the shared middleware
/// stack: request id, request logging, gzip, CORS and a body size limit.
pub fn build_app(identity_router: Router, config: &Config) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/identity", identity_router)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|request: &Request<Body>| {
                            let request_id = request
                                .headers()
                                .get("x-request-id")
                                .and_then(|value| value.to_str().ok())
                                .unwrap_or("-");
                            tracing::info_span!(
                                "request",
                                method = %request.method(),
                                uri = %request.uri(),
                                request_id = %request_id
                            )
                        })
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(
                    CompressionLayer::new()
                        .quality(CompressionLevel::Precise(config.compression_level)),
                )
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(config.max_body_size)),
        )
}

async fn health() -> &'static str {
    "ok"
}
