// # HTTP Transport
//
// This crate exposes the signage DistributionGateway over HTTP.
//
// ## Routes
//
// | method | path                          | operation                  |
// |--------|-------------------------------|----------------------------|
// | GET    | `/signage/configs`            | list every device          |
// | GET    | `/signage/config/{deviceId}`  | fetch one device           |
// | PUT    | `/signage/config`             | upsert                     |
// | PUT    | `/signage/configs`            | upsert (same operation)    |
// | GET    | `/healthz`                    | liveness, not gated        |
//
// Every `/signage` route sits behind the access gate, which answers 401/403
// itself so that rejected requests never reach the gateway.
//
// ## Architecture
//
// Thin translation only: the gateway owns validation and storage, this crate
// owns status codes, the error body shape and credentials.

pub mod access_gate;
pub mod handlers;
pub mod response;

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use signage_core::{DistributionGateway, SignageConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub use access_gate::{AccessGate, GateDecision};
pub use handlers::AppState;
pub use response::ApiError;

/// Build the router with all middleware layers
#[allow(deprecated)]
pub fn router(gateway: DistributionGateway, gate: AccessGate, request_timeout: Duration) -> Router {
    let gated = Router::new()
        .route(
            "/signage/configs",
            get(handlers::list_configs).put(handlers::upsert_config),
        )
        .route("/signage/config", put(handlers::upsert_config))
        .route("/signage/config/{device_id}", get(handlers::fetch_config))
        .route_layer(middleware::from_fn_with_state(
            Arc::new(gate),
            access_gate::access_gate_middleware,
        ))
        .with_state(AppState { gateway });

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .merge(gated)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::map_response(timeout_body))
        .layer(TraceLayer::new_for_http())
}

// TimeoutLayer answers with an empty 408; give it the usual error body.
async fn timeout_body(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        tracing::warn!("Request timed out");
        return ApiError::Timeout.into_response();
    }
    response
}

/// HTTP server for the signage service
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server for `gateway` using the server and access settings in `config`
    pub fn new(gateway: DistributionGateway, config: &SignageConfig) -> Self {
        let router = router(
            gateway,
            AccessGate::new(&config.access),
            Duration::from_secs(config.server.request_timeout_secs),
        );
        Self { router }
    }

    /// The router, for serving or driving directly in tests
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` completes
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
