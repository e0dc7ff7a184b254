//! # pdfgate: PDF Password Service
//!
//! `pdfgate` is a small HTTP service that applies and removes PDF password
//! protection. It accepts a multipart upload (the document plus a password),
//! drives the external `qpdf` tool as a subprocess, and returns the
//! transformed document as a binary attachment. Nothing is persisted:
//! every request gets a private temporary workspace that is removed as soon
//! as the response is produced.
//!
//! ## Request Flow
//!
//! A `POST /api/protect` or `POST /api/unlock` request passes through the
//! origin-policy middleware ([`cors`]), which also answers every `OPTIONS`
//! request directly. The handler then acquires a scoped workspace
//! ([`workspace`]), streams the multipart body into it with the size ceiling
//! enforced ([`ingest`]), validates the extracted fields, invokes the tool
//! ([`qpdf`]), and buffers the produced file back to the client. Failures at
//! any stage map to an HTTP status through the crate-wide error type
//! ([`errors`]); the workspace directory is removed on every path.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use pdfgate::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Parse CLI arguments and load configuration
//!     let args = pdfgate::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     // Initialize structured logging
//!     pdfgate::telemetry::init_telemetry()?;
//!
//!     // Create and start the application
//!     let app = Application::new(config);
//!
//!     // Run with graceful shutdown on Ctrl+C
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## External Tool
//!
//! The service shells out to nothing: `qpdf` is spawned directly with
//! argument vectors, with the literal `--` separator guarding the file paths
//! from option parsing. Only the argument shapes and the exit-code contract
//! are relied upon; the binary is configurable via `tool.binary`.

pub mod api;
pub mod config;
pub mod cors;
pub mod errors;
pub mod ingest;
pub mod qpdf;
pub mod telemetry;
pub mod workspace;

#[cfg(test)]
mod test_utils;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::post,
};
use bon::Builder;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};

pub use config::Config;
use workspace::{DiskWorkspaces, WorkspaceProvider};

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub workspaces: Arc<dyn WorkspaceProvider>,
}

/// Build the application router with all endpoints and middleware.
///
/// Exactly two operations are exposed, both `POST`-only; every other
/// path/method combination falls through to a plain 404. The origin-policy
/// middleware is the outermost application layer so error responses and the
/// fallback carry the CORS bundle too.
pub fn build_router(state: AppState) -> Router {
    let upload_routes = Router::new()
        // The wrong method on a known path is answered like an unknown path
        .route("/api/protect", post(api::handlers::documents::protect).fallback(not_found))
        .route("/api/unlock", post(api::handlers::documents::unlock).fallback(not_found))
        // The ingestor owns admission control: oversized uploads are drained
        // and answered with 413, so axum's 2MB default cap must not reject
        // the body first.
        .layer(DefaultBodyLimit::disable());

    Router::new()
        .merge(upload_routes)
        .fallback(not_found)
        .with_state(state.clone())
        .layer(from_fn_with_state(state, cors::origin_policy_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Main application struct that owns the router and configuration.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] wires the workspace provider and router
/// 2. **Serve**: [`Application::serve`] binds a TCP listener and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance from configuration.
    pub fn new(config: Config) -> Self {
        debug!("Starting pdfgate with configuration: {:#?}", config);

        let workspaces: Arc<dyn WorkspaceProvider> = Arc::new(DiskWorkspaces::new(config.workspace.root.clone()));
        let state = AppState::builder().config(config.clone()).workspaces(workspaces).build();
        let router = build_router(state);

        Self { router, config }
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("pdfgate listening on http://{}, serving /api/protect and /api/unlock", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutdown complete");
        Ok(())
    }
}
