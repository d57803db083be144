//! # fpbridge: Filepass revisions-complete notifications for Make.com
//!
//! When a reviewer finishes leaving revisions on Filepass, they are sent to a
//! "revisions complete" page with the session details in the query string:
//!
//! ```text
//! GET /pages/7?email=artist@example.com&song=Track%20One.wav&project=Debut%20EP&filepass=abc123
//! Referer: https://app.filepass.com/review/abc123
//! ```
//!
//! `fpbridge` serves that page and forwards the details to a Make.com webhook
//! as JSON, so an automation can take over (notify the engineer, update a
//! tracker, email the artist).
//!
//! ## Trigger paths
//!
//! There are two independent ways a notification goes out, both implemented in
//! [`revisions`]:
//!
//! - **Page load.** Every page view passes through the [`revisions::TriggerGate`].
//!   When a webhook URL and revisions page are configured, the view is of that
//!   page, the referrer mentions Filepass, and all four parameters are present,
//!   the sanitised fields are posted to the configured webhook. Transport errors
//!   are logged and the page renders regardless.
//! - **Directive.** Page content may embed
//!   `[FILEPASS_REVISIONS make_url="..."]content[/FILEPASS_REVISIONS]`. Rendering
//!   it validates the fields, posts a derived payload to `make_url`, and
//!   replaces the directive with the content (or a message explaining what was
//!   missing, or the transport error).
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use fpbridge::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = fpbridge::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     fpbridge::telemetry::init_telemetry(config.log_format)?;
//!
//!     Application::new(config)?
//!         .serve(async {
//!             tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!         })
//!         .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
mod openapi;
pub mod pages;
pub mod revisions;
pub mod sanitize;
pub mod settings;
pub mod shortcode;
pub mod telemetry;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::sync::Arc;

use axum::{
    Json, Router,
    routing::get,
};
use bon::Builder;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info, warn};
use utoipa::OpenApi;

pub use config::Config;

use crate::{
    openapi::ApiDoc,
    pages::PageRegistry,
    revisions::{Forwarder, HttpForwarder, Notifier, TriggerGate},
    settings::{InMemorySettingsStore, SettingsStore},
};

/// Shown at startup while no webhook URL is configured.
pub const MISSING_WEBHOOK_NOTICE: &str = "Please add your webhook URL in the settings";

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .settings(settings)
///     .notifier(notifier)
///     .gate(gate)
///     .pages(pages)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub settings: Arc<dyn SettingsStore>,
    pub notifier: Notifier,
    #[builder(default)]
    pub gate: TriggerGate,
    pub pages: Arc<PageRegistry>,
}

/// Build the application router.
///
/// The admin routes are only mounted when an admin token is configured.
pub fn build_router(state: &AppState) -> Router {
    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/pages/{page_id}", get(api::handlers::pages::get_page))
        .route("/assets/css/style.css", get(api::handlers::static_assets::stylesheet))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }));

    if state.config.admin.api_token.is_some() {
        let admin_routes = Router::new().route(
            "/settings",
            get(api::handlers::settings::get_settings).put(api::handlers::settings::update_settings),
        );
        router = router.nest("/admin/api/v1", admin_routes);
    } else {
        info!("No admin token configured; admin API disabled");
    }

    router.with_state(state.clone()).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// Main application.
///
/// 1. **Create**: [`Application::new`] sanitises the seed settings and builds the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests until shutdown
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application that posts notifications over HTTP
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let forwarder = HttpForwarder::new()?;
        Self::with_forwarder(config, Arc::new(forwarder))
    }

    /// Create a new application with a caller-supplied forwarder
    pub fn with_forwarder(config: Config, forwarder: Arc<dyn Forwarder>) -> anyhow::Result<Self> {
        debug!("Starting bridge with configuration: {:#?}", config);

        let initial_settings = config.initial_settings()?;
        if initial_settings.webhook_url.is_none() {
            warn!("{MISSING_WEBHOOK_NOTICE}");
        }

        let gate = TriggerGate::new(config.trigger.gate_mode());
        info!(mode = ?gate.mode(), "Page-load trigger configured");

        let state = AppState::builder()
            .settings(Arc::new(InMemorySettingsStore::new(initial_settings)))
            .notifier(Notifier::new(forwarder))
            .gate(gate)
            .pages(Arc::new(PageRegistry::new(config.pages.iter().cloned())))
            .config(config.clone())
            .build();

        let router = build_router(&state);

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(any(test, feature = "test-utils"))]
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
        info!(
            "Bridge listening on http://{}, serving {} page(s)",
            bind_addr,
            self.config.pages.len()
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Bridge stopped");
        Ok(())
    }
}
