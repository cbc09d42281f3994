//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with fixed endpoints and the dispatch fallback
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Classify each request: proxy rule → gateway, otherwise → static responder
//! - Bind server to listener and shut down gracefully

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::assets::runtime_config::config_script;
use crate::assets::{ConfigScript, StaticResponder};
use crate::config::env::{EnvSource, ProcessEnv};
use crate::config::schema::{FrontdoorConfig, DEFAULT_BACKEND_URL};
use crate::gateway::Gateway;
use crate::health::{liveness, readiness};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, X_REQUEST_ID};
use crate::http::response::found;
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::routing::{Route, RouteError, Router as ProxyRouter};

/// Error building the server from config.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProxyRouter>,
    pub gateway: Gateway,
    pub assets: Arc<StaticResponder>,
    pub config_script: Arc<ConfigScript>,
}

impl AppState {
    pub fn new(config: &FrontdoorConfig, env: Arc<dyn EnvSource>) -> Result<Self, ServerError> {
        let router = ProxyRouter::from_config(&config.proxy)?;
        let gateway = Gateway::from_config(&config.proxy.timeouts)?;
        let assets = StaticResponder::new(&config.static_files);

        let backend_url = config
            .proxy
            .backend_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let config_script = ConfigScript::new(&config.runtime_config, backend_url, env);

        Ok(Self {
            router: Arc::new(router),
            gateway,
            assets: Arc::new(assets),
            config_script: Arc::new(config_script),
        })
    }
}

/// HTTP server for the frontdoor.
pub struct HttpServer {
    router: Router,
    config: FrontdoorConfig,
}

impl HttpServer {
    /// Create a server reading the process environment.
    pub fn new(config: FrontdoorConfig) -> Result<Self, ServerError> {
        Self::with_env(config, Arc::new(ProcessEnv))
    }

    /// Create a server with an explicit environment source.
    pub fn with_env(config: FrontdoorConfig, env: Arc<dyn EnvSource>) -> Result<Self, ServerError> {
        if config.proxy.backend_url.is_none() {
            tracing::warn!(default = DEFAULT_BACKEND_URL, "No backend URL configured, using default");
        }

        let state = AppState::new(&config, env)?;
        for rule in state.router.rules() {
            tracing::info!(
                rule = %rule.name,
                prefix = %rule.prefix,
                target = %rule.target,
                strip_prefix = rule.strip_prefix,
                "Proxy rule loaded"
            );
        }

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &FrontdoorConfig, state: AppState) -> Router {
        let mut app = Router::new()
            .route(&config.endpoints.health_path, get(liveness))
            .route(&config.endpoints.ready_path, get(readiness));

        if config.runtime_config.enabled {
            app = app.route(&config.runtime_config.path, get(config_script));
        }

        if let Some(target) = &config.endpoints.root_redirect {
            let target: Arc<str> = Arc::from(target.as_str());
            app = app.route(
                "/",
                get(move || {
                    let target = Arc::clone(&target);
                    async move { found(&target) }
                }),
            );
        }

        app.fallback(dispatch).with_state(state).layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                    let request_id = req
                        .headers()
                        .get(X_REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "request",
                        method = %req.method(),
                        uri = %req.uri(),
                        request_id = %request_id,
                    )
                }))
                .layer(propagate_request_id_layer())
                .layer(RequestBodyLimitLayer::new(config.security.max_body_bytes))
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
    }

    /// A clone of the fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &FrontdoorConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Everything not claimed by a fixed endpoint: proxy or static.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    let route = state.router.route(&request);
    let (response, kind) = match route {
        Route::Proxy(rule) => (
            state.gateway.forward(rule, request).await,
            metrics::ROUTE_PROXY,
        ),
        Route::Static => (state.assets.respond(request).await, metrics::ROUTE_STATIC),
    };

    metrics::record_request(&method, response.status().as_u16(), kind, start);
    response
}
