//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all routing handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Route every request through the TenantRouter
//! - Execute the decision: reject, redirect, or forward upstream
//! - Swap routing state when a new configuration arrives

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::validation::validate_config;
use crate::config::{ConfigError, RouterConfig, ValidationError};
use crate::http::request::{self, SessionDetector};
use crate::http::response;
use crate::http::upstream::{ForwardError, Upstream};
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::routing::{RoutingDecision, TenantRouter};

/// Hot-swappable part of the server: everything a decision depends on.
#[derive(Debug)]
pub struct RoutingState {
    pub router: TenantRouter,
    pub session: SessionDetector,
}

impl RoutingState {
    pub fn from_config(config: &RouterConfig) -> Self {
        Self {
            router: TenantRouter::from_config(&config.routing),
            session: SessionDetector::from_config(&config.session),
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routing: Arc<ArcSwap<RoutingState>>,
    pub upstream: Upstream,
}

/// Owns the live routing state together with the config it was built from.
#[derive(Clone)]
struct Reloader {
    routing: Arc<ArcSwap<RoutingState>>,
    active: Arc<ArcSwap<RouterConfig>>,
}

impl Reloader {
    fn new(config: RouterConfig) -> Self {
        Self {
            routing: Arc::new(ArcSwap::from_pointee(RoutingState::from_config(&config))),
            active: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    /// Validate and swap in `new_config`. On error the current state is kept.
    fn apply(&self, new_config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
        if let Err(errors) = validate_config(new_config) {
            metrics::record_config_reload(false);
            for error in &errors {
                tracing::error!(error = %error, "Invalid configuration update");
            }
            tracing::error!("Rejected configuration update, keeping current configuration");
            return Err(errors);
        }

        let active = self.active.load();
        if new_config.listener != active.listener
            || new_config.upstream != active.upstream
            || new_config.timeouts != active.timeouts
        {
            tracing::warn!("Listener, upstream and timeout changes take effect after restart");
        }

        self.routing
            .store(Arc::new(RoutingState::from_config(new_config)));
        self.active.store(Arc::new(new_config.clone()));
        metrics::record_config_reload(true);
        tracing::info!(
            root_domain = %new_config.routing.root_domain,
            demo_hosts = new_config.routing.demo_hosts.len(),
            "Routing configuration reloaded"
        );
        Ok(())
    }
}

/// HTTP server fronting the rendering upstream.
pub struct HttpServer {
    router: Router,
    reloader: Reloader,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RouterConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let upstream = Upstream::new(&config.upstream, &config.timeouts).map_err(|_| {
            ConfigError::Validation(vec![ValidationError::InvalidUpstream(
                config.upstream.address.clone(),
            )])
        })?;
        let router_timeout = config.timeouts.request_secs;
        let reloader = Reloader::new(config);

        let state = AppState {
            routing: reloader.routing.clone(),
            upstream,
        };

        let router = Self::build_router(router_timeout, state);
        Ok(Self { router, reloader })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(request_secs: u64, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(route_handler))
            .route("/", any(route_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(request_secs))),
            )
    }

    /// The fully layered router, for driving requests without a listener.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// The last successfully applied configuration.
    pub fn config(&self) -> Arc<RouterConfig> {
        self.reloader.active.load_full()
    }

    /// Apply a new configuration to subsequent requests.
    ///
    /// Invalid configurations are refused and the running one stays in place.
    pub fn reload(&self, new_config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
        self.reloader.apply(new_config)
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configs received on `config_updates` replace the routing state;
    /// the server stops gracefully once `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<RouterConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        {
            let config = self.reloader.active.load();
            tracing::info!(
                address = %addr,
                root_domain = %config.routing.root_domain,
                upstream = %config.upstream.address,
                "HTTP server starting"
            );
        }

        let reloader = self.reloader.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                let _ = reloader.apply(&new_config);
            }
        });

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Routes a request and executes the decision.
async fn route_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request::request_id(request.headers()).to_string();

    let (decision, host) = {
        let routing = state.routing.load();
        let ctx = request::request_context(&request, &routing.session);
        (routing.router.route(&ctx), ctx.host().map(str::to_owned))
    };
    let kind = decision.kind();

    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        host = ?host,
        path = %request.uri().path(),
        decision = kind,
        "Routed request"
    );

    let response = match decision {
        RoutingDecision::Reject { status, reason } => {
            tracing::debug!(request_id = %request_id, status = %status, reason, "Rejecting request");
            response::reject(status)
        }
        RoutingDecision::RedirectExternal { url } => response::redirect(&url),
        RoutingDecision::RedirectInternal { path } => {
            redirect_internal(&request, host.as_deref(), &path, &request_id)
        }
        RoutingDecision::RewritePath { path } => {
            forward(&state.upstream, request, Some(&path), &request_id).await
        }
        RoutingDecision::PassThrough => forward(&state.upstream, request, None, &request_id).await,
    };

    metrics::record_request(kind, response.status().as_u16(), start_time);
    response
}

fn redirect_internal(
    request: &Request<Body>,
    host: Option<&str>,
    path: &str,
    request_id: &str,
) -> Response {
    let Some(host) = host else {
        return response::reject(StatusCode::BAD_REQUEST);
    };

    match response::internal_redirect_location(request.headers(), request.uri(), host, path) {
        Ok(location) => response::redirect(&location),
        Err(e) => {
            tracing::warn!(request_id = %request_id, host = %host, error = %e, "Cannot build redirect location");
            response::reject(StatusCode::BAD_REQUEST)
        }
    }
}

async fn forward(
    upstream: &Upstream,
    request: Request<Body>,
    rewrite: Option<&str>,
    request_id: &str,
) -> Response {
    match upstream.forward(request, rewrite).await {
        Ok(response) => response,
        Err(ForwardError::InvalidTarget(e)) => {
            tracing::warn!(request_id = %request_id, error = %e, "Invalid rewrite target");
            response::reject(StatusCode::BAD_REQUEST)
        }
        Err(e @ ForwardError::Upstream(_)) => {
            tracing::error!(
                request_id = %request_id,
                upstream = %upstream.authority(),
                error = %e,
                "Upstream error"
            );
            metrics::record_upstream_error();
            response::reject(StatusCode::BAD_GATEWAY)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use tower::ServiceExt;

    fn config() -> RouterConfig {
        let mut config = RouterConfig::default();
        config.routing.root_domain = "example.com".into();
        config
    }

    async fn send(app: Router, request: Request<Body>) -> Response {
        app.oneshot(request).await.unwrap()
    }

    fn get(host: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::HOST, host)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_host_is_bad_request() {
        let server = HttpServer::new(config()).unwrap();
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = send(server.app(), request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_demo_host_redirects() {
        let server = HttpServer::new(config()).unwrap();

        let response = send(server.app(), get("vercel.pub", "/x")).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "https://demo.vercel.pub");
    }

    #[tokio::test]
    async fn test_hidden_namespace_is_not_found() {
        let server = HttpServer::new(config()).unwrap();

        let response = send(server.app(), get("example.com", "/_sites/foo")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_authenticated_login_redirects_home() {
        let server = HttpServer::new(config()).unwrap();
        let request = Request::builder()
            .uri("/login?from=nav")
            .header(header::HOST, "app.example.com")
            .header(header::COOKIE, "next-auth.session-token=abc")
            .body(Body::empty())
            .unwrap();

        let response = send(server.app(), request).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers()[header::LOCATION],
            "http://app.example.com/?from=nav"
        );
    }

    #[tokio::test]
    async fn test_request_id_is_assigned_and_echoed() {
        let server = HttpServer::new(config()).unwrap();

        let response = send(server.app(), get("vercel.pub", "/")).await;
        assert!(response.headers().contains_key(request::X_REQUEST_ID));

        let request = Request::builder()
            .uri("/")
            .header(header::HOST, "vercel.pub")
            .header(request::X_REQUEST_ID, "req-42")
            .body(Body::empty())
            .unwrap();
        let response = send(server.app(), request).await;
        assert_eq!(response.headers()[request::X_REQUEST_ID], "req-42");
    }

    #[tokio::test]
    async fn test_reload_changes_decisions() {
        let server = HttpServer::new(config()).unwrap();

        let mut updated = config();
        updated.routing.demo_hosts = vec!["legacy.example.net".into()];
        updated.routing.demo_redirect_url = "https://demo.example.com".into();
        server.reload(&updated).unwrap();

        let response = send(server.app(), get("legacy.example.net", "/")).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "https://demo.example.com");
    }

    #[test]
    fn test_config_tracks_last_applied() {
        let server = HttpServer::new(config()).unwrap();
        assert_eq!(server.config().routing.root_domain, "example.com");

        let mut first = config();
        first.routing.root_domain = "platform.dev".into();
        server.reload(&first).unwrap();
        assert_eq!(*server.config(), first);

        let mut second = first.clone();
        second.routing.root_domain = "other.dev".into();
        server.reload(&second).unwrap();
        assert_eq!(*server.config(), second);
    }

    #[tokio::test]
    async fn test_invalid_reload_keeps_current_routing() {
        let server = HttpServer::new(config()).unwrap();

        let mut bad = config();
        bad.routing.root_domain = String::new();
        let errors = server.reload(&bad).unwrap_err();
        assert_eq!(errors, vec![ValidationError::EmptyRootDomain]);
        assert_eq!(*server.config(), config());

        let response = send(server.app(), get("example.com", "/_sites/foo")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = send(server.app(), get("vercel.pub", "/")).await;
        assert_eq!(response.headers()[header::LOCATION], "https://demo.vercel.pub");
    }

    #[test]
    fn test_invalid_config_is_refused() {
        let mut bad = config();
        bad.upstream.address = "renderer".into();

        match HttpServer::new(bad) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors, vec![ValidationError::InvalidUpstream("renderer".into())]);
            }
            _ => panic!("expected validation failure"),
        }
    }
}
