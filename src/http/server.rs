//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the Axum router: static files, then the dispatcher as fallback
//! - Wire up middleware (request ID, tracing, timeout)
//! - Run until shutdown is triggered

use axum::{
    body::Body,
    extract::{FromRequest, Query, State},
    http::{Method, Request},
    response::{IntoResponse, Response},
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::{ServeDir, ServeFile},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::cookies::TICKET_PARAM;
use crate::config::BlogConfig;
use crate::http::dispatch::{Decision, Dispatched, RequestDispatcher};
use crate::http::pages::{PageRequest, Pages};
use crate::http::response::{render, Outcome};
use crate::http::routes::Page;
use crate::lifecycle::shutdown::ShutdownListener;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<RequestDispatcher<Page>>,
    pub pages: Arc<Pages>,
}

/// HTTP server for the blog.
pub struct HttpServer {
    router: Router,
    config: BlogConfig,
}

impl HttpServer {
    pub fn new(config: BlogConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &BlogConfig, state: AppState) -> Router {
        let public_dir = Path::new(&config.site.public_dir);

        Router::new()
            .nest_service("/public", ServeDir::new(public_dir))
            .route_service("/favicon.ico", ServeFile::new(public_dir.join("favicon.ico")))
            .route_service("/robots.txt", ServeFile::new(public_dir.join("robots.txt")))
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        let request_id = request
                            .headers()
                            .get("x-request-id")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("unknown");
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            path = %request.uri().path(),
                            request_id = %request_id,
                        )
                    }))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownListener,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &BlogConfig {
        &self.config
    }
}

/// Every request that is not a static file lands here.
async fn dispatch_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query = Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .map(|Query(q)| q)
        .unwrap_or_default();

    let Dispatched {
        identity,
        jar,
        decision,
    } = state
        .dispatcher
        .dispatch(&method, &path, jar, query.get(TICKET_PARAM).map(String::as_str))
        .await;

    let (jar, outcome) = match decision {
        Decision::NotFound => (jar, Outcome::NotFound),
        Decision::NotAuthorized => (jar, Outcome::NotAuthorized),
        Decision::Invoke {
            handler, params, ..
        } => {
            let page = *handler;
            let form = if method == Method::POST {
                read_form(request).await
            } else {
                HashMap::new()
            };
            let req = PageRequest {
                identity: identity.clone(),
                params,
                query,
                form,
                jar,
            };
            state.pages.handle(page, req).await
        }
    };

    metrics::record_request(method.as_str(), outcome.label(), start);
    (jar, render(outcome, &identity, &method, &path)).into_response()
}

async fn read_form(request: Request<Body>) -> HashMap<String, String> {
    match Form::<HashMap<String, String>>::from_request(request, &()).await {
        Ok(Form(form)) => form,
        Err(e) => {
            tracing::debug!(error = %e, "Unreadable form body");
            HashMap::new()
        }
    }
}
