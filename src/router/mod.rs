//! Route registrar: path → script handler, and the axum side of dispatch.
//!
//! Requests are matched on the exact URI path, any method. A matched request
//! evaluates the handler body in a fresh environment and discards the
//! result: the response is always an empty `200 OK`. Request data is not
//! forwarded into the script.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::object::{Environment, Evaluator, Function, Object};

pub const NOT_FOUND_BODY: &str = "404 page not found";

/// Per-request context. Lives until the handler body has been evaluated.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
}

impl RequestContext {
    pub fn new(method: Method, uri: &Uri) -> Self {
        Self {
            method,
            path: uri.path().to_string(),
        }
    }
}

/// 라우트 테이블. 요청 처리(읽기)와 `handle` 호출(쓰기)이 동시에 일어날 수 있음
pub struct RouteRegistrar {
    routes: RwLock<HashMap<String, Function>>,
    evaluator: Arc<dyn Evaluator>,
}

impl RouteRegistrar {
    pub fn new(evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
            evaluator,
        }
    }

    /// Registers `handler` for `path`. A second registration of the same
    /// path replaces the first (last write wins).
    ///
    /// Returns `true` when an earlier handler was replaced.
    pub fn register(&self, path: &str, handler: Function) -> bool {
        let mut routes = self.routes.write().unwrap_or_else(|e| e.into_inner());
        let replaced = routes.insert(path.to_string(), handler).is_some();
        if replaced {
            tracing::info!("Route '{}' re-registered, previous handler replaced", path);
        } else {
            tracing::info!("Route '{}' registered", path);
        }
        replaced
    }

    pub fn lookup(&self, path: &str) -> Option<Function> {
        let routes = self.routes.read().unwrap_or_else(|e| e.into_inner());
        routes.get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.routes.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluates the handler registered for `ctx.path`, if any.
    ///
    /// Returns `None` when no route matches. The evaluation result is
    /// returned for logging only; it never reaches the HTTP response.
    pub async fn dispatch(&self, ctx: RequestContext) -> Option<Object> {
        // 읽기 잠금은 핸들러 복제 후 바로 해제
        let handler = self.lookup(&ctx.path)?;
        let evaluator = self.evaluator.clone();

        tracing::debug!("Dispatching {} {} to script handler", ctx.method, ctx.path);
        let result = tokio::task::spawn_blocking(move || {
            let mut env = Environment::new();
            evaluator.eval(&handler.body, &mut env)
        })
        .await;

        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Handler for {} panicked or was cancelled: {}", ctx.path, e);
                Some(Object::Error(format!("handler for {} did not complete", ctx.path)))
            }
        }
    }

    /// axum router with every path routed through this registrar.
    pub fn into_router(self: Arc<Self>) -> Router {
        Router::new()
            .fallback(dispatch_request)
            .with_state(self)
            .layer(TraceLayer::new_for_http())
    }
}

async fn dispatch_request(
    State(registrar): State<Arc<RouteRegistrar>>,
    method: Method,
    uri: Uri,
) -> impl IntoResponse {
    let ctx = RequestContext::new(method, &uri);
    let path = ctx.path.clone();

    match registrar.dispatch(ctx).await {
        Some(Object::Error(message)) => {
            tracing::warn!("Handler for {} returned an error: {}", path, message);
            StatusCode::OK.into_response()
        }
        Some(_) => StatusCode::OK.into_response(),
        None => (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response(),
    }
}
