//! Request dispatch: trie lookup, body collection, handler invocation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use axum::response::Response;
use uuid::Uuid;

use crate::http::respond::Responder;
use crate::routing::{RouteMethod, RouteParams, RouteTrie};

/// Upper bound on a collected POST/PUT body.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Everything a handler sees about its request.
pub struct RouteRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    /// Variables bound by the matched route.
    pub params: RouteParams,
    /// Parsed JSON body for mutating methods; `None` for an empty body.
    pub body: Option<serde_json::Value>,
}

pub type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// A registered route callback: user REST handlers and the generated
/// static-serving handlers share this shape.
pub type RouteHandler = Arc<dyn Fn(RouteRequest, Responder) -> HandlerFuture + Send + Sync>;

/// Resolves requests against the frozen trie and runs the winning handler.
pub struct DispatchEngine {
    trie: RouteTrie<RouteHandler>,
    responder: Responder,
}

impl DispatchEngine {
    pub fn new(trie: RouteTrie<RouteHandler>, responder: Responder) -> Self {
        Self { trie, responder }
    }

    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        let request_id = Uuid::new_v4();
        let (parts, body) = request.into_parts();
        let path = parts.uri.path().to_string();

        tracing::debug!(
            request_id = %request_id,
            method = %parts.method,
            path = %path,
            "dispatching request"
        );

        let Some(method) = RouteMethod::from_http(&parts.method) else {
            tracing::warn!(request_id = %request_id, method = %parts.method, "unsupported method");
            return self.respond_default(StatusCode::NOT_FOUND).await;
        };

        let Some((handler, params)) = self.trie.find(method, &path).map(|(h, p)| (h.clone(), p))
        else {
            tracing::debug!(request_id = %request_id, path = %path, "no route matched");
            return self.respond_default(StatusCode::NOT_FOUND).await;
        };

        let body_value = if method.has_body() {
            match self.collect_body(body, request_id).await {
                Ok(value) => value,
                Err(outcome) => return self.respond_default(outcome).await,
            }
        } else {
            None
        };

        let route_request = RouteRequest {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            params,
            body: body_value,
        };

        handler(route_request, self.responder.clone()).await
    }

    /// Accumulate and parse a JSON body. A malformed body is a recoverable
    /// 400 outcome; a transport failure while reading is a 500.
    async fn collect_body(
        &self,
        body: Body,
        request_id: Uuid,
    ) -> Result<Option<serde_json::Value>, StatusCode> {
        let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::error!(request_id = %request_id, error = %err, "failed to read request body");
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };
        if bytes.is_empty() {
            return Ok(None);
        }
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                tracing::warn!(request_id = %request_id, error = %err, "malformed JSON body");
                Err(StatusCode::BAD_REQUEST)
            }
        }
    }

    async fn respond_default(&self, status: StatusCode) -> Response {
        self.responder
            .from_status(status)
            .default_or_builtin()
            .await
    }
}
