//! Status-bound response senders and per-status defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::NoDefaultConfigured;
use crate::files::{self, Outcome, ResolveContext, ServeMode};

/// What `do_default()` serves for a status.
#[derive(Debug, Clone)]
pub enum DefaultBody {
    Text {
        body: &'static str,
        mime: &'static str,
    },
    File(PathBuf),
}

/// Default bodies keyed by status code.
#[derive(Debug, Default)]
pub struct StatusDefaults {
    map: HashMap<u16, DefaultBody>,
}

impl StatusDefaults {
    /// The fixed plain-text bodies the server carries out of the box.
    pub fn builtin() -> Self {
        let mut defaults = Self::default();
        defaults.set(400, DefaultBody::Text { body: "Bad request.", mime: "text/plain" });
        defaults.set(404, DefaultBody::Text { body: "Not found.", mime: "text/plain" });
        defaults.set(500, DefaultBody::Text { body: "Internal server error.", mime: "text/plain" });
        defaults
    }

    pub fn set(&mut self, status: u16, body: DefaultBody) {
        self.map.insert(status, body);
    }

    pub fn get(&self, status: u16) -> Option<&DefaultBody> {
        self.map.get(&status)
    }
}

/// Factory for status-bound senders, built once per server and handed to
/// every handler invocation.
#[derive(Clone)]
pub struct Responder {
    defaults: Arc<StatusDefaults>,
    inject: bool,
}

impl Responder {
    pub(crate) fn new(defaults: Arc<StatusDefaults>, inject: bool) -> Self {
        Self { defaults, inject }
    }

    pub fn ok(&self) -> ResponseSender {
        self.from_status(StatusCode::OK)
    }

    pub fn not_found(&self) -> ResponseSender {
        self.from_status(StatusCode::NOT_FOUND)
    }

    pub fn bad_request(&self) -> ResponseSender {
        self.from_status(StatusCode::BAD_REQUEST)
    }

    pub fn internal_server_error(&self) -> ResponseSender {
        self.from_status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn from_status(&self, status: StatusCode) -> ResponseSender {
        ResponseSender {
            status,
            defaults: self.defaults.clone(),
            inject: self.inject,
        }
    }

    /// A 301 with a `Location` header.
    pub fn redirect(&self, url: &str) -> Response {
        match header::HeaderValue::from_str(url) {
            Ok(location) => {
                let mut response = StatusCode::MOVED_PERMANENTLY.into_response();
                response.headers_mut().insert(header::LOCATION, location);
                response
            }
            Err(err) => {
                tracing::error!(url, error = %err, "redirect target is not a valid header value");
                builtin_text(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

/// One outcome, bound to a status, exposing the fixed capability set.
pub struct ResponseSender {
    status: StatusCode,
    defaults: Arc<StatusDefaults>,
    inject: bool,
}

impl ResponseSender {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// A body with an explicit MIME type.
    pub fn content(&self, body: impl Into<Bytes>, mime: &str) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, mime.to_string())],
            body.into(),
        )
            .into_response()
    }

    /// A value serialized as JSON with `application/json`.
    pub fn data<T: Serialize>(&self, value: &T) -> Response {
        match serde_json::to_vec(value) {
            Ok(body) => self.content(body, "application/json"),
            Err(err) => {
                tracing::error!(error = %err, "response value failed to serialize");
                builtin_text(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// A file body with single-candidate fallback-resolver semantics
    /// (directory → `index.html`, injection when live reload is on). The
    /// body is always buffered so the bound status applies cleanly even for
    /// non-200 outcomes. A missing file falls through to the not-found
    /// default.
    pub async fn file(&self, path: &Path) -> Response {
        match self.try_file(path).await {
            Ok(response) => response,
            Err(Outcome::Error(err)) => {
                tracing::error!(path = %path.display(), error = %err, "file response failed");
                self.sibling(StatusCode::INTERNAL_SERVER_ERROR)
                    .default_or_builtin()
                    .await
            }
            Err(_) => {
                self.sibling(StatusCode::NOT_FOUND)
                    .default_or_builtin()
                    .await
            }
        }
    }

    /// Like [`file`](Self::file), but a missing file invokes `fallback`
    /// instead of the not-found default.
    pub async fn file_or(&self, path: &Path, fallback: impl FnOnce() -> Response) -> Response {
        match self.try_file(path).await {
            Ok(response) => response,
            Err(Outcome::Error(err)) => {
                tracing::error!(path = %path.display(), error = %err, "file response failed");
                self.sibling(StatusCode::INTERNAL_SERVER_ERROR)
                    .default_or_builtin()
                    .await
            }
            Err(_) => fallback(),
        }
    }

    /// Serve the configured default for this status.
    ///
    /// Errors when nothing is configured for the status (the 400/404/500
    /// built-ins count as configured).
    pub async fn do_default(&self) -> Result<Response, NoDefaultConfigured> {
        let Some(default) = self.defaults.get(self.status.as_u16()) else {
            return Err(NoDefaultConfigured(self.status));
        };
        Ok(match default {
            DefaultBody::Text { body, mime } => self.content(*body, mime),
            DefaultBody::File(path) => {
                let path = path.clone();
                match self.try_file(&path).await {
                    Ok(response) => response,
                    Err(Outcome::Error(err)) => {
                        tracing::error!(
                            path = %path.display(),
                            error = %err,
                            "default body file failed to serve"
                        );
                        builtin_text(self.status)
                    }
                    Err(_) => {
                        // Validated at setup; went missing since.
                        tracing::warn!(path = %path.display(), "default body file disappeared");
                        builtin_text(self.status)
                    }
                }
            }
        })
    }

    /// `do_default()` with the programming-error case collapsed into a bare
    /// status response; used internally where a response must go out.
    pub(crate) async fn default_or_builtin(&self) -> Response {
        match self.do_default().await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(error = %err, "no default response available");
                self.status.into_response()
            }
        }
    }

    async fn try_file(&self, path: &Path) -> Result<Response, Outcome> {
        let ctx = ResolveContext {
            inject: self.inject,
            mode: ServeMode::Buffer,
        };
        match files::serve_single(path, ctx).await {
            Outcome::Served(mut response) => {
                *response.status_mut() = self.status;
                Ok(response)
            }
            other => Err(other),
        }
    }

    fn sibling(&self, status: StatusCode) -> ResponseSender {
        ResponseSender {
            status,
            defaults: self.defaults.clone(),
            inject: self.inject,
        }
    }
}

fn builtin_text(status: StatusCode) -> Response {
    let body = match status {
        StatusCode::BAD_REQUEST => "Bad request.",
        StatusCode::NOT_FOUND => "Not found.",
        _ => "Internal server error.",
    };
    (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
}
