//! Error taxonomy for the server core.
//!
//! # Design Decisions
//! - Setup-time failures (route conflicts, config validation) are returned
//!   synchronously from the registration/construction call.
//! - Per-request failures never surface here; they terminate in a response
//!   (404/400/500 defaults) and are logged server-side.
//! - A failed directory watch is reported but does not abort startup.

use std::path::PathBuf;

use axum::http::StatusCode;
use thiserror::Error;

/// Rejected route registration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteConflict {
    /// Two variable-kind siblings at the same trie depth with different
    /// bindings (`:a` next to `:b`, or `:a` next to `::a`).
    #[error("variable segment `{new}` conflicts with existing sibling `{existing}`")]
    VariableNameClash { existing: String, new: String },

    /// A greedy segment that is not the final segment of its route.
    #[error("greedy segment `::{name}` must be the last segment of its route")]
    GreedyNotLast { name: String },

    /// A segment containing characters not valid in a URL path segment once
    /// variable markers are stripped.
    #[error("segment `{0}` contains characters not valid in a URL path segment")]
    InvalidSegment(String),

    /// A method outside GET/POST/PUT/DELETE/PATCH.
    #[error("unsupported HTTP method `{0}`")]
    UnsupportedMethod(String),
}

/// Failure while assembling a server from configuration.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Route(#[from] RouteConflict),

    #[error("config error: {0}")]
    Config(#[from] crate::config::loader::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// `do_default()` was invoked for a status with no registered default body.
///
/// This is a programming error on the caller's side, not a request-level
/// condition, so it is a dedicated type rather than a response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("no default response configured for status {}", .0.as_u16())]
pub struct NoDefaultConfigured(pub StatusCode);

/// A filesystem watch could not be established for a directory.
///
/// The directory is still served for static content; it simply will not
/// trigger live-reload notifications.
#[derive(Debug, Error)]
#[error("cannot watch {}: {source}", .path.display())]
pub struct WatchError {
    pub path: PathBuf,
    #[source]
    pub source: notify::Error,
}
