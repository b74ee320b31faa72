//! HTTP dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! axum catch-all route
//!     → dispatch.rs (normalize path, trie lookup, collect JSON body)
//!     → registered handler (user REST callback or generated static handler)
//!     → respond.rs (status-bound response senders, status defaults)
//!     → response
//! ```
//!
//! # Design Decisions
//! - Response capabilities are value types built by a factory keyed by
//!   status, not methods attached to the transport's response object
//! - A malformed JSON body is a recoverable 400 outcome, never a crash
//! - Every failure path ends in a response; internal errors are logged

pub mod dispatch;
pub mod respond;

pub use dispatch::{DispatchEngine, RouteHandler, RouteRequest};
pub use respond::{DefaultBody, Responder, ResponseSender, StatusDefaults};
