//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at configuration time):
//!     (method, "/users/:id/files/::path", handler)
//!     → normalize (strip one leading + one trailing slash)
//!     → parse segments (literal / `:name` / `::name`)
//!     → conflict checks (variable siblings, greedy position, segment chars)
//!     → insert into trie, freeze before the listener starts
//!
//! Request Matching:
//!     (method, request path)
//!     → trie walk, depth-first, literal preferred over variable
//!     → greedy tail consumes the remainder, percent-decoded per segment
//!     → Return: (handler, RouteParams) or no match
//! ```
//!
//! # Design Decisions
//! - Trie is immutable after startup (shared read-only, no locks)
//! - Explicit tagged nodes; no sentinel keys for "handler lives here"
//! - No regex; matching is purely structural and registration-order free
//! - Literal comparison happens on the raw (still-encoded) segment text;
//!   only variable bindings are percent-decoded

pub mod trie;

pub use trie::{RouteMethod, RouteParams, RouteTrie};
