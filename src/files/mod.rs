//! Static file serving subsystem.
//!
//! # Data Flow
//! ```text
//! greedy route variable (relative path)
//!     → resolver.rs (walk candidate directories in registration order)
//!     → stat; directory retargets to index.html; not-found advances
//!     → classify by extension
//!     → injectable + live reload: buffered read, inject.rs splices the
//!       client script before </body>, single buffered response
//!     → everything else: streamed via the tower-http file service
//!       (conditional GET and range requests come with it)
//! ```
//!
//! # Design Decisions
//! - Only a true not-found advances the fallback chain; any other stat
//!   error aborts resolution and is an internal error
//! - Non-200 bodies (status-default assets) are always buffered, because
//!   partial-content negotiation does not apply to error bodies
//! - Injection is a byte splice, no HTML parsing

pub mod inject;
pub mod resolver;

pub use resolver::{resolve, serve_single, Outcome, ResolveContext, ServeMode};
