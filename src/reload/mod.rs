//! Change notification subsystem.
//!
//! # Data Flow
//! ```text
//! notify (inotify/FSEvents) callback thread
//!     → watcher.rs (filter by ignore rules)
//!     → unbounded mpsc into the tokio runtime
//!     → broadcaster.rs classifies (.css → refreshcss, else reload)
//!     → per-connection channel → connection task debounces → WebSocket
//! ```
//!
//! # Design Decisions
//! - The connection set is owned by the broadcaster and mutated only on
//!   attach and close
//! - Debounce state lives inside each connection's task; a burst within the
//!   window delivers only its last event
//! - A directory that cannot be watched is logged and skipped; the server
//!   still serves it statically

pub mod broadcaster;
pub mod watcher;

pub use broadcaster::{ChangeBroadcaster, ReloadMessage};
pub use watcher::{watch, IgnoreRules, WatchHandle};

/// The upgrade endpoint the injected client script connects to.
pub const NOTIFY_PATH: &str = "/__live_serve";
