//! Development HTTP server with layered static fallbacks and live reload.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌────────────────────────────────────────────────┐
//!                      │                  LIVE-SERVE                     │
//!                      │                                                 │
//!   Request ───────────┼─▶ http/dispatch ──▶ routing (trie) ──▶ handler │
//!                      │                        │                 │      │
//!                      │                        │        ┌────────▼────┐ │
//!   Response ◀─────────┼── http/respond ◀───────┴────────│ files       │ │
//!                      │   (status senders)              │ (fallbacks, │ │
//!                      │                                 │  injection) │ │
//!                      │                                 └─────────────┘ │
//!                      │                                                 │
//!   File change ───────┼─▶ reload/watcher ──▶ reload/broadcaster ──▶ ws │
//!                      │                                                 │
//!                      │   config (schema/loader/validation)  lifecycle  │
//!                      └────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod files;
pub mod http;
pub mod lifecycle;
pub mod reload;
pub mod routing;
pub mod server;

pub use config::ServerConfig;
pub use error::{NoDefaultConfigured, RouteConflict, SetupError, WatchError};
pub use lifecycle::Shutdown;
pub use routing::{RouteMethod, RouteParams};
pub use server::LiveServer;
