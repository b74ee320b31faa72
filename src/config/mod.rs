//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → consumed once by server assembly
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All sections have defaults so the server runs with no config file at
//!   all (current directory mounted at the root prefix, live reload on)
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{DefaultsConfig, LiveReloadConfig, MountConfig, ServerConfig};
