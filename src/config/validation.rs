//! Semantic validation, run after deserialization.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::schema::ServerConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("mount `{0}` has no candidate directories")]
    EmptyMount(String),

    #[error("default body file for status {status} does not exist: {}", .path.display())]
    MissingDefaultFile { status: u16, path: PathBuf },
}

/// Check everything serde cannot: every mount has at least one directory,
/// every configured default body file exists on disk.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for mount in &config.mounts {
        if mount.dirs.is_empty() {
            errors.push(ValidationError::EmptyMount(mount.route.clone()));
        }
    }

    for (status, path) in config.defaults.files() {
        if !path.is_file() {
            errors.push(ValidationError::MissingDefaultFile {
                status,
                path: path.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
