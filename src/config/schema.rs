//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

/// Root configuration for the development server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Static path mappings: URL prefix → ordered fallback directories.
    pub mounts: Vec<MountConfig>,

    /// Live-reload behavior (watching, debouncing, script injection).
    pub live_reload: LiveReloadConfig,

    /// Optional body files served for default outcomes per status.
    pub defaults: DefaultsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            mounts: vec![MountConfig {
                route: String::new(),
                dirs: vec![PathBuf::from(".")],
            }],
            live_reload: LiveReloadConfig::default(),
            defaults: DefaultsConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// One static path mapping.
///
/// The directory list is ordered fallback priority: a requested file is
/// looked up in each directory in turn and the first hit wins.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MountConfig {
    /// URL-path prefix this mapping answers under ("" is the site root).
    #[serde(default)]
    pub route: String,

    /// Candidate base directories, first match wins. A bare string is
    /// accepted as a one-element list.
    #[serde(deserialize_with = "one_or_many")]
    pub dirs: Vec<PathBuf>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(PathBuf),
        Many(Vec<PathBuf>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(dir) => vec![dir],
        OneOrMany::Many(dirs) => dirs,
    })
}

/// Live-reload settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// Master switch: watching, notifications and script injection.
    pub enabled: bool,

    /// Per-connection debounce window in milliseconds; 0 sends immediately.
    pub debounce_ms: u64,

    /// Extra ignore patterns (substring match against the changed path),
    /// on top of the built-in hidden/VCS/build rules.
    pub ignore: Vec<String>,
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 100,
            ignore: Vec::new(),
        }
    }
}

/// Optional per-status default body files.
///
/// Missing targets fail validation at setup time, not at request time.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Body served for 404 outcomes.
    pub not_found: Option<PathBuf>,

    /// Body served for 400 outcomes.
    pub bad_request: Option<PathBuf>,

    /// Body served for 500 outcomes.
    pub internal_error: Option<PathBuf>,
}

impl DefaultsConfig {
    /// (status, path) pairs for every configured default file.
    pub fn files(&self) -> impl Iterator<Item = (u16, &PathBuf)> {
        [
            (404, self.not_found.as_ref()),
            (400, self.bad_request.as_ref()),
            (500, self.internal_error.as_ref()),
        ]
        .into_iter()
        .filter_map(|(status, path)| path.map(|p| (status, p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_gets_full_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8080");
        assert_eq!(config.mounts.len(), 1);
        assert_eq!(config.mounts[0].route, "");
        assert_eq!(config.mounts[0].dirs, vec![PathBuf::from(".")]);
        assert!(config.live_reload.enabled);
        assert_eq!(config.live_reload.debounce_ms, 100);
    }

    #[test]
    fn test_bare_string_mount_equals_one_element_list() {
        let single: ServerConfig = toml::from_str(
            r#"
            [[mounts]]
            route = "assets"
            dirs = "public"
            "#,
        )
        .unwrap();
        let list: ServerConfig = toml::from_str(
            r#"
            [[mounts]]
            route = "assets"
            dirs = ["public"]
            "#,
        )
        .unwrap();
        assert_eq!(single.mounts[0].dirs, list.mounts[0].dirs);
    }

    #[test]
    fn test_ordered_fallback_dirs_preserved() {
        let config: ServerConfig = toml::from_str(
            r#"
            [[mounts]]
            dirs = ["a", "b", "c"]
            "#,
        )
        .unwrap();
        assert_eq!(
            config.mounts[0].dirs,
            vec![PathBuf::from("a"), PathBuf::from("b"), PathBuf::from("c")]
        );
    }

    #[test]
    fn test_default_files_iterator() {
        let defaults = DefaultsConfig {
            not_found: Some(PathBuf::from("404.html")),
            bad_request: None,
            internal_error: Some(PathBuf::from("500.html")),
        };
        let files: Vec<_> = defaults.files().collect();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].0, 404);
        assert_eq!(files[1].0, 500);
    }
}
