//! Filesystem watching with ignore rules.

use std::path::{Component, Path, PathBuf};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::WatchError;

/// Directories whose contents never trigger a reload.
const IGNORED_DIRS: &[&str] = &[".git", ".hg", ".svn", "node_modules", "target"];

/// Decides which changed paths are forwarded to the broadcaster.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    patterns: Vec<String>,
}

impl IgnoreRules {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    /// Hidden path components, VCS/build directories, and any configured
    /// pattern (substring match) suppress the event.
    pub fn is_ignored(&self, path: &Path) -> bool {
        for component in path.components() {
            let Component::Normal(part) = component else {
                continue;
            };
            let part = part.to_string_lossy();
            if part.starts_with('.') {
                return true;
            }
            if IGNORED_DIRS.iter().any(|dir| *dir == part) {
                return true;
            }
        }

        let text = path.to_string_lossy();
        self.patterns.iter().any(|pattern| text.contains(pattern))
    }
}

/// Keeps one directory watch alive; dropping it releases the watch.
#[derive(Debug)]
pub struct WatchHandle {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl WatchHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Watch `dir` recursively, forwarding non-ignored changed paths into `tx`.
///
/// The notify callback runs on its own thread; the channel is the bridge
/// into the async runtime.
pub fn watch(
    dir: &Path,
    ignore: IgnoreRules,
    tx: mpsc::UnboundedSender<PathBuf>,
) -> Result<WatchHandle, WatchError> {
    let mut watcher = RecommendedWatcher::new(
        move |result: notify::Result<Event>| match result {
            Ok(event) => {
                if !(event.kind.is_create() || event.kind.is_modify() || event.kind.is_remove()) {
                    return;
                }
                for path in event.paths {
                    if ignore.is_ignored(&path) {
                        continue;
                    }
                    // Receiver gone means the server is shutting down.
                    if tx.send(path).is_err() {
                        return;
                    }
                }
            }
            Err(err) => tracing::error!(error = %err, "watch event error"),
        },
        Config::default(),
    )
    .map_err(|source| WatchError {
        path: dir.to_path_buf(),
        source,
    })?;

    watcher
        .watch(dir, RecursiveMode::Recursive)
        .map_err(|source| WatchError {
            path: dir.to_path_buf(),
            source,
        })?;

    tracing::info!(path = %dir.display(), "watching for changes");
    Ok(WatchHandle {
        _watcher: watcher,
        path: dir.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_components_ignored() {
        let rules = IgnoreRules::default();
        assert!(rules.is_ignored(Path::new("site/.env")));
        assert!(rules.is_ignored(Path::new("site/.cache/page.html")));
        assert!(!rules.is_ignored(Path::new("site/page.html")));
    }

    #[test]
    fn test_vcs_and_build_dirs_ignored() {
        let rules = IgnoreRules::default();
        assert!(rules.is_ignored(Path::new("site/.git/HEAD")));
        assert!(rules.is_ignored(Path::new("site/node_modules/pkg/index.js")));
        assert!(rules.is_ignored(Path::new("site/target/debug/app")));
        assert!(!rules.is_ignored(Path::new("site/targets/list.html")));
    }

    #[test]
    fn test_configured_patterns_ignored() {
        let rules = IgnoreRules::new(vec!["generated".into(), ".tmp".into()]);
        assert!(rules.is_ignored(Path::new("site/generated/index.html")));
        assert!(rules.is_ignored(Path::new("site/draft.tmp")));
        assert!(!rules.is_ignored(Path::new("site/index.html")));
    }

    #[test]
    fn test_relative_dir_markers_are_not_hidden() {
        let rules = IgnoreRules::default();
        assert!(!rules.is_ignored(Path::new("./site/page.html")));
    }

    #[tokio::test]
    async fn test_watch_failure_is_reported_not_fatal() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let missing = Path::new("/definitely/not/a/real/directory");
        let err = watch(missing, IgnoreRules::default(), tx).unwrap_err();
        assert_eq!(err.path, missing);
    }
}
