//! Server assembly: trie construction, mount registration, run loop.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::routing::{any, get};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::trace::TraceLayer;

use crate::config::loader::ConfigError;
use crate::config::validation::validate_config;
use crate::config::ServerConfig;
use crate::error::{RouteConflict, SetupError};
use crate::files::{self, Outcome, ResolveContext, ServeMode};
use crate::http::dispatch::{DispatchEngine, RouteHandler, RouteRequest};
use crate::http::respond::{DefaultBody, Responder, StatusDefaults};
use crate::reload::{self, ChangeBroadcaster, IgnoreRules};
use crate::routing::{trie, RouteMethod, RouteTrie};

/// The development server: static mounts, REST routes, live reload.
///
/// Routes are registered between [`new`](Self::new) and [`run`](Self::run);
/// the trie freezes when the listener starts.
pub struct LiveServer {
    config: ServerConfig,
    routes: RouteTrie<RouteHandler>,
    responder: Responder,
    broadcaster: Arc<ChangeBroadcaster>,
}

#[derive(Clone)]
struct AppState {
    engine: Arc<DispatchEngine>,
    broadcaster: Arc<ChangeBroadcaster>,
}

impl LiveServer {
    /// Validate the configuration and register the static mount routes.
    pub fn new(config: ServerConfig) -> Result<Self, SetupError> {
        validate_config(&config)
            .map_err(|errors| SetupError::Config(ConfigError::Validation(errors)))?;

        let mut defaults = StatusDefaults::builtin();
        for (status, path) in config.defaults.files() {
            defaults.set(status, DefaultBody::File(path.clone()));
        }

        let inject = config.live_reload.enabled;
        let responder = Responder::new(Arc::new(defaults), inject);

        let mut routes = RouteTrie::new();
        for mount in &config.mounts {
            let route = format!("{}/::path", trie::normalize(&mount.route));
            let handler = static_handler(mount.dirs.clone(), inject);
            routes.register(RouteMethod::Get, &route, handler)?;
        }

        let broadcaster = Arc::new(ChangeBroadcaster::new(Duration::from_millis(
            config.live_reload.debounce_ms,
        )));

        Ok(Self {
            config,
            routes,
            responder,
            broadcaster,
        })
    }

    /// Register a REST route handler.
    pub fn route(
        &mut self,
        method: RouteMethod,
        path: &str,
        handler: RouteHandler,
    ) -> Result<(), RouteConflict> {
        self.routes.register(method, path, handler)
    }

    /// [`route`](Self::route) for plain async closures.
    pub fn route_fn<F, Fut>(
        &mut self,
        method: RouteMethod,
        path: &str,
        handler: F,
    ) -> Result<(), RouteConflict>
    where
        F: Fn(RouteRequest, Responder) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(
            method,
            path,
            Arc::new(move |request, responder| Box::pin(handler(request, responder))),
        )
    }

    /// Handle to the notification fan-out, e.g. for pushing synthetic
    /// change events.
    pub fn broadcaster(&self) -> Arc<ChangeBroadcaster> {
        self.broadcaster.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve until the shutdown signal fires.
    ///
    /// Starts one recursive watch per mount directory (failures are logged,
    /// the directory is still served), pumps change events into the
    /// broadcaster, and runs the axum server. Watches are released when
    /// this returns.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let (change_tx, mut change_rx) = mpsc::unbounded_channel::<PathBuf>();
        let mut watch_handles = Vec::new();

        if self.config.live_reload.enabled {
            let ignore = IgnoreRules::new(self.config.live_reload.ignore.clone());
            for mount in &self.config.mounts {
                for dir in &mount.dirs {
                    match reload::watch(dir, ignore.clone(), change_tx.clone()) {
                        Ok(handle) => watch_handles.push(handle),
                        Err(err) => {
                            tracing::warn!(error = %err, "live reload disabled for directory");
                        }
                    }
                }
            }
        }
        drop(change_tx);

        let broadcaster = self.broadcaster.clone();
        let pump = tokio::spawn(async move {
            while let Some(path) = change_rx.recv().await {
                tracing::debug!(path = %path.display(), "file change");
                broadcaster.notify_change(&path);
            }
        });

        let engine = Arc::new(DispatchEngine::new(self.routes, self.responder));
        let state = AppState {
            engine,
            broadcaster: self.broadcaster.clone(),
        };

        let app = Router::new()
            .route(reload::NOTIFY_PATH, get(notify_upgrade))
            .route("/", any(dispatch_entry))
            .route("/{*path}", any(dispatch_entry))
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "serving");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("shutdown signal received");
            })
            .await?;

        pump.abort();
        drop(watch_handles);
        tracing::info!("server stopped");
        Ok(())
    }
}

async fn dispatch_entry(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.engine.dispatch(request).await
}

async fn notify_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let broadcaster = state.broadcaster.clone();
    ws.on_upgrade(move |socket| broadcaster.run_connection(socket))
}

/// Build the static-serving handler for one mount: greedy path variable in,
/// ordered fallback resolution out.
fn static_handler(dirs: Vec<PathBuf>, inject: bool) -> RouteHandler {
    let dirs = Arc::new(dirs);
    Arc::new(move |request: RouteRequest, responder: Responder| {
        let dirs = dirs.clone();
        Box::pin(async move {
            let relative = request.params.get("path").unwrap_or("").to_string();
            let ctx = ResolveContext {
                inject,
                mode: ServeMode::Stream {
                    method: &request.method,
                    uri: &request.uri,
                    headers: &request.headers,
                },
            };
            match files::resolve(&dirs, &relative, ctx).await {
                Outcome::Served(response) => response,
                Outcome::NotFound => {
                    responder
                        .from_status(StatusCode::NOT_FOUND)
                        .default_or_builtin()
                        .await
                }
                Outcome::Error(err) => {
                    tracing::error!(
                        path = %relative,
                        error = %err,
                        "static resolution failed"
                    );
                    responder
                        .from_status(StatusCode::INTERNAL_SERVER_ERROR)
                        .default_or_builtin()
                        .await
                }
            }
        })
    })
}
