//! Fan-out of change notifications to connected browsers.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// The three values ever sent on the notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadMessage {
    Connected,
    Reload,
    RefreshCss,
}

impl ReloadMessage {
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Reload => "reload",
            Self::RefreshCss => "refreshcss",
        }
    }

    /// A `.css` change refreshes stylesheets in place; anything else
    /// reloads the page.
    pub fn classify(path: &Path) -> Self {
        let is_css = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("css"));
        if is_css {
            Self::RefreshCss
        } else {
            Self::Reload
        }
    }
}

/// Owns the set of live notification connections for one server instance.
///
/// Attach and close are the only entry points that touch the set; change
/// events only read it (pruning senders whose task has gone away).
pub struct ChangeBroadcaster {
    connections: Mutex<HashMap<u64, mpsc::UnboundedSender<ReloadMessage>>>,
    next_id: AtomicU64,
    debounce: Duration,
}

impl ChangeBroadcaster {
    pub fn new(debounce: Duration) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            debounce,
        }
    }

    /// Push a change at `path` to every live connection.
    pub fn notify_change(&self, path: &Path) {
        let message = ReloadMessage::classify(path);
        let mut connections = match self.connections.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        connections.retain(|id, tx| {
            let alive = tx.send(message).is_ok();
            if !alive {
                tracing::debug!(connection = id, "pruned closed reload connection");
            }
            alive
        });
    }

    pub fn connection_count(&self) -> usize {
        match self.connections.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    fn subscribe(&self) -> (u64, mpsc::UnboundedReceiver<ReloadMessage>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        match self.connections.lock() {
            Ok(mut guard) => {
                guard.insert(id, tx);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(id, tx);
            }
        }
        (id, rx)
    }

    fn unsubscribe(&self, id: u64) {
        match self.connections.lock() {
            Ok(mut guard) => {
                guard.remove(&id);
            }
            Err(poisoned) => {
                poisoned.into_inner().remove(&id);
            }
        }
    }

    /// Drive one accepted upgrade until the socket closes.
    ///
    /// Sends `connected` immediately, then debounced change messages: a new
    /// event inside the window cancels and reschedules the pending send, so
    /// only the last event of a burst goes out. Socket close cancels the
    /// pending timer and removes the connection from the set.
    pub async fn run_connection(self: Arc<Self>, mut socket: WebSocket) {
        if socket
            .send(Message::Text(ReloadMessage::Connected.as_wire().into()))
            .await
            .is_err()
        {
            return;
        }

        let (id, mut rx) = self.subscribe();
        tracing::debug!(connection = id, "reload client connected");

        let mut pending: Option<ReloadMessage> = None;
        let timer = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                queued = rx.recv() => match queued {
                    None => break,
                    Some(message) => {
                        if self.debounce.is_zero() {
                            if send(&mut socket, message).await.is_err() {
                                break;
                            }
                        } else {
                            pending = Some(message);
                            timer.as_mut().reset(Instant::now() + self.debounce);
                        }
                    }
                },
                () = &mut timer, if pending.is_some() => {
                    let Some(message) = pending.take() else {
                        continue;
                    };
                    if send(&mut socket, message).await.is_err() {
                        break;
                    }
                },
                incoming = socket.recv() => match incoming {
                    None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                },
            }
        }

        self.unsubscribe(id);
        tracing::debug!(connection = id, "reload client disconnected");
    }
}

async fn send(socket: &mut WebSocket, message: ReloadMessage) -> Result<(), axum::Error> {
    socket.send(Message::Text(message.as_wire().into())).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(
            ReloadMessage::classify(Path::new("site/style.css")),
            ReloadMessage::RefreshCss
        );
        assert_eq!(
            ReloadMessage::classify(Path::new("site/STYLE.CSS")),
            ReloadMessage::RefreshCss
        );
        assert_eq!(
            ReloadMessage::classify(Path::new("site/index.html")),
            ReloadMessage::Reload
        );
        assert_eq!(
            ReloadMessage::classify(Path::new("site/script.js")),
            ReloadMessage::Reload
        );
        assert_eq!(
            ReloadMessage::classify(Path::new("noextension")),
            ReloadMessage::Reload
        );
    }

    #[test]
    fn test_wire_values() {
        assert_eq!(ReloadMessage::Connected.as_wire(), "connected");
        assert_eq!(ReloadMessage::Reload.as_wire(), "reload");
        assert_eq!(ReloadMessage::RefreshCss.as_wire(), "refreshcss");
    }

    #[tokio::test]
    async fn test_notify_reaches_every_subscriber() {
        let broadcaster = ChangeBroadcaster::new(Duration::ZERO);
        let (_, mut rx_a) = broadcaster.subscribe();
        let (_, mut rx_b) = broadcaster.subscribe();

        broadcaster.notify_change(Path::new("index.html"));

        assert_eq!(rx_a.recv().await, Some(ReloadMessage::Reload));
        assert_eq!(rx_b.recv().await, Some(ReloadMessage::Reload));
    }

    #[tokio::test]
    async fn test_closed_connections_are_pruned() {
        let broadcaster = ChangeBroadcaster::new(Duration::ZERO);
        let (_, rx_gone) = broadcaster.subscribe();
        let (_, mut rx_live) = broadcaster.subscribe();
        assert_eq!(broadcaster.connection_count(), 2);

        drop(rx_gone);
        broadcaster.notify_change(Path::new("style.css"));

        assert_eq!(broadcaster.connection_count(), 1);
        assert_eq!(rx_live.recv().await, Some(ReloadMessage::RefreshCss));
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_from_set() {
        let broadcaster = ChangeBroadcaster::new(Duration::ZERO);
        let (id, _rx) = broadcaster.subscribe();
        assert_eq!(broadcaster.connection_count(), 1);
        broadcaster.unsubscribe(id);
        assert_eq!(broadcaster.connection_count(), 0);
    }
}
