//! The remote session manager: single authority for creating, feeding,
//! resizing and destroying sessions.
//!
//! `connect` is the only operation that suspends its caller, and it resolves
//! at transport-ready. Shell negotiation continues in a spawned per-session
//! task which then pumps channel output to the session's event sink. `write`,
//! `resize` and `disconnect` are fire-and-forget: they queue work and return.
//!
//! Teardown runs exactly once per session, whichever side triggers it. The
//! registry's atomic `remove` is the arbiter: the event pump emits the
//! terminal `closed` event after draining the channel stream, and the
//! disconnect path emits it only when no pump is consuming (a channel was
//! never attached).

use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::ConnectConfig;
use crate::error::ConnectError;
use crate::events::{EventSink, SessionEvent};
use crate::registry::SessionRegistry;
use crate::session::{Session, SessionStatus};
use crate::transport::{ChannelEvent, ChannelEvents, Connector, ShellChannel, Transport};

/// Shell dimensions requested at negotiation time. The display surface
/// issues a real resize as soon as it has measured itself.
const INITIAL_COLS: u16 = 80;
const INITIAL_ROWS: u16 = 24;

/// Fulfilment payload of a successful `connect`.
#[derive(Serialize, Clone, Debug)]
pub struct ConnectAck {
    pub status: &'static str,
    pub id: String,
}

/// Owns the session registry and every per-session background task.
pub struct SessionManager<C: Connector> {
    connector: C,
    registry: Arc<SessionRegistry<C::Transport>>,
}

impl<C: Connector> SessionManager<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            registry: Arc::new(SessionRegistry::new()),
        }
    }

    /// Open a transport for `id` and register the session once the transport
    /// is ready. Resolves with the ack at that point; shell negotiation is
    /// still in flight and its failure arrives later as an `error` event on
    /// `sink`, not as a rejection here.
    ///
    /// A transport failure rejects the call and registers nothing. An id
    /// already in use is rejected without disturbing the existing session.
    pub async fn connect(
        &self,
        id: &str,
        config: ConnectConfig,
        sink: impl EventSink,
    ) -> Result<ConnectAck, ConnectError> {
        if id.is_empty() {
            return Err(ConnectError::EmptyId);
        }
        if self.registry.contains(id) {
            return Err(ConnectError::SessionExists(id.to_string()));
        }

        let transport = self.connector.connect(&config).await?;

        let sink: Arc<dyn EventSink> = Arc::new(sink);
        let session = Session::connecting(transport.clone(), Arc::clone(&sink));
        if let Err(err) = self.registry.insert(id, session) {
            // Lost a connect race for this id. The session that won stays
            // untouched; only the transport we just opened is torn down.
            transport.close().await;
            return Err(err);
        }
        info!("session {id}: transport ready to {}:{}", config.host, config.port);

        let registry = Arc::clone(&self.registry);
        let id = id.to_string();
        let ack = ConnectAck {
            status: "connected",
            id: id.clone(),
        };
        tokio::spawn(run_session(registry, id, transport, sink));

        Ok(ack)
    }

    /// Forward input bytes to the session's shell. Dropped, not queued, when
    /// the id is unknown or the channel is not attached yet.
    pub fn write(&self, id: &str, bytes: &[u8]) {
        match self.channel_of(id) {
            Some(channel) => {
                if channel.write(bytes.to_vec()).is_err() {
                    debug!("session {id}: write dropped, channel closing");
                }
            }
            None => debug!("session {id}: write dropped, no channel"),
        }
    }

    /// Update the shell's window dimensions. Same missing-channel semantics
    /// as [`write`](Self::write); the registry is not touched.
    pub fn resize(&self, id: &str, rows: u16, cols: u16) {
        match self.channel_of(id) {
            Some(channel) => {
                if channel.resize(rows, cols).is_err() {
                    debug!("session {id}: resize dropped, channel closing");
                }
            }
            None => debug!("session {id}: resize dropped, no channel"),
        }
    }

    /// Tear down the session for `id`. Idempotent: repeat calls and unknown
    /// ids are no-ops, and the session's single `closed` event fires once
    /// teardown completes.
    pub fn disconnect(&self, id: &str) {
        let Some(entry) = self.registry.remove(id) else {
            return;
        };
        info!("session {id}: disconnect requested");

        let (transport, channel, sink) = {
            let session = entry.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            (
                session.transport.clone(),
                session.channel.clone(),
                Arc::clone(&session.events),
            )
        };

        let id = id.to_string();
        tokio::spawn(async move {
            match channel {
                Some(channel) => {
                    // A pump is draining this channel. Closing the channel
                    // ends its stream; the pump emits `closed` after the
                    // remaining output, so data is never delivered late.
                    channel.close();
                    transport.close().await;
                }
                None => {
                    // No channel ever attached, so nothing is pumping:
                    // finish the teardown here.
                    transport.close().await;
                    sink.emit(SessionEvent::Closed { id });
                }
            }
        });
    }

    /// Ids of all registered sessions, sorted.
    pub fn session_ids(&self) -> Vec<String> {
        self.registry.ids()
    }

    pub fn status(&self, id: &str) -> Option<SessionStatus> {
        self.registry.status(id)
    }

    fn channel_of(&self, id: &str) -> Option<<C::Transport as Transport>::Channel> {
        self.registry
            .with_session(id, |session| session.channel.clone())
            .flatten()
    }
}

/// Per-session background task: negotiate the shell channel, then pump its
/// event stream into the bridge until it runs dry.
async fn run_session<T: Transport>(
    registry: Arc<SessionRegistry<T>>,
    id: String,
    transport: T,
    sink: Arc<dyn EventSink>,
) {
    let (channel, events) = match transport.open_shell(INITIAL_COLS, INITIAL_ROWS).await {
        Ok(pair) => pair,
        Err(err) => {
            warn!("session {id}: shell negotiation failed: {err}");
            // Advisory failure: the transport stays up and the session stays
            // registered and disconnectable. Emitting under the entry lock
            // keeps the error from landing after a concurrent disconnect's
            // `closed`.
            registry.with_session(&id, |session| {
                session.events.emit(SessionEvent::Error {
                    id: id.clone(),
                    message: err.to_string(),
                });
            });
            return;
        }
    };

    if !registry.attach_channel(&id, channel.clone()) {
        // Disconnected while negotiating; nothing will ever pump this
        // channel, so close it before dropping the handles.
        channel.close();
        return;
    }
    debug!("session {id}: shell channel attached");

    pump(registry, id, transport, sink, events).await;
}

/// Drain the channel's event stream into the sink, then finish teardown.
/// Sole emitter of `closed` for sessions whose channel attached.
async fn pump<T: Transport>(
    registry: Arc<SessionRegistry<T>>,
    id: String,
    transport: T,
    sink: Arc<dyn EventSink>,
    mut events: ChannelEvents,
) {
    while let Some(event) = events.recv().await {
        match event {
            ChannelEvent::Data(bytes) => sink.emit(SessionEvent::Data {
                id: id.clone(),
                bytes,
            }),
            ChannelEvent::Error(message) => sink.emit(SessionEvent::Error {
                id: id.clone(),
                message,
            }),
            ChannelEvent::Closed => break,
        }
    }

    // Stream is dry. Either the remote ended the session (entry still
    // registered, remove it and close the transport) or a disconnect already
    // removed it and closed the transport itself.
    if registry.remove(&id).is_some() {
        transport.close().await;
    }
    info!("session {id}: closed");
    sink.emit(SessionEvent::Closed { id });
}
