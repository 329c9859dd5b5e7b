//! Scripted doubles for the transport seam and the event bridge, shared by
//! the unit tests in this crate. Nothing here touches the network.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::Notify;

use crate::config::ConnectConfig;
use crate::error::{ChannelError, TransportError};
use crate::events::{EventSink, SessionEvent};
use crate::transport::{ChannelEvent, ChannelEvents, Connector, ShellChannel, Transport};

/// Everything a test wants to observe about one fake transport.
#[derive(Default)]
pub(crate) struct FakeState {
    pub writes: Vec<Vec<u8>>,
    pub resizes: Vec<(u16, u16)>,
    pub channel_closed: bool,
    pub transport_closed: bool,
}

/// Fake transport handle. Clones share state, like the real handle.
#[derive(Clone)]
pub(crate) struct FakeTransport {
    pub state: Arc<Mutex<FakeState>>,
    /// Handle to the channel's event stream, for driving remote output.
    pub remote: Arc<Mutex<Option<mpsc::UnboundedSender<ChannelEvent>>>>,
    fail_shell: bool,
    shell_gate: Option<Arc<Notify>>,
}

impl FakeTransport {
    /// Shell negotiation succeeds immediately.
    pub fn ok() -> Self {
        Self {
            state: Arc::default(),
            remote: Arc::default(),
            fail_shell: false,
            shell_gate: None,
        }
    }

    /// Shell negotiation always fails.
    pub fn failing_shell() -> Self {
        Self {
            fail_shell: true,
            ..Self::ok()
        }
    }

    /// Shell negotiation blocks until the gate is notified.
    pub fn gated_shell(gate: Arc<Notify>) -> Self {
        Self {
            shell_gate: Some(gate),
            ..Self::ok()
        }
    }

    /// Push remote shell output onto the channel's event stream.
    pub fn push_output(&self, bytes: &[u8]) {
        self.push_event(ChannelEvent::Data(bytes.to_vec()));
    }

    /// Push an arbitrary event, e.g. `ChannelEvent::Closed` for a
    /// remote-initiated close.
    pub fn push_event(&self, event: ChannelEvent) {
        let remote = self.remote.lock().unwrap();
        remote
            .as_ref()
            .expect("shell not negotiated yet")
            .send(event)
            .expect("event stream dropped");
    }

    pub fn transport_closed(&self) -> bool {
        self.state.lock().unwrap().transport_closed
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn resizes(&self) -> Vec<(u16, u16)> {
        self.state.lock().unwrap().resizes.clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    type Channel = FakeChannel;

    async fn open_shell(
        &self,
        _cols: u16,
        _rows: u16,
    ) -> Result<(FakeChannel, ChannelEvents), ChannelError> {
        if let Some(gate) = &self.shell_gate {
            gate.notified().await;
        }
        if self.fail_shell {
            return Err(ChannelError::Negotiation("shell refused".into()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.remote.lock().unwrap() = Some(tx.clone());
        let channel = FakeChannel {
            state: Arc::clone(&self.state),
            events_tx: tx,
        };
        Ok((channel, rx))
    }

    async fn close(&self) {
        self.state.lock().unwrap().transport_closed = true;
    }
}

/// Fake shell channel recording writes and resizes.
#[derive(Clone)]
pub(crate) struct FakeChannel {
    state: Arc<Mutex<FakeState>>,
    events_tx: mpsc::UnboundedSender<ChannelEvent>,
}

impl ShellChannel for FakeChannel {
    fn write(&self, bytes: Vec<u8>) -> Result<(), ChannelError> {
        let mut state = self.state.lock().unwrap();
        if state.channel_closed {
            return Err(ChannelError::Closed);
        }
        state.writes.push(bytes);
        Ok(())
    }

    fn resize(&self, rows: u16, cols: u16) -> Result<(), ChannelError> {
        let mut state = self.state.lock().unwrap();
        if state.channel_closed {
            return Err(ChannelError::Closed);
        }
        state.resizes.push((rows, cols));
        Ok(())
    }

    fn close(&self) {
        let mut state = self.state.lock().unwrap();
        if !state.channel_closed {
            state.channel_closed = true;
            let _ = self.events_tx.send(ChannelEvent::Closed);
        }
    }
}

/// Scripted connector. Dials are resolved by host name:
/// `"unreachable"` fails the handshake, `"bad-auth"` rejects credentials,
/// `"no-shell"` connects but refuses the shell channel, `"slow-shell"`
/// connects with negotiation gated on `shell_gate`. Anything else succeeds.
pub(crate) struct FakeConnector {
    /// Transports created, in connect order.
    pub transports: Arc<Mutex<Vec<FakeTransport>>>,
    pub shell_gate: Arc<Notify>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self {
            transports: Arc::default(),
            shell_gate: Arc::new(Notify::new()),
        }
    }

    pub fn transport(&self, index: usize) -> FakeTransport {
        self.transports.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Transport = FakeTransport;

    async fn connect(&self, config: &ConnectConfig) -> Result<FakeTransport, TransportError> {
        let transport = match config.host.as_str() {
            "unreachable" => return Err(TransportError::Handshake("connection refused".into())),
            "bad-auth" => return Err(TransportError::AuthRejected(config.username.clone())),
            "no-shell" => FakeTransport::failing_shell(),
            "slow-shell" => FakeTransport::gated_shell(Arc::clone(&self.shell_gate)),
            _ => FakeTransport::ok(),
        };
        self.transports.lock().unwrap().push(transport.clone());
        Ok(transport)
    }
}

/// Event sink collecting everything it is handed.
#[derive(Clone, Default)]
pub(crate) struct RecordingSink {
    pub events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// An anonymous sink for tests that never inspect events.
    pub fn shared() -> Arc<dyn EventSink> {
        Arc::new(Self::new())
    }

    pub fn snapshot(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn closed_count(&self, id: &str) -> usize {
        self.snapshot()
            .iter()
            .filter(|event| matches!(event, SessionEvent::Closed { id: event_id } if event_id == id))
            .count()
    }

    pub fn data_for(&self, id: &str) -> Vec<u8> {
        self.snapshot()
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Data { id: event_id, bytes } if event_id == id => {
                    Some(bytes.clone())
                }
                _ => None,
            })
            .flatten()
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: SessionEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// A connect config pointed at the scripted host name.
pub(crate) fn config_for(host: &str) -> ConnectConfig {
    serde_json::from_str(&format!(
        r#"{{"host": "{host}", "username": "deploy", "password": "secret"}}"#
    ))
    .unwrap()
}

/// Poll `predicate` until it holds or the deadline passes.
pub(crate) async fn wait_for(predicate: impl Fn() -> bool) {
    let deadline = std::time::Instant::now() + Duration::from_secs(3);
    while !predicate() {
        if std::time::Instant::now() > deadline {
            panic!("condition not reached within deadline");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
