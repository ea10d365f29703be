pub mod sim;
pub mod types;

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::transport::types::{CommandRequest, TransportEvent};

/// Persistent connection to the remote strategy engine.
///
/// Reconnect and backoff live behind this trait; the client only reacts to
/// the events it emits.
pub trait Transport: Send + Sync {
    /// Subscribe to the inbound event stream.
    fn subscribe(&self) -> broadcast::Receiver<TransportEvent>;

    /// Channel for outbound command requests.
    fn command_sender(&self) -> mpsc::Sender<CommandRequest>;

    /// Start the transport (spawn tasks, connect sockets, etc.).
    fn start(self: Arc<Self>);
}
