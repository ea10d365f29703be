use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::health::connection::TransportStatus;

/// Everything the transport can deliver. `StrategyData` payloads are raw
/// JSON; validation happens at the client's ingress boundary.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    StrategyData {
        payload: Value,
    },

    ConnectionStatus {
        status: TransportStatus,
    },

    StrategyConnected,

    StrategyDisconnected,

    /// Explicit liveness ping, independent of data pushes.
    Heartbeat {
        remote_active: bool,
        timestamp_ms: u64,
    },

    /// Transport-level disconnect.
    Closed,
}

/// Strategy-facing commands issued from the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    EnterLong,
    EnterShort,
    ClosePosition,
    UpdateSettings { max_position: Decimal },
}

impl Command {
    pub fn label(&self) -> &'static str {
        match self {
            Command::EnterLong => "enter long",
            Command::EnterShort => "enter short",
            Command::ClosePosition => "close position",
            Command::UpdateSettings { .. } => "update settings",
        }
    }
}

/// Result of one command exchange. No retry is owned on this side; a
/// failed outcome is surfaced to the caller and the notification queue.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub success: bool,
    pub detail: String,
}

#[derive(Debug)]
pub struct CommandRequest {
    pub command: Command,
    pub reply: oneshot::Sender<CommandOutcome>,
}
