use tokio::sync::oneshot;

use crate::health::ConnectionHealth;
use crate::transport::types::{Command, CommandOutcome};

use super::view::DashboardView;

/// Requests into the client loop.
#[derive(Debug)]
pub enum ClientEvent {
    /// Read-only view for the rendering layer.
    GetView {
        reply: oneshot::Sender<DashboardView>,
    },

    /// Fire a command at the strategy engine. The reply carries the
    /// outcome; failures also land in the notification queue.
    Command {
        command: Command,
        reply: oneshot::Sender<CommandOutcome>,
    },

    /// Internal: a spawned dispatch task reporting failure back into the
    /// loop so the notification is raised on the owning task.
    CommandFailed { message: String },

    /// Tear the loop down; all pending timers die with it.
    Shutdown,
}

/// Change events broadcast to subscribers. Dropping the receiver
/// unsubscribes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientUpdate {
    StateCommitted,
    HealthChanged(ConnectionHealth),
    NotificationsChanged,
}
