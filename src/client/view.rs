use std::time::Duration;

use crate::health::ConnectionHealth;
use crate::notify::Notification;
use crate::state::snapshot::FieldValue;

/// Read-only projection handed to the rendering layer. Always a fully
/// committed state; never a mix of two update cycles.
#[derive(Debug, Clone)]
pub struct DashboardView {
    /// Applied fields in stable (sorted) order.
    pub fields: Vec<(String, FieldValue)>,
    pub health: ConnectionHealth,
    pub notifications: Vec<Notification>,
    /// Age of the last commit, if any has happened yet.
    pub last_commit_age: Option<Duration>,
}
