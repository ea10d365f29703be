use std::time::Instant;

use tracing::info;

use super::staleness::FeedOverlay;
use super::ConnectionHealth;

/// Transport-level status, as reported by the connection library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStatus {
    Disconnected,
    Connecting,
    Live,
}

/// Most recent explicit liveness signal from the remote side.
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatRecord {
    pub last_received_at: Instant,
    pub remote_active: bool,
}

/// Announcement the runtime should turn into a notification. Emitted only
/// on a real edge, so flapping transports do not spam the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthAnnouncement {
    ConnectionLive,
    ConnectionLost,
}

/// Pure reflector of transport connect/disconnect signals. Retry and
/// backoff belong to the transport; this only tracks which tier we are in
/// and merges in the staleness overlay.
#[derive(Debug)]
pub struct ConnectionManager {
    status: TransportStatus,
    overlay: Option<FeedOverlay>,
    heartbeat: Option<HeartbeatRecord>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            status: TransportStatus::Disconnected,
            overlay: None,
            heartbeat: None,
        }
    }

    pub fn status(&self) -> TransportStatus {
        self.status
    }

    pub fn heartbeat(&self) -> Option<HeartbeatRecord> {
        self.heartbeat
    }

    /// Effective tier: the overlay only applies while the transport is live.
    pub fn health(&self) -> ConnectionHealth {
        match (self.status, self.overlay) {
            (TransportStatus::Disconnected, _) => ConnectionHealth::Disconnected,
            (TransportStatus::Connecting, _) => ConnectionHealth::Connecting,
            (TransportStatus::Live, None) => ConnectionHealth::Live,
            (TransportStatus::Live, Some(FeedOverlay::Degraded)) => {
                ConnectionHealth::Degraded
            }
            (TransportStatus::Live, Some(FeedOverlay::Inactive)) => {
                ConnectionHealth::Inactive
            }
        }
    }

    /// Apply a transport status signal. Duplicate signals are silent; a
    /// reconnect clears any staleness overlay.
    pub fn on_status(&mut self, status: TransportStatus) -> Option<HealthAnnouncement> {
        if status == self.status {
            return None;
        }

        // never skip Connecting on the way up
        if self.status == TransportStatus::Disconnected
            && status == TransportStatus::Live
        {
            self.status = TransportStatus::Connecting;
        }

        let previous = self.status;
        self.status = status;
        info!(from = ?previous, to = ?status, "transport status change");

        match status {
            TransportStatus::Live => {
                self.overlay = None;
                Some(HealthAnnouncement::ConnectionLive)
            }
            TransportStatus::Disconnected => Some(HealthAnnouncement::ConnectionLost),
            TransportStatus::Connecting => None,
        }
    }

    pub fn on_heartbeat(&mut self, remote_active: bool, now: Instant) {
        self.heartbeat = Some(HeartbeatRecord {
            last_received_at: now,
            remote_active,
        });
    }

    pub fn set_overlay(&mut self, overlay: Option<FeedOverlay>) {
        self.overlay = overlay;
    }

    pub fn overlay(&self) -> Option<FeedOverlay> {
        self.overlay
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_connect_sequence() {
        let mut cm = ConnectionManager::new();
        assert_eq!(cm.health(), ConnectionHealth::Disconnected);

        assert_eq!(cm.on_status(TransportStatus::Connecting), None);
        assert_eq!(cm.health(), ConnectionHealth::Connecting);

        assert_eq!(
            cm.on_status(TransportStatus::Live),
            Some(HealthAnnouncement::ConnectionLive)
        );
        assert_eq!(cm.health(), ConnectionHealth::Live);
    }

    #[test]
    fn duplicate_signals_are_silent() {
        let mut cm = ConnectionManager::new();
        cm.on_status(TransportStatus::Connecting);
        cm.on_status(TransportStatus::Live);

        assert_eq!(cm.on_status(TransportStatus::Live), None);
        assert_eq!(
            cm.on_status(TransportStatus::Disconnected),
            Some(HealthAnnouncement::ConnectionLost)
        );
        assert_eq!(cm.on_status(TransportStatus::Disconnected), None);
    }

    #[test]
    fn never_skips_connecting() {
        let mut cm = ConnectionManager::new();
        // remote ack arrives without an explicit connecting signal
        assert_eq!(
            cm.on_status(TransportStatus::Live),
            Some(HealthAnnouncement::ConnectionLive)
        );
        assert_eq!(cm.status(), TransportStatus::Live);
    }

    #[test]
    fn reconnect_clears_overlay() {
        let mut cm = ConnectionManager::new();
        cm.on_status(TransportStatus::Connecting);
        cm.on_status(TransportStatus::Live);
        cm.set_overlay(Some(FeedOverlay::Inactive));
        assert_eq!(cm.health(), ConnectionHealth::Inactive);

        cm.on_status(TransportStatus::Disconnected);
        cm.on_status(TransportStatus::Connecting);
        cm.on_status(TransportStatus::Live);
        assert_eq!(cm.health(), ConnectionHealth::Live);
    }

    #[test]
    fn overlay_hidden_while_disconnected() {
        let mut cm = ConnectionManager::new();
        cm.set_overlay(Some(FeedOverlay::Degraded));
        assert_eq!(cm.health(), ConnectionHealth::Disconnected);
    }

    #[test]
    fn reconnect_reannounces_live() {
        let mut cm = ConnectionManager::new();
        cm.on_status(TransportStatus::Connecting);
        assert!(cm.on_status(TransportStatus::Live).is_some());
        cm.on_status(TransportStatus::Disconnected);
        cm.on_status(TransportStatus::Connecting);
        // a genuine edge after a drop announces again
        assert_eq!(
            cm.on_status(TransportStatus::Live),
            Some(HealthAnnouncement::ConnectionLive)
        );
    }
}
