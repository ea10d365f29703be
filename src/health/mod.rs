pub mod connection;
pub mod staleness;

/// Coarse connection-quality tier exposed to the rendering layer.
///
/// `Degraded` and `Inactive` are feed-freshness overlays on top of a live
/// transport; the transport itself only knows the first three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionHealth {
    Disconnected,
    Connecting,
    Live,
    Degraded,
    Inactive,
}

impl std::fmt::Display for ConnectionHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionHealth::Disconnected => "disconnected",
            ConnectionHealth::Connecting => "connecting",
            ConnectionHealth::Live => "live",
            ConnectionHealth::Degraded => "degraded",
            ConnectionHealth::Inactive => "inactive",
        };
        f.write_str(s)
    }
}
