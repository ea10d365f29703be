use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, sleep_until};
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::health::connection::{ConnectionManager, HealthAnnouncement, TransportStatus};
use crate::health::staleness::{FeedOverlay, StalenessEvent, StalenessMonitor};
use crate::health::ConnectionHealth;
use crate::notify::{NotificationQueue, Severity};
use crate::state::diff::ChangeDetector;
use crate::state::schema;
use crate::state::smoothing::SmoothingPipeline;
use crate::state::snapshot::AppliedState;
use crate::transport::types::{Command, CommandOutcome, CommandRequest, TransportEvent};
use crate::transport::Transport;

use super::event::{ClientEvent, ClientUpdate};
use super::view::DashboardView;

/// Handle to the client loop. The loop owns every piece of mutable state;
/// this handle only carries channels.
pub struct ClientRuntime {
    sender: mpsc::Sender<ClientEvent>,
    updates: broadcast::Sender<ClientUpdate>,
}

impl ClientRuntime {
    pub fn sender(&self) -> mpsc::Sender<ClientEvent> {
        self.sender.clone()
    }

    /// Subscribe to change events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientUpdate> {
        self.updates.subscribe()
    }
}

/// All client state, mutated only from the loop task so every handler runs
/// serialized. Time is passed in explicitly, which keeps the whole thing
/// testable without timers.
struct ClientState {
    applied: AppliedState,
    detector: ChangeDetector,
    smoothing: SmoothingPipeline,
    connection: ConnectionManager,
    staleness: StalenessMonitor,
    notifications: NotificationQueue,
    updates: broadcast::Sender<ClientUpdate>,
}

impl ClientState {
    fn new(cfg: ClientConfig, updates: broadcast::Sender<ClientUpdate>) -> Self {
        Self {
            applied: AppliedState::default(),
            detector: ChangeDetector::new(cfg.tolerances),
            smoothing: SmoothingPipeline::new(cfg.timing.clone()),
            connection: ConnectionManager::new(),
            staleness: StalenessMonitor::new(cfg.timing),
            notifications: NotificationQueue::new(cfg.notify),
            updates,
        }
    }

    fn notify(&mut self, message: impl Into<String>, severity: Severity, now: Instant) {
        let message = message.into();
        info!(severity = %severity, %message, "notification");
        self.notifications.enqueue(message, severity, now);
        let _ = self.updates.send(ClientUpdate::NotificationsChanged);
    }

    fn announce_health(&mut self, before: ConnectionHealth) {
        let after = self.connection.health();
        if after != before {
            let _ = self.updates.send(ClientUpdate::HealthChanged(after));
        }
    }

    /// A freshness signal: committed snapshot or active heartbeat. Clears
    /// any staleness overlay.
    fn mark_fresh(&mut self, now: Instant) {
        let before = self.connection.health();
        if self.staleness.on_fresh(now) == Some(StalenessEvent::Recovered) {
            self.connection.set_overlay(None);
            self.notify("data feed recovered", Severity::Info, now);
        }
        self.announce_health(before);
    }

    fn apply_status(&mut self, status: TransportStatus, now: Instant) {
        let before = self.connection.health();
        match self.connection.on_status(status) {
            Some(HealthAnnouncement::ConnectionLive) => {
                // fresh episode: a still-dead feed must re-cross the
                // thresholds and re-notify after a reconnect
                self.staleness.reset(now);
                self.notify("connection live", Severity::Info, now);
            }
            Some(HealthAnnouncement::ConnectionLost) => {
                self.notify("connection lost", Severity::Error, now);
            }
            None => {}
        }
        self.announce_health(before);
    }

    fn on_transport_event(&mut self, event: TransportEvent, now: Instant) {
        match event {
            TransportEvent::StrategyData { payload } => match schema::validate(&payload) {
                Ok(snapshot) => {
                    if self.detector.should_apply(&snapshot, &self.applied.snapshot) {
                        self.smoothing.accept(snapshot, now);
                    }
                }
                Err(err) => {
                    warn!(%err, "malformed snapshot dropped");
                    self.notify(
                        format!("malformed snapshot dropped: {err}"),
                        Severity::Warning,
                        now,
                    );
                }
            },

            TransportEvent::ConnectionStatus { status } => self.apply_status(status, now),
            TransportEvent::StrategyConnected => {
                self.apply_status(TransportStatus::Live, now)
            }
            TransportEvent::StrategyDisconnected | TransportEvent::Closed => {
                self.apply_status(TransportStatus::Disconnected, now)
            }

            TransportEvent::Heartbeat { remote_active, .. } => {
                self.connection.on_heartbeat(remote_active, now);
                if remote_active {
                    self.mark_fresh(now);
                }
            }
        }
    }

    fn on_smoothing_timer(&mut self, now: Instant) {
        if let Some(snapshot) = self.smoothing.poll(now) {
            // wholesale replacement, never a merge
            self.applied.commit(snapshot, now);
            let _ = self.updates.send(ClientUpdate::StateCommitted);
            self.mark_fresh(now);
        }
    }

    fn on_staleness_check(&mut self, now: Instant) {
        let before = self.connection.health();
        match self.staleness.check(now) {
            Some(StalenessEvent::WentDegraded) => {
                self.connection.set_overlay(Some(FeedOverlay::Degraded));
                self.notify("data feed degraded: no fresh data", Severity::Warning, now);
            }
            Some(StalenessEvent::WentInactive) => {
                self.connection.set_overlay(Some(FeedOverlay::Inactive));
                self.notify("data feed inactive: remote stopped publishing", Severity::Error, now);
            }
            Some(StalenessEvent::Recovered) | None => {}
        }
        self.announce_health(before);
    }

    fn on_notification_expiry(&mut self, now: Instant) {
        if self.notifications.expire_due(now) > 0 {
            let _ = self.updates.send(ClientUpdate::NotificationsChanged);
        }
    }

    fn on_command_failed(&mut self, message: String, now: Instant) {
        self.notify(message, Severity::Error, now);
    }

    fn view(&self, now: Instant) -> DashboardView {
        DashboardView {
            fields: self
                .applied
                .snapshot
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            health: self.connection.health(),
            notifications: self.notifications.live(),
            last_commit_age: self.applied.committed_at.map(|t| now.duration_since(t)),
        }
    }
}

/// Forwarded off-loop so a slow engine cannot stall the client. Failure is
/// reported back into the loop as an event; no retry here.
async fn dispatch_command(
    cmd_tx: mpsc::Sender<CommandRequest>,
    loop_tx: mpsc::Sender<ClientEvent>,
    command: Command,
    reply: oneshot::Sender<CommandOutcome>,
) {
    let label = command.label();
    let (tx, rx) = oneshot::channel();

    let outcome = if cmd_tx.send(CommandRequest { command, reply: tx }).await.is_err() {
        CommandOutcome {
            success: false,
            detail: format!("{label}: transport unavailable"),
        }
    } else {
        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => CommandOutcome {
                success: false,
                detail: format!("{label}: no response from engine"),
            },
        }
    };

    if !outcome.success {
        let _ = loop_tx
            .send(ClientEvent::CommandFailed {
                message: outcome.detail.clone(),
            })
            .await;
    }

    let _ = reply.send(outcome);
}

pub fn start_client(transport: Arc<dyn Transport>, cfg: ClientConfig) -> ClientRuntime {
    let (tx, mut rx) = mpsc::channel::<ClientEvent>(1024);
    let (update_tx, _) = broadcast::channel(256);

    let mut feed = Some(transport.subscribe());
    let cmd_tx = transport.command_sender();
    transport.start();

    let loop_tx = tx.clone();
    let updates = update_tx.clone();
    let check_interval = cfg.timing.staleness_check_interval;

    tokio::spawn(async move {
        let mut state = ClientState::new(cfg, update_tx);
        let mut staleness_tick = interval(check_interval);

        info!("[CLIENT] started");

        loop {
            // deadlines re-derived each pass; arming a new one is how a
            // pending one gets cancelled
            let far = Instant::now() + Duration::from_secs(3600);
            let smooth_at = state.smoothing.next_deadline();
            let expiry_at = state.notifications.next_expiry();

            tokio::select! {
                event = recv_feed(&mut feed), if feed.is_some() => {
                    match event {
                        Ok(ev) => state.on_transport_event(ev, Instant::now()),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "feed receiver lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            state.on_transport_event(
                                TransportEvent::Closed,
                                Instant::now(),
                            );
                            feed = None;
                        }
                    }
                }

                Some(ev) = rx.recv() => match ev {
                    ClientEvent::GetView { reply } => {
                        let _ = reply.send(state.view(Instant::now()));
                    }
                    ClientEvent::Command { command, reply } => {
                        tokio::spawn(dispatch_command(
                            cmd_tx.clone(),
                            loop_tx.clone(),
                            command,
                            reply,
                        ));
                    }
                    ClientEvent::CommandFailed { message } => {
                        state.on_command_failed(message, Instant::now());
                    }
                    ClientEvent::Shutdown => break,
                },

                _ = sleep_until(to_tokio(smooth_at.unwrap_or(far))),
                    if smooth_at.is_some() =>
                {
                    state.on_smoothing_timer(Instant::now());
                }

                _ = staleness_tick.tick() => {
                    state.on_staleness_check(Instant::now());
                }

                _ = sleep_until(to_tokio(expiry_at.unwrap_or(far))),
                    if expiry_at.is_some() =>
                {
                    state.on_notification_expiry(Instant::now());
                }
            }
        }

        info!("[CLIENT] shut down");
    });

    ClientRuntime {
        sender: tx,
        updates,
    }
}

fn to_tokio(at: Instant) -> tokio::time::Instant {
    tokio::time::Instant::from_std(at)
}

/// Guarded by `feed.is_some()` in the loop; pends forever once the feed is
/// gone so the branch can never fire again.
async fn recv_feed(
    feed: &mut Option<broadcast::Receiver<TransportEvent>>,
) -> Result<TransportEvent, broadcast::error::RecvError> {
    match feed {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
