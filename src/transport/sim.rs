use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::time::{sleep, Duration};
use tracing::info;

use crate::health::connection::TransportStatus;
use crate::transport::types::{CommandOutcome, CommandRequest, TransportEvent};
use crate::transport::Transport;

struct SimTransportInner {
    cmd_rx: mpsc::Receiver<CommandRequest>,
}

/// Scripted in-process feed so the dashboard runs end-to-end without a
/// live engine: connect handshake, drifting snapshots with heartbeats, a
/// stall window long enough to trip the staleness monitor, then recovery.
pub struct SimTransport {
    cmd_tx: mpsc::Sender<CommandRequest>,
    feed_tx: broadcast::Sender<TransportEvent>,
    inner: Arc<Mutex<SimTransportInner>>,
}

impl SimTransport {
    pub fn new() -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let (feed_tx, _) = broadcast::channel(1024);
        Self {
            cmd_tx,
            feed_tx,
            inner: Arc::new(Mutex::new(SimTransportInner { cmd_rx })),
        }
    }

    async fn run_feed(feed_tx: broadcast::Sender<TransportEvent>) {
        let _ = feed_tx.send(TransportEvent::ConnectionStatus {
            status: TransportStatus::Connecting,
        });
        sleep(Duration::from_millis(300)).await;
        let _ = feed_tx.send(TransportEvent::StrategyConnected);

        let mut price = dec!(104250.0);
        let mut confidence = dec!(0.58);
        let mut side = "Flat";
        let mut tick: u64 = 0;

        loop {
            tick += 1;

            // drift the price, wobble the model score
            price += Decimal::from(tick % 7) - dec!(3);
            confidence += if tick % 2 == 0 { dec!(0.004) } else { dec!(-0.003) };

            if tick % 40 == 0 {
                side = match side {
                    "Flat" => "Long",
                    "Long" => "Short",
                    _ => "Flat",
                };
            }

            // wire numbers go out as plain JSON numbers, not decimal strings
            let num = |d: Decimal| d.to_f64().unwrap_or_default();
            let payload = json!({
                "v": 1,
                "data": {
                    "price": num(price),
                    "position_side": side,
                    "position_size": if side == "Flat" { 0.0 } else { 0.25 },
                    "realized_pnl": (tick / 40) as f64,
                    "unrealized_pnl": (tick % 11) as f64 - 5.0,
                    "model_confidence": num(confidence),
                    "strategy_mode": "auto",
                }
            });
            let _ = feed_tx.send(TransportEvent::StrategyData { payload });

            if tick % 10 == 0 {
                let _ = feed_tx.send(TransportEvent::Heartbeat {
                    remote_active: true,
                    timestamp_ms: tick * 250,
                });
            }

            // simulate a zombie feed: socket stays open, publishing stops
            if tick % 600 == 0 {
                info!("[SIM] feed stalling");
                sleep(Duration::from_secs(150)).await;
                info!("[SIM] feed resuming");
            }

            sleep(Duration::from_millis(250)).await;
        }
    }
}

impl Default for SimTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SimTransport {
    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.feed_tx.subscribe()
    }

    fn command_sender(&self) -> mpsc::Sender<CommandRequest> {
        self.cmd_tx.clone()
    }

    fn start(self: Arc<Self>) {
        let feed_tx = self.feed_tx.clone();
        tokio::spawn(Self::run_feed(feed_tx));

        let inner = self.inner.clone();
        tokio::spawn(async move {
            let mut inner = inner.lock().await;

            while let Some(req) = inner.cmd_rx.recv().await {
                info!("[SIM] command {}", req.command.label());
                sleep(Duration::from_millis(80)).await;
                let _ = req.reply.send(CommandOutcome {
                    success: true,
                    detail: format!("{} acknowledged", req.command.label()),
                });
            }
        });
    }
}
