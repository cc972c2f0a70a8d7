//! Periodic status poller.
//!
//! Re-fetches `/voting-status` on a fixed interval and, while results are
//! visible, `/get-votes` as well. Each tick emits one event; fetch failures
//! become events too, with no retry beyond the next tick.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::VotingStatus;
use crate::tally::OptionCount;

use super::{ClientError, VotingClient};

/// Default poll cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Poller configuration.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Time between polls.
    pub interval: Duration,
    /// Event channel capacity; a slow consumer back-pressures the poller.
    pub channel_capacity: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            channel_capacity: 16,
        }
    }
}

impl PollerConfig {
    /// Read the cadence from `POLL_INTERVAL_SECS`, defaulting to 5 seconds.
    pub fn from_env() -> Self {
        let interval = std::env::var("POLL_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        Self {
            interval,
            ..Self::default()
        }
    }
}

/// One poll outcome.
#[derive(Debug)]
pub enum PollEvent {
    /// A fetched status, with counts when results are visible.
    Snapshot {
        status: VotingStatus,
        /// Present only while `status.display_results` is set.
        results: Option<Vec<OptionCount>>,
    },
    /// The fetch failed; the poller keeps ticking.
    Failed(ClientError),
}

/// Control messages for a running poller.
#[derive(Debug)]
enum PollerMessage {
    Stop,
}

/// Handle for stopping a running poller.
pub struct PollerHandle {
    control_tx: mpsc::Sender<PollerMessage>,
    join: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop the poller and wait for its task to finish.
    pub async fn stop(self) {
        // A poller that already exited has dropped its receiver; that is
        // still a clean stop.
        let _ = self.control_tx.send(PollerMessage::Stop).await;
        let _ = self.join.await;
    }

    /// Whether the poller task is still running.
    pub fn is_running(&self) -> bool {
        !self.join.is_finished()
    }
}

/// Periodically fetches voting status and results.
pub struct StatusPoller {
    client: VotingClient,
    config: PollerConfig,
}

impl StatusPoller {
    pub fn new(client: VotingClient, config: PollerConfig) -> Self {
        Self { client, config }
    }

    /// Spawn the poll loop.
    ///
    /// Returns a stop handle and the event stream. The loop exits on
    /// [`PollerHandle::stop`] or when the receiver is dropped.
    pub fn spawn(self) -> (PollerHandle, mpsc::Receiver<PollEvent>) {
        let (event_tx, event_rx) = mpsc::channel(self.config.channel_capacity);
        let (control_tx, control_rx) = mpsc::channel(1);

        let join = tokio::spawn(run_loop(self.client, self.config, event_tx, control_rx));

        (PollerHandle { control_tx, join }, event_rx)
    }
}

async fn run_loop(
    client: VotingClient,
    config: PollerConfig,
    event_tx: mpsc::Sender<PollEvent>,
    mut control_rx: mpsc::Receiver<PollerMessage>,
) {
    info!(interval_secs = config.interval.as_secs(), "starting status poller");

    let mut ticker = interval(config.interval);
    // A stalled consumer should not cause a burst of catch-up polls.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let event = poll_once(&client).await;
                if let PollEvent::Failed(ref e) = event {
                    warn!(error = %e, "status poll failed");
                }
                if event_tx.send(event).await.is_err() {
                    debug!("poll consumer dropped, stopping");
                    break;
                }
            }
            msg = control_rx.recv() => {
                match msg {
                    Some(PollerMessage::Stop) | None => {
                        info!("status poller stopping");
                        break;
                    }
                }
            }
        }
    }
}

async fn poll_once(client: &VotingClient) -> PollEvent {
    let status = match client.voting_status().await {
        Ok(status) => status,
        Err(e) => return PollEvent::Failed(e),
    };

    let results = if status.display_results {
        match client.get_votes().await {
            Ok(response) => Some(response.vote_counts),
            Err(e) => return PollEvent::Failed(e),
        }
    } else {
        None
    };

    PollEvent::Snapshot { status, results }
}
