//! In-process host runtime: one tokio task per match.
//!
//! The task owns the [`MatchController`] and is the only consumer of the
//! command queue, so hooks never run concurrently for the same match.
//! Move messages are buffered and handed to `tick` on the next interval.
//!
//! Hooks call the store synchronously. On a multi-threaded runtime each
//! hook runs under [`tokio::task::block_in_place`], so a locked database
//! stalls only this match; a current-thread runtime runs hooks inline.

use std::collections::HashMap;
use std::time::Duration;

use derive_more::{Display, Error};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, trace};

use crate::broadcast::{Broadcast, Broadcaster};
use crate::controller::MatchController;
use crate::effects::EffectFailure;
use crate::messages::{MatchData, Presence};
use crate::service::JoinRejection;
use crate::session::SessionState;

/// Broadcasts pending per subscriber before the slowest one starts lagging.
pub const BROADCAST_CAPACITY: usize = 64;

/// The match task has stopped and can no longer take commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("match task is no longer running")]
pub struct RuntimeClosed;

/// Broadcaster that fans messages out over a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct ChannelBroadcaster {
    tx: broadcast::Sender<Broadcast>,
}

impl ChannelBroadcaster {
    /// Creates a channel holding up to `capacity` undelivered messages.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// New receiver for everything broadcast from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Broadcast> {
        self.tx.subscribe()
    }
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new(BROADCAST_CAPACITY)
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn broadcast(&self, message: Broadcast) {
        let op_code = message.op_code();
        if self.tx.send(message).is_err() {
            trace!(%op_code, "No subscribers for broadcast");
        }
    }
}

enum Command {
    JoinAttempt {
        presence: Presence,
        metadata: HashMap<String, String>,
        reply: oneshot::Sender<Result<(), JoinRejection>>,
    },
    Join {
        presences: Vec<Presence>,
        reply: oneshot::Sender<()>,
    },
    Leave {
        presences: Vec<Presence>,
        reply: oneshot::Sender<()>,
    },
    Send(MatchData),
    Signal {
        raw: String,
        reply: oneshot::Sender<String>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionState>,
    },
    DrainEffects {
        reply: oneshot::Sender<Vec<EffectFailure>>,
    },
    Terminate {
        grace_seconds: u64,
        reply: oneshot::Sender<SessionState>,
    },
}

/// Spawns match tasks.
pub struct MatchRuntime;

impl MatchRuntime {
    /// Starts the task for `controller`, ticking every
    /// `tick_interval_secs` seconds.
    ///
    /// `broadcaster` must be the one the controller's collaborators
    /// broadcast through, so that subscribers see the match's messages.
    #[instrument(skip(controller, broadcaster), fields(match_id = %controller.state().match_id()))]
    pub fn spawn(
        controller: MatchController,
        tick_interval_secs: u64,
        broadcaster: &ChannelBroadcaster,
    ) -> MatchHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let period = Duration::from_secs(tick_interval_secs.max(1));
        let task = tokio::spawn(run(controller, rx, period));
        info!(?period, "Match task spawned");
        MatchHandle {
            tx,
            broadcasts: broadcaster.clone(),
            task,
        }
    }
}

/// Runs a hook that may block on store I/O.
fn blocking<T>(hook: impl FnOnce() -> T) -> T {
    match Handle::current().runtime_flavor() {
        RuntimeFlavor::MultiThread => tokio::task::block_in_place(hook),
        _ => hook(),
    }
}

async fn run(
    mut controller: MatchController,
    mut rx: mpsc::UnboundedReceiver<Command>,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    let mut queued: Vec<MatchData> = Vec::new();
    loop {
        tokio::select! {
            command = rx.recv() => {
                let Some(command) = command else {
                    debug!("All handles dropped, stopping match task");
                    let _ = blocking(|| controller.terminate(0));
                    return;
                };
                match command {
                    Command::JoinAttempt { presence, metadata, reply } => {
                        let _ = reply.send(blocking(|| controller.join_attempt(&presence, &metadata)));
                    }
                    Command::Join { presences, reply } => {
                        blocking(|| controller.join(&presences));
                        let _ = reply.send(());
                    }
                    Command::Leave { presences, reply } => {
                        blocking(|| controller.leave(&presences));
                        let _ = reply.send(());
                    }
                    Command::Send(data) => queued.push(data),
                    Command::Signal { raw, reply } => {
                        let _ = reply.send(blocking(|| controller.signal(&raw)));
                    }
                    Command::Snapshot { reply } => {
                        let _ = reply.send(controller.state().clone());
                    }
                    Command::DrainEffects { reply } => {
                        let _ = reply.send(controller.drain_effect_failures());
                    }
                    Command::Terminate { grace_seconds, reply } => {
                        let _ = reply.send(blocking(|| controller.terminate(grace_seconds)));
                        return;
                    }
                }
            }
            _ = ticker.tick() => {
                let now = controller.now();
                let messages = std::mem::take(&mut queued);
                blocking(|| controller.tick(now, &messages));
            }
        }
    }
}

/// Handle to a running match task.
pub struct MatchHandle {
    tx: mpsc::UnboundedSender<Command>,
    broadcasts: ChannelBroadcaster,
    task: JoinHandle<()>,
}

impl MatchHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RuntimeClosed> {
        let (reply, response) = oneshot::channel();
        self.tx.send(build(reply)).map_err(|_| RuntimeClosed)?;
        response.await.map_err(|_| RuntimeClosed)
    }

    /// Receiver for every broadcast the match sends from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Broadcast> {
        self.broadcasts.subscribe()
    }

    /// Asks whether `presence` may join.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeClosed`] if the task has stopped.
    pub async fn join_attempt(
        &self,
        presence: Presence,
        metadata: HashMap<String, String>,
    ) -> Result<Result<(), JoinRejection>, RuntimeClosed> {
        self.request(|reply| Command::JoinAttempt {
            presence,
            metadata,
            reply,
        })
        .await
    }

    /// Seats presences.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeClosed`] if the task has stopped.
    pub async fn join(&self, presences: Vec<Presence>) -> Result<(), RuntimeClosed> {
        self.request(|reply| Command::Join { presences, reply }).await
    }

    /// Reports departed presences.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeClosed`] if the task has stopped.
    pub async fn leave(&self, presences: Vec<Presence>) -> Result<(), RuntimeClosed> {
        self.request(|reply| Command::Leave { presences, reply }).await
    }

    /// Queues match data for the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeClosed`] if the task has stopped.
    pub fn send(&self, data: MatchData) -> Result<(), RuntimeClosed> {
        self.tx.send(Command::Send(data)).map_err(|_| RuntimeClosed)
    }

    /// Delivers a signal and returns its result string.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeClosed`] if the task has stopped.
    pub async fn signal(&self, raw: impl Into<String>) -> Result<String, RuntimeClosed> {
        let raw = raw.into();
        self.request(|reply| Command::Signal { raw, reply }).await
    }

    /// Copy of the current state.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeClosed`] if the task has stopped.
    pub async fn snapshot(&self) -> Result<SessionState, RuntimeClosed> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Removes and returns recorded side-effect failures.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeClosed`] if the task has stopped.
    pub async fn drain_effect_failures(&self) -> Result<Vec<EffectFailure>, RuntimeClosed> {
        self.request(|reply| Command::DrainEffects { reply }).await
    }

    /// Stops the task and returns the final state.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeClosed`] if the task had already stopped.
    pub async fn terminate(self, grace_seconds: u64) -> Result<SessionState, RuntimeClosed> {
        let state = self
            .request(|reply| Command::Terminate {
                grace_seconds,
                reply,
            })
            .await?;
        let _ = self.task.await;
        Ok(state)
    }
}
