//! Event-loop driver
//!
//! Runs a [`StoryTray`] on a single task. Every state change happens in the
//! loop, one event at a time:
//! - commands from [`TrayHandle`]s
//! - fired auto-advance tickets
//! - completions of detached fetches and publishes
//! - a periodic expiry tick
//!
//! Fetches and publishes run on their own tasks and report back; the loop
//! keeps serving opens and closes meanwhile.

use crate::entry::TrayEntry;
use crate::error::{DriverError, PublishError};
use crate::model::{PublishRequest, StoryId, StoryItem};
use crate::playback::{PlaybackEvent, PlaybackState};
use crate::publish::PreparedStory;
use crate::timer::AdvanceTicket;
use crate::tray::StoryTray;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Command queue depth per driver
const COMMAND_BUFFER: usize = 64;

/// Point-in-time view of the tray
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraySnapshot {
    /// Strip entries, newest first
    pub entries: Vec<TrayEntry>,
    /// Playback state
    pub playback: PlaybackState,
    /// Story being shown, if any
    pub current: Option<StoryItem>,
    /// Whether a publish is in flight
    pub publishing: bool,
}

/// Messages sent to the driver
#[derive(Debug)]
enum TrayCommand {
    Open {
        id: StoryId,
        reply: oneshot::Sender<PlaybackEvent>,
    },
    Close {
        reply: oneshot::Sender<PlaybackEvent>,
    },
    Publish {
        request: PublishRequest,
        reply: oneshot::Sender<Result<StoryItem, PublishError>>,
    },
    Reconcile,
    Snapshot {
        reply: oneshot::Sender<TraySnapshot>,
    },
    Shutdown,
}

/// Results of detached work
enum Completion {
    Fetched(Option<Vec<StoryItem>>),
    Published {
        outcome: Result<PreparedStory, PublishError>,
        reply: oneshot::Sender<Result<StoryItem, PublishError>>,
    },
}

/// Handle for talking to a running tray
#[derive(Debug, Clone)]
pub struct TrayHandle {
    commands: mpsc::Sender<TrayCommand>,
}

impl TrayHandle {
    /// Open a story
    pub async fn open(&self, id: impl Into<StoryId>) -> Result<PlaybackEvent, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.send(TrayCommand::Open {
            id: id.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| DriverError::Stopped)
    }

    /// Close playback
    pub async fn close(&self) -> Result<PlaybackEvent, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.send(TrayCommand::Close { reply }).await?;
        rx.await.map_err(|_| DriverError::Stopped)
    }

    /// Publish a story and wait for it to land
    ///
    /// The outer error means the driver is gone; the inner one is the publish
    /// outcome.
    pub async fn publish(
        &self,
        request: PublishRequest,
    ) -> Result<Result<StoryItem, PublishError>, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.send(TrayCommand::Publish { request, reply }).await?;
        rx.await.map_err(|_| DriverError::Stopped)
    }

    /// Start a background reconciliation
    pub async fn reconcile(&self) -> Result<(), DriverError> {
        self.send(TrayCommand::Reconcile).await
    }

    /// Current view of the tray
    pub async fn snapshot(&self) -> Result<TraySnapshot, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.send(TrayCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| DriverError::Stopped)
    }

    /// Stop the driver
    pub async fn shutdown(&self) -> Result<(), DriverError> {
        self.send(TrayCommand::Shutdown).await
    }

    async fn send(&self, command: TrayCommand) -> Result<(), DriverError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| DriverError::Stopped)
    }
}

/// Run `tray` on a new task
///
/// `tickets` must be the receiver paired with the tray's timer factory. A
/// reconciliation starts immediately. The task returns the tray when every
/// handle is dropped or [`TrayHandle::shutdown`] is called, after publishes
/// already under way have been applied.
pub fn spawn_tray(
    tray: StoryTray,
    tickets: mpsc::UnboundedReceiver<AdvanceTicket>,
) -> (TrayHandle, JoinHandle<StoryTray>) {
    spawn(tray, tickets, true)
}

/// Run a tray that was just reconciled, without fetching again on start
pub fn spawn_reconciled_tray(
    tray: StoryTray,
    tickets: mpsc::UnboundedReceiver<AdvanceTicket>,
) -> (TrayHandle, JoinHandle<StoryTray>) {
    spawn(tray, tickets, false)
}

fn spawn(
    tray: StoryTray,
    tickets: mpsc::UnboundedReceiver<AdvanceTicket>,
    fetch_first: bool,
) -> (TrayHandle, JoinHandle<StoryTray>) {
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let task = tokio::spawn(run(tray, rx, tickets, fetch_first));
    (TrayHandle { commands: tx }, task)
}

async fn run(
    mut tray: StoryTray,
    mut commands: mpsc::Receiver<TrayCommand>,
    mut tickets: mpsc::UnboundedReceiver<AdvanceTicket>,
    fetch_first: bool,
) -> StoryTray {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
    let mut publishes_in_flight = 0usize;
    let mut expiry = tokio::time::interval(tray.config().expiry_check());
    expiry.set_missed_tick_behavior(MissedTickBehavior::Delay);

    if fetch_first {
        spawn_fetch(&tray, &done_tx);
    }

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                if !handle_command(&mut tray, command, &done_tx, &mut publishes_in_flight).await {
                    break;
                }
            }
            Some(ticket) = tickets.recv() => {
                tray.on_advance(ticket).await;
            }
            Some(done) = done_rx.recv() => match done {
                Completion::Fetched(Some(remote)) => {
                    tray.apply_remote(remote).await;
                }
                Completion::Fetched(None) => {}
                Completion::Published { outcome, reply } => {
                    publishes_in_flight -= 1;
                    let _ = reply.send(tray.finish_publish(outcome).await);
                }
            },
            _ = expiry.tick() => {
                tray.refresh().await;
            }
        }
    }

    // Uploads already started still land in the tray.
    if publishes_in_flight > 0 {
        tracing::info!("Waiting for {} publish(es) before stopping", publishes_in_flight);
    }
    while publishes_in_flight > 0 {
        match done_rx.recv().await {
            Some(Completion::Published { outcome, reply }) => {
                publishes_in_flight -= 1;
                let _ = reply.send(tray.finish_publish(outcome).await);
            }
            Some(Completion::Fetched(_)) => {}
            None => break,
        }
    }

    tray.close();
    tracing::debug!("Tray driver stopped");
    tray
}

/// Returns `false` when the loop should stop
async fn handle_command(
    tray: &mut StoryTray,
    command: TrayCommand,
    done: &mpsc::UnboundedSender<Completion>,
    publishes_in_flight: &mut usize,
) -> bool {
    match command {
        TrayCommand::Open { id, reply } => {
            let _ = reply.send(tray.open(&id).await);
        }
        TrayCommand::Close { reply } => {
            let _ = reply.send(tray.close());
        }
        TrayCommand::Publish { request, reply } => match tray.begin_publish(request) {
            Ok(prepare) => {
                let done = done.clone();
                *publishes_in_flight += 1;
                let upload = tokio::spawn(prepare);
                tokio::spawn(async move {
                    let outcome = upload.await.unwrap_or_else(|e| {
                        tracing::error!("Publish task failed: {}", e);
                        Err(PublishError::Cancelled)
                    });
                    let _ = done.send(Completion::Published { outcome, reply });
                });
            }
            Err(e) => {
                let _ = reply.send(Err(e));
            }
        },
        TrayCommand::Reconcile => spawn_fetch(tray, done),
        TrayCommand::Snapshot { reply } => {
            let _ = reply.send(TraySnapshot {
                entries: tray.entries(),
                playback: tray.playback_state().clone(),
                current: tray.current_story(),
                publishing: tray.is_publishing(),
            });
        }
        TrayCommand::Shutdown => return false,
    }
    true
}

// Overlapping fetches are fine: merging is a union keyed by id.
fn spawn_fetch(tray: &StoryTray, done: &mpsc::UnboundedSender<Completion>) {
    let fetch = tray.fetch_task();
    let done = done.clone();
    tokio::spawn(async move {
        let _ = done.send(Completion::Fetched(fetch.await));
    });
}
