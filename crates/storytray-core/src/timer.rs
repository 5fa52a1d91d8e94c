//! Auto-advance timers
//!
//! A timer is armed with a ticket. When it fires, the ticket is delivered to
//! whoever drives the tray, which hands it back to the playback machine.
//! Cancelling (or dropping) the handle stops delivery.

use std::fmt::Debug;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Identifies the armed timer a notification belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdvanceTicket {
    /// Playback generation at arm time
    pub generation: u64,
}

/// Handle to an armed timer
pub trait PendingTimer: Send + Sync + Debug {
    /// Stop the timer. A ticket already delivered is not recalled.
    fn cancel(self: Box<Self>);
}

/// Arms auto-advance timers
pub trait TimerFactory: Send + Sync + Debug {
    /// Deliver `ticket` after `delay` unless cancelled first
    fn arm(&self, delay: Duration, ticket: AdvanceTicket) -> Box<dyn PendingTimer>;
}

/// Timers backed by the tokio runtime
///
/// Fired tickets are sent on the channel returned by [`TokioTimers::new`].
#[derive(Debug, Clone)]
pub struct TokioTimers {
    tickets: mpsc::UnboundedSender<AdvanceTicket>,
}

impl TokioTimers {
    /// Create timers and the receiver fired tickets arrive on
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AdvanceTicket>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tickets: tx }, rx)
    }
}

impl TimerFactory for TokioTimers {
    fn arm(&self, delay: Duration, ticket: AdvanceTicket) -> Box<dyn PendingTimer> {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let tickets = self.tickets.clone();

        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(delay) => {
                    let _ = tickets.send(ticket);
                }
                _ = cancel_rx => {
                    tracing::trace!(generation = ticket.generation, "Advance timer cancelled");
                }
            }
        });

        Box::new(TokioPendingTimer { cancel: cancel_tx })
    }
}

/// Armed tokio timer; dropping the sender also cancels it
#[derive(Debug)]
struct TokioPendingTimer {
    cancel: oneshot::Sender<()>,
}

impl PendingTimer for TokioPendingTimer {
    fn cancel(self: Box<Self>) {
        let _ = self.cancel.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let (timers, mut rx) = TokioTimers::new();
        let _timer = timers.arm(Duration::from_secs(6), AdvanceTicket { generation: 3 });

        tokio::time::sleep(Duration::from_millis(5_900)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(rx.try_recv().unwrap(), AdvanceTicket { generation: 3 });
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let (timers, mut rx) = TokioTimers::new();
        let timer = timers.arm(Duration::from_secs(6), AdvanceTicket { generation: 1 });
        timer.cancel();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_cancels() {
        let (timers, mut rx) = TokioTimers::new();
        drop(timers.arm(Duration::from_secs(1), AdvanceTicket { generation: 1 }));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
    }
}
