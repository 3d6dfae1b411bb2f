use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    Tick { remaining_secs: u32 },
    /// Sent once, after the tick that reaches zero. The task ends with it.
    Expired,
}

/// Whole-attempt countdown running as its own task.
///
/// Remaining time is read off a fixed deadline, so a receiver that falls
/// behind loses ticks but never stretches the limit. Dropping the handle
/// cancels the task.
#[derive(Debug)]
pub struct Countdown {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn start(total_secs: u32, events: mpsc::Sender<CountdownEvent>) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let started = Instant::now();
        let first_tick = started + TICK;
        let deadline = started + TICK * total_secs;

        let handle = tokio::spawn(async move {
            let mut remaining = total_secs;
            let mut ticker = interval_at(first_tick, TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            while remaining > 0 {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tracing::debug!(remaining, "countdown cancelled");
                        return;
                    }
                    _ = ticker.tick() => {}
                }

                remaining = secs_until(deadline);
                match events.try_send(CountdownEvent::Tick { remaining_secs: remaining }) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::debug!(remaining, "tick dropped, receiver is behind");
                    }
                    Err(TrySendError::Closed(_)) => return,
                }
            }

            tracing::info!("countdown reached zero");
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = events.send(CountdownEvent::Expired) => {}
            }
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the task to wind down after cancellation or expiry.
    pub async fn join(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

/// Whole seconds left before `deadline`, rounded up.
fn secs_until(deadline: Instant) -> u32 {
    let left = deadline.saturating_duration_since(Instant::now());
    left.as_millis().div_ceil(1_000) as u32
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
