//! Board lifetime: remaining time-to-live and the terminal expiry transition.

mod clock;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub use clock::{Clock, ManualClock, SystemClock};

/// How long a board accepts edits after it was created.
pub fn board_lifetime() -> Duration {
    Duration::hours(24)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardPhase {
    Active,
    /// Terminal. The board is read-only and export-only.
    Expired,
}

/// One countdown update published by the ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub remaining: Duration,
    pub phase: BoardPhase,
}

impl Countdown {
    /// `HH:MM:SS` rendering of the remaining time.
    pub fn display(&self) -> String {
        format_countdown(self.remaining)
    }
}

/// Tracks the lifetime of one board.
///
/// Once expired the timer stays expired, even if the clock moves backwards.
pub struct LifecycleTimer {
    created_at: DateTime<Utc>,
    clock: Arc<dyn Clock>,
    expired: AtomicBool,
}

impl std::fmt::Debug for LifecycleTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleTimer")
            .field("created_at", &self.created_at)
            .field("expired", &self.expired.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl LifecycleTimer {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self::with_clock(created_at, Arc::new(SystemClock))
    }

    pub fn with_clock(created_at: DateTime<Utc>, clock: Arc<dyn Clock>) -> Self {
        Self {
            created_at,
            clock,
            expired: AtomicBool::new(false),
        }
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + board_lifetime()
    }

    /// `max(0, lifetime - (now - created_at))`.
    ///
    /// Pure query: it neither reads nor sets the expiry latch.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (board_lifetime() - (now - self.created_at)).max(Duration::zero())
    }

    /// Phase the board would be in at `now`. Does not latch.
    pub fn phase_at(&self, now: DateTime<Utc>) -> BoardPhase {
        phase_of(self.remaining_at(now))
    }

    /// Remaining time by the injected clock. Reaching zero latches expiry.
    pub fn remaining(&self) -> Duration {
        if self.expired.load(Ordering::SeqCst) {
            return Duration::zero();
        }
        let remaining = self.remaining_at(self.clock.now());
        if remaining.is_zero() {
            self.expired.store(true, Ordering::SeqCst);
        }
        remaining
    }

    pub fn phase(&self) -> BoardPhase {
        phase_of(self.remaining())
    }

    pub fn is_expired(&self) -> bool {
        self.phase() == BoardPhase::Expired
    }

    pub fn countdown(&self) -> Countdown {
        let remaining = self.remaining();
        Countdown {
            remaining,
            phase: phase_of(remaining),
        }
    }

    /// Publish the countdown every `period` until the board expires or every
    /// receiver is dropped.
    pub fn spawn_ticker(
        self: &Arc<Self>,
        period: std::time::Duration,
    ) -> (watch::Receiver<Countdown>, JoinHandle<()>) {
        let (sender, receiver) = watch::channel(self.countdown());
        let timer = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let countdown = timer.countdown();
                if sender.send(countdown).is_err() {
                    tracing::debug!("Countdown receivers dropped, stopping ticker");
                    break;
                }
                if countdown.phase == BoardPhase::Expired {
                    tracing::info!("Board created at {} expired", timer.created_at);
                    break;
                }
            }
        });
        (receiver, handle)
    }
}

fn phase_of(remaining: Duration) -> BoardPhase {
    if remaining.is_zero() {
        BoardPhase::Expired
    } else {
        BoardPhase::Active
    }
}

/// Render a duration as zero-padded `HH:MM:SS`. Negative durations render as zero.
pub fn format_countdown(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
