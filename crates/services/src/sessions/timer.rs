use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use quiz_core::model::QuizSettings;

/// Remaining time at or below which a countdown is shown as running low.
pub const LOW_TIME_SECS: u32 = 300;

/// Countdown configuration for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    limit_secs: u32,
}

impl TimerConfig {
    /// `None` for a zero limit.
    #[must_use]
    pub fn new(limit_secs: u32) -> Option<Self> {
        (limit_secs > 0).then_some(Self { limit_secs })
    }

    /// Timer for a fresh attempt, if the user enabled one.
    #[must_use]
    pub fn from_settings(settings: &QuizSettings) -> Option<Self> {
        if settings.timer_enabled() {
            Self::new(settings.time_limit_secs())
        } else {
            None
        }
    }

    #[must_use]
    pub fn limit_secs(&self) -> u32 {
        self.limit_secs
    }
}

/// Per-attempt countdown state, advanced one second per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    limit_secs: u32,
    remaining_secs: u32,
}

impl Countdown {
    #[must_use]
    pub fn start(config: TimerConfig) -> Self {
        Self {
            limit_secs: config.limit_secs,
            remaining_secs: config.limit_secs,
        }
    }

    /// Take one second off; returns true once the countdown has reached zero.
    pub fn tick(&mut self) -> bool {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        self.is_expired()
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining_secs == 0
    }

    #[must_use]
    pub fn limit_secs(&self) -> u32 {
        self.limit_secs
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.limit_secs - self.remaining_secs
    }

    #[must_use]
    pub fn is_low(&self) -> bool {
        self.remaining_secs <= LOW_TIME_SECS
    }
}

/// One timer tick addressed to a specific attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTick {
    pub session: u64,
}

/// Handle to a running tick source.
pub trait TickHandle: Send {
    /// Stop delivering ticks. Calling it again is a no-op.
    fn cancel(&mut self);

    fn is_cancelled(&self) -> bool;
}

/// Starts a once-per-second tick source for an attempt.
pub trait TickScheduler: Send + Sync {
    fn schedule(&self, session: u64) -> Box<dyn TickHandle>;
}

//
// ─── TOKIO INTERVAL ────────────────────────────────────────────────────────────
//

/// Delivers ticks from a tokio interval task into an mpsc channel.
#[derive(Debug, Clone)]
pub struct IntervalTicks {
    sender: mpsc::UnboundedSender<SessionTick>,
    period: Duration,
}

impl IntervalTicks {
    #[must_use]
    pub fn new(sender: mpsc::UnboundedSender<SessionTick>) -> Self {
        Self::with_period(sender, Duration::from_secs(1))
    }

    #[must_use]
    pub fn with_period(sender: mpsc::UnboundedSender<SessionTick>, period: Duration) -> Self {
        Self { sender, period }
    }

    /// Scheduler plus the receiving end the driver loop should poll.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionTick>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl TickScheduler for IntervalTicks {
    fn schedule(&self, session: u64) -> Box<dyn TickHandle> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(session, "no tokio runtime; timer ticks disabled");
            return Box::new(IntervalHandle { task: None });
        };

        let sender = self.sender.clone();
        let period = self.period;
        let task = runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if sender.send(SessionTick { session }).is_err() {
                    break;
                }
            }
        });
        debug!(session, "timer started");
        Box::new(IntervalHandle { task: Some(task) })
    }
}

struct IntervalHandle {
    task: Option<JoinHandle<()>>,
}

impl TickHandle for IntervalHandle {
    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("timer stopped");
        }
    }

    fn is_cancelled(&self) -> bool {
        self.task.is_none()
    }
}

impl Drop for IntervalHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

//
// ─── MANUAL ────────────────────────────────────────────────────────────────────
//

/// Scheduler that never fires on its own; callers feed ticks by hand.
///
/// Counts scheduled and still-running handles so callers can check that
/// only one countdown is ever live.
#[derive(Debug, Clone, Default)]
pub struct ManualTicks {
    scheduled: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
}

impl ManualTicks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn scheduled(&self) -> usize {
        self.scheduled.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

impl TickScheduler for ManualTicks {
    fn schedule(&self, _session: u64) -> Box<dyn TickHandle> {
        self.scheduled.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_add(1, Ordering::SeqCst);
        Box::new(ManualHandle {
            active: Arc::clone(&self.active),
            live: true,
        })
    }
}

struct ManualHandle {
    active: Arc<AtomicUsize>,
    live: bool,
}

impl TickHandle for ManualHandle {
    fn cancel(&mut self) {
        if self.live {
            self.live = false;
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn is_cancelled(&self) -> bool {
        !self.live
    }
}

impl Drop for ManualHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
