//! Run deadline and external interrupt signalling.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tokio::sync::watch;

/// Stand-in for budgets too large to represent.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Absolute stop time shared by every worker of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
    wall: DateTime<Local>,
}

impl Deadline {
    /// Deadline `budget` from now.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        let now = Instant::now();
        let started = Local::now();
        let wall = chrono::Duration::from_std(budget)
            .ok()
            .and_then(|budget| started.checked_add_signed(budget))
            .unwrap_or(started);
        Self {
            at: now.checked_add(budget).unwrap_or_else(|| now + FAR_FUTURE),
            wall,
        }
    }

    /// Deadline `minutes` from now.
    #[must_use]
    pub fn after_minutes(minutes: u64) -> Self {
        Self::after(Duration::from_secs(minutes.saturating_mul(60)))
    }

    /// Whether the deadline has been reached.
    #[must_use]
    pub fn has_passed(&self) -> bool {
        self.has_passed_at(Instant::now())
    }

    /// Whether the deadline is reached at `now`.
    #[must_use]
    pub fn has_passed_at(&self, now: Instant) -> bool {
        now >= self.at
    }

    /// Time left, zero once passed.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Monotonic instant of the deadline.
    #[must_use]
    pub const fn instant(&self) -> Instant {
        self.at
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wall.format("%Y-%m-%d %H:%M:%S %Z"))
    }
}

/// Raises an interrupt for every listener of a run.
#[derive(Debug, Clone)]
pub struct Interrupt {
    tx: Arc<watch::Sender<bool>>,
}

/// Observes an [`Interrupt`]. Cheap to clone, one per worker.
#[derive(Debug, Clone)]
pub struct InterruptListener {
    rx: watch::Receiver<bool>,
}

impl Interrupt {
    /// Create a fresh, un-raised interrupt.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Raise the interrupt. Idempotent.
    pub fn raise(&self) {
        self.tx.send_replace(true);
    }

    /// Whether the interrupt has been raised.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        *self.tx.borrow()
    }

    /// New listener.
    #[must_use]
    pub fn listener(&self) -> InterruptListener {
        InterruptListener {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptListener {
    /// Whether the interrupt has been raised.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the interrupt is raised. Never resolves if the
    /// [`Interrupt`] is dropped un-raised.
    pub async fn raised(&mut self) {
        if self.rx.wait_for(|raised| *raised).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
