//! Two-state debounce timer for flush coalescing.
//!
//! The timer is either idle (no deadline) or pending (deadline armed).
//! Every [`Debounce::schedule`] re-arms the deadline to now + window, so a
//! burst of queued changes keeps pushing the flush out until the burst
//! stops. [`Debounce::expired`] is made to sit in a `select!` arm: it
//! completes once the armed deadline passes and never completes while idle.
//!
//! The owner decides what an expiry means; this type only keeps time.

use std::time::Duration;

use tokio::time::Instant;

/// Default window between the last queued change and the flush.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(300);

/// Idle-or-pending deadline tracker.
#[derive(Debug)]
pub struct Debounce {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Arm (or re-arm) the deadline to now + window.
    pub fn schedule(&mut self) {
        self.deadline = Some(Instant::now() + self.window);
    }

    /// Disarm without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// True while a deadline is armed.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// The configured window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Completes when the armed deadline passes; pends forever while idle.
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
