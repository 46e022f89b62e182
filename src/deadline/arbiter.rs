//! Linked cancellation with after-the-fact cause attribution.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{BatchError, Result};

/// Composes a caller's cancellation token with a deadline into one linked token.
///
/// The linked token fires when either the caller cancels or the deadline elapses.
/// The deadline keeps its own token as well, which fires before the linked one and
/// never resets, so reading it after a cancellation has been observed is enough to
/// tell the two causes apart.
///
/// Dropping the arbiter stops the deadline timer and cancels the linked token, so
/// tasks still holding it observe cancellation once their call is over.
#[derive(Debug)]
pub struct DeadlineArbiter {
    deadline: Duration,
    expired: CancellationToken,
    linked: CancellationToken,
    timer: JoinHandle<()>,
}

impl DeadlineArbiter {
    /// Start the deadline clock, linked to `external`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(deadline: Duration, external: &CancellationToken) -> Self {
        let expired = CancellationToken::new();
        let linked = external.child_token();

        let timer = tokio::spawn({
            let expired = expired.clone();
            let linked = linked.clone();
            async move {
                tokio::time::sleep(deadline).await;
                expired.cancel();
                linked.cancel();
                debug!(deadline_ms = deadline.as_millis(), "Deadline elapsed");
            }
        });

        Self {
            deadline,
            expired,
            linked,
            timer,
        }
    }

    /// Linked token handed to work functions
    pub fn token(&self) -> CancellationToken {
        self.linked.clone()
    }

    /// Deadline this arbiter was started with
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Whether the deadline's own signal has fired
    pub fn is_expired(&self) -> bool {
        self.expired.is_cancelled()
    }

    /// Whether the linked token has fired, for either reason
    pub fn is_cancelled(&self) -> bool {
        self.linked.is_cancelled()
    }

    /// Attribute a failure observed under the linked token.
    ///
    /// Cancellation-shaped failures become [`BatchError::DeadlineExceeded`] when the
    /// deadline has fired and are returned untouched otherwise. Every other failure
    /// passes through as is.
    pub fn classify(&self, err: BatchError) -> BatchError {
        if !err.is_cancelled() {
            return err;
        }

        if self.is_expired() {
            warn!(deadline_ms = self.deadline.as_millis(), "Deadline exceeded");
            BatchError::DeadlineExceeded {
                deadline: self.deadline,
                source: Box::new(err),
            }
        } else {
            warn!("Cancelled by caller");
            err
        }
    }

    /// Fail with the classified cancellation if the linked token has fired
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(self.classify(BatchError::Cancelled))
        } else {
            Ok(())
        }
    }
}

impl Drop for DeadlineArbiter {
    fn drop(&mut self) {
        self.timer.abort();
        self.linked.cancel();
    }
}
