//! # deadline-batch
//!
//! Deadline-aware batch fan-out on top of Tokio.
//!
//! ## Overview
//!
//! Given a sequence of items, the crate splits it into fixed-size slices, spawns one
//! task per slice right away, and hands the results back in the order the slices were
//! produced. One wall-clock deadline covers the whole call, and the caller's own
//! [`CancellationToken`] is honored alongside it. Both arrive at the work functions as
//! a single linked token, yet the caller always learns which one fired:
//! [`BatchError::DeadlineExceeded`] for the deadline, [`BatchError::Cancelled`] for
//! the caller's token.
//!
//! ## Quick Start
//!
//! ```rust
//! use deadline_batch::{work, BatchRunner, BatchError};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> deadline_batch::Result<()> {
//! let runner = BatchRunner::new()
//!     .with_batch_size(10)
//!     .with_deadline(Duration::from_secs(10));
//!
//! let doubled = runner
//!     .run_batches(
//!         0..100u32,
//!         work::flat(|slice: Vec<u32>, _token: CancellationToken| async move {
//!             Ok::<_, BatchError>(slice.into_iter().map(|n| n * 2).collect())
//!         }),
//!         &CancellationToken::new(),
//!     )
//!     .collect_all()
//!     .await?;
//!
//! assert_eq!(doubled.len(), 100);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`partition`]: single-pass splitting of iterators and streams into slices
//! - [`deadline`]: deadline arbitration and the single-unit [`run_with_deadline`] helper
//! - [`batch`]: batch fan-out, work shapes and ordered result delivery

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

use std::time::Duration;

use thiserror::Error;

pub use tokio_util::sync::CancellationToken;

/// Result type for batch operations
pub type Result<T> = std::result::Result<T, BatchError>;

/// Main error type for batch operations
#[derive(Error, Debug)]
pub enum BatchError {
    /// The shared deadline fired before the work completed
    #[error("Deadline of {deadline:?} exceeded")]
    DeadlineExceeded {
        /// Deadline configured for the call
        deadline: Duration,
        /// Cancellation failure that was reclassified
        #[source]
        source: Box<BatchError>,
    },

    /// The operation was cancelled through its cancellation token
    #[error("Operation cancelled")]
    Cancelled,

    /// Failure raised by a work function
    #[error("Work error: {0}")]
    Work(#[from] anyhow::Error),

    /// A batch task panicked
    #[error("Async join error: {0}")]
    Join(tokio::task::JoinError),
}

impl BatchError {
    /// Wrap any error raised by a work function
    pub fn work<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        BatchError::Work(err.into())
    }

    /// Whether this failure is cancellation-shaped and still open to classification
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BatchError::Cancelled)
    }

    /// Whether this failure was attributed to the deadline
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, BatchError::DeadlineExceeded { .. })
    }
}

impl From<tokio::task::JoinError> for BatchError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            BatchError::Cancelled
        } else {
            BatchError::Join(err)
        }
    }
}

/// Splitting sequences into fixed-size slices
pub mod partition;

/// Deadline arbitration and single-unit deadline runner
pub mod deadline;

/// Batch scheduling and ordered result aggregation
pub mod batch;

pub use batch::{run_batches, work, BatchConfig, BatchRunner, BatchStream, BatchWork};
pub use deadline::{run_with_deadline, DeadlineArbiter};
pub use partition::{partition, partition_stream, Partition, PartitionExt};

/// Commonly used items
pub mod prelude {
    pub use crate::batch::{work, BatchConfig, BatchRunner, BatchStream, BatchWork};
    pub use crate::deadline::{run_with_deadline, DeadlineArbiter};
    pub use crate::partition::{partition, partition_stream, PartitionExt};
    pub use crate::{BatchError, CancellationToken, Result};
}
