//! Batch fan-out: partition the input, spawn one task per slice, hand back an
//! ordered [`BatchStream`].
//!
//! Every task is spawned before any is awaited, so N batches of equal cost take
//! roughly as long as one. There is deliberately no concurrency cap; Tokio's worker
//! pool is the only limit.

use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::batch::aggregation::{BatchHandle, BatchStream};
use crate::batch::types::BatchConfig;
use crate::batch::work::{self, BatchWork};
use crate::deadline::DeadlineArbiter;
use crate::partition::{partition, partition_stream};
use crate::{BatchError, Result};

/// Runs work over fixed-size slices of an input under one shared deadline
#[derive(Debug, Clone, Default)]
pub struct BatchRunner {
    config: BatchConfig,
}

impl BatchRunner {
    /// Create a new batch runner with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a batch runner from an existing configuration
    pub fn from_config(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Set the number of items per batch
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Set the deadline shared by the whole call
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.config.deadline = deadline;
        self
    }

    /// Current configuration
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Spawn one task per slice of `items` and return their results in slice order.
    ///
    /// The deadline starts now, and every batch task is already running when this
    /// returns. Must be called from within a Tokio runtime.
    pub fn run_batches<I, T, R, W>(
        &self,
        items: I,
        work: W,
        cancel: &CancellationToken,
    ) -> BatchStream<R>
    where
        I: IntoIterator<Item = T>,
        T: Send + 'static,
        R: Send + 'static,
        W: BatchWork<T, R>,
    {
        let (arbiter, span) = self.begin(cancel);
        let token = arbiter.token();
        let work = Arc::new(work);

        let pending: VecDeque<_> = partition(items, self.config.batch_size)
            .enumerate()
            .map(|(index, slice)| spawn_batch(index, slice, &work, token.clone(), &span))
            .collect();

        info!(parent: &span, batches = pending.len(), "Launched all batches");
        BatchStream::new(arbiter, pending, span)
    }

    /// Like [`run_batches`](Self::run_batches), with items pulled from a stream.
    ///
    /// Each slice's task is spawned as soon as the slice is complete. Pulling from
    /// the source is bounded by the same deadline and token; if either fires first
    /// the call fails with the classified cancellation and the tasks spawned so far
    /// see their token fire.
    pub async fn run_stream_batches<S, T, R, W>(
        &self,
        source: S,
        work: W,
        cancel: &CancellationToken,
    ) -> Result<BatchStream<R>>
    where
        S: Stream<Item = T> + Send,
        T: Send + 'static,
        R: Send + 'static,
        W: BatchWork<T, R>,
    {
        let (arbiter, span) = self.begin(cancel);
        let token = arbiter.token();
        let work = Arc::new(work);

        let mut slices = partition_stream(source, self.config.batch_size);
        let mut pending = VecDeque::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    let err = arbiter.classify(BatchError::Cancelled);
                    warn!(parent: &span, launched = pending.len(), "Source abandoned before it was exhausted");
                    return Err(err);
                }
                next = slices.next() => next,
            };

            match next {
                Some(slice) => {
                    let index = pending.len();
                    pending.push_back(spawn_batch(index, slice, &work, token.clone(), &span));
                }
                None => break,
            }
        }

        info!(parent: &span, batches = pending.len(), "Launched all batches");
        Ok(BatchStream::new(arbiter, pending, span))
    }

    /// Run work with no result over every slice, failing on the first failure in
    /// slice order
    pub async fn run<I, T, F, Fut>(&self, items: I, f: F, cancel: &CancellationToken) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Send + 'static,
        F: Fn(Vec<T>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.run_batches(items, work::unit(f), cancel).drain().await
    }

    /// Run work over every slice and collect all results in order
    pub async fn collect<I, T, R, W>(
        &self,
        items: I,
        work: W,
        cancel: &CancellationToken,
    ) -> Result<Vec<R>>
    where
        I: IntoIterator<Item = T>,
        T: Send + 'static,
        R: Send + 'static,
        W: BatchWork<T, R>,
    {
        self.run_batches(items, work, cancel).collect_all().await
    }

    fn begin(&self, cancel: &CancellationToken) -> (DeadlineArbiter, Span) {
        let span = info_span!(
            "batch_run",
            run_id = %Uuid::new_v4(),
            batch_size = self.config.batch_size,
            deadline_ms = self.config.deadline.as_millis() as u64,
        );

        if self.config.batch_size == 0 {
            warn!(parent: &span, "Batch size is zero, no batches will run");
        }
        debug!(parent: &span, "Starting batch run");

        (DeadlineArbiter::start(self.config.deadline, cancel), span)
    }
}

/// Run `work` over `items` in slices of `batch_size`, under `deadline` and `cancel`.
///
/// Shorthand for a [`BatchRunner`] built from the arguments.
pub fn run_batches<I, T, R, W>(
    items: I,
    batch_size: usize,
    work: W,
    deadline: Duration,
    cancel: &CancellationToken,
) -> BatchStream<R>
where
    I: IntoIterator<Item = T>,
    T: Send + 'static,
    R: Send + 'static,
    W: BatchWork<T, R>,
{
    BatchRunner::new()
        .with_batch_size(batch_size)
        .with_deadline(deadline)
        .run_batches(items, work, cancel)
}

fn spawn_batch<T, R, W>(
    index: usize,
    slice: Vec<T>,
    work: &Arc<W>,
    token: CancellationToken,
    span: &Span,
) -> BatchHandle<R>
where
    T: Send + 'static,
    R: Send + 'static,
    W: BatchWork<T, R>,
{
    let work = Arc::clone(work);
    let items = slice.len();
    debug!(parent: span, batch = index, items, "Launching batch");

    tokio::spawn(
        async move {
            if token.is_cancelled() {
                return Err(BatchError::Cancelled);
            }
            let result = work.call(slice, token).await;
            debug!(batch = index, ok = result.is_ok(), "Batch task done");
            result
        }
        .instrument(span.clone()),
    )
}
