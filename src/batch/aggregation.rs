//! Ordered delivery of batch results.

use futures::future;
use futures::stream::{FusedStream, Stream, TryStreamExt};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, Span};

use crate::deadline::DeadlineArbiter;
use crate::{BatchError, Result};

/// Handle of one in-flight batch
pub(crate) type BatchHandle<R> = JoinHandle<Result<Vec<R>>>;

/// Results of a batch run, in slice order.
///
/// Every batch task is already running when the stream is created. Polling awaits
/// the tasks one by one in the order their slices were produced and yields each
/// batch's results before moving on, so a slow batch holds back itself and every
/// later batch, never an earlier one.
///
/// The first failing batch (in slice order) ends the stream with its failure;
/// later batches are not awaited. Before each task is awaited the linked token is
/// checked, and a fired token ends the stream with the classified cancellation.
///
/// Dropping the stream, or reaching its end, stops the deadline timer and cancels
/// the linked token.
pub struct BatchStream<R> {
    arbiter: Option<DeadlineArbiter>,
    pending: VecDeque<BatchHandle<R>>,
    awaiting: Option<BatchHandle<R>>,
    current: std::vec::IntoIter<R>,
    delivered: usize,
    started: Instant,
    span: Span,
}

// no field is ever pinned in place
impl<R> Unpin for BatchStream<R> {}

impl<R> BatchStream<R> {
    pub(crate) fn new(arbiter: DeadlineArbiter, pending: VecDeque<BatchHandle<R>>, span: Span) -> Self {
        Self {
            arbiter: Some(arbiter),
            pending,
            awaiting: None,
            current: Vec::new().into_iter(),
            delivered: 0,
            started: Instant::now(),
            span,
        }
    }

    /// Batches whose results have not been handed out yet
    pub fn remaining_batches(&self) -> usize {
        self.pending.len() + usize::from(self.awaiting.is_some())
    }

    /// Collect every result, in order, or the first failure
    pub async fn collect_all(self) -> Result<Vec<R>> {
        self.try_collect().await
    }

    /// Wait for every batch in order, discarding results
    pub async fn drain(self) -> Result<()> {
        self.try_for_each(|_| future::ready(Ok(()))).await
    }

    fn finish(&mut self, outcome: &str) {
        self.pending.clear();
        self.awaiting = None;
        if self.arbiter.take().is_some() {
            info!(
                parent: &self.span,
                outcome,
                batches_delivered = self.delivered,
                elapsed_ms = self.started.elapsed().as_millis(),
                "Batch run finished"
            );
        }
    }
}

impl<R> Stream for BatchStream<R> {
    type Item = Result<R>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            if let Some(item) = this.current.next() {
                return Poll::Ready(Some(Ok(item)));
            }

            let Some(arbiter) = this.arbiter.as_ref() else {
                return Poll::Ready(None);
            };

            if this.awaiting.is_none() {
                let Some(handle) = this.pending.pop_front() else {
                    this.finish("completed");
                    return Poll::Ready(None);
                };
                if let Err(err) = arbiter.check() {
                    this.finish("cancelled");
                    return Poll::Ready(Some(Err(err)));
                }
                this.awaiting = Some(handle);
            }

            let Some(handle) = this.awaiting.as_mut() else {
                continue;
            };

            let joined = match Pin::new(handle).poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(joined) => joined,
            };
            this.awaiting = None;

            match joined.map_err(BatchError::from).and_then(|res| res) {
                Ok(results) => {
                    debug!(
                        parent: &this.span,
                        batch = this.delivered,
                        results = results.len(),
                        "Batch results ready"
                    );
                    this.delivered += 1;
                    this.current = results.into_iter();
                }
                Err(err) => {
                    let err = arbiter.classify(err);
                    debug!(parent: &this.span, batch = this.delivered, error = %err, "Batch failed");
                    this.finish("failed");
                    return Poll::Ready(Some(Err(err)));
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let buffered = self.current.len();
        if self.arbiter.is_none() {
            (buffered, Some(buffered))
        } else {
            (buffered, None)
        }
    }
}

impl<R> FusedStream for BatchStream<R> {
    fn is_terminated(&self) -> bool {
        self.arbiter.is_none() && self.current.len() == 0
    }
}

impl<R> std::fmt::Debug for BatchStream<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchStream")
            .field("remaining_batches", &self.remaining_batches())
            .field("buffered", &self.current.len())
            .field("delivered", &self.delivered)
            .field("finished", &self.arbiter.is_none())
            .finish()
    }
}
