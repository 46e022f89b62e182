use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::DeadlineArbiter;
use crate::{BatchError, Result};

/// Run a single unit of work under a deadline and the caller's cancellation token.
///
/// `work` receives the linked token and runs on its own task. The task is raced
/// against the linked token, so work that never looks at its token still ends up
/// bounded by the deadline: the call returns as soon as either token fires, and
/// the abandoned task is left to finish on its own.
///
/// Returns [`BatchError::DeadlineExceeded`] when the deadline fired first,
/// [`BatchError::Cancelled`] when the caller cancelled, and any other failure of
/// `work` unchanged.
#[instrument(skip(work, cancel), fields(deadline_ms = deadline.as_millis()))]
pub async fn run_with_deadline<F, Fut, T>(
    work: F,
    deadline: Duration,
    cancel: &CancellationToken,
) -> Result<T>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let start = Instant::now();
    let arbiter = DeadlineArbiter::start(deadline, cancel);
    let token = arbiter.token();

    if token.is_cancelled() {
        return Err(arbiter.classify(BatchError::Cancelled));
    }

    let mut task = tokio::spawn(work(token.clone()));

    let outcome = tokio::select! {
        biased;
        joined = &mut task => joined.map_err(BatchError::from).and_then(|res| res),
        _ = token.cancelled() => Err(BatchError::Cancelled),
    };

    debug!(
        elapsed_ms = start.elapsed().as_millis(),
        ok = outcome.is_ok(),
        "Deadline-bound work finished"
    );

    outcome.map_err(|err| arbiter.classify(err))
}
