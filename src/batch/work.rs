//! Work shapes accepted by the batch runner.
//!
//! Every shape is normalized to [`BatchWork`], whose output for one slice is a
//! `Vec` of results. The adapters in this module cover:
//!
//! - [`unit`]: async work with no result
//! - [`each`]: async work producing one value per slice
//! - [`flat`]: async work producing a `Vec` of values per slice
//! - [`blocking`]: synchronous work returning any iterable, run on the blocking pool
//! - [`streamed`]: work returning a stream of values, drained inside the batch task

use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::Result;

/// One unit of work applied to a single slice
#[async_trait]
pub trait BatchWork<T, R>: Send + Sync + 'static
where
    T: Send + 'static,
    R: Send + 'static,
{
    /// Process `slice`, returning its results in order.
    ///
    /// Implementations should stop early with [`crate::BatchError::Cancelled`] once
    /// `token` fires.
    async fn call(&self, slice: Vec<T>, token: CancellationToken) -> Result<Vec<R>>;
}

/// Async work with no result, see [`unit`]
pub struct Unit<F>(F);

/// Async work yielding one value per slice, see [`each`]
pub struct Each<F>(F);

/// Async work yielding a `Vec` per slice, see [`flat`]
pub struct Flat<F>(F);

/// Synchronous work run on the blocking pool, see [`blocking`]
pub struct Blocking<F>(Arc<F>);

/// Work returning a stream of results, see [`streamed`]
pub struct Streamed<F>(F);

/// Async work that only reports success or failure
pub fn unit<T, F, Fut>(f: F) -> Unit<F>
where
    F: Fn(Vec<T>, CancellationToken) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    Unit(f)
}

/// Async work producing a single value for its slice
pub fn each<T, R, F, Fut>(f: F) -> Each<F>
where
    F: Fn(Vec<T>, CancellationToken) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    Each(f)
}

/// Async work producing an ordered `Vec` of values for its slice
pub fn flat<T, R, F, Fut>(f: F) -> Flat<F>
where
    F: Fn(Vec<T>, CancellationToken) -> Fut,
    Fut: Future<Output = Result<Vec<R>>>,
{
    Flat(f)
}

/// Synchronous work returning an iterable; it runs on Tokio's blocking pool so it
/// never stalls the async workers
pub fn blocking<T, R, F, I>(f: F) -> Blocking<F>
where
    F: Fn(Vec<T>, CancellationToken) -> Result<I>,
    I: IntoIterator<Item = R>,
{
    Blocking(Arc::new(f))
}

/// Work returning a stream of results for its slice
pub fn streamed<T, R, F, S>(f: F) -> Streamed<F>
where
    F: Fn(Vec<T>, CancellationToken) -> S,
    S: Stream<Item = Result<R>>,
{
    Streamed(f)
}

#[async_trait]
impl<T, F, Fut> BatchWork<T, ()> for Unit<F>
where
    T: Send + 'static,
    F: Fn(Vec<T>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn call(&self, slice: Vec<T>, token: CancellationToken) -> Result<Vec<()>> {
        (self.0)(slice, token).await?;
        Ok(Vec::new())
    }
}

#[async_trait]
impl<T, R, F, Fut> BatchWork<T, R> for Each<F>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(Vec<T>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    async fn call(&self, slice: Vec<T>, token: CancellationToken) -> Result<Vec<R>> {
        Ok(vec![(self.0)(slice, token).await?])
    }
}

#[async_trait]
impl<T, R, F, Fut> BatchWork<T, R> for Flat<F>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(Vec<T>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<R>>> + Send + 'static,
{
    async fn call(&self, slice: Vec<T>, token: CancellationToken) -> Result<Vec<R>> {
        (self.0)(slice, token).await
    }
}

#[async_trait]
impl<T, R, F, I> BatchWork<T, R> for Blocking<F>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(Vec<T>, CancellationToken) -> Result<I> + Send + Sync + 'static,
    I: IntoIterator<Item = R> + 'static,
{
    async fn call(&self, slice: Vec<T>, token: CancellationToken) -> Result<Vec<R>> {
        let f = Arc::clone(&self.0);
        tokio::task::spawn_blocking(move || {
            f(slice, token).map(|results| results.into_iter().collect())
        })
        .await?
    }
}

#[async_trait]
impl<T, R, F, S> BatchWork<T, R> for Streamed<F>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(Vec<T>, CancellationToken) -> S + Send + Sync + 'static,
    S: Stream<Item = Result<R>> + Send + 'static,
{
    async fn call(&self, slice: Vec<T>, token: CancellationToken) -> Result<Vec<R>> {
        (self.0)(slice, token).try_collect().await
    }
}
