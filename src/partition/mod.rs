//! Single-pass partitioning of iterators and streams.
//!
//! Both partitioners walk their source exactly once. A slice is never empty, slices
//! never overlap, and only the last one can be shorter than the requested size. A
//! size of zero produces no slices at all.

use futures::stream::{self, Stream, StreamExt};
use std::iter::FusedIterator;

/// Iterator over consecutive, non-empty slices of an inner iterator
#[derive(Debug, Clone)]
pub struct Partition<I> {
    iter: I,
    size: usize,
}

impl<I: Iterator> Partition<I> {
    /// Wrap an iterator, yielding slices of up to `size` items
    pub fn new(iter: I, size: usize) -> Self {
        Self { iter, size }
    }

    /// Configured slice size
    pub fn size(&self) -> usize {
        self.size
    }
}

impl<I: Iterator> Iterator for Partition<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.size == 0 {
            return None;
        }

        let slice: Vec<_> = self.iter.by_ref().take(self.size).collect();
        if slice.is_empty() {
            None
        } else {
            Some(slice)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.size == 0 {
            return (0, Some(0));
        }

        let (lower, upper) = self.iter.size_hint();
        (
            lower.div_ceil(self.size),
            upper.map(|n| n.div_ceil(self.size)),
        )
    }
}

impl<I: FusedIterator> FusedIterator for Partition<I> {}

/// Split `items` into consecutive slices of `size` items, the last possibly shorter
pub fn partition<I>(items: I, size: usize) -> Partition<I::IntoIter>
where
    I: IntoIterator,
{
    Partition::new(items.into_iter(), size)
}

/// Extension trait adding `.partitioned(size)` to every iterator
pub trait PartitionExt: Iterator + Sized {
    /// Split this iterator into slices of `size` items
    fn partitioned(self, size: usize) -> Partition<Self> {
        Partition::new(self, size)
    }
}

impl<I: Iterator> PartitionExt for I {}

/// Split a stream into consecutive slices of `size` items, the last possibly shorter.
///
/// The source is polled once per item and never re-enumerated; each slice is
/// emitted as soon as it is full (or the source ends).
pub fn partition_stream<'a, S>(source: S, size: usize) -> stream::BoxStream<'a, Vec<S::Item>>
where
    S: Stream + Send + 'a,
    S::Item: Send + 'a,
{
    if size == 0 {
        return stream::empty().boxed();
    }
    source.chunks(size).boxed()
}
