use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_buffered::FuturesUnordered;
use futures_lite::StreamExt;

use super::SingleResult;
use crate::Result;

/// Waits for every result in a set and gathers their values in the order
/// they completed.
///
/// This is the bridge from synchronous iteration into the asynchronous world:
/// collect an iterator of [`SingleResult`]s into a `Barrier`, then await it
/// (or convert it into a `SingleResult<Vec<T>>`). The first failure resolves
/// the barrier with that failure and drops every result still in flight.
///
/// # Example
///
/// ```
/// use flux_concurrency::{Barrier, Scheduler, SingleResult};
///
/// let barrier: Barrier<_> = (1..=3)
///     .map(|n| SingleResult::from_fn(move || n * n).run_on(Scheduler::parallel()))
///     .collect();
/// let mut squares = SingleResult::from(barrier).wait().unwrap();
/// squares.sort();
/// assert_eq!(squares, [1, 4, 9]);
/// ```
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Barrier<T> {
    group: FuturesUnordered<SingleResult<T>>,
    output: Vec<T>,
}

// Neither the group nor the gathered values are ever pinned.
impl<T> Unpin for Barrier<T> {}

impl<T> fmt::Debug for Barrier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Barrier")
            .field("pending", &self.group.len())
            .field("completed", &self.output.len())
            .finish()
    }
}

impl<T: Send + 'static> Barrier<T> {
    /// Create an empty barrier.
    pub fn new() -> Self {
        Self {
            group: FuturesUnordered::new(),
            output: Vec::new(),
        }
    }

    /// Add another result to wait for.
    pub fn push(&mut self, result: SingleResult<T>) {
        self.group.push(result);
    }

    /// The number of results that have not resolved yet.
    pub fn pending(&self) -> usize {
        self.group.len()
    }
}

impl<T: Send + 'static> Default for Barrier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> FromIterator<SingleResult<T>> for Barrier<T> {
    fn from_iter<I: IntoIterator<Item = SingleResult<T>>>(iter: I) -> Self {
        let mut barrier = Self::new();
        for result in iter {
            barrier.push(result);
        }
        barrier
    }
}

impl<T: Send + 'static> Extend<SingleResult<T>> for Barrier<T> {
    fn extend<I: IntoIterator<Item = SingleResult<T>>>(&mut self, iter: I) {
        for result in iter {
            self.push(result);
        }
    }
}

impl<T: Send + 'static> Future for Barrier<T> {
    type Output = Result<Vec<T>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        loop {
            match this.group.poll_next(cx) {
                Poll::Ready(Some(Ok(value))) => this.output.push(value),
                Poll::Ready(Some(Err(err))) => {
                    // Drop everything still running.
                    this.group = FuturesUnordered::new();
                    return Poll::Ready(Err(err));
                }
                Poll::Ready(None) => return Poll::Ready(Ok(mem::take(&mut this.output))),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Error, Scheduler};
    use futures_lite::future::block_on;

    #[test]
    fn empty_barrier_resolves_immediately() {
        let values = block_on(Barrier::<u8>::new()).unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn gathers_every_value() {
        let barrier: Barrier<_> = (0..32)
            .map(|n| SingleResult::from_fn(move || n).run_on(Scheduler::parallel()))
            .collect();
        assert_eq!(barrier.pending(), 32);
        let mut values = block_on(barrier).unwrap();
        values.sort_unstable();
        assert_eq!(values, (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn values_arrive_in_completion_order() {
        let (sender, receiver) = futures::channel::oneshot::channel::<()>();
        let mut barrier = Barrier::new();
        barrier.push(SingleResult::from_future(async move {
            let _ = receiver.await;
            Ok("late")
        }));
        barrier.push(SingleResult::from_future(async move {
            let _ = sender.send(());
            Ok("early")
        }));
        assert_eq!(block_on(barrier).unwrap(), ["early", "late"]);
    }

    #[test]
    fn first_failure_wins() {
        let mut barrier = Barrier::new();
        barrier.push(SingleResult::from_future(async {
            futures_lite::future::pending::<()>().await;
            Ok(1)
        }));
        barrier.push(SingleResult::failed(Error::computation("boom")));
        let err = block_on(barrier).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
