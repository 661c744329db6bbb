use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use futures_core::Stream;
use parking_lot::Mutex;

use super::Flux;
use crate::{BoxError, Error, Result};

/// Build a demand-driven flux.
///
/// `emitter` is called with a [`FluxSink`] and the number of newly requested
/// items every time the consumer signals demand. It may push up to that many
/// items right away, or keep a clone of the sink and push them later from
/// anywhere. Items pushed without outstanding demand are refused.
///
/// The flux ends when the sink is completed or fails, or when the consumer
/// drops it, for example because a [`take`](super::Flux::take) bound was
/// reached. After that the emitter is never called again and the sink
/// reports itself as cancelled.
pub fn create<T, F>(emitter: F) -> Flux<Create<T, F>>
where
    F: FnMut(&FluxSink<T>, u64),
{
    Flux::new(Create {
        sink: FluxSink::new(),
        emitter,
        done: false,
    })
}

/// A demand-driven flux.
///
/// This `struct` is created by [`create`]. See its documentation for more.
pub struct Create<T, F> {
    sink: FluxSink<T>,
    emitter: F,
    done: bool,
}

// Neither the sink nor the emitter is ever pinned.
impl<T, F> Unpin for Create<T, F> {}

impl<T, F> fmt::Debug for Create<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Create")
            .field("sink", &self.sink)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl<T, F> Stream for Create<T, F>
where
    F: FnMut(&FluxSink<T>, u64),
{
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        let requested = {
            let mut state = this.sink.shared.lock();
            if let Some(item) = take_next(&mut state, &mut this.done) {
                return Poll::Ready(item);
            }
            state.waker = Some(cx.waker().clone());
            if state.demand > 0 {
                // The emitter still owes us items from an earlier request.
                return Poll::Pending;
            }
            state.demand = 1;
            1
        };

        tracing::trace!(requested, "signaling demand");
        (this.emitter)(&this.sink, requested);

        let mut state = this.sink.shared.lock();
        match take_next(&mut state, &mut this.done) {
            Some(item) => Poll::Ready(item),
            None => Poll::Pending,
        }
    }
}

/// Pop the next buffered signal, if any.
fn take_next<T>(state: &mut SinkState<T>, done: &mut bool) -> Option<Option<Result<T>>> {
    match state.queue.pop_front() {
        Some(Ok(item)) => Some(Some(Ok(item))),
        Some(Err(err)) => {
            *done = true;
            Some(Some(Err(err)))
        }
        None if state.completed => {
            *done = true;
            Some(None)
        }
        None => None,
    }
}

impl<T, F> Drop for Create<T, F> {
    fn drop(&mut self) {
        let mut state = self.sink.shared.lock();
        if !state.completed {
            tracing::trace!("consumer released demand-driven source");
        }
        state.cancelled = true;
        state.demand = 0;
        state.queue.clear();
        state.waker = None;
    }
}

/// The producer side of a [`create`] flux.
///
/// Cloning a sink yields another handle to the same flux.
pub struct FluxSink<T> {
    shared: Arc<Mutex<SinkState<T>>>,
}

struct SinkState<T> {
    queue: VecDeque<Result<T>>,
    demand: u64,
    completed: bool,
    cancelled: bool,
    waker: Option<Waker>,
}

impl<T> Clone for FluxSink<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> fmt::Debug for FluxSink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("FluxSink")
            .field("demand", &state.demand)
            .field("buffered", &state.queue.len())
            .field("completed", &state.completed)
            .field("cancelled", &state.cancelled)
            .finish()
    }
}

impl<T> FluxSink<T> {
    fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(SinkState {
                queue: VecDeque::new(),
                demand: 0,
                completed: false,
                cancelled: false,
                waker: None,
            })),
        }
    }

    /// Push an item towards the consumer.
    ///
    /// Returns `false`, dropping the item, if there is no outstanding demand
    /// or the flux has already ended.
    pub fn next(&self, item: T) -> bool {
        let waker = {
            let mut state = self.shared.lock();
            if state.cancelled || state.completed {
                return false;
            }
            if state.demand == 0 {
                tracing::warn!("item emitted without outstanding demand, dropping it");
                return false;
            }
            state.demand -= 1;
            state.queue.push_back(Ok(item));
            state.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
        true
    }

    /// End the flux with a failure.
    pub fn error(&self, err: impl Into<BoxError>) {
        self.finish(Some(Error::computation(err)));
    }

    /// End the flux successfully.
    pub fn complete(&self) {
        self.finish(None);
    }

    fn finish(&self, err: Option<Error>) {
        let waker = {
            let mut state = self.shared.lock();
            if state.cancelled || state.completed {
                return;
            }
            state.completed = true;
            state.demand = 0;
            if let Some(err) = err {
                state.queue.push_back(Err(err));
            }
            state.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// How many more items the consumer is currently willing to accept.
    pub fn requested(&self) -> u64 {
        self.shared.lock().demand
    }

    /// Whether the consumer has gone away.
    pub fn is_cancelled(&self) -> bool {
        self.shared.lock().cancelled
    }
}
