//! Single-value asynchronous results.
//!
//! A [`SingleResult`] eventually resolves to exactly one value or one
//! [`Error`]. Nothing runs until the result is driven: either `.await`ed, or
//! blocked on at the outermost entry point with [`SingleResult::wait`].
//!
//! # Examples
//!
//! **Chain steps and redirect them onto a pool**
//!
//! ```
//! use flux_concurrency::{Scheduler, SingleResult};
//!
//! let doubled = SingleResult::from_fn(|| 21)
//!     .map(|n| n * 2)
//!     .run_on(Scheduler::parallel())
//!     .wait()
//!     .unwrap();
//! assert_eq!(doubled, 42);
//! ```
//!
//! **Substitute a value for a failure**
//!
//! ```
//! use flux_concurrency::SingleResult;
//!
//! let n = SingleResult::from_computation(|| "x".parse::<u32>())
//!     .recover(|_| SingleResult::just(0))
//!     .wait()
//!     .unwrap();
//! assert_eq!(n, 0);
//! ```

mod barrier;
mod dispatch;
mod first;

use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::BoxFuture;

use crate::scheduler::Scheduler;
use crate::{BoxError, Error, Result};
use dispatch::Dispatched;

pub use barrier::Barrier;
pub use first::First;

/// A computation that will produce one value or one failure.
///
/// Each instance has a single consumer and resolves exactly once. Building a
/// new `SingleResult` from the same closure runs the closure again; outcomes
/// are never cached.
#[must_use = "a `SingleResult` does nothing unless driven"]
pub struct SingleResult<T> {
    state: State<T>,
}

// The value is never pinned in place.
impl<T> Unpin for SingleResult<T> {}

enum State<T> {
    /// Not started; runs on whichever task drives it.
    Lazy(BoxFuture<'static, Result<T>>),
    /// Not started; is moved onto `scheduler` when first driven.
    Deferred {
        chain: BoxFuture<'static, Result<T>>,
        scheduler: Scheduler,
    },
    /// Running on a scheduler.
    Dispatched(Dispatched<T>),
    /// Resolved, or failed before it could start.
    Ready(Option<Result<T>>),
}

impl<T> fmt::Debug for SingleResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Lazy(_) => "Lazy",
            State::Deferred { .. } => "Deferred",
            State::Dispatched(_) => "Dispatched",
            State::Ready(Some(_)) => "Ready",
            State::Ready(None) => "Done",
        };
        f.debug_struct("SingleResult").field("state", &state).finish()
    }
}

impl<T: Send + 'static> SingleResult<T> {
    fn lazy(chain: BoxFuture<'static, Result<T>>) -> Self {
        Self {
            state: State::Lazy(chain),
        }
    }

    /// A result that has already succeeded.
    pub fn just(value: T) -> Self {
        Self {
            state: State::Ready(Some(Ok(value))),
        }
    }

    /// A result that has already failed.
    pub fn failed(err: Error) -> Self {
        Self {
            state: State::Ready(Some(Err(err))),
        }
    }

    /// Wrap a fallible function. It is called when the result is first driven.
    pub fn from_computation<E, F>(computation: F) -> Self
    where
        F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
        E: Into<BoxError>,
    {
        Self::lazy(Box::pin(async move { computation().map_err(Error::computation) }))
    }

    /// Wrap an infallible function. It is called when the result is first driven.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self::lazy(Box::pin(async move { Ok(f()) }))
    }

    /// Wrap a future.
    pub fn from_future<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self::lazy(Box::pin(future))
    }

    pub(crate) fn dispatch(scheduler: &Scheduler, work: BoxFuture<'static, Result<T>>) -> Self {
        match Dispatched::new(scheduler, work) {
            Ok(dispatched) => Self {
                state: State::Dispatched(dispatched),
            },
            Err(err) => Self::failed(err),
        }
    }

    /// Append a step to the chain without changing where it runs.
    fn then_step<U, F>(self, step: F) -> SingleResult<U>
    where
        U: Send + 'static,
        F: FnOnce(BoxFuture<'static, Result<T>>) -> BoxFuture<'static, Result<U>>,
    {
        match self.state {
            State::Lazy(chain) => SingleResult::lazy(step(chain)),
            State::Deferred { chain, scheduler } => SingleResult {
                state: State::Deferred {
                    chain: step(chain),
                    scheduler,
                },
            },
            state => SingleResult::lazy(step(Box::pin(Self { state }))),
        }
    }

    /// Transform the success value.
    pub fn map<U, F>(self, f: F) -> SingleResult<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.then_step(|chain| Box::pin(async move { chain.await.map(f) }))
    }

    /// Continue with another result built from the success value.
    pub fn flat_map<U, F>(self, f: F) -> SingleResult<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> SingleResult<U> + Send + 'static,
    {
        self.then_step(|chain| {
            Box::pin(async move {
                let value = chain.await?;
                f(value).await
            })
        })
    }

    /// Replace a failure with the outcome of another result.
    ///
    /// Successes pass through untouched. The failure does not travel any
    /// further than this point.
    pub fn recover<F>(self, handler: F) -> SingleResult<T>
    where
        F: FnOnce(Error) -> SingleResult<T> + Send + 'static,
    {
        self.then_step(|chain| {
            Box::pin(async move {
                match chain.await {
                    Ok(value) => Ok(value),
                    Err(err) => {
                        tracing::warn!(error = %err, "recovering from failure");
                        handler(err).await
                    }
                }
            })
        })
    }

    /// Run everything chained so far, and every step chained afterwards, on
    /// `scheduler`.
    ///
    /// Calling `run_on` again starts a new segment: earlier steps stay on the
    /// previous scheduler, later ones move to the new one.
    pub fn run_on(self, scheduler: Scheduler) -> Self {
        let chain = match self.state {
            State::Lazy(chain) => chain,
            state => Box::pin(Self { state }),
        };
        Self {
            state: State::Deferred { chain, scheduler },
        }
    }

    /// Resolve with whichever of `self` and `other` finishes first.
    ///
    /// The slower result is dropped, which aborts it if it was running on a
    /// scheduler.
    pub fn first(self, other: SingleResult<T>) -> Self {
        Self::from_future(First::new(self, other))
    }

    /// Block the current thread until the result resolves.
    ///
    /// Meant for the outermost entry point of a program; never call this
    /// from inside a pipeline.
    pub fn wait(self) -> Result<T> {
        futures_lite::future::block_on(self)
    }
}

impl<T: Send + 'static> Future for SingleResult<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        loop {
            match mem::replace(&mut this.state, State::Ready(None)) {
                State::Deferred { chain, scheduler } => {
                    *this = Self::dispatch(&scheduler, chain);
                }
                State::Lazy(mut chain) => {
                    return match chain.as_mut().poll(cx) {
                        Poll::Ready(outcome) => Poll::Ready(outcome),
                        Poll::Pending => {
                            this.state = State::Lazy(chain);
                            Poll::Pending
                        }
                    };
                }
                State::Dispatched(mut dispatched) => {
                    return match Pin::new(&mut dispatched).poll(cx) {
                        Poll::Ready(outcome) => Poll::Ready(outcome),
                        Poll::Pending => {
                            this.state = State::Dispatched(dispatched);
                            Poll::Pending
                        }
                    };
                }
                State::Ready(Some(outcome)) => return Poll::Ready(outcome),
                State::Ready(None) => panic!("`SingleResult` polled after completing"),
            }
        }
    }
}

impl<T: Send + 'static> From<Barrier<T>> for SingleResult<Vec<T>> {
    fn from(barrier: Barrier<T>) -> Self {
        Self::from_future(barrier)
    }
}

impl<T: Send + 'static> From<Result<T>> for SingleResult<T> {
    fn from(outcome: Result<T>) -> Self {
        Self {
            state: State::Ready(Some(outcome)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::thread;
    use std::time::Duration;

    use futures_lite::future::block_on;

    fn thread_name() -> String {
        thread::current().name().unwrap_or_default().to_owned()
    }

    #[test]
    fn computations_are_lazy() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let result = SingleResult::from_computation(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>(5)
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.wait().unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn outcomes_are_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let build = || {
            let counter = calls.clone();
            SingleResult::from_fn(move || counter.fetch_add(1, Ordering::SeqCst))
        };
        assert_eq!(build().wait().unwrap(), 0);
        assert_eq!(build().wait().unwrap(), 1);
    }

    #[test]
    fn map_and_flat_map() {
        let out = SingleResult::just(3)
            .map(|n| n + 1)
            .flat_map(|n| SingleResult::from_fn(move || n * 10))
            .wait()
            .unwrap();
        assert_eq!(out, 40);
    }

    #[test]
    fn failures_short_circuit() {
        let mapped = Arc::new(AtomicUsize::new(0));
        let counter = mapped.clone();
        let err = SingleResult::<u8>::failed(Error::Canceled)
            .map(move |n| {
                counter.fetch_add(1, Ordering::SeqCst);
                n
            })
            .flat_map(|n| SingleResult::just(n + 1))
            .wait()
            .unwrap_err();
        assert!(matches!(err, Error::Canceled));
        assert_eq!(mapped.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn recover_substitutes_failures_only() {
        let recovered = SingleResult::from_computation(|| "nope".parse::<i32>())
            .recover(|err| {
                assert!(err.downcast_ref::<std::num::ParseIntError>().is_some());
                SingleResult::just(-1)
            })
            .wait()
            .unwrap();
        assert_eq!(recovered, -1);

        let untouched = SingleResult::from_computation(|| "7".parse::<i32>())
            .recover(|_| SingleResult::just(-1))
            .wait()
            .unwrap();
        assert_eq!(untouched, 7);
    }

    #[test]
    fn recover_can_fail_again() {
        let err = SingleResult::<()>::failed(Error::Canceled)
            .recover(|_| SingleResult::failed(Error::computation("still broken")))
            .wait()
            .unwrap_err();
        assert_eq!(err.to_string(), "still broken");
    }

    #[test]
    fn run_on_moves_the_whole_chain() {
        let (before, after) = SingleResult::from_fn(thread_name)
            .map(|before| (before, thread_name()))
            .run_on(Scheduler::parallel())
            .wait()
            .unwrap();
        assert!(before.starts_with("parallel-"));
        assert!(after.starts_with("parallel-"));
    }

    #[test]
    fn steps_after_run_on_follow_it() {
        let name = SingleResult::just(())
            .run_on(Scheduler::parallel())
            .map(|()| thread_name())
            .wait()
            .unwrap();
        assert!(name.starts_with("parallel-"));
    }

    #[test]
    fn second_run_on_starts_a_new_segment() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("other")
            .build()
            .unwrap();
        let (first, second) = SingleResult::from_fn(thread_name)
            .run_on(Scheduler::parallel())
            .map(|first| (first, thread_name()))
            .run_on(Scheduler::from_tokio(runtime.handle().clone()))
            .map(|(first, _)| (first, thread_name()))
            .wait()
            .unwrap();
        assert!(first.starts_with("parallel-"));
        assert_eq!(second, "other");
    }

    #[test]
    fn first_takes_the_faster_result() {
        let slow = SingleResult::from_future(async {
            futures_lite::future::pending::<()>().await;
            Ok("slow")
        });
        let fast = SingleResult::from_fn(|| "fast");
        assert_eq!(slow.first(fast).wait().unwrap(), "fast");
    }

    #[test]
    fn dropping_a_dispatched_result_aborts_it() {
        struct Guard(mpsc::Sender<()>);
        impl Drop for Guard {
            fn drop(&mut self) {
                let _ = self.0.send(());
            }
        }

        let (sender, receiver) = mpsc::channel();
        let guard = Guard(sender);
        let result = Scheduler::parallel().spawn(async move {
            let _guard = guard;
            futures_lite::future::pending::<()>().await;
            Ok(())
        });
        drop(result);
        receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("remote work was not aborted");
    }

    #[test]
    fn awaiting_inside_async_code() {
        block_on(async {
            let a = SingleResult::from_fn(|| 1).run_on(Scheduler::parallel());
            let b = SingleResult::just(2);
            assert_eq!(a.await.unwrap() + b.await.unwrap(), 3);
        });
    }
}
