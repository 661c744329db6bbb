use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures::channel::oneshot;
use futures::future::{self, AbortHandle, BoxFuture};
use futures::FutureExt;

use crate::scheduler::Scheduler;
use crate::{Error, Result};

/// The receiving half of work that is running on a scheduler.
///
/// Dropping it aborts the remote task.
pub(crate) struct Dispatched<T> {
    receiver: oneshot::Receiver<Result<T>>,
    abort: AbortHandle,
}

impl<T: Send + 'static> Dispatched<T> {
    pub(crate) fn new(scheduler: &Scheduler, work: BoxFuture<'static, Result<T>>) -> Result<Self> {
        let (sender, receiver) = oneshot::channel();
        let (work, abort) = future::abortable(work);
        let name = scheduler.name().to_owned();
        scheduler.execute(async move {
            match AssertUnwindSafe(work).catch_unwind().await {
                Ok(Ok(outcome)) => {
                    // The receiver may be gone already; nobody is waiting then.
                    let _ = sender.send(outcome);
                }
                Ok(Err(_aborted)) => {
                    tracing::trace!(scheduler = %name, "scheduled work aborted");
                }
                Err(_panic) => {
                    tracing::error!(scheduler = %name, "scheduled work panicked");
                }
            }
        })?;
        tracing::debug!(scheduler = scheduler.name(), "dispatched work");
        Ok(Self { receiver, abort })
    }
}

impl<T> Future for Dispatched<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match ready!(Pin::new(&mut self.receiver).poll(cx)) {
            Ok(outcome) => Poll::Ready(outcome),
            Err(oneshot::Canceled) => Poll::Ready(Err(Error::Canceled)),
        }
    }
}

impl<T> Drop for Dispatched<T> {
    fn drop(&mut self) {
        self.abort.abort();
    }
}
