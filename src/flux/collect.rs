use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_core::Stream;
use pin_project::pin_project;

use crate::Result;

/// A future that gathers every item of a flux into a `Vec`.
///
/// Resolves once the flux completes, or with the first failure it yields.
/// [`Flux::collect`](super::Flux::collect) wraps this in a
/// [`SingleResult`](crate::SingleResult).
#[pin_project]
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Collect<S, T> {
    #[pin]
    stream: S,
    items: Vec<T>,
}

impl<S: Stream, T> Collect<S, T> {
    pub(crate) fn new(stream: S) -> Self {
        // Only trust the lower bound when there is an upper one too.
        let capacity = match stream.size_hint() {
            (lower, Some(_)) => lower,
            (_, None) => 0,
        };
        let items = Vec::with_capacity(capacity);
        Self { stream, items }
    }
}

impl<S, T> Future for Collect<S, T>
where
    S: Stream<Item = Result<T>>,
{
    type Output = Result<Vec<T>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        loop {
            match ready!(this.stream.as_mut().poll_next(cx)) {
                Some(Ok(item)) => this.items.push(item),
                Some(Err(err)) => return Poll::Ready(Err(err)),
                None => return Poll::Ready(Ok(mem::take(this.items))),
            }
        }
    }
}
