use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_core::Stream;
use pin_project::pin_project;

use crate::Result;

/// A flux that drops items failing a predicate.
///
/// This `struct` is created by the [`filter`] method on [`Flux`]. See its
/// documentation for more.
///
/// [`filter`]: super::Flux::filter
/// [`Flux`]: super::Flux
#[pin_project]
#[derive(Debug)]
pub struct Filter<S, P> {
    #[pin]
    stream: S,
    predicate: P,
}

impl<S, P> Filter<S, P> {
    pub(crate) fn new(stream: S, predicate: P) -> Self {
        Self { stream, predicate }
    }
}

impl<S, P, T> Stream for Filter<S, P>
where
    S: Stream<Item = Result<T>>,
    P: FnMut(&T) -> bool,
{
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            match ready!(this.stream.as_mut().poll_next(cx)) {
                Some(Ok(item)) if !(this.predicate)(&item) => continue,
                item => return Poll::Ready(item),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.stream.size_hint().1)
    }
}
