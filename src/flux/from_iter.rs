use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use super::Flux;
use crate::Result;

/// A flux that yields the items of an iterator.
///
/// This `struct` is created by [`from_iter`].
#[derive(Clone, Debug)]
pub struct FromIter<I> {
    iter: I,
}

/// Emit every item of `items` once, in order, then complete.
pub fn from_iter<I: IntoIterator>(items: I) -> Flux<FromIter<I::IntoIter>> {
    Flux::new(FromIter {
        iter: items.into_iter(),
    })
}

impl<I: Iterator> Unpin for FromIter<I> {}

impl<I: Iterator> Stream for FromIter<I> {
    type Item = Result<I::Item>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.iter.next().map(Ok))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}
