use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_core::Stream;

use crate::single::SingleResult;
use crate::Result;

/// A flux that yields the outcome of a single result, then completes.
///
/// This `struct` is created by converting a [`SingleResult`] with
/// [`IntoFlux`](super::IntoFlux).
#[derive(Debug)]
pub struct Once<T> {
    result: Option<SingleResult<T>>,
}

impl<T> Once<T> {
    pub(crate) fn new(result: SingleResult<T>) -> Self {
        Self {
            result: Some(result),
        }
    }
}

impl<T: Send + 'static> Stream for Once<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Some(result) = self.result.as_mut() else {
            return Poll::Ready(None);
        };
        let outcome = ready!(Pin::new(result).poll(cx));
        self.result = None;
        Poll::Ready(Some(outcome))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = usize::from(self.result.is_some());
        (len, Some(len))
    }
}
