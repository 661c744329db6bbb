use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use pin_project::pin_project;

use crate::Result;

/// A flux that transforms each item with a closure.
///
/// This `struct` is created by the [`map`] method on [`Flux`]. See its
/// documentation for more.
///
/// [`map`]: super::Flux::map
/// [`Flux`]: super::Flux
#[pin_project]
#[derive(Debug)]
pub struct Map<S, F> {
    #[pin]
    stream: S,
    f: F,
}

impl<S, F> Map<S, F> {
    pub(crate) fn new(stream: S, f: F) -> Self {
        Self { stream, f }
    }
}

impl<S, F, T, U> Stream for Map<S, F>
where
    S: Stream<Item = Result<T>>,
    F: FnMut(T) -> U,
{
    type Item = Result<U>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        this.stream
            .poll_next(cx)
            .map(|item| item.map(|item| item.map(this.f)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.stream.size_hint()
    }
}

#[cfg(test)]
mod test {
    use crate::flux;
    use crate::Error;

    #[test]
    fn transforms_in_order() {
        let items = flux::from_iter(1..=3)
            .map(|n| n * 10)
            .map(|n| n.to_string())
            .collect()
            .wait()
            .unwrap();
        assert_eq!(items, ["10", "20", "30"]);
    }

    #[test]
    fn failures_pass_through() {
        let err = flux::Flux::new(futures_lite::stream::iter([Ok(1), Err(Error::Canceled)]))
            .map(|n: i32| n + 1)
            .collect()
            .wait()
            .unwrap_err();
        assert!(matches!(err, Error::Canceled));
    }
}
