use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use pin_project::pin_project;

/// A flux that only yields the first `n` items of its upstream.
///
/// This `struct` is created by the [`take`] method on [`Flux`]. See its
/// documentation for more.
///
/// [`take`]: super::Flux::take
/// [`Flux`]: super::Flux
#[pin_project]
#[derive(Debug)]
pub struct Take<S> {
    // `None` once the upstream has been released.
    #[pin]
    stream: Option<S>,
    remaining: usize,
}

impl<S> Take<S> {
    pub(crate) fn new(stream: S, n: usize) -> Self {
        Self {
            stream: Some(stream),
            remaining: n,
        }
    }
}

impl<S: Stream> Stream for Take<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        if *this.remaining == 0 {
            // Release the upstream without asking it for anything.
            this.stream.set(None);
            return Poll::Ready(None);
        }
        let Some(stream) = this.stream.as_mut().as_pin_mut() else {
            return Poll::Ready(None);
        };
        match stream.poll_next(cx) {
            Poll::Ready(Some(item)) => {
                *this.remaining -= 1;
                if *this.remaining == 0 {
                    tracing::trace!("take bound reached, releasing upstream");
                    this.stream.set(None);
                }
                Poll::Ready(Some(item))
            }
            Poll::Ready(None) => {
                this.stream.set(None);
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.stream {
            Some(stream) => {
                let (lower, upper) = stream.size_hint();
                let lower = lower.min(self.remaining);
                let upper = match upper {
                    Some(upper) => upper.min(self.remaining),
                    None => self.remaining,
                };
                (lower, Some(upper))
            }
            None => (0, Some(0)),
        }
    }
}
