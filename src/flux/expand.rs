use std::fmt;
use std::future::Future;
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_buffered::FuturesUnordered;
use futures_core::Stream;
use futures_lite::StreamExt;
use pin_project::pin_project;

use super::IntoFlux;
use crate::Result;

/// A flux that runs a sub-pipeline per upstream item and merges the outputs.
///
/// This `struct` is created by [`Flux::expand`](super::Flux::expand). See its
/// documentation for more.
#[pin_project]
#[must_use = "streams do nothing unless polled"]
pub struct Expand<S, F, I>
where
    I: IntoFlux,
{
    #[pin]
    upstream: Option<S>,
    f: F,
    group: FuturesUnordered<NextOf<I::Stream>>,
    limit: usize,
    active: usize,
    done: bool,
}

impl<S, F, I> Expand<S, F, I>
where
    I: IntoFlux,
{
    pub(crate) fn new(upstream: S, limit: NonZeroUsize, f: F) -> Self {
        Self {
            upstream: Some(upstream),
            f,
            group: FuturesUnordered::new(),
            limit: limit.get(),
            active: 0,
            done: false,
        }
    }
}

impl<S, F, I> fmt::Debug for Expand<S, F, I>
where
    I: IntoFlux,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expand")
            .field("limit", &self.limit)
            .field("active", &self.active)
            .field("upstream_done", &self.upstream.is_none())
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl<S, F, T, I> Stream for Expand<S, F, I>
where
    S: Stream<Item = Result<T>>,
    F: FnMut(T) -> I,
    I: IntoFlux,
{
    type Item = Result<I::Item>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }

        loop {
            // Start inner sources while there are free slots.
            while *this.active < *this.limit {
                let Some(upstream) = this.upstream.as_mut().as_pin_mut() else {
                    break;
                };
                match upstream.poll_next(cx) {
                    Poll::Ready(Some(Ok(item))) => {
                        let inner = (this.f)(item).into_flux().into_inner();
                        this.group.push(NextOf::new(Box::pin(inner)));
                        *this.active += 1;
                    }
                    Poll::Ready(Some(Err(err))) => {
                        this.upstream.set(None);
                        *this.group = FuturesUnordered::new();
                        *this.active = 0;
                        *this.done = true;
                        tracing::debug!(error = %err, "upstream failed, expand terminated");
                        return Poll::Ready(Some(Err(err)));
                    }
                    Poll::Ready(None) => this.upstream.set(None),
                    Poll::Pending => break,
                }
            }

            match this.group.poll_next(cx) {
                Poll::Ready(Some((Some(Ok(item)), rest))) => {
                    this.group.push(NextOf::new(rest));
                    return Poll::Ready(Some(Ok(item)));
                }
                Poll::Ready(Some((Some(Err(err)), _))) => {
                    let cancelled = this.group.len();
                    this.upstream.set(None);
                    *this.group = FuturesUnordered::new();
                    *this.active = 0;
                    *this.done = true;
                    tracing::debug!(error = %err, cancelled, "inner source failed, expand terminated");
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(Some((None, _))) => {
                    // An inner source completed, which frees a slot.
                    *this.active -= 1;
                }
                Poll::Ready(None) if this.upstream.is_none() => {
                    *this.done = true;
                    return Poll::Ready(None);
                }
                Poll::Ready(None) | Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Resolves with the next item of a stream, handing the stream back.
struct NextOf<U> {
    stream: Option<Pin<Box<U>>>,
}

impl<U> NextOf<U> {
    fn new(stream: Pin<Box<U>>) -> Self {
        Self {
            stream: Some(stream),
        }
    }
}

impl<U: Stream> Future for NextOf<U> {
    type Output = (Option<U::Item>, Pin<Box<U>>);

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(stream) = self.stream.as_mut() else {
            panic!("`NextOf` polled after completing");
        };
        let item = ready!(stream.as_mut().poll_next(cx));
        match self.stream.take() {
            Some(stream) => Poll::Ready((item, stream)),
            None => unreachable!(),
        }
    }
}
