//! Fallible asynchronous sequences.
//!
//! A [`Flux`] wraps any [`Stream`] of `Result<T>` items and adds the
//! operators a pipeline is built from. The first `Err` a flux yields is
//! terminal: no items follow it.
//!
//! Sources:
//!
//! - [`from_iter`]: pull items from a finite collection, in order.
//! - [`create`]: a demand-driven emitter that is asked for items whenever the
//!   consumer is ready for more.
//! - [`from_stream`]: any existing stream of results.
//!
//! # Examples
//!
//! **Fan out over a pool and gather the results**
//!
//! ```
//! use flux_concurrency::flux::{self, DEFAULT_CONCURRENCY};
//! use flux_concurrency::{Scheduler, SingleResult};
//!
//! let mut squares = flux::from_iter(1..=4)
//!     .expand(DEFAULT_CONCURRENCY, |n| {
//!         SingleResult::from_fn(move || n * n).run_on(Scheduler::parallel())
//!     })
//!     .filter(|n| n % 2 == 0)
//!     .collect()
//!     .wait()
//!     .unwrap();
//! squares.sort();
//! assert_eq!(squares, [4, 16]);
//! ```
//!
//! **Bound a demand-driven source**
//!
//! ```
//! use flux_concurrency::flux;
//!
//! let mut next = 0;
//! let numbers = flux::create(move |sink, requested| {
//!     for _ in 0..requested {
//!         sink.next(next);
//!         next += 1;
//!     }
//! })
//! .take(3)
//! .collect()
//! .wait()
//! .unwrap();
//! assert_eq!(numbers, [0, 1, 2]);
//! ```

mod collect;
mod create;
mod expand;
mod filter;
mod from_iter;
mod map;
mod once;
mod take;

use std::num::NonZeroUsize;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use pin_project::pin_project;

use crate::single::SingleResult;
use crate::Result;

pub use collect::Collect;
pub use create::{create, Create, FluxSink};
pub use expand::Expand;
pub use filter::Filter;
pub use from_iter::{from_iter, FromIter};
pub use map::Map;
pub use once::Once;
pub use take::Take;

/// The fan-out used by pipelines that have no reason to pick another one.
///
/// It is never applied implicitly: [`Flux::expand`] always takes its limit
/// as an argument.
pub const DEFAULT_CONCURRENCY: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(limit) => limit,
    None => unreachable!(),
};

/// Wrap an existing stream of results.
pub fn from_stream<S, T>(stream: S) -> Flux<S>
where
    S: Stream<Item = Result<T>>,
{
    Flux::new(stream)
}

/// A fallible asynchronous sequence with pipeline operators.
#[pin_project]
#[derive(Debug)]
#[must_use = "streams do nothing unless polled"]
pub struct Flux<S> {
    #[pin]
    stream: S,
}

impl<S> Flux<S> {
    /// Wrap a stream of results.
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S, T> Flux<S>
where
    S: Stream<Item = Result<T>>,
{
    /// Transform every item.
    pub fn map<U, F>(self, f: F) -> Flux<Map<S, F>>
    where
        F: FnMut(T) -> U,
    {
        Flux::new(Map::new(self.stream, f))
    }

    /// Keep only the items matching `predicate`.
    pub fn filter<P>(self, predicate: P) -> Flux<Filter<S, P>>
    where
        P: FnMut(&T) -> bool,
    {
        Flux::new(Filter::new(self.stream, predicate))
    }

    /// Complete after `n` items, releasing the upstream.
    ///
    /// Once the bound is reached the upstream is dropped, so a [`create`]
    /// source is cancelled and never asked for more items.
    pub fn take(self, n: usize) -> Flux<Take<S>> {
        Flux::new(Take::new(self.stream, n))
    }

    /// Run a sub-pipeline for each item and merge their outputs.
    ///
    /// `f` turns every upstream item into an inner source: another `Flux`
    /// or a [`SingleResult`]. At most `limit` inner sources are active at
    /// once; the upstream is not pulled while all slots are taken. Items are
    /// emitted in the order they complete, not in upstream order.
    ///
    /// The merged flux completes once the upstream and every inner source
    /// have completed. The first failure from an inner source that was not
    /// recovered ends the flux with that failure and drops every sibling
    /// still in flight.
    pub fn expand<F, I>(self, limit: NonZeroUsize, f: F) -> Flux<Expand<S, F, I>>
    where
        F: FnMut(T) -> I,
        I: IntoFlux,
    {
        Flux::new(Expand::new(self.stream, limit, f))
    }

    /// Gather every item, in arrival order, into a `Vec`.
    pub fn collect(self) -> SingleResult<Vec<T>>
    where
        S: Send + 'static,
        T: Send + 'static,
    {
        SingleResult::from_future(Collect::new(self.stream))
    }
}

impl<S: Stream> Stream for Flux<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().stream.poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.stream.size_hint()
    }
}

/// Conversion into a [`Flux`].
///
/// This is what lets [`Flux::expand`] accept both fluxes and single results
/// as inner sources.
pub trait IntoFlux {
    /// The success type of the items.
    type Item;
    /// The stream the flux wraps.
    type Stream: Stream<Item = Result<Self::Item>>;

    /// Convert `self` into a flux.
    fn into_flux(self) -> Flux<Self::Stream>;
}

impl<S, T> IntoFlux for Flux<S>
where
    S: Stream<Item = Result<T>>,
{
    type Item = T;
    type Stream = S;

    fn into_flux(self) -> Flux<S> {
        self
    }
}

impl<T: Send + 'static> IntoFlux for SingleResult<T> {
    type Item = T;
    type Stream = Once<T>;

    fn into_flux(self) -> Flux<Once<T>> {
        Flux::new(Once::new(self))
    }
}
