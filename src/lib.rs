//! Asynchronous operator pipelines with per-element failure isolation.
//!
//! This crate provides a small set of building blocks for pipelines that fan
//! every element of a sequence out into its own sub-computation, keep a
//! failure in one element from affecting its siblings, and gather the results
//! into a single outcome. See the [`single`] and [`flux`] submodules for more.
//!
//! # Operations
//!
//! - [`SingleResult`]: one eventual value or failure, with `map`, `flat_map`,
//!   `recover` and `run_on`.
//! - [`Scheduler`]: a pool that computations can be placed on.
//! - [`Flux`]: a fallible stream with `map`, `filter`, `take`, `expand` and
//!   `collect`, built with [`flux::from_iter`] or [`flux::create`].
//! - [`Barrier`]: waits for a set of results, in completion order.
//!
//! # Examples
//!
//! Fan out, isolate a failure, and gather the rest:
//!
//! ```rust
//! use flux_concurrency::flux::{self, DEFAULT_CONCURRENCY};
//! use flux_concurrency::{Scheduler, SingleResult};
//!
//! let mut values = flux::from_iter(["1", "two", "3"])
//!     .expand(DEFAULT_CONCURRENCY, |text| {
//!         SingleResult::from_computation(move || text.parse::<u32>())
//!             .run_on(Scheduler::parallel())
//!             .recover(|_| SingleResult::just(0))
//!     })
//!     .filter(|n| *n > 0)
//!     .collect()
//!     .wait()
//!     .unwrap();
//! values.sort();
//! assert_eq!(values, [1, 3]);
//! ```
//!
//! The [`pipelines`] module assembles complete pipelines over exact
//! [`fraction`]s, and is what the `fraction-pipelines` binary runs.

#![deny(missing_debug_implementations, nonstandard_style)]
#![warn(missing_docs, unreachable_pub)]

mod error;

pub mod flux;
pub mod fraction;
pub mod pipelines;
pub mod report;
pub mod scheduler;
pub mod single;

/// The flux-concurrency prelude.
pub mod prelude {
    pub use super::flux::{Flux, IntoFlux as _};
    pub use super::scheduler::Scheduler;
    pub use super::single::{Barrier, SingleResult};
}

pub use error::{BoxError, Error, Result};
pub use flux::Flux;
pub use scheduler::Scheduler;
pub use single::{Barrier, SingleResult};
