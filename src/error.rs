//! Errors produced while driving a pipeline.

use futures::task::SpawnError;

/// A type-erased error returned by a user computation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The ways a [`SingleResult`] or [`Flux`] can fail.
///
/// [`SingleResult`]: crate::single::SingleResult
/// [`Flux`]: crate::flux::Flux
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A computation returned an error.
    #[error("{0}")]
    Computation(#[source] BoxError),

    /// The scheduler refused to accept the work.
    #[error("scheduler `{scheduler}` rejected work: {source}")]
    Rejected {
        /// Name of the scheduler that refused the task.
        scheduler: String,
        /// Reason given by the pool.
        #[source]
        source: SpawnError,
    },

    /// Scheduled work was dropped, or panicked, before producing an outcome.
    #[error("scheduled work was dropped before it completed")]
    Canceled,
}

impl Error {
    /// Wrap an arbitrary error as a computation failure.
    pub fn computation(err: impl Into<BoxError>) -> Self {
        Self::Computation(err.into())
    }

    /// Returns a reference to the computation error if it is of type `E`.
    ///
    /// # Example
    ///
    /// ```
    /// use flux_concurrency::fraction::{Fraction, FractionError};
    /// use flux_concurrency::Error;
    ///
    /// let err = Error::computation(Fraction::new(1, 0).unwrap_err());
    /// assert_eq!(err.downcast_ref::<FractionError>(), Some(&FractionError::DivisionByZero));
    /// ```
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Self::Computation(err) => err.downcast_ref::<E>(),
            Self::Rejected { .. } | Self::Canceled => None,
        }
    }

    /// Returns `true` if this failure came from the pipeline machinery rather
    /// than from a computation.
    pub fn is_pipeline_failure(&self) -> bool {
        !matches!(self, Self::Computation(_))
    }
}
