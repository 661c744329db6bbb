//! Worker pools that computations can be placed on.
//!
//! A [`Scheduler`] is a cheap, cloneable name for a pool of threads. Work
//! handed to it starts running on one of the pool's threads and the caller
//! immediately gets back a pending [`SingleResult`].
//!
//! Two kinds of pools are provided out of the box:
//!
//! - [`Scheduler::parallel`]: a process-wide, fixed-size pool with one thread
//!   per CPU, meant for CPU-bound work.
//! - [`Scheduler::from_tokio`]: any tokio runtime, such as the work-stealing
//!   multi-threaded runtime.
//!
//! Anything implementing [`futures::task::Spawn`] can be wrapped with
//! [`Scheduler::from_spawner`]; pipelines never care which pool they run on.
//!
//! # Example
//!
//! ```
//! use flux_concurrency::Scheduler;
//! use std::convert::Infallible;
//!
//! let answer = Scheduler::parallel()
//!     .schedule(|| Ok::<_, Infallible>(6 * 7))
//!     .wait();
//! assert_eq!(answer.unwrap(), 42);
//! ```

use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use futures::executor::ThreadPool;
use futures::future::FutureObj;
use futures::task::{Spawn, SpawnError, SpawnExt};

use crate::single::SingleResult;
use crate::{BoxError, Error, Result};

/// A named pool of worker threads.
#[derive(Clone)]
pub struct Scheduler {
    name: Arc<str>,
    pool: Arc<dyn Spawn + Send + Sync>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// The shared CPU-count-sized pool.
    ///
    /// The pool is started the first time this is called. If its threads
    /// cannot be spawned every piece of work scheduled on it fails with
    /// [`Error::Rejected`].
    pub fn parallel() -> Self {
        static PARALLEL: OnceLock<Scheduler> = OnceLock::new();
        PARALLEL
            .get_or_init(|| {
                let size = num_cpus::get();
                let pool = ThreadPool::builder()
                    .pool_size(size)
                    .name_prefix("parallel-")
                    .create();
                match pool {
                    Ok(pool) => {
                        tracing::debug!(size, "started parallel scheduler");
                        Self::from_spawner("parallel", pool)
                    }
                    Err(err) => {
                        tracing::error!(%err, "failed to start parallel scheduler");
                        Self::from_spawner("parallel", Unavailable)
                    }
                }
            })
            .clone()
    }

    /// Place work on a tokio runtime.
    pub fn from_tokio(handle: tokio::runtime::Handle) -> Self {
        Self::from_spawner("tokio", TokioPool(handle))
    }

    /// Wrap any spawner as a scheduler.
    pub fn from_spawner<S>(name: impl Into<Arc<str>>, spawner: S) -> Self
    where
        S: Spawn + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            pool: Arc::new(spawner),
        }
    }

    /// The name this scheduler was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run a fallible computation on this pool.
    ///
    /// The computation starts right away; the returned result resolves once it
    /// has finished.
    pub fn schedule<T, E, F>(&self, computation: F) -> SingleResult<T>
    where
        F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
        E: Into<BoxError>,
        T: Send + 'static,
    {
        self.spawn(async move { computation().map_err(Error::computation) })
    }

    /// Run a future on this pool.
    ///
    /// The future starts right away; the returned result resolves with its
    /// output. Dropping the returned result aborts the future.
    pub fn spawn<T, Fut>(&self, future: Fut) -> SingleResult<T>
    where
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        SingleResult::dispatch(self, Box::pin(future))
    }

    pub(crate) fn execute<Fut>(&self, task: Fut) -> Result<()>
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.pool.spawn(task).map_err(|source| Error::Rejected {
            scheduler: self.name.to_string(),
            source,
        })
    }
}

/// Adapts a tokio runtime handle to the `Spawn` interface.
struct TokioPool(tokio::runtime::Handle);

impl Spawn for TokioPool {
    fn spawn_obj(&self, future: FutureObj<'static, ()>) -> std::result::Result<(), SpawnError> {
        // The join handle is dropped; completion is reported through the task itself.
        drop(self.0.spawn(future));
        Ok(())
    }
}

/// Stand-in for a pool that could not be started.
struct Unavailable;

impl Spawn for Unavailable {
    fn spawn_obj(&self, _future: FutureObj<'static, ()>) -> std::result::Result<(), SpawnError> {
        Err(SpawnError::shutdown())
    }

    fn status(&self) -> std::result::Result<(), SpawnError> {
        Err(SpawnError::shutdown())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::convert::Infallible;
    use std::thread;

    fn thread_name() -> std::result::Result<String, Infallible> {
        Ok(thread::current().name().unwrap_or_default().to_owned())
    }

    #[test]
    fn parallel_runs_on_pool_threads() {
        let name = Scheduler::parallel().schedule(thread_name).wait().unwrap();
        assert!(name.starts_with("parallel-"), "ran on `{name}`");
    }

    #[test]
    fn parallel_is_shared() {
        let a = Scheduler::parallel();
        let b = Scheduler::parallel();
        assert!(Arc::ptr_eq(&a.pool, &b.pool));
        assert_eq!(a.name(), "parallel");
    }

    #[test]
    fn rejected_work_fails() {
        let scheduler = Scheduler::from_spawner("closed", Unavailable);
        let err = scheduler
            .schedule(|| Ok::<_, Infallible>(1))
            .wait()
            .unwrap_err();
        assert!(matches!(err, Error::Rejected { ref scheduler, .. } if scheduler == "closed"));
        assert!(err.is_pipeline_failure());
    }

    #[test]
    fn computation_errors_are_preserved() {
        let err = Scheduler::parallel()
            .schedule(|| Err::<(), _>(std::fmt::Error))
            .wait()
            .unwrap_err();
        assert!(err.downcast_ref::<std::fmt::Error>().is_some());
    }

    #[test]
    fn tokio_pool() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("stealer")
            .build()
            .unwrap();
        let scheduler = Scheduler::from_tokio(runtime.handle().clone());
        let name = scheduler.schedule(thread_name).wait().unwrap();
        assert_eq!(name, "stealer");
        assert_eq!(scheduler.name(), "tokio");
    }
}
