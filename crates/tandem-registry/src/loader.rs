//! Designated loader actor.
//!
//! Some unit formats must be instantiated on one specific thread. A
//! [`LoaderThread`] owns such a thread, runs every instantiation there, and
//! blocks the caller until the reply arrives. Calls made from the loader
//! thread itself run inline instead of deadlocking on their own queue.
//!
//! ## Design Decisions
//!
//! - **crossbeam-channel**: unbounded job queue, `bounded(1)` reply channel
//!   per request.
//! - **Panics are contained**: a factory that panics fails that one request;
//!   the loader keeps serving.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Sender, unbounded};

use crate::catalog::{BoxedUnit, UnitSource};
use crate::descriptor::{IdScheme, UnitDescriptor};

type Job = Box<dyn FnOnce() + Send>;

/// A [`UnitSource`] that instantiates on a dedicated thread.
pub struct LoaderThread {
    source: Arc<dyn UnitSource>,
    jobs: Option<Sender<Job>>,
    thread_id: ThreadId,
    handle: Option<JoinHandle<()>>,
}

impl LoaderThread {
    /// Spawn the loader thread serving `source`.
    pub fn spawn(source: Arc<dyn UnitSource>) -> std::io::Result<Self> {
        let (tx, rx) = unbounded::<Job>();
        let handle = thread::Builder::new()
            .name("unit-loader".to_owned())
            .spawn(move || {
                tracing::debug!("LoaderThread: started");
                while let Ok(job) = rx.recv() {
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        tracing::warn!("LoaderThread: job panicked");
                    }
                }
                tracing::debug!("LoaderThread: stopped");
            })?;
        Ok(Self {
            source,
            jobs: Some(tx),
            thread_id: handle.thread().id(),
            handle: Some(handle),
        })
    }

    /// Whether the calling thread is the loader thread.
    pub fn is_loader_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Run `f` on the loader thread and wait for its result.
    ///
    /// Returns `None` if the loader is gone or `f` panicked.
    pub fn run_sync<R, F>(&self, f: F) -> Option<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        if self.is_loader_thread() {
            return Some(f());
        }
        let jobs = self.jobs.as_ref()?;
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        let job: Job = Box::new(move || {
            let _ = reply_tx.send(f());
        });
        jobs.send(job).ok()?;
        reply_rx.recv().ok()
    }
}

impl UnitSource for LoaderThread {
    fn find_descriptor(&self, id: &str, scheme: IdScheme) -> Option<UnitDescriptor> {
        self.source.find_descriptor(id, scheme)
    }

    fn instantiate(
        &self,
        descriptor: &UnitDescriptor,
        sample_rate: f64,
        block_size: usize,
    ) -> Result<BoxedUnit, String> {
        let source = Arc::clone(&self.source);
        let descriptor = descriptor.clone();
        self.run_sync(move || source.instantiate(&descriptor, sample_rate, block_size))
            .unwrap_or_else(|| Err("unit loader did not complete the request".to_owned()))
    }

    fn descriptors(&self) -> Vec<UnitDescriptor> {
        self.source.descriptors()
    }
}

impl Drop for LoaderThread {
    fn drop(&mut self) {
        // Closing the queue ends the loop.
        self.jobs.take();
        if let Some(handle) = self.handle.take()
            && !self.is_loader_thread()
        {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UnitCatalog;

    fn loader() -> LoaderThread {
        LoaderThread::spawn(Arc::new(UnitCatalog::with_builtins())).unwrap()
    }

    #[test]
    fn test_instantiates_on_loader_thread() {
        let loader = Arc::new(loader());
        let probe = Arc::clone(&loader);
        let on_loader = loader.run_sync(move || probe.is_loader_thread()).unwrap();
        assert!(on_loader);
        assert!(!loader.is_loader_thread());

        let desc = loader.find_descriptor("builtin:echo", IdScheme::Native).unwrap();
        let unit = loader.instantiate(&desc, 48000.0, 128).unwrap();
        assert_eq!(unit.name(), "Echo");
    }

    #[test]
    fn test_reentrant_call_runs_inline() {
        let loader = Arc::new(loader());
        let inner = Arc::clone(&loader);
        let nested = loader.run_sync(move || inner.run_sync(|| 7)).unwrap();
        assert_eq!(nested, Some(7));
    }

    #[test]
    fn test_panicking_job_does_not_kill_loader() {
        let loader = loader();
        let result: Option<()> = loader.run_sync(|| panic!("boom"));
        assert!(result.is_none());
        assert_eq!(loader.run_sync(|| 1 + 1), Some(2));
    }
}
