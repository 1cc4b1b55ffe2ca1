//! Getting work onto the UI thread.

use std::sync::mpsc::{self, Sender};
use std::thread::{JoinHandle, ThreadId};

use tracing::debug;

use crate::error::{ClientError, Result};

/// A unit of work to run on the UI thread.
pub type UiJob = Box<dyn FnOnce() + Send + 'static>;

/// Schedules jobs on the single thread allowed to touch the live tree.
///
/// Implementations run each job exactly once, or drop it if the UI thread is
/// gone. Dropping is reported to the swap caller as abandoned.
pub trait UiDispatcher: Send + Sync {
    fn dispatch(&self, job: UiJob);
}

/// Runs every job immediately on the calling thread.
///
/// For consumers whose tree is not thread-affine, and for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatcher;

impl UiDispatcher for InlineDispatcher {
    fn dispatch(&self, job: UiJob) {
        job();
    }
}

/// A dedicated thread that runs jobs in submission order.
pub struct UiThread {
    jobs: Option<Sender<UiJob>>,
    thread: Option<JoinHandle<()>>,
    id: ThreadId,
}

impl UiThread {
    pub fn spawn(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let (tx, rx) = mpsc::channel::<UiJob>();
        let thread = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                for job in rx {
                    job();
                }
            })
            .map_err(|source| ClientError::Spawn { name, source })?;

        Ok(Self {
            id: thread.thread().id(),
            jobs: Some(tx),
            thread: Some(thread),
        })
    }

    /// Id of the thread jobs run on.
    pub fn thread_id(&self) -> ThreadId {
        self.id
    }

    /// Stop accepting jobs and wait for the queued ones to finish.
    pub fn join(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.jobs.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                debug!("ui thread panicked");
            }
        }
    }
}

impl UiDispatcher for UiThread {
    fn dispatch(&self, job: UiJob) {
        let sent = self.jobs.as_ref().map(|jobs| jobs.send(job));
        if !matches!(sent, Some(Ok(()))) {
            debug!("ui thread gone, dropping job");
        }
    }
}

impl Drop for UiThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for UiThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiThread")
            .field("id", &self.id)
            .field("running", &self.jobs.is_some())
            .finish()
    }
}
