//! Filesystem watching for the producer.
//!
//! Wraps `notify` and turns its events into a stream of changed paths that
//! [`DocumentWatcher::run_until`] feeds into
//! [`BroadcastServer::document_changed`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::document::DocumentFilter;
use crate::error::Result;
use crate::server::BroadcastServer;

/// Window in which repeated events for the same save are folded together.
const DEBOUNCE: Duration = Duration::from_millis(50);

/// How often `run_until` checks its stop flag while idle.
const POLL: Duration = Duration::from_millis(100);

/// Recursive watcher producing changed file paths.
pub struct DocumentWatcher {
    _watcher: RecommendedWatcher,
    events: Receiver<PathBuf>,
    root: PathBuf,
}

impl DocumentWatcher {
    /// Start watching `root` and everything below it.
    pub fn watch(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let (tx, rx) = mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for path in changed_paths(&event) {
                    if tx.send(path).is_err() {
                        return;
                    }
                }
            }
            Err(err) => warn!(error = %err, "file watch error"),
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        info!(root = %root.display(), "watching for document changes");

        Ok(Self {
            _watcher: watcher,
            events: rx,
            root,
        })
    }

    /// The directory being watched.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Wait up to `timeout` for the next batch of changed paths.
    ///
    /// Events arriving within a short window after the first are folded
    /// into the same batch; duplicates are removed, first-seen order kept.
    /// An empty batch means the timeout elapsed.
    pub fn next_batch(&self, timeout: Duration) -> Vec<PathBuf> {
        let first = match self.events.recv_timeout(timeout) {
            Ok(path) => path,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                return Vec::new()
            }
        };

        let mut batch = vec![first];
        let deadline = Instant::now() + DEBOUNCE;
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            match self.events.recv_timeout(remaining) {
                Ok(path) => {
                    if !batch.contains(&path) {
                        batch.push(path);
                    }
                }
                Err(_) => break,
            }
        }
        batch
    }

    /// Feed change events into `server` until `running` is cleared.
    ///
    /// Filtered-out changes and unreadable documents are not errors; a
    /// broadcast failure that is not a consumer going away is returned.
    pub fn run_until(&self, server: &BroadcastServer, running: &AtomicBool) -> Result<()> {
        while running.load(Ordering::SeqCst) {
            let batch = self.next_batch(POLL);
            for path in distinct_documents(&server.config().filter, batch) {
                match server.document_changed(&path)? {
                    Some(delivered) => {
                        info!(path = %path.display(), delivered, "pushed document")
                    }
                    None => debug!(path = %path.display(), "no broadcast for change"),
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for DocumentWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentWatcher")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// The documents a batch of changes resolves to, each once, in first-seen
/// order. Changes the filter ignores are dropped.
fn distinct_documents(filter: &DocumentFilter, batch: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut documents: Vec<PathBuf> = Vec::with_capacity(batch.len());
    for changed in batch {
        match filter.resolve(&changed) {
            Some(document) if !documents.contains(&document) => documents.push(document),
            Some(_) => {}
            None => debug!(path = %changed.display(), "change filtered out"),
        }
    }
    documents
}

/// Paths whose content may have changed, per event.
fn changed_paths(event: &Event) -> Vec<PathBuf> {
    match &event.kind {
        EventKind::Create(_)
        | EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Any)
        | EventKind::Modify(ModifyKind::Other) => event.paths.clone(),
        // Atomic saves land by renaming a temp file over the document.
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event.paths.clone(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.last().cloned().into_iter().collect()
        }
        _ => Vec::new(),
    }
}
