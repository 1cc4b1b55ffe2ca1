//! Replacing a live node's content in place.
//!
//! The swap itself runs on the UI thread through a [`UiDispatcher`]; the
//! caller gets a [`PendingSwap`] and blocks on it. While the loader runs,
//! the node's data context is held aside and put back afterwards no matter
//! how the load ended, so bindings survive a reload and a broken document
//! leaves the node's state untouched.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::dispatch::UiDispatcher;
use crate::error::{LoadError, SwapError};
use crate::tree::{DataContext, LiveNode, NodeRef};

/// Applies document text to a live node. Implemented by the UI framework.
pub trait MarkupLoader: Send + Sync {
    fn load(&self, node: &dyn LiveNode, markup: &str) -> std::result::Result<(), LoadError>;
}

/// Schedules hot swaps on the UI thread.
#[derive(Clone)]
pub struct HotSwap {
    loader: Arc<dyn MarkupLoader>,
    dispatcher: Arc<dyn UiDispatcher>,
}

impl HotSwap {
    pub fn new(loader: Arc<dyn MarkupLoader>, dispatcher: Arc<dyn UiDispatcher>) -> Self {
        Self { loader, dispatcher }
    }

    /// Schedule `markup` to be applied to `node`.
    pub fn apply(&self, node: NodeRef, markup: impl Into<String>) -> PendingSwap {
        let (tx, rx) = mpsc::sync_channel(1);
        let loader = Arc::clone(&self.loader);
        let markup = markup.into();

        self.dispatcher.dispatch(Box::new(move || {
            let outcome = swap_in_place(loader.as_ref(), &node, &markup);
            if tx.send(outcome).is_err() {
                debug!(identity = node.identity(), "swap result no longer awaited");
            }
        }));

        PendingSwap { result: rx }
    }
}

impl std::fmt::Debug for HotSwap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotSwap").finish_non_exhaustive()
    }
}

/// A scheduled swap whose outcome is not known yet.
#[derive(Debug)]
pub struct PendingSwap {
    result: Receiver<Result<(), SwapError>>,
}

impl PendingSwap {
    /// Block until the UI thread has run (or dropped) the swap.
    pub fn wait(self) -> Result<(), SwapError> {
        self.result.recv().unwrap_or(Err(SwapError::Abandoned))
    }
}

/// Puts the captured data context back when dropped.
struct RestoreContext<'a> {
    node: &'a dyn LiveNode,
    saved: Option<DataContext>,
}

impl<'a> RestoreContext<'a> {
    fn capture(node: &'a dyn LiveNode) -> Self {
        Self {
            saved: node.data_context(),
            node,
        }
    }
}

impl Drop for RestoreContext<'_> {
    fn drop(&mut self) {
        self.node.set_data_context(self.saved.take());
    }
}

fn swap_in_place(loader: &dyn MarkupLoader, node: &NodeRef, markup: &str) -> Result<(), SwapError> {
    let node: &dyn LiveNode = node.as_ref();
    let _restore = RestoreContext::capture(node);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<(), SwapError> {
        loader.load(node, markup).map_err(SwapError::Load)?;
        node.force_layout();
        Ok(())
    }));

    match outcome {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(identity = node.identity(), panic = %message, "hot swap panicked");
            Err(SwapError::Panicked(message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
