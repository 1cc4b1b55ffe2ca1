//! The consumer's live object tree, as seen by liveswap.
//!
//! The tree itself belongs to the UI framework. liveswap only reads its
//! shape to find swap targets, and touches a node's data context while it
//! swaps that node's content.

use std::any::Any;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared handle to a live node.
pub type NodeRef = Arc<dyn LiveNode>;

/// Opaque state attached to a node from outside its markup.
pub type DataContext = Arc<dyn Any + Send + Sync>;

/// How a node composes other nodes.
#[derive(Clone, Default)]
pub enum NodeShape {
    /// No children that take part in target lookup.
    #[default]
    Leaf,
    /// A container showing one child at a time.
    Navigation { current: Option<NodeRef> },
    /// A composite with a primary and a secondary pane.
    DualPane {
        primary: Option<NodeRef>,
        secondary: Option<NodeRef>,
    },
}

impl std::fmt::Debug for NodeShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id = |node: &Option<NodeRef>| node.as_ref().map(|n| n.identity().to_string());
        match self {
            NodeShape::Leaf => f.write_str("Leaf"),
            NodeShape::Navigation { current } => f
                .debug_struct("Navigation")
                .field("current", &id(current))
                .finish(),
            NodeShape::DualPane { primary, secondary } => f
                .debug_struct("DualPane")
                .field("primary", &id(primary))
                .field("secondary", &id(secondary))
                .finish(),
        }
    }
}

/// A renderable object in the consumer's tree.
pub trait LiveNode: Send + Sync {
    /// Fully qualified type name, compared against the document identity.
    fn identity(&self) -> &str;

    /// Modal layers pushed over this node, oldest first.
    fn modal_stack(&self) -> Vec<NodeRef> {
        Vec::new()
    }

    fn shape(&self) -> NodeShape {
        NodeShape::Leaf
    }

    fn data_context(&self) -> Option<DataContext>;

    fn set_data_context(&self, context: Option<DataContext>);

    /// Recompute layout after the content changed.
    fn force_layout(&self) {}
}

/// Handle to the consumer's current root node.
#[derive(Default)]
pub struct LiveTree {
    root: RwLock<Option<NodeRef>>,
}

impl LiveTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: NodeRef) -> Self {
        Self {
            root: RwLock::new(Some(root)),
        }
    }

    /// Replace the root, e.g. after the application navigated.
    pub fn set_root(&self, root: Option<NodeRef>) {
        *self.root.write().unwrap_or_else(PoisonError::into_inner) = root;
    }

    pub fn root(&self) -> Option<NodeRef> {
        self.root
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl std::fmt::Debug for LiveTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveTree")
            .field("root", &self.root().map(|n| n.identity().to_string()))
            .finish()
    }
}
