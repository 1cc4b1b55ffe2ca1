//! Finding the live node a received document belongs to.

use crate::tree::{NodeRef, NodeShape};

/// Find the node under `root` whose identity is `identity`.
///
/// Candidates are checked in this order, first hit wins:
/// 1. the root's modal stack, preferring the most recently pushed layer;
/// 2. the current child of a navigation container;
/// 3. the primary pane, then the secondary pane, of a dual-pane node
///    (each searched with these same rules);
/// 4. the root itself.
///
/// Returns `None` when nothing matches, which is a normal outcome: the
/// document simply is not on screen.
pub fn find(root: &NodeRef, identity: &str) -> Option<NodeRef> {
    if let Some(modal) = root
        .modal_stack()
        .into_iter()
        .rev()
        .find(|node| node.identity() == identity)
    {
        return Some(modal);
    }

    match root.shape() {
        NodeShape::Leaf => {}
        NodeShape::Navigation { current } => {
            if let Some(current) = current.filter(|node| node.identity() == identity) {
                return Some(current);
            }
        }
        NodeShape::DualPane { primary, secondary } => {
            if let Some(found) = primary.as_ref().and_then(|pane| find(pane, identity)) {
                return Some(found);
            }
            if let Some(found) = secondary.as_ref().and_then(|pane| find(pane, identity)) {
                return Some(found);
            }
        }
    }

    (root.identity() == identity).then(|| root.clone())
}
