//! Consumer side of liveswap.
//!
//! A consumer holds a [`LiveTree`] of on-screen nodes. [`enable`] connects to
//! the producer and, for every document it pushes, pulls the target identity
//! out of the text, finds the matching node with [`find`], and hands the
//! document to a [`HotSwap`], which runs the framework's [`MarkupLoader`] on
//! the UI thread while keeping the node's data context intact.
//!
//! The UI framework plugs in through three traits: [`LiveNode`],
//! [`MarkupLoader`] and [`UiDispatcher`].

pub mod config;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod locate;
pub mod receive;
pub mod swap;
pub mod tree;

pub use config::{ClientConfig, DEFAULT_CONNECT_TIMEOUT};
pub use dispatch::{InlineDispatcher, UiDispatcher, UiJob, UiThread};
pub use error::{ClientError, LoadError, Result, SwapError};
pub use identity::{extract_identity, IdentityExtractor, DEFAULT_IDENTITY_ATTRIBUTE};
pub use locate::find;
pub use receive::{enable, query_hostname, receive_loop, ClientSession, FrameOutcome};
pub use swap::{HotSwap, MarkupLoader, PendingSwap};
pub use tree::{DataContext, LiveNode, LiveTree, NodeRef, NodeShape};
