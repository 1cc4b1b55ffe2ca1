//! Push changed documents to running apps and hot-swap them in place.
//!
//! A producer watches documents on disk and broadcasts each saved one to
//! every connected consumer over loopback TCP. A consumer finds the live
//! object the document describes and reloads it on its UI thread without
//! losing the object's state.
//!
//! # Crate Structure
//!
//! - [`transport`]: loopback TCP transport and disconnect classification
//! - [`frame`]: kind + length prefixed message framing
//! - [`server`]: the producer (behind `server` feature)
//! - [`client`]: the consumer (behind `client` feature)

/// Re-export transport types.
pub mod transport {
    pub use liveswap_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use liveswap_frame::*;
}

/// Re-export producer types (requires `server` feature).
#[cfg(feature = "server")]
pub mod server {
    pub use liveswap_server::*;
}

/// Re-export consumer types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use liveswap_client::*;
}
