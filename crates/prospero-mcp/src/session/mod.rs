//! Session handshake state.

pub mod state;
#[cfg(feature = "sse")]
pub mod store;

pub use state::SessionState;
#[cfg(feature = "sse")]
pub use store::SessionStore;
