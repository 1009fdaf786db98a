//! # Session Core - Session Expiration & Flash Messages
//!
//! Session expiration policies and one-shot flash messages over pluggable
//! session storage.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use session_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let store = Arc::new(MemoryStore::new());
//!     let session = Session::new(store);
//!
//!     session.write("user_id", 42).await?;
//!     assert_eq!(session.read("user_id").await?, Some(42.into()));
//!     assert!(!session.is_max_age_expired().await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Dual expiration timers**: absolute max age plus rolling last-activity timeout
//! - **Identity rotation**: the session identity rotates on every store open
//! - **Flash messages**: categorized, consumed exactly once, local or session-backed
//! - **Pluggable storage**: bring your own [`SessionStore`](store::SessionStore),
//!   or use the in-memory one

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, future_incompatible)]

pub mod error;
pub mod flash;
pub mod session;
pub mod store;

pub use error::{Result, SessionError};

/// Convenient re-exports for common use cases
pub mod prelude {
    pub use crate::error::{Result, SessionError};
    pub use crate::flash::{FlashBag, FlashCategory, FlashMessages};
    pub use crate::session::{Session, SessionConfig};
    pub use crate::store::{MemoryStore, SessionStore, StoreError};
}

/// Current version of the session-core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
