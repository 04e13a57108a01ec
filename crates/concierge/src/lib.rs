//! An out-of-the-box admissions concierge: the university agent profile
//! wired to the routing core and the Anthropic-compatible provider.
//!
//! The crate includes a small CLI for trying the router in a terminal, and
//! can also be used as a library to embed the configured profile in a host
//! application.

#![deny(missing_docs)]

pub mod profile;

/// Re-exports of the [`concierge_core`] crate.
pub mod core {
    pub use concierge_core::*;
}
