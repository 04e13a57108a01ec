//! An abstraction layer for hosted model endpoints.
//!
//! This crate establishes an unified protocol between the routing core and
//! the concrete model endpoint, so that the core can be exercised against a
//! scripted fake as easily as against a real hosted model.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
