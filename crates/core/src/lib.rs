//! Core logic: policy building, markup extraction and the retrying router.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod decision;
mod model_client;
pub mod policy;
pub mod profile;
mod router;
pub mod xml;

pub use decision::{Decision, ToolAction};
pub use model_client::ModelClient;
pub use router::{Invocation, Router, RouterBuilder};
pub use router::{INITIAL_TEMPERATURE, MAX_ATTEMPTS, TEMPERATURE_STEP};
