//! Sequential database updates for the control panel schema.
//!
//! Updates are identified by an increasing revision number. The engine reads
//! the stored revision counter, runs every update from there up to the highest
//! known revision, one transaction per update, and stops at the first failure.

pub mod context;
pub mod engine;
pub mod failure;
pub mod registry;
pub mod statement;

pub use context::{StepContext, StepSettings};
pub use engine::{InvocationMode, UpdateEngine};
pub use registry::{Registry, Step};
pub use statement::Statement;
