//! Configuration for the action-group handlers
//!
//! Compiled-in defaults reproduce the constants the handlers ship with; YAML and
//! environment overrides adjust them per deployment.

pub mod types;
pub mod loader;
pub mod validation;

pub use types::*;
pub use loader::*;
