//! Schema module - Configuration and scene types for advection runs.

mod config;
mod scene;

pub use config::*;
pub use scene::*;
