//! CLI command implementations.

pub mod common;
pub mod evolve;
pub mod run;
pub mod version;
