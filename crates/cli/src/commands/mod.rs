//! Command handlers for the casefile CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod check;
pub mod investigate;
pub mod retrieve;
mod setup;

// Re-export command types for convenience
pub use check::CheckCommand;
pub use investigate::InvestigateCommand;
pub use retrieve::RetrieveCommand;
