//! Command-line interface module.
//!
//! This module drives the two phases of a census run:
//! - Writing the seed records through the write API
//! - Reading them back over Flight SQL

pub mod handlers;

pub use handlers::{handle_census, run_workflow};
