pub mod census;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod reader;
pub mod write;

// Re-export commonly used types
pub use census::{seed_records, Record};
pub use client::{FlightQueryClient, QueryService};
pub use config::Settings;
pub use error::{CensusError, QueryError, WriteError};
pub use write::{HttpPointWriter, PointWriter};
