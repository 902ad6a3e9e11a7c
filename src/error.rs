//! Error types for the census client.
//!
//! Each phase of the run owns an error enum whose display text starts with a
//! short phase prefix. Every error is terminal: the binary prints it and
//! exits with a nonzero status.

use arrow::error::ArrowError;
use arrow_flight::error::FlightError;
use std::result;

/// A specialized Result type for the census workflow.
pub type Result<T> = result::Result<T, CensusError>;

/// Errors raised while submitting points to the write API.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The write client could not be built.
    #[error("write API client: {0}")]
    Client(String),

    /// A record could not be turned into a point.
    #[error("write API point: {0}")]
    Point(String),

    /// The request never got an answer from the store.
    #[error("write API write point: {0}")]
    Request(#[from] influxdb2::RequestError),

    /// The store answered with a non-success status.
    #[error("write API write point: {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Errors raised by the Flight SQL query phase.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("x509: {0}")]
    Tls(String),

    #[error("flightsql: invalid endpoint {0}")]
    Endpoint(String),

    #[error("flightsql: {0}")]
    Connect(#[from] tonic::transport::Error),

    #[error("flightsql flight info: {0}")]
    FlightInfo(#[source] ArrowError),

    #[error("flightsql do get: {0}")]
    DoGet(#[source] ArrowError),

    #[error("flightsql reader: {0}")]
    Stream(#[source] FlightError),

    #[error("json: {0}")]
    Serialize(#[source] ArrowError),

    #[error("stdout: {0}")]
    Output(#[from] std::io::Error),
}

/// Top-level error for a census run.
#[derive(Debug, thiserror::Error)]
pub enum CensusError {
    #[error("config: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("stdout: {0}")]
    Output(#[from] std::io::Error),
}
