//! Flight SQL client used by the read phase.
//!
//! Every request carries the bearer token and the bucket name as gRPC
//! metadata, which is how InfluxDB's Flight SQL endpoint scopes a query.

use crate::config::Settings;
use crate::error::QueryError;
use arrow_array::RecordBatch;
use arrow_flight::{error::FlightError, sql::client::FlightSqlServiceClient, FlightInfo, Ticket};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tracing::{debug, info};

/// Record batches streamed back by a `do_get`.
pub type BatchStream = BoxStream<'static, Result<RecordBatch, FlightError>>;

/// The two calls the read phase makes against a Flight SQL endpoint.
#[async_trait]
pub trait QueryService: Send {
    /// Submit a SQL query and return the flight info describing where its results live.
    async fn execute(&mut self, query: &str) -> Result<FlightInfo, QueryError>;

    /// Open the result stream for one ticket.
    async fn do_get(&mut self, ticket: Ticket) -> Result<BatchStream, QueryError>;
}

/// Flight SQL client for the configured InfluxDB instance.
pub struct FlightQueryClient {
    client: FlightSqlServiceClient<Channel>,
    endpoint: String,
}

impl FlightQueryClient {
    /// Connect to the query endpoint derived from `settings`.
    ///
    /// `https` URLs negotiate TLS against the platform's trusted roots.
    pub async fn connect(settings: &Settings) -> Result<Self, QueryError> {
        let uri = settings
            .query_endpoint()
            .map_err(|e| QueryError::Endpoint(e.to_string()))?;

        debug!(uri = %uri, "Connecting to Flight SQL endpoint");

        let mut endpoint = Endpoint::from_shared(uri.clone())
            .map_err(|e| QueryError::Endpoint(format!("{}: {}", uri, e)))?;

        if settings.uses_tls() {
            let tls_config = ClientTlsConfig::new().with_native_roots();
            endpoint = endpoint
                .tls_config(tls_config)
                .map_err(|e| QueryError::Tls(e.to_string()))?;
        }

        let channel = endpoint.connect().await?;
        let client = Self::with_channel(channel, settings, uri);

        info!(endpoint = %client.endpoint, "Connected to Flight SQL endpoint");

        Ok(client)
    }

    /// Wrap an established channel, attaching the auth and bucket metadata.
    pub fn with_channel(channel: Channel, settings: &Settings, endpoint: String) -> Self {
        let mut client = FlightSqlServiceClient::new(channel);
        client.set_header("authorization", format!("Bearer {}", settings.token));
        client.set_header("bucket-name", settings.bucket.clone());
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl QueryService for FlightQueryClient {
    async fn execute(&mut self, query: &str) -> Result<FlightInfo, QueryError> {
        debug!(query = %query, "Executing query");
        self.client
            .execute(query.to_string(), None)
            .await
            .map_err(QueryError::FlightInfo)
    }

    async fn do_get(&mut self, ticket: Ticket) -> Result<BatchStream, QueryError> {
        let stream = self.client.do_get(ticket).await.map_err(QueryError::DoGet)?;
        Ok(stream.boxed())
    }
}
