//! Blocking point submission against the InfluxDB v2 write API.

use crate::config::Settings;
use crate::error::WriteError;
use async_trait::async_trait;
use futures::stream;
use influxdb2::{models::DataPoint, Client, RequestError};
use tracing::debug;

/// Submits one point and resolves once the store has acknowledged it.
#[async_trait]
pub trait PointWriter: Send + Sync {
    async fn write_point(&self, point: DataPoint) -> Result<(), WriteError>;
}

/// Writes points through the InfluxDB v2 client, one request per point.
pub struct HttpPointWriter {
    client: Client,
    bucket: String,
}

impl HttpPointWriter {
    pub fn new(settings: &Settings) -> Result<Self, WriteError> {
        let base = settings
            .base_url()
            .map_err(|e| WriteError::Client(e.to_string()))?;
        let client = Client::new(
            base.as_str().trim_end_matches('/'),
            settings.organisation.as_str(),
            settings.token.as_str(),
        );

        Ok(Self {
            client,
            bucket: settings.bucket.clone(),
        })
    }
}

#[async_trait]
impl PointWriter for HttpPointWriter {
    async fn write_point(&self, point: DataPoint) -> Result<(), WriteError> {
        debug!(bucket = %self.bucket, point = ?point, "Submitting point");

        self.client
            .write(&self.bucket, stream::iter([point]))
            .await
            .map_err(|e| match e {
                RequestError::Http { status, text } => WriteError::Rejected {
                    status: status.as_u16(),
                    message: text.trim().to_string(),
                },
                other => WriteError::Request(other),
            })
    }
}
