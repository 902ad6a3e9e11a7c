//! The read phase: one fixed query, every result batch printed as JSON.

use crate::client::QueryService;
use crate::error::QueryError;
use arrow::error::ArrowError;
use arrow_array::RecordBatch;
use arrow_flight::FlightInfo;
use arrow_flight::Ticket;
use futures::StreamExt;
use std::io::Write;
use tracing::{debug, info, warn};

/// Everything written to `census` in the last hour that carries a species count.
///
/// The species names are fixed to the seed data.
pub const CENSUS_QUERY: &str = "SELECT *\n\
\t\t\t  FROM 'census'\n\
\t\t\t  WHERE time >= now() - interval '1 hour'\n\
\t\t\t  AND ('bees' IS NOT NULL OR 'ants' IS NOT NULL)";

/// Run [`CENSUS_QUERY`] and write one JSON line per streamed batch to `out`.
///
/// Returns the number of batches written.
pub async fn read_census<Q, W>(client: &mut Q, out: &mut W) -> Result<usize, QueryError>
where
    Q: QueryService + ?Sized,
    W: Write,
{
    let info = client.execute(CENSUS_QUERY).await?;
    let ticket = first_ticket(&info)?;

    let mut stream = client.do_get(ticket).await?;
    let mut batches = 0;
    while let Some(batch) = stream.next().await {
        let batch = batch.map_err(QueryError::Stream)?;
        let line = batch_to_json(&batch).map_err(QueryError::Serialize)?;
        writeln!(out, "{}", line)?;
        batches += 1;
        debug!(rows = batch.num_rows(), "Streamed batch");
    }
    out.flush()?;

    info!(batches, "Query stream exhausted");
    Ok(batches)
}

/// Ticket of the first endpoint. Further endpoints are not read.
fn first_ticket(info: &FlightInfo) -> Result<Ticket, QueryError> {
    if info.endpoint.len() > 1 {
        warn!(
            endpoints = info.endpoint.len(),
            "Flight info lists several endpoints, reading only the first"
        );
    }

    info.endpoint
        .first()
        .and_then(|endpoint| endpoint.ticket.clone())
        .ok_or_else(|| {
            QueryError::FlightInfo(ArrowError::IpcError(
                "no endpoint ticket in flight info".to_string(),
            ))
        })
}

/// Render a batch as a JSON array of row objects.
pub fn batch_to_json(batch: &RecordBatch) -> Result<String, ArrowError> {
    let mut writer = arrow_json::ArrayWriter::new(Vec::new());
    writer.write(batch)?;
    writer.finish()?;
    String::from_utf8(writer.into_inner()).map_err(|e| ArrowError::JsonError(e.to_string()))
}
