use crate::{
    census::{seed_records, write_records},
    client::{FlightQueryClient, QueryService},
    config::Settings,
    error::{QueryError, Result},
    reader::read_census,
    write::{HttpPointWriter, PointWriter},
};
use std::future::Future;
use std::io::Write;
use tracing::info;

/// Write the seed records, then stream the census query back into `out`.
///
/// The query connection is only opened once every point has been acknowledged,
/// and the write client is dropped before that happens.
pub async fn run_workflow<P, Q, C, Fut, O>(
    points: P,
    settings: &Settings,
    connect: C,
    out: &mut O,
) -> Result<()>
where
    P: PointWriter,
    Q: QueryService,
    C: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<Q, QueryError>>,
    O: Write,
{
    let records = seed_records();
    let written = write_records(
        &points,
        records.iter().map(|(key, record)| (*key, record)),
        settings.write_interval(),
    )
    .await?;
    drop(points);

    info!(written, "Write phase complete");
    writeln!(out, "Write Successful...")?;
    out.flush()?;

    let mut client = connect().await?;
    let batches = read_census(&mut client, out).await?;

    info!(batches, "Read phase complete");
    writeln!(out, "Read Successful...")?;
    out.flush()?;
    Ok(())
}

/// Run the census against the configured InfluxDB instance, printing to stdout.
pub async fn handle_census(settings: &Settings) -> Result<()> {
    let writer = HttpPointWriter::new(settings)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    run_workflow(writer, settings, || FlightQueryClient::connect(settings), &mut out).await
}
