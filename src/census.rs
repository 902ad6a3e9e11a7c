//! Census seed data and the write phase.

use crate::error::WriteError;
use crate::write::PointWriter;
use influxdb2::models::DataPoint;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

/// Measurement every census point is written under.
pub const MEASUREMENT: &str = "census";

/// One species count observed at a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub location: String,
    pub species: String,
    pub count: i64,
}

impl Record {
    pub fn new(location: impl Into<String>, species: impl Into<String>, count: i64) -> Self {
        Self {
            location: location.into(),
            species: species.into(),
            count,
        }
    }

    /// `census,location=<location> <species>=<count>i`
    pub fn to_point(&self) -> Result<DataPoint, WriteError> {
        DataPoint::builder(MEASUREMENT)
            .tag("location", self.location.as_str())
            .field(self.species.as_str(), self.count)
            .build()
            .map_err(|e| WriteError::Point(e.to_string()))
    }
}

/// The six seed records, keyed by an identifier that carries no ordering.
pub fn seed_records() -> BTreeMap<&'static str, Record> {
    BTreeMap::from([
        ("point1", Record::new("Klamath", "bees", 23)),
        ("point2", Record::new("Portland", "ants", 30)),
        ("point3", Record::new("Klamath", "bees", 28)),
        ("point4", Record::new("Portland", "ants", 32)),
        ("point5", Record::new("Klamath", "bees", 29)),
        ("point6", Record::new("Portland", "ants", 40)),
    ])
}

/// Write every record as a point, pausing `interval` after each acknowledged write.
///
/// The first failure stops the loop; points already written stay in the store.
pub async fn write_records<'a, W, I>(
    writer: &W,
    records: I,
    interval: Duration,
) -> Result<usize, WriteError>
where
    W: PointWriter + ?Sized,
    I: IntoIterator<Item = (&'a str, &'a Record)>,
{
    let mut written = 0;
    for (key, record) in records {
        let point = record.to_point()?;
        writer.write_point(point).await?;
        written += 1;
        info!(
            key,
            location = %record.location,
            species = %record.species,
            count = record.count,
            "Wrote point"
        );

        tokio::time::sleep(interval).await;
    }
    Ok(written)
}
