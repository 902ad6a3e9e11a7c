//! Configuration management for the census client.
//!
//! Settings are layered, later sources overriding earlier ones:
//! 1. Built-in defaults (cloud endpoint, query port 443, one second between writes)
//! 2. An optional TOML file passed with `--config`
//! 3. Command-line flags, which clap also fills from the environment
//!
//! # Environment Variables
//!
//! - `ORGANISATION` - organisation the write API writes into
//! - `BUCKET` - bucket that scopes both writes and the query
//! - `INFLUXDB_TOKEN` - API token used by both connections

use clap::Parser;
use config::{Config, ConfigError};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default InfluxDB Cloud endpoint.
pub const DEFAULT_URL: &str = "https://us-east-1-1.aws.cloud2.influxdata.com";

/// Port the Flight SQL query endpoint listens on.
pub const DEFAULT_QUERY_PORT: u16 = 443;

/// Pause after each write so the store assigns increasing timestamps.
pub const DEFAULT_WRITE_INTERVAL_MS: u64 = 1000;

/// Keys with no default, with the variable and flag that supply them.
const REQUIRED: [(&str, &str, &str); 3] = [
    ("organisation", "ORGANISATION", "organisation"),
    ("bucket", "BUCKET", "bucket"),
    ("token", "INFLUXDB_TOKEN", "token"),
];

/// Command-line arguments
#[derive(Debug, Default, Parser)]
#[command(author, version, about = "Write a census to InfluxDB and read it back over Flight SQL")]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Base URL of the InfluxDB instance
    #[arg(long)]
    pub url: Option<String>,

    /// Port of the Flight SQL query endpoint
    #[arg(long)]
    pub query_port: Option<u16>,

    /// Organisation to write into
    #[arg(long, env = "ORGANISATION")]
    pub organisation: Option<String>,

    /// Bucket to write into and query from
    #[arg(long, env = "BUCKET")]
    pub bucket: Option<String>,

    /// API token
    #[arg(long, env = "INFLUXDB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Milliseconds to wait after each write
    #[arg(long)]
    pub write_interval_ms: Option<u64>,

    /// Verbosity level (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Connection settings shared by the writer and the reader.
#[derive(Clone, Deserialize)]
pub struct Settings {
    pub url: String,
    pub query_port: u16,
    pub organisation: String,
    pub bucket: String,
    pub token: String,
    pub write_interval_ms: u64,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("url", &self.url)
            .field("query_port", &self.query_port)
            .field("organisation", &self.organisation)
            .field("bucket", &self.bucket)
            .field("token", &"<redacted>")
            .field("write_interval_ms", &self.write_interval_ms)
            .finish()
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("url", DEFAULT_URL)?
            .set_default("query_port", i64::from(DEFAULT_QUERY_PORT))?
            .set_default("write_interval_ms", DEFAULT_WRITE_INTERVAL_MS as i64)?;

        if let Some(path) = &args.config {
            builder = builder.add_source(config::File::from(path.as_path()));
        }

        let config = builder
            .set_override_option("url", args.url.clone())?
            .set_override_option("query_port", args.query_port.map(i64::from))?
            .set_override_option("organisation", args.organisation.clone())?
            .set_override_option("bucket", args.bucket.clone())?
            .set_override_option("token", args.token.clone())?
            .set_override_option("write_interval_ms", args.write_interval_ms.map(|ms| ms as i64))?
            .build()?;

        for (key, env, flag) in REQUIRED {
            if config.get_string(key).is_err() {
                return Err(ConfigError::Message(format!(
                    "{key} is required: set {env} or pass --{flag}"
                )));
            }
        }

        let settings: Settings = config.try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("organisation", &self.organisation),
            ("bucket", &self.bucket),
            ("token", &self.token),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Message(format!("{key} must not be empty")));
            }
        }
        self.base_url()?;
        Ok(())
    }

    /// Parsed base URL; it must carry a host.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.url)
            .map_err(|e| ConfigError::Message(format!("invalid url {}: {}", self.url, e)))?;
        if url.host_str().is_none() {
            return Err(ConfigError::Message(format!("url {} has no host", self.url)));
        }
        Ok(url)
    }

    /// URI of the Flight SQL endpoint: the base URL's scheme and host with the query port.
    pub fn query_endpoint(&self) -> Result<String, ConfigError> {
        let url = self.base_url()?;
        let host = url.host_str().unwrap_or_default();
        Ok(format!("{}://{}:{}", url.scheme(), host, self.query_port))
    }

    /// Whether the query connection should negotiate TLS.
    pub fn uses_tls(&self) -> bool {
        self.base_url()
            .map(|url| url.scheme() == "https")
            .unwrap_or(false)
    }

    pub fn write_interval(&self) -> Duration {
        Duration::from_millis(self.write_interval_ms)
    }
}
