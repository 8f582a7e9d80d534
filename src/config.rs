use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::Parser;
use log::warn;

use crate::{
    error::{Error, Result},
    request::{RequestSpec, RequestSpecBuilder, DEFAULT_CONTENT_TYPE, DEFAULT_PATH, DEFAULT_PORT},
};

/// Probe every running member of a fleet with one HTTP request
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Name of the fleet to probe
    #[arg(long, alias = "asg-name")]
    pub fleet: String,

    /// Region the fleet lives in
    #[arg(long)]
    pub region: String,

    /// HTTP path to call on each member
    #[arg(long, default_value = DEFAULT_PATH)]
    pub path: String,

    /// Port to use for the HTTP request
    #[arg(long, default_value = DEFAULT_PORT)]
    pub port: String,

    /// Use HTTPS instead of HTTP
    #[arg(long)]
    pub tls: bool,

    /// File to POST as request body; GET is used when absent (eg: some-request.json)
    #[arg(long, value_name = "FILE")]
    pub post: Option<PathBuf>,

    /// Content-Type sent with the POST body
    #[arg(long, default_value = DEFAULT_CONTENT_TYPE)]
    pub request_type: String,

    /// Per-request timeout (eg: 500ms, 3s, 2m, 1s 500ms)
    #[arg(long, default_value = "3s")]
    pub timeout: String,

    /// Comma-separated list of headers (key=value,key2=value2)
    #[arg(long, default_value = "")]
    pub headers: String,

    /// JSON document describing fleet membership
    #[arg(long, value_name = "FILE", env = "FLEET_PROBE_INVENTORY", default_value = "fleet.json")]
    pub inventory: PathBuf,

    /// Maximum number of requests in flight at once (unbounded when absent)
    #[arg(long)]
    pub max_in_flight: Option<usize>,
}

/// Validated probe configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub fleet: String,
    pub region: String,
    pub path: String,
    pub port: String,
    pub tls: bool,
    pub post_file: Option<PathBuf>,
    pub content_type: String,
    pub timeout: Duration,
    pub headers: BTreeMap<String, String>,
    pub inventory: PathBuf,
    pub max_in_flight: Option<usize>,
}

impl ProbeConfig {
    /// # Errors
    /// Fails when the POST file does not exist or the timeout is not a
    /// positive duration.
    pub fn from_args(args: Args) -> Result<Self> {
        if let Some(post) = &args.post {
            if !post.exists() {
                return Err(Error::PayloadMissing(post.clone()));
            }
        }

        Ok(Self {
            path: normalize_path(&args.path),
            timeout: parse_timeout(&args.timeout)?,
            headers: parse_headers(&args.headers),
            fleet: args.fleet,
            region: args.region,
            port: args.port,
            tls: args.tls,
            post_file: args.post,
            content_type: args.request_type,
            inventory: args.inventory,
            max_in_flight: args.max_in_flight,
        })
    }

    /// Builds the request settings, reading the POST payload once.
    ///
    /// # Errors
    /// Returns [`Error::PayloadRead`] if the payload file cannot be read.
    pub fn request_spec(&self) -> Result<RequestSpec> {
        let mut builder = RequestSpecBuilder::new()
            .with_tls(self.tls)
            .with_port(self.port.as_str())
            .with_path(self.path.as_str())
            .with_content_type(self.content_type.as_str())
            .with_headers(self.headers.clone())
            .with_timeout(self.timeout);
        if let Some(path) = &self.post_file {
            builder = builder.with_body(read_payload(path)?);
        }
        builder
            .build()
            .map_err(|err| Error::Opaque(Box::new(err)))
    }
}

fn read_payload(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| Error::PayloadRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Prefixes `/` when missing.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

pub fn parse_timeout(raw: &str) -> Result<Duration> {
    match humantime::parse_duration(raw.trim()) {
        Ok(timeout) if !timeout.is_zero() => Ok(timeout),
        _ => Err(Error::InvalidTimeout(raw.to_string())),
    }
}

/// Parses `key=value,key2=value2`.
///
/// Whitespace around keys and values is trimmed and a repeated key keeps its
/// last value. Segments that are not exactly one `key=value` pair are dropped
/// with a warning.
pub fn parse_headers(raw: &str) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    if raw.trim().is_empty() {
        return headers;
    }
    for pair in raw.split(',') {
        let parts: Vec<&str> = pair.split('=').map(str::trim).collect();
        match parts.as_slice() {
            [key, value] if !key.is_empty() => {
                headers.insert(key.to_string(), value.to_string());
            }
            _ => warn!("ignoring malformed header {:?}, expected key=value", pair.trim()),
        }
    }
    headers
}
