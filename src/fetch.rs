//! Loading the raw export text: one blocking HTTP GET per cycle, or a local
//! file / stdin (`-`) when working offline.

use std::{
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use log::{debug, info};
use reqwest::blocking::Client;

use crate::error::ViewError;

const USER_AGENT: &str = concat!("lens-compare/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    Path(PathBuf),
}

impl Source {
    pub fn describe(&self) -> String {
        match self {
            Source::Url(url) => url.clone(),
            Source::Path(path) if is_dash(path) => "stdin".to_string(),
            Source::Path(path) => path.display().to_string(),
        }
    }
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

/// Decodes `bytes`, honouring a leading BOM over `encoding`.
pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!("Failed to decode text with encoding {}", used.name()))
    } else {
        Ok(text.into_owned())
    }
}

/// Client for the single GET of a load cycle. No request timeout is set:
/// failure is a transport error or a non-success status.
pub fn build_client() -> Result<Client, ViewError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(None::<Duration>)
        .build()
        .map_err(|err| ViewError::NetworkFailure {
            url: String::new(),
            reason: err.to_string(),
        })
}

pub fn fetch_text(
    client: &Client,
    url: &str,
    encoding: &'static Encoding,
) -> Result<String, ViewError> {
    let failure = |reason: String| ViewError::NetworkFailure {
        url: url.to_string(),
        reason,
    };
    info!("Fetching {url}");
    let response = client
        .get(url)
        .send()
        .map_err(|err| failure(err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(failure(format!("HTTP status {status}")));
    }
    let bytes = response.bytes().map_err(|err| failure(err.to_string()))?;
    debug!("Received {} byte(s) from {url}", bytes.len());
    decode_bytes(&bytes, encoding).map_err(|err| failure(err.to_string()))
}

pub fn read_text(path: &Path, encoding: &'static Encoding) -> Result<String> {
    let mut bytes = Vec::new();
    if is_dash(path) {
        io::stdin()
            .lock()
            .read_to_end(&mut bytes)
            .context("Reading stdin")?;
    } else {
        File::open(path)
            .with_context(|| format!("Opening input file {path:?}"))?
            .read_to_end(&mut bytes)
            .with_context(|| format!("Reading input file {path:?}"))?;
    }
    decode_bytes(&bytes, encoding).with_context(|| format!("Decoding {path:?}"))
}

/// Loads the export text. Any failure is folded into `NetworkFailure` so the
/// cycle ends in the error state the same way regardless of source.
pub fn load(source: &Source, encoding: &'static Encoding) -> Result<String, ViewError> {
    match source {
        Source::Url(url) => {
            let client = build_client()?;
            fetch_text(&client, url, encoding)
        }
        Source::Path(path) => read_text(path, encoding).map_err(|err| ViewError::NetworkFailure {
            url: source.describe(),
            reason: format!("{err:#}"),
        }),
    }
}
