use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML parsing failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Manifest error: {0}")]
    Schema(String),

    #[error("Unsupported Cargo.lock version: {0}")]
    UnsupportedLockVersion(String),

    #[error("Crate {0} declares neither license nor license-file")]
    MissingLicense(String),

    #[error("Checksum mismatch for {path}, got: {actual}, exp: {expected}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Download of {url} failed: {status}")]
    Download { url: String, status: String },

    #[error("{0} not found in {1}")]
    ArchiveEntryNotFound(String, PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
