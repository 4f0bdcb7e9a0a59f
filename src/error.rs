use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for a snap-fetch run.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidSetting(String),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// The output directory tree could not be established. Fatal to the run.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("{path} exists and is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a single download task. Never escapes the task boundary.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("item has no asset URL")]
    MissingUrl,

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("URL '{url}' has no file name segment")]
    NoFileName { url: String },

    #[error("file name {file_name} is already taken by {kept_url}")]
    NameCollision { file_name: String, kept_url: String },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} for URL: {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image conversion failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image worker failed: {0}")]
    Worker(String),

    #[error("cancelled before start")]
    Cancelled,
}

impl FetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FetchError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for catalog URL: {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Failed to parse catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
