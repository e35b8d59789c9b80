use shared::error::{ApiError, PageBodyError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("catalog api returned {status}: {message}")]
    Status {
        status: u16,
        message: String,
        api: Option<ApiError>,
    },
    #[error("malformed page body: {0}")]
    Malformed(#[from] PageBodyError),
    #[error("invalid catalog url: {0}")]
    Url(#[from] url::ParseError),
}

impl ProviderError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("persisted selection under '{key}' is corrupt: {source}")]
    CorruptState {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read persisted selection: {0:#}")]
    Store(anyhow::Error),
}

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("page must be at least 1, got {0}")]
    InvalidPage(u32),
    #[error("page size must be at least 1, got {0}")]
    InvalidPageSize(u32),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
