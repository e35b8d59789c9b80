use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the catalog API on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub status: u16,
    pub error: String,
    #[serde(default)]
    pub detail: String,
}

/// A page body that decoded as JSON but does not have the expected shape.
#[derive(Debug, Error)]
pub enum PageBodyError {
    #[error("page body has no `data` list")]
    MissingData,
    #[error("page body has no `pagination` block")]
    MissingPagination,
    #[error("page body failed to decode: {0}")]
    Decode(#[from] serde_json::Error),
}
