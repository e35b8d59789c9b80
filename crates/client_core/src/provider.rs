use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::{
    domain::PageRequest,
    error::{ApiError, PageBodyError},
    protocol::ArtworkPage,
};
use tracing::debug;
use url::Url;

use crate::error::ProviderError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.artic.edu/api/v1";

/// Fields requested from the catalog; everything else in a record is ignored.
pub const ARTWORK_FIELDS: &[&str] = &[
    "id",
    "title",
    "place_of_origin",
    "artist_display",
    "inscriptions",
    "date_start",
    "date_end",
];

/// Supplies one page of artworks plus pagination metadata.
#[async_trait]
pub trait PageProvider: Send + Sync {
    async fn fetch_page(&self, request: PageRequest) -> Result<ArtworkPage, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct HttpPageProvider {
    http: Client,
    base_url: Url,
    fields: Vec<String>,
}

impl HttpPageProvider {
    pub fn new(base_url: &str) -> Result<Self, ProviderError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, ProviderError> {
        let mut base_url = Url::parse(base_url.trim())?;
        // `Url::join` drops the last segment unless the path ends in a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http,
            base_url,
            fields: ARTWORK_FIELDS.iter().map(|f| f.to_string()).collect(),
        })
    }

    /// Overrides the `fields` projection; an empty list requests full records.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    fn artworks_url(&self) -> Result<Url, ProviderError> {
        Ok(self.base_url.join("artworks")?)
    }
}

#[async_trait]
impl PageProvider for HttpPageProvider {
    async fn fetch_page(&self, request: PageRequest) -> Result<ArtworkPage, ProviderError> {
        let url = self.artworks_url()?;
        debug!(page = request.page, limit = request.limit, "catalog: fetching page");

        let mut builder = self
            .http
            .get(url.clone())
            .query(&[("page", request.page), ("limit", request.limit)]);
        if !self.fields.is_empty() {
            builder = builder.query(&[("fields", self.fields.join(","))]);
        }

        let response = builder
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let api = serde_json::from_str::<ApiError>(&body).ok();
            let message = match &api {
                Some(api) if !api.detail.is_empty() => api.detail.clone(),
                Some(api) => api.error.clone(),
                None => body,
            };
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
                api,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|source| ProviderError::Transport {
                url: url.to_string(),
                source,
            })?;
        let body: Value = serde_json::from_str(&text).map_err(PageBodyError::from)?;
        let page = ArtworkPage::from_value(body)?;
        debug!(
            page = page.pagination.current_page,
            total_pages = page.pagination.total_pages,
            rows = page.data.len(),
            "catalog: page received"
        );
        Ok(page)
    }
}

#[cfg(test)]
#[path = "tests/provider_tests.rs"]
mod tests;
