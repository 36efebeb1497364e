use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared::{
    domain::CatalogEntry,
    error::ApiError,
    protocol::{PageCursor, PageResponse},
};
use tracing::debug;
use url::Url;

use crate::{config::ClientSettings, error::FetchError};

/// One page as handed to the list controller.
#[derive(Debug, Clone)]
pub struct PageResult {
    pub entries: Vec<CatalogEntry>,
    pub next_cursor: PageCursor,
    pub has_more: bool,
}

/// Request/response boundary to a paginated catalog.
///
/// Implementations issue exactly one request per call and never retry or
/// cache; recovery policy belongs to the caller.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_page(&self, cursor: &PageCursor) -> Result<PageResult, FetchError>;
}

pub struct RemoteCatalogClient {
    http: Client,
    endpoint: Url,
    api_token: Option<String>,
}

impl RemoteCatalogClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::from_settings(&ClientSettings {
            base_url: base_url.to_string(),
            ..ClientSettings::default()
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> anyhow::Result<Self> {
        let endpoint = catalog_endpoint(&settings.base_url, &settings.catalog_path)?;
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("failed to build catalog http client")?;
        Ok(Self {
            http,
            endpoint,
            api_token: settings.api_token.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl CatalogSource for RemoteCatalogClient {
    async fn fetch_page(&self, cursor: &PageCursor) -> Result<PageResult, FetchError> {
        let (key, value) = cursor.query_pair();
        let mut request = self.http.get(self.endpoint.clone()).query(&[(key, value)]);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(FetchError::from_transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(FetchError::from_transport)?;
        debug!(%cursor, status = status.as_u16(), bytes = body.len(), "catalog page response");

        if !status.is_success() {
            return Err(FetchError::ServerError {
                status: status.as_u16(),
                message: server_error_message(status, &body),
            });
        }

        let page: PageResponse =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;
        resolve_page(cursor, page)
    }
}

fn catalog_endpoint(base_url: &str, catalog_path: &str) -> anyhow::Result<Url> {
    let base_url = base_url.trim();
    if base_url.is_empty() {
        return Err(anyhow!("catalog base url must not be empty"));
    }

    let mut base =
        Url::parse(base_url).with_context(|| format!("invalid catalog base url '{base_url}'"))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(catalog_path.trim_start_matches('/'))
        .with_context(|| format!("invalid catalog path '{catalog_path}'"))
}

fn server_error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(api_error) = serde_json::from_slice::<ApiError>(body) {
        return api_error.message;
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        text
    }
}

/// Fills in a missing `next_cursor`. Numeric cursors advance by one page;
/// a token cursor with more pages and no successor is a malformed response.
fn resolve_page(requested: &PageCursor, page: PageResponse) -> Result<PageResult, FetchError> {
    let next_cursor = match page.next_cursor {
        Some(next) => next,
        None if !page.has_more => requested.clone(),
        None => requested.successor().ok_or_else(|| {
            FetchError::Decode(format!(
                "response for {requested} has more pages but no next_cursor"
            ))
        })?,
    };

    Ok(PageResult {
        entries: page.entries,
        next_cursor,
        has_more: page.has_more,
    })
}

#[cfg(test)]
#[path = "tests/remote_tests.rs"]
mod tests;
