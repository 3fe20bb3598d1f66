use crate::utils::filename_from_content_disposition;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

use super::models::{ApiConfig, SearchResult};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Received {0} from server.")]
    UnexpectedStatus(u16),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("API URL cannot carry a path: {0}")]
    CannotBeABase(String),

    #[error("Malformed content-disposition header: {0}")]
    MalformedHeader(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// An opened download: the server-provided filename (if any) and the body stream.
pub struct DownloadStream {
    pub filename: Option<String>,
    pub body: BoxStream<'static, Result<bytes::Bytes>>,
}

#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    /// Builds `<base_url>/<segments...>`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)?;
        url.path_segments_mut()
            .map_err(|_| ApiError::CannotBeABase(self.config.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let url = self.endpoint(&["api", "search", query])?;
        tracing::debug!(%url, "issuing search");

        // A fresh client per request keeps connections scoped to one exchange.
        let client = Client::new();
        let response = client
            .get(url)
            .basic_auth("", Some(&self.config.api_key))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(ApiError::UnexpectedStatus(response.status().as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("JSON decode error: {}", e)))
    }

    /// Opens a streaming download for `hash`.
    ///
    /// The connection lives inside the returned body stream and is released
    /// when the stream is dropped.
    pub async fn open_download(&self, hash: &str) -> Result<DownloadStream> {
        let url = self.endpoint(&["api", "download", hash])?;

        let client = Client::new();
        let response = client
            .get(url)
            .basic_auth("", Some(&self.config.api_key))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::UnexpectedStatus(response.status().as_u16()));
        }

        let filename = match response.headers().get(CONTENT_DISPOSITION) {
            Some(value) => {
                let raw = value
                    .to_str()
                    .map_err(|_| ApiError::MalformedHeader("non-ASCII header value".into()))?;
                let name = filename_from_content_disposition(raw)
                    .ok_or_else(|| ApiError::MalformedHeader(raw.to_string()))?;
                Some(name)
            }
            None => None,
        };

        let body = response
            .bytes_stream()
            .map_err(ApiError::RequestError)
            .boxed();

        Ok(DownloadStream { filename, body })
    }
}
