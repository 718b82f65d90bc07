//! Byte-fetch capability
//!
//! Reading an asset means fetching its delivery URL. The fetch is behind a
//! trait so the read path stays testable without a network; the default
//! implementation wraps a shared `reqwest` client.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};

use crate::error::{AssetFsError, Result};

/// Stream of byte chunks from a delivery URL.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// URL byte-fetch capability consumed by the read path.
#[async_trait]
pub trait ByteFetcher: Send + Sync {
    /// Fetch the full body at a URL.
    async fn fetch(&self, url: &str) -> Result<Bytes>;

    /// Open the body at a URL as a chunk stream.
    async fn fetch_stream(&self, url: &str) -> Result<ByteStream>;
}

/// HTTP fetcher backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AssetFsError::Remote(format!("GET {url}: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AssetFsError::NotFound(url.to_string()));
        }
        response
            .error_for_status()
            .map_err(|e| AssetFsError::Remote(format!("GET {url}: {e}")))
    }
}

#[async_trait]
impl ByteFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let response = self.get(url).await?;
        response
            .bytes()
            .await
            .map_err(|e| AssetFsError::Remote(format!("reading body of {url}: {e}")))
    }

    async fn fetch_stream(&self, url: &str) -> Result<ByteStream> {
        let response = self.get(url).await?;
        let stream = response
            .bytes_stream()
            .map_err(|e| AssetFsError::Remote(format!("streaming body: {e}")));
        Ok(stream.boxed())
    }
}
