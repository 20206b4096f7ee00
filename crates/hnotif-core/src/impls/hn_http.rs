//! HackerNewsFetcher - Hacker News Firebase API の ItemFetcher 実装
//!
//! - `GET {base}/topstories.json` → `[id, ...]`（ランク順）
//! - `GET {base}/item/{id}.json` → item オブジェクト（存在しない ID は `null`）
//!
//! 200 以外は `FetchError::Status`。分類（一時的 / 恒久的）は `FetchError::kind()` が行う。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::{Item, ItemId};
use crate::ports::{FetchError, ItemFetcher};

pub const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

#[derive(Debug, Clone)]
pub struct HackerNewsFetcher {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HackerNewsFetcher {
    /// `timeout` is applied per request by the HTTP client.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hnotif/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, FetchError> {
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await.map_err(|source| {
            if source.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Transport {
                    url: url.clone(),
                    source,
                }
            }
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| FetchError::Decode { url, source })
    }
}

#[async_trait]
impl ItemFetcher for HackerNewsFetcher {
    async fn fetch_ranked_ids(&self) -> Result<Vec<ItemId>, FetchError> {
        self.get_json(format!("{}/topstories.json", self.base_url))
            .await
    }

    async fn fetch_item(&self, id: ItemId) -> Result<Item, FetchError> {
        let item: Option<Item> = self
            .get_json(format!("{}/item/{id}.json", self.base_url))
            .await?;
        item.ok_or(FetchError::NotFound(id))
    }
}
