use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::item::Category;

/// One article exactly as the provider returned it. Everything is
/// optional on the wire; `normalize` decides what is usable.
#[derive(Debug, Clone, Deserialize)]
pub struct RawArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub source: Option<RawSource>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSource {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    articles: Vec<RawArticle>,
    message: Option<String>,
}

/// Thin client for the upstream headlines API. Carries no retry or
/// fallback logic; callers own that policy.
pub struct ProviderClient {
    client: Client,
    base_url: String,
    api_key: String,
    country: String,
}

impl ProviderClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            country: config.country.clone(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Top headlines scoped to a single category.
    pub async fn fetch_category(
        &self,
        category: Category,
        page_size: usize,
    ) -> Result<Vec<RawArticle>, ProviderError> {
        self.top_headlines(Some(category), page_size).await
    }

    /// Broad top-headlines query with no category filter.
    pub async fn fetch_headlines(&self, page_size: usize) -> Result<Vec<RawArticle>, ProviderError> {
        self.top_headlines(None, page_size).await
    }

    async fn top_headlines(
        &self,
        category: Option<Category>,
        page_size: usize,
    ) -> Result<Vec<RawArticle>, ProviderError> {
        if !self.has_api_key() {
            return Err(ProviderError::MissingKey);
        }

        let page_size = page_size.to_string();
        let mut query: Vec<(&str, &str)> =
            vec![("country", self.country.as_str()), ("pageSize", &page_size)];
        if let Some(category) = category {
            query.push(("category", category.as_str()));
        }

        let response = self
            .client
            .get(format!("{}/top-headlines", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .query(&query)
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Keyword search across all articles published since `since`.
    pub async fn fetch_keyword(
        &self,
        query: &str,
        since: NaiveDate,
        page_size: usize,
    ) -> Result<Vec<RawArticle>, ProviderError> {
        if !self.has_api_key() {
            return Err(ProviderError::MissingKey);
        }

        let page_size = page_size.to_string();
        let since = since.format("%Y-%m-%d").to_string();
        let response = self
            .client
            .get(format!("{}/everything", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", query),
                ("language", "en"),
                ("sortBy", "publishedAt"),
                ("from", &since),
                ("pageSize", &page_size),
            ])
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<Vec<RawArticle>, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status { status });
        }

        let envelope: Envelope = response.json().await?;
        if envelope.status != "ok" {
            return Err(ProviderError::Api(
                envelope
                    .message
                    .unwrap_or_else(|| format!("status {}", envelope.status)),
            ));
        }

        debug!(count = envelope.articles.len(), "provider returned articles");
        Ok(envelope.articles)
    }
}
