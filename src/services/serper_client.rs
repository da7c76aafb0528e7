use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{configuration::SearchSettings, domain::contact::NewsItem, error::SearchError};

use super::http::build_api_client;

/// Seam over the hosted search API so the pipeline can run against fakes.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// One page (1-based) of ranked organic results.
    async fn search(&self, query: &str, page: u8) -> Result<Vec<OrganicResult>, SearchError>;

    async fn news(&self, query: &str) -> Result<Vec<NewsItem>, SearchError>;

    fn is_configured(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrganicResult {
    #[serde(default)]
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub position: Option<u32>,
}

#[derive(Serialize)]
struct SerperQuery<'a> {
    q: &'a str,
    num: u8,
    gl: &'a str,
    page: u8,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Deserialize)]
struct NewsResponse {
    #[serde(default)]
    news: Vec<SerperNews>,
}

#[derive(Deserialize)]
struct SerperNews {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

pub struct SerperClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    results_per_query: u8,
    gl: String,
}

impl SerperClient {
    pub fn new(settings: &SearchSettings, api_key: Option<String>) -> Result<Self, SearchError> {
        let client = build_api_client(settings.timeout())
            .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {}", e)))?;

        Ok(SerperClient {
            client,
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            results_per_query: settings.results_per_query,
            gl: settings.gl.clone(),
        })
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &str,
        page: u8,
    ) -> Result<T, SearchError> {
        let api_key = self.api_key.as_deref().ok_or(SearchError::MissingApiKey)?;

        let res = self
            .client
            .post(format!("{}/{}", self.base_url, endpoint))
            .header("X-API-KEY", api_key)
            .json(&SerperQuery {
                q: query,
                num: self.results_per_query,
                gl: &self.gl,
                page,
            })
            .send()
            .await
            .map_err(|e| SearchError::Http(e.to_string()))?;

        if !res.status().is_success() {
            return Err(SearchError::Status(res.status().as_u16()));
        }

        res.json::<T>()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))
    }
}

#[async_trait]
impl SearchProvider for SerperClient {
    async fn search(&self, query: &str, page: u8) -> Result<Vec<OrganicResult>, SearchError> {
        let response: SearchResponse = self.post("search", query, page).await?;
        log::info!(
            "Found {} organic results for query: {} (page {})",
            response.organic.len(),
            query,
            page
        );

        Ok(response
            .organic
            .into_iter()
            .filter(|r| !r.link.trim().is_empty())
            .collect())
    }

    async fn news(&self, query: &str) -> Result<Vec<NewsItem>, SearchError> {
        let response: NewsResponse = self.post("news", query, 1).await?;

        Ok(response
            .news
            .into_iter()
            .filter(|n| !n.title.trim().is_empty() && !n.link.trim().is_empty())
            .map(|n| NewsItem {
                title: n.title.trim().to_string(),
                link: n.link,
                date: n.date,
                source: n.source,
            })
            .collect())
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
