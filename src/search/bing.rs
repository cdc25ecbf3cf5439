//! Bing Web Search client.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::debug;

use super::{WebResult, WebSearch};
use crate::config::{require, ServiceEndpoints};
use crate::error::DocentError;
use crate::provider::http::{check_status, key_headers, shared_client};

const DEFAULT_URL: &str = "https://api.bing.microsoft.com/v7.0/search";

pub struct BingWebSearch {
    url: String,
    headers: HeaderMap,
}

impl BingWebSearch {
    pub fn new(api_key: &str, url: Option<String>) -> Self {
        Self {
            url: url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            headers: key_headers("ocp-apim-subscription-key", api_key),
        }
    }

    pub fn from_endpoints(endpoints: &ServiceEndpoints) -> Result<Self, DocentError> {
        Ok(Self::new(
            require(&endpoints.bing_api_key, "BING_SUBSCRIPTION_KEY")?,
            endpoints.bing_url.clone(),
        ))
    }
}

#[async_trait]
impl WebSearch for BingWebSearch {
    async fn search(&self, query: &str, cap: usize) -> Result<Vec<WebResult>, DocentError> {
        let resp = shared_client()
            .get(&self.url)
            .headers(self.headers.clone())
            .query(&[
                ("q", query),
                ("mkt", "en-US"),
                ("textDecorations", "true"),
                ("textFormat", "HTML"),
            ])
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let data: BingResponse = resp.json().await?;

        let pages = data.web_pages.map(|p| p.value).unwrap_or_default();
        debug!(hits = pages.len(), "web search");
        Ok(pages
            .into_iter()
            .take(cap)
            .map(|page| WebResult {
                title: page.name,
                snippet: page.snippet,
            })
            .collect())
    }
}

#[derive(Deserialize)]
struct BingResponse {
    #[serde(rename = "webPages")]
    web_pages: Option<BingPages>,
}

#[derive(Deserialize)]
struct BingPages {
    #[serde(default)]
    value: Vec<BingPage>,
}

#[derive(Deserialize)]
struct BingPage {
    name: String,
    #[serde(default)]
    snippet: String,
}
