//! Azure AI Search content index with query embeddings from Azure OpenAI.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::debug;

use super::{ContentIndex, LocalResult};
use crate::config::{require, SearchSettings, ServiceEndpoints};
use crate::error::DocentError;
use crate::provider::azure::deployment_url;
use crate::provider::http::{check_status, key_headers, shared_client};

const SEARCH_API_VERSION: &str = "2023-11-01";
const EMBEDDING_API_VERSION: &str = "2024-06-01";
const VECTOR_FIELD: &str = "summaryVector";

/// Hybrid semantic + vector lookup against one search index.
pub struct AzureContentIndex {
    search_url: String,
    search_headers: HeaderMap,
    embedding_url: String,
    embedding_headers: HeaderMap,
    semantic_configuration: String,
}

impl AzureContentIndex {
    pub fn new(
        search_endpoint: &str,
        index: &str,
        search_api_key: &str,
        embedding_url: String,
        openai_api_key: &str,
        semantic_configuration: impl Into<String>,
    ) -> Self {
        Self {
            search_url: format!(
                "{}/indexes/{}/docs/search?api-version={}",
                search_endpoint.trim_end_matches('/'),
                index,
                SEARCH_API_VERSION
            ),
            search_headers: key_headers("api-key", search_api_key),
            embedding_url,
            embedding_headers: key_headers("api-key", openai_api_key),
            semantic_configuration: semantic_configuration.into(),
        }
    }

    /// Build from configured endpoints.
    pub fn from_endpoints(
        endpoints: &ServiceEndpoints,
        settings: &SearchSettings,
    ) -> Result<Self, DocentError> {
        let openai_endpoint = require(&endpoints.openai_endpoint, "AZURE_OPENAI_ENDPOINT")?;
        let embedding_deployment =
            require(&endpoints.embedding_deployment, "AZURE_OPENAI_EMB_DEPLOYMENT")?;
        let api_version = endpoints
            .openai_api_version
            .as_deref()
            .unwrap_or(EMBEDDING_API_VERSION);
        Ok(Self::new(
            require(&endpoints.search_endpoint, "COGNITIVE_SEARCH_ENDPOINT")?,
            require(&endpoints.search_index, "COGNITIVE_SEARCH_INDEX_NAME")?,
            require(&endpoints.search_api_key, "COGNITIVE_SEARCH_API_KEY")?,
            deployment_url(openai_endpoint, embedding_deployment, "embeddings", api_version),
            require(&endpoints.openai_api_key, "AZURE_OPENAI_API_KEY")?,
            settings.semantic_configuration.clone(),
        ))
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, DocentError> {
        let body = serde_json::json!({ "input": [text.replace('\n', " ")] });
        let resp = shared_client()
            .post(&self.embedding_url)
            .headers(self.embedding_headers.clone())
            .json(&body)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let data: EmbeddingResponse = resp.json().await?;
        data.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| DocentError::api(200, "No embedding in response"))
    }

    pub(crate) fn build_query(&self, query: &str, vector: Vec<f32>, cap: usize) -> serde_json::Value {
        serde_json::json!({
            "search": query,
            "vectorQueries": [{
                "kind": "vector",
                "vector": vector,
                "k": cap,
                "fields": VECTOR_FIELD,
            }],
            "queryType": "semantic",
            "semanticConfiguration": self.semantic_configuration,
            "captions": "extractive",
            "answers": "extractive",
            "select": "summary,content_details,image_links",
            "top": cap,
        })
    }
}

#[async_trait]
impl ContentIndex for AzureContentIndex {
    async fn search(&self, query: &str, cap: usize) -> Result<Vec<LocalResult>, DocentError> {
        let vector = self.embed(query).await?;
        let body = self.build_query(query, vector, cap);

        let resp = shared_client()
            .post(&self.search_url)
            .headers(self.search_headers.clone())
            .json(&body)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let data: SearchResponse = resp.json().await?;
        debug!(hits = data.value.len(), "content index search");

        Ok(data
            .value
            .into_iter()
            .take(cap)
            .map(|doc| LocalResult {
                summary: doc.summary.unwrap_or_default(),
                details: doc.content_details.unwrap_or_default(),
                score: doc.reranker_score,
                images: doc.image_links.map(ImageLinks::into_vec).unwrap_or_default(),
            })
            .collect())
    }
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<SearchDocument>,
}

#[derive(Deserialize)]
struct SearchDocument {
    #[serde(rename = "@search.rerankerScore")]
    reranker_score: Option<f64>,
    summary: Option<String>,
    content_details: Option<String>,
    image_links: Option<ImageLinks>,
}

/// Indexes store `image_links` either as a collection or a single string.
#[derive(Deserialize)]
#[serde(untagged)]
enum ImageLinks {
    Many(Vec<String>),
    One(String),
}

impl ImageLinks {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::Many(links) => links,
            Self::One(link) if link.is_empty() => Vec::new(),
            Self::One(link) => vec![link],
        }
    }
}
