//! Concurrent local + internet search with per-branch fault isolation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::{
    format_current_date, ContentIndex, LocalResult, WebResult, WebSearch, INTERNET_BRANCH,
    LOCAL_BRANCH,
};
use crate::config::SearchSettings;
use crate::error::DocentError;

/// Merged output of one fan-out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FanoutResult {
    pub text: String,
    pub images: Vec<String>,
}

/// Runs the enabled search branches concurrently and merges their output.
pub struct SearchFanout {
    index: Arc<dyn ContentIndex>,
    web: Arc<dyn WebSearch>,
    settings: SearchSettings,
}

impl SearchFanout {
    pub fn new(
        index: Arc<dyn ContentIndex>,
        web: Arc<dyn WebSearch>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            index,
            web,
            settings,
        }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub async fn search(&self, query: &str) -> FanoutResult {
        self.search_at(query, Utc::now()).await
    }

    /// Search as of `now`, which dates the internet query.
    pub async fn search_at(&self, query: &str, now: DateTime<Utc>) -> FanoutResult {
        let local_query = scrub(query, &self.settings.query_stopwords);
        let internet_query = format!(
            "{query} with up-to-date knowledge from the current datetime ({}).",
            format_current_date(now)
        );

        let local = async {
            if self.settings.local_enabled() {
                Some(self.local_branch(&local_query).await)
            } else {
                None
            }
        };
        let internet = async {
            if self.settings.internet_enabled() {
                Some(self.internet_branch(&internet_query).await)
            } else {
                None
            }
        };
        let (local, internet) = tokio::join!(local, internet);

        let mut merged = FanoutResult::default();
        if let Some(outcome) = local {
            let section = match outcome {
                Ok((text, images)) => {
                    merged.images = images;
                    text.trim().to_string()
                }
                Err(e) => branch_stub(LOCAL_BRANCH, e),
            };
            merged.text = format!("\nLocal Search Results (Priority):\n{section}");
        }
        if let Some(outcome) = internet {
            let section = match outcome {
                Ok(text) => text.trim().to_string(),
                Err(e) => branch_stub(INTERNET_BRANCH, e),
            };
            merged
                .text
                .push_str(&format!("\nInternet Search Results:\n{section}"));
        }

        debug!(
            chars = merged.text.len(),
            images = merged.images.len(),
            "search fan-out complete"
        );
        merged
    }

    async fn local_branch(&self, query: &str) -> Result<(String, Vec<String>), DocentError> {
        debug!(branch = LOCAL_BRANCH, query, "searching");
        let cap = self.settings.local_search as usize;
        let mut results = self.index.search(query, cap).await?;
        results.truncate(cap);
        let images = relevant_images(&results, self.settings.relevance_threshold);
        Ok((render_local(&results), images))
    }

    async fn internet_branch(&self, query: &str) -> Result<String, DocentError> {
        debug!(branch = INTERNET_BRANCH, query, "searching");
        let cap = self.settings.internet_search as usize;
        let results = self.web.search(query, cap).await?;
        Ok(render_web(&results[..results.len().min(cap)]))
    }
}

fn branch_stub(branch: &str, error: DocentError) -> String {
    warn!(branch, error = %error, "search branch failed");
    DocentError::Search {
        branch: branch.to_string(),
        message: error.to_string(),
    }
    .to_string()
}

fn scrub(query: &str, stopwords: &[String]) -> String {
    stopwords
        .iter()
        .filter(|w| !w.is_empty())
        .fold(query.to_string(), |q, word| q.replace(word.as_str(), ""))
}

/// Image references of results at or above `threshold`, in rank order, without duplicates.
pub(crate) fn relevant_images(results: &[LocalResult], threshold: f64) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();
    for result in results {
        if result.score.is_some_and(|s| s >= threshold) {
            for image in &result.images {
                if !images.contains(image) {
                    images.push(image.clone());
                }
            }
        }
    }
    images
}

fn render_local(results: &[LocalResult]) -> String {
    let mut text = String::from("Here is the result of local search: \n");
    for (i, r) in results.iter().enumerate() {
        text.push_str(&format!("{}. {}\n{}\n", i + 1, r.summary, r.details));
    }
    text
}

fn render_web(results: &[WebResult]) -> String {
    let mut text = String::from("Here is the result of internet search: \n");
    for (i, r) in results.iter().enumerate() {
        text.push_str(&format!("{}. {}\n{}\n", i + 1, r.title, r.snippet));
    }
    text
}
