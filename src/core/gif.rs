//! Tenor GIF search.
//!
//! Results are reduced to plain URLs. Tenor has returned several response
//! shapes over time (v2 `media_formats`, v1 `media` lists, bare `url`
//! fields), so URL extraction tries each of them.

use crate::errors::Result;
use rand::seq::SliceRandom;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const TENOR_SEARCH_URL: &str = "https://tenor.googleapis.com/v2/search";

/// Last-resort GIF when nothing else is available.
pub const GLOBAL_FALLBACK_GIF: &str = "https://c.tenor.com/J7eGDvGeP9IAAAAC/tenor.gif";

/// Returns the best GIF URL found in one Tenor result object.
#[must_use]
pub fn extract_gif_url(result: &Value) -> Option<String> {
    let result = result.as_object()?;

    if let Some(gif) = result
        .get("media_formats")
        .and_then(Value::as_object)
        .and_then(|formats| formats.get("gif"))
        .and_then(Value::as_object)
    {
        return url_or_src(gif);
    }

    if let Some(media) = result.get("media").and_then(Value::as_array) {
        for item in media.iter().filter_map(Value::as_object) {
            for key in ["gif", "mediumgif", "tinygif", "nanogif"] {
                if let Some(url) = item.get(key).and_then(Value::as_object).and_then(url_or_src) {
                    return Some(url);
                }
            }
        }
    }

    ["url", "itemurl", "source"]
        .iter()
        .filter_map(|key| result.get(*key).and_then(Value::as_str))
        .find(|url| !url.is_empty())
        .map(str::to_string)
}

fn url_or_src(format: &serde_json::Map<String, Value>) -> Option<String> {
    ["url", "src"]
        .iter()
        .filter_map(|key| format.get(*key).and_then(Value::as_str))
        .find(|url| !url.is_empty())
        .map(str::to_string)
}

/// Extracts every usable URL from a Tenor search response body.
#[must_use]
pub fn urls_from_response(body: &Value) -> Vec<String> {
    body.get("results")
        .and_then(Value::as_array)
        .map(|results| results.iter().filter_map(extract_gif_url).collect())
        .unwrap_or_default()
}

/// Picks a random URL from `candidates`, or the global fallback.
#[must_use]
pub fn pick_or_fallback(candidates: &[String]) -> String {
    candidates
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_else(|| GLOBAL_FALLBACK_GIF.to_string())
}

/// Thin Tenor v2 client. Without an API key every search returns nothing.
#[derive(Debug, Clone)]
pub struct TenorClient {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl TenorClient {
    /// Creates a client; `api_key` comes from the configuration.
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
        }
    }

    /// Whether an API key is configured.
    #[must_use]
    pub const fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Searches Tenor and returns GIF URLs. Network or API failures yield an empty list.
    pub async fn search(&self, query: &str, limit: u32) -> Vec<String> {
        match self.try_search(query, limit).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!("Tenor search for {query:?} failed: {e}");
                Vec::new()
            }
        }
    }

    async fn try_search(&self, query: &str, limit: u32) -> Result<Vec<String>> {
        let Some(key) = &self.api_key else {
            debug!("No Tenor API key configured, skipping search");
            return Ok(Vec::new());
        };

        let limit = limit.to_string();
        let response = self
            .http
            .get(TENOR_SEARCH_URL)
            .query(&[
                ("q", query),
                ("key", key.as_str()),
                ("limit", limit.as_str()),
                ("media_filter", "gif"),
                ("contentfilter", "medium"),
            ])
            .timeout(Duration::from_secs(8))
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("Tenor returned HTTP {}", response.status());
            return Ok(Vec::new());
        }

        let body: Value = response.json().await?;
        Ok(urls_from_response(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_v2_media_formats() {
        let result = json!({"media_formats": {"gif": {"url": "https://a/1.gif"}}});
        assert_eq!(extract_gif_url(&result).as_deref(), Some("https://a/1.gif"));
    }

    #[test]
    fn test_extract_v1_media_list() {
        let result = json!({"media": [{"tinygif": {"src": "https://a/tiny.gif"}}]});
        assert_eq!(extract_gif_url(&result).as_deref(), Some("https://a/tiny.gif"));
    }

    #[test]
    fn test_extract_top_level_fallbacks() {
        let result = json!({"url": "", "itemurl": "https://tenor.com/view/x"});
        assert_eq!(
            extract_gif_url(&result).as_deref(),
            Some("https://tenor.com/view/x")
        );
    }

    #[test]
    fn test_extract_rejects_non_objects() {
        assert_eq!(extract_gif_url(&json!("https://a/1.gif")), None);
        assert_eq!(extract_gif_url(&json!({"id": 5})), None);
    }

    #[test]
    fn test_urls_from_response_skips_unusable_results() {
        let body = json!({"results": [
            {"media_formats": {"gif": {"url": "https://a/1.gif"}}},
            {"nothing": true},
            {"url": "https://a/2.gif"}
        ]});
        assert_eq!(
            urls_from_response(&body),
            vec!["https://a/1.gif".to_string(), "https://a/2.gif".to_string()]
        );
        assert!(urls_from_response(&json!({})).is_empty());
    }

    #[test]
    fn test_pick_or_fallback() {
        assert_eq!(pick_or_fallback(&[]), GLOBAL_FALLBACK_GIF);
        let only = vec!["https://a/only.gif".to_string()];
        assert_eq!(pick_or_fallback(&only), "https://a/only.gif");
    }

    #[tokio::test]
    async fn test_search_without_key_is_empty() {
        let client = TenorClient::new(None);
        assert!(!client.has_key());
        assert!(client.search("hug", 10).await.is_empty());
    }
}
