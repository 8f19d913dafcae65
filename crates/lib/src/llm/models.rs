//! Model directory: list the models the backend offers.

use crate::config::{normalize_backend_url, validate_backend_url, ConfigError};
use serde::Deserialize;
use std::time::Duration;

pub const MODELS_PATH: &str = "/models";

const LIST_TIMEOUT: Duration = Duration::from_secs(10);

/// Ordered, deduplicated model names as last reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelSet(Vec<String>);

impl ModelSet {
    /// Keeps the first occurrence of each name.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !out.contains(&name) {
                out.push(name);
            }
        }
        Self(out)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|m| m == name)
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("model list request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("model list api error: {0}")]
    Api(String),
    #[error("malformed model list: {0}")]
    Malformed(String),
}

/// Result of a listing: the models, plus the error when the fetch failed.
/// On error `models` is always empty.
#[derive(Debug, Default)]
pub struct ModelListing {
    pub models: ModelSet,
    pub error: Option<DirectoryError>,
}

impl ModelListing {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Client for the backend's model list endpoint.
#[derive(Clone, Default)]
pub struct ModelDirectoryClient {
    client: reqwest::Client,
}

impl ModelDirectoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// GET {backend_url}/models. Never fails past this boundary: transport,
    /// status, and shape errors come back as an empty set plus `error`.
    pub async fn list_models(&self, backend_url: &str) -> ModelListing {
        match self.fetch(backend_url).await {
            Ok(models) => {
                log::debug!("backend offers {} model(s)", models.len());
                ModelListing {
                    models,
                    error: None,
                }
            }
            Err(e) => {
                log::warn!("listing models failed: {}", e);
                ModelListing {
                    models: ModelSet::default(),
                    error: Some(e),
                }
            }
        }
    }

    async fn fetch(&self, backend_url: &str) -> Result<ModelSet, DirectoryError> {
        let base = normalize_backend_url(backend_url);
        validate_backend_url(&base)?;
        let url = format!("{}{}", base, MODELS_PATH);
        log::debug!("GET {}", url);
        let res = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(LIST_TIMEOUT)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(DirectoryError::Api(format!("{} {}", status, body)));
        }
        let body = res.text().await?;
        parse_model_list(&body)
    }
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<String>,
}

/// Strict shape check: `{"models": [string, ...]}` with no blank names.
fn parse_model_list(body: &str) -> Result<ModelSet, DirectoryError> {
    let data: ModelsResponse =
        serde_json::from_str(body).map_err(|e| DirectoryError::Malformed(e.to_string()))?;
    let mut names = Vec::with_capacity(data.models.len());
    for (i, name) in data.models.into_iter().enumerate() {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(DirectoryError::Malformed(format!("model name at index {} is blank", i)));
        }
        names.push(name);
    }
    Ok(ModelSet::new(names))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_models_in_order() {
        let set = parse_model_list(r#"{"models":["a","b"]}"#).unwrap();
        assert_eq!(set.as_slice(), ["a", "b"]);
    }

    #[test]
    fn duplicates_are_dropped_keeping_first() {
        let set = parse_model_list(r#"{"models":["b","a","b"," a "]}"#).unwrap();
        assert_eq!(set.as_slice(), ["b", "a"]);
    }

    #[test]
    fn wrong_shapes_are_malformed() {
        for body in [
            r#"{"models":"a"}"#,
            r#"{"models":["a",1]}"#,
            r#"{"data":["a"]}"#,
            r#"["a","b"]"#,
            "not json",
        ] {
            assert!(
                matches!(parse_model_list(body), Err(DirectoryError::Malformed(_))),
                "expected malformed for {}",
                body
            );
        }
    }

    #[test]
    fn blank_name_rejects_whole_list() {
        assert!(matches!(
            parse_model_list(r#"{"models":["a","  "]}"#),
            Err(DirectoryError::Malformed(_))
        ));
    }

    #[test]
    fn empty_list_is_valid() {
        assert!(parse_model_list(r#"{"models":[]}"#).unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_url_yields_empty_listing_with_error() {
        let listing = ModelDirectoryClient::new().list_models("localhost:11434").await;
        assert!(listing.models.is_empty());
        assert!(matches!(
            listing.error,
            Some(DirectoryError::Config(ConfigError::InvalidUrl { .. }))
        ));
    }
}
