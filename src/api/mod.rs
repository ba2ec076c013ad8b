//! HTTP clients for the GitHub and Clubhouse APIs.
//!
//! Both clients share one `reqwest::Client` setup, one error type and the
//! JSON response handling in this module.

pub mod clubhouse;
pub mod github;

pub use clubhouse::ClubhouseClient;
pub use github::GitHubClient;

use crate::config::HttpConfig;
use reqwest::header::LINK;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Errors returned by the API clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP client could not be built.
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request never got a response.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The API answered with a non-success status.
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    /// The response body was not the JSON we expected.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One page of a JSON response.
#[derive(Debug)]
pub struct Page<T> {
    pub body: T,
    /// URL of the following page, from the `Link` header.
    pub next: Option<String>,
}

/// Build the HTTP client both APIs use.
pub fn build_http_client(config: &HttpConfig) -> Result<reqwest::Client, ApiError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(ApiError::Client)
}

/// Send a request and decode its JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    url: &str,
) -> Result<Page<T>, ApiError> {
    let response = request.send().await.map_err(|source| ApiError::Request {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    debug!("{} -> {}", url, status);

    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(url.to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            url: url.to_string(),
            status,
            body,
        });
    }

    let next = response
        .headers()
        .get(LINK)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| parse_link_header(value).remove("next"));

    let text = response.text().await.map_err(|source| ApiError::Request {
        url: url.to_string(),
        source,
    })?;
    let body = serde_json::from_str(&text).map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })?;

    Ok(Page { body, next })
}

/// Parse an RFC 8288 `Link` header into a map of rel to URL.
///
/// `<https://api.github.com/x?page=2>; rel="next"` maps `next` to the URL.
pub fn parse_link_header(header: &str) -> HashMap<String, String> {
    let mut links = HashMap::new();

    for part in header.split(',') {
        let part = part.trim();
        let (Some(open), Some(close)) = (part.find('<'), part.find('>')) else {
            continue;
        };
        if close < open {
            continue;
        }
        let url = &part[open + 1..close];

        for param in part[close + 1..].split(';') {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            if key.trim() == "rel" {
                let rel = value.trim().trim_matches('"');
                links.insert(rel.to_string(), url.to_string());
            }
        }
    }

    links
}
