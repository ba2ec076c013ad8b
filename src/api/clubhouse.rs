//! Clubhouse REST API client.

use super::{send_json, ApiError, Page};
use crate::models::Story;
use reqwest::header::ACCEPT;
use tracing::info;

/// Clubhouse client authenticated with an API token.
pub struct ClubhouseClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl ClubhouseClient {
    pub fn new(http: reqwest::Client, api_url: &str, token: &str) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Fetch a story by id.
    ///
    /// Returns [`ApiError::NotFound`] for deleted or unknown stories.
    pub async fn story(&self, id: u64) -> Result<Story, ApiError> {
        let url = format!("{}/stories/{}", self.api_url, id);
        info!("Hitting clubhouse {}", url);

        let request = self
            .http
            .get(&url)
            .header("Clubhouse-Token", &self.token)
            .header(ACCEPT, "application/json");

        let page: Page<Story> = send_json(request, &url).await?;
        Ok(page.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{http_client, MockResponse, MockServer};

    const STORY: &str = include_str!("../../fixtures/clubhouse/story.json");

    #[tokio::test]
    async fn test_fetch_story() {
        let server =
            MockServer::start(vec![("/api/v3/stories/123", MockResponse::json(STORY))]).await;
        let api_url = format!("{}/api/v3/", server.base_url);
        let client = ClubhouseClient::new(http_client(), &api_url, "ch-token");

        let story = client.story(123).await.unwrap();
        assert_eq!(story.id, 123);
        assert_eq!(story.name, "Throttle failed logins");
        assert_eq!(story.story_type, "feature");
        assert_eq!(story.app_url, "https://app.clubhouse.io/acme/story/123");

        let requests = server.requests();
        assert!(requests[0].starts_with("GET /api/v3/stories/123 "));
        assert!(requests[0].to_lowercase().contains("clubhouse-token: ch-token"));
    }

    #[tokio::test]
    async fn test_missing_story() {
        let server = MockServer::start(vec![]).await;
        let client = ClubhouseClient::new(http_client(), &server.base_url, "ch-token");

        let err = client.story(404).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
