//! Last.fm HTTP client
//!
//! Handles communication with the Last.fm web service.
//! See: https://www.last.fm/api/show/user.getRecentTracks
//!
//! Requests are validated before they are sent and are never retried here;
//! pages are requested one at a time by the import stream.

use std::time::Duration;

use super::{adapter, dto};
use crate::source::domain::{RecentTracksPage, RecentTracksQuery, SourceError};

/// Default Last.fm API endpoint
pub const LASTFM_API_BASE: &str = "https://ws.audioscrobbler.com/2.0/";

/// Largest page size Last.fm accepts
pub const MAX_PAGE_SIZE: u32 = 200;

/// Last.fm error code for exceeded rate limits
const RATE_LIMIT_EXCEEDED: u32 = 29;

/// User agent string sent with every request
const USER_AGENT: &str = concat!("scrobble-charts/", env!("CARGO_PKG_VERSION"));

/// Last.fm API client
pub struct LastFmClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl LastFmClient {
    /// Create a client for the public Last.fm endpoint.
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        Self::with_base_url(LASTFM_API_BASE, timeout)
    }

    /// Create a client for a custom endpoint (mirrors, tests).
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    /// Fetch one page of a user's scrobbles.
    pub async fn get_recent_tracks(
        &self,
        query: &RecentTracksQuery<'_>,
    ) -> Result<RecentTracksPage, SourceError> {
        validate(query)?;
        let response = self.send_recent_tracks_request(query).await?;
        adapter::to_page(response)
    }

    /// Send the HTTP request and parse the response
    async fn send_recent_tracks_request(
        &self,
        query: &RecentTracksQuery<'_>,
    ) -> Result<dto::RecentTracksResponse, SourceError> {
        let from = query.from.timestamp().to_string();
        let to = query.to.timestamp().to_string();
        let limit = query.limit.to_string();
        let page = query.page.to_string();

        tracing::debug!(
            target: "lastfm",
            user = query.user,
            page = query.page,
            from = %query.from,
            to = %query.to,
            "Requesting recent tracks"
        );

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("method", "user.getrecenttracks"),
                ("user", query.user.trim()),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("limit", limit.as_str()),
                ("page", page.as_str()),
                ("api_key", query.api_key.trim()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited);
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        parse_body(status, &body)
    }
}

/// Interpret a response body, preferring Last.fm's own error payload.
fn parse_body(
    status: reqwest::StatusCode,
    body: &str,
) -> Result<dto::RecentTracksResponse, SourceError> {
    if body.trim().is_empty() {
        return Err(SourceError::EmptyResponse);
    }

    if let Ok(error) = serde_json::from_str::<dto::ApiError>(body) {
        if error.error == RATE_LIMIT_EXCEEDED {
            return Err(SourceError::RateLimited);
        }
        return Err(SourceError::Api {
            code: error.error,
            message: error.message,
        });
    }

    if !status.is_success() {
        return Err(SourceError::Network(format!(
            "HTTP {}: {}",
            status,
            status.canonical_reason().unwrap_or("Unknown")
        )));
    }

    serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))
}

fn validate(query: &RecentTracksQuery<'_>) -> Result<(), SourceError> {
    if query.user.trim().is_empty() {
        return Err(SourceError::InvalidRequest(
            "user cannot be empty or whitespace only".to_string(),
        ));
    }
    if query.api_key.trim().is_empty() {
        return Err(SourceError::InvalidRequest(
            "API key cannot be empty or whitespace only".to_string(),
        ));
    }
    if query.from >= query.to {
        return Err(SourceError::InvalidRequest(
            "from must be before to".to_string(),
        ));
    }
    if query.limit == 0 || query.limit > MAX_PAGE_SIZE {
        return Err(SourceError::InvalidRequest(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    if query.page == 0 {
        return Err(SourceError::InvalidRequest(
            "page must be greater than 0".to_string(),
        ));
    }
    Ok(())
}
