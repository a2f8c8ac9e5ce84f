//! Internal domain models for remote listening history.
//!
//! These types are OUR types - they don't change when the Last.fm API
//! changes. Responses get converted into these types by the adapter.

use chrono::{DateTime, Utc};

/// Parameters of one page request for a user's recent tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecentTracksQuery<'a> {
    pub user: &'a str,
    /// Inclusive lower bound
    pub from: DateTime<Utc>,
    /// Inclusive upper bound
    pub to: DateTime<Utc>,
    /// Page size (1..=200)
    pub limit: u32,
    /// 1-based page number
    pub page: u32,
    pub api_key: &'a str,
}

/// One page of a user's recent tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentTracksPage {
    pub user: String,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub total: u32,
    pub events: Vec<RecentEvent>,
}

/// An entry in the recent tracks list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecentEvent {
    /// A finished play with its timestamp
    Played(PlayedEvent),
    /// The track currently playing; it has no timestamp yet
    NowPlaying(NowPlaying),
}

impl RecentEvent {
    pub fn into_played(self) -> Option<PlayedEvent> {
        match self {
            Self::Played(played) => Some(played),
            Self::NowPlaying(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedEvent {
    pub name: String,
    pub artist: String,
    pub album: String,
    pub played_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub name: String,
    pub artist: String,
    pub album: String,
}

/// Errors that can occur while fetching recent tracks
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Last.fm error {code}: {message}")]
    Api { code: u32, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Rate limited - try again later")]
    RateLimited,

    #[error("Empty response")]
    EmptyResponse,
}
