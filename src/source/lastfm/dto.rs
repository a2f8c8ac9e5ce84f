//! Last.fm API Data Transfer Objects
//!
//! These types match what `user.getRecentTracks` returns with
//! `format=json`. DO NOT use them outside the lastfm module - convert to
//! domain types in the adapter.
//!
//! Last.fm quirks encoded here:
//! - numbers in `@attr` are strings
//! - `track` is an object instead of an array when there is exactly one entry
//! - the currently playing track has `@attr.nowplaying = "true"` and no `date`
//!
//! API Reference: https://www.last.fm/api/show/user.getRecentTracks

use serde::{Deserialize, Serialize};

/// Top-level envelope
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecentTracksResponse {
    pub recenttracks: RecentTracks,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecentTracks {
    #[serde(default)]
    pub track: OneOrMany<TrackEntry>,
    #[serde(rename = "@attr")]
    pub attr: RecentTracksAttr,
}

/// Pagination info
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecentTracksAttr {
    pub user: String,
    #[serde(rename = "totalPages")]
    pub total_pages: String,
    pub page: String,
    #[serde(rename = "perPage")]
    pub per_page: String,
    pub total: String,
}

/// A JSON value that is either a single item or an array of items.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

/// One scrobble (or the now-playing entry)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackEntry {
    pub name: String,
    pub artist: TextField,
    #[serde(default)]
    pub album: TextField,
    pub url: Option<String>,
    pub mbid: Option<String>,
    #[serde(rename = "@attr")]
    pub attr: Option<TrackAttr>,
    pub date: Option<DateField>,
}

/// `{"mbid": "...", "#text": "..."}` objects used for artist and album
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TextField {
    #[serde(rename = "#text", default)]
    pub text: String,
    pub mbid: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackAttr {
    pub nowplaying: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DateField {
    /// Unix seconds, as a string
    pub uts: String,
    #[serde(rename = "#text")]
    pub text: Option<String>,
}

/// Error body returned by Last.fm
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: u32,
    pub message: String,
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs match what the real API returns.
// ============================================================================
