//! Adapter layer: Convert Last.fm DTOs to domain models
//!
//! This is the ONLY place where DTO types are converted to domain types.

use chrono::DateTime;

use super::dto;
use crate::source::domain::{NowPlaying, PlayedEvent, RecentEvent, RecentTracksPage, SourceError};

/// Convert a recent tracks response to a page of events.
pub fn to_page(response: dto::RecentTracksResponse) -> Result<RecentTracksPage, SourceError> {
    let dto::RecentTracks { track, attr } = response.recenttracks;

    let events = track
        .into_vec()
        .into_iter()
        .map(to_event)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RecentTracksPage {
        user: attr.user,
        page: parse_number("page", &attr.page)?,
        per_page: parse_number("perPage", &attr.per_page)?,
        total_pages: parse_number("totalPages", &attr.total_pages)?,
        total: parse_number("total", &attr.total)?,
        events,
    })
}

fn to_event(entry: dto::TrackEntry) -> Result<RecentEvent, SourceError> {
    let now_playing = entry
        .attr
        .as_ref()
        .and_then(|a| a.nowplaying.as_deref())
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));

    if now_playing {
        return Ok(RecentEvent::NowPlaying(NowPlaying {
            name: entry.name,
            artist: entry.artist.text,
            album: entry.album.text,
        }));
    }

    let date = entry.date.ok_or_else(|| {
        SourceError::Parse(format!("'{}' is neither playing nor dated", entry.name))
    })?;
    let secs: i64 = parse_number("date.uts", &date.uts)?;
    let played_at = DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| SourceError::Parse(format!("timestamp out of range: {secs}")))?;

    Ok(RecentEvent::Played(PlayedEvent {
        name: entry.name,
        artist: entry.artist.text,
        album: entry.album.text,
        played_at,
    }))
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, SourceError> {
    value
        .trim()
        .parse()
        .map_err(|_| SourceError::Parse(format!("{field} is not a number: '{value}'")))
}
