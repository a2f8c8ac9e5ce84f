//! Get-or-create resolution of artists and tracks during an import.

use std::collections::HashMap;

use sqlx::SqliteConnection;

use crate::db;
use crate::error::Result;
use crate::model::{Artist, Track};

/// Resolves artist and track names to stored rows, creating them on first
/// sighting.
///
/// Lookups go through an in-memory working set first, then storage. The
/// working set lives as long as one import run, so every row a run creates
/// is created exactly once even across many pages. Rows are written on the
/// connection passed in, normally the import's open transaction.
#[derive(Debug, Default)]
pub struct EntityReconciler {
    artists: HashMap<String, Artist>,
    tracks: HashMap<(i64, String), Track>,
    artists_created: u64,
    tracks_created: u64,
}

impl EntityReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The artist named `name`, created if it does not exist yet.
    pub async fn resolve_artist(&mut self, conn: &mut SqliteConnection, name: &str) -> Result<Artist> {
        if let Some(artist) = self.artists.get(name) {
            return Ok(artist.clone());
        }

        let artist = match db::find_artist_by_name(conn, name).await? {
            Some(artist) => artist,
            None => {
                let artist = db::insert_artist(conn, name).await?;
                self.artists_created += 1;
                tracing::trace!(target: "import", id = artist.id, artist = name, "Created artist");
                artist
            }
        };

        self.artists.insert(name.to_string(), artist.clone());
        Ok(artist)
    }

    /// The track `name` of artist `artist_id`, created if it does not exist yet.
    pub async fn resolve_track(
        &mut self,
        conn: &mut SqliteConnection,
        artist_id: i64,
        name: &str,
    ) -> Result<Track> {
        let key = (artist_id, name.to_string());
        if let Some(track) = self.tracks.get(&key) {
            return Ok(track.clone());
        }

        let track = match db::find_track(conn, artist_id, name).await? {
            Some(track) => track,
            None => {
                let track = db::insert_track(conn, artist_id, name).await?;
                self.tracks_created += 1;
                tracing::trace!(target: "import", id = track.id, artist_id, track = name, "Created track");
                track
            }
        };

        self.tracks.insert(key, track.clone());
        Ok(track)
    }

    pub fn artists_created(&self) -> u64 {
        self.artists_created
    }

    pub fn tracks_created(&self) -> u64 {
        self.tracks_created
    }
}
