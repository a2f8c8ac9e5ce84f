//! Remote listening history.
//!
//! # Architecture
//!
//! Same split as any external API integration in this crate:
//! - **Domain models** (`domain.rs`) - our types for pages and play events
//! - **API DTOs** (`lastfm/dto.rs`) - exact Last.fm response shapes
//! - **Adapter** (`lastfm/adapter.rs`) - converts DTOs to domain models
//! - **Client** (`lastfm/client.rs`) - HTTP client
//! - **Traits** (`traits.rs`) - the seam the importer depends on, plus mocks
//! - **History** (`history.rs`) - the lazy, page-by-page play stream
//!
//! # Usage
//!
//! ```ignore
//! use scrobble_charts::source::{LastFmClient, RecentTracksSource};
//!
//! let client = LastFmClient::new(Duration::from_secs(30))?;
//! let page = client.fetch_page(&query).await?;
//! println!("{} of {} pages", page.page, page.total_pages);
//! ```

pub mod domain;
pub mod history;
pub mod lastfm;
pub mod traits;

pub use domain::{
    NowPlaying, PlayedEvent, RecentEvent, RecentTracksPage, RecentTracksQuery, SourceError,
};
pub use history::{HistoryRequest, recent_plays};
pub use lastfm::LastFmClient;
pub use traits::RecentTracksSource;
