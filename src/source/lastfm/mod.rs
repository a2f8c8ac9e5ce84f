//! Last.fm API integration
//!
//! Fetches a user's scrobble history page by page through
//! `user.getRecentTracks`.
//!
//! API docs: https://www.last.fm/api

pub mod dto;
mod adapter;
mod client;

pub use adapter::to_page;
pub use client::{LASTFM_API_BASE, LastFmClient, MAX_PAGE_SIZE};
