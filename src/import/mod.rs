//! Importing listening history into storage.
//!
//! - [`EntityReconciler`] resolves artist and track names to rows
//! - [`ImportCoordinator`] runs one all-or-nothing year import
//!
//! # Usage
//!
//! ```ignore
//! use scrobble_charts::import::{ImportCoordinator, ImportRequest};
//!
//! let importer = ImportCoordinator::new(pool, LastFmClient::new(timeout)?);
//! let request = ImportRequest { user: "alice", year: 2024, api_key: &key };
//! let summary = importer.import_year(&request, &CancellationToken::new()).await?;
//! println!("{} new plays", summary.imported);
//! ```

mod coordinator;
mod reconciler;

pub use coordinator::{ImportCoordinator, ImportRequest, ImportSummary};
pub use reconciler::EntityReconciler;
