//! Year import command.

use std::path::Path;

use chrono::{DateTime, Local, Utc};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::open_db;
use crate::config::Config;
use crate::import::{ImportCoordinator, ImportRequest};
use crate::source::LastFmClient;

/// Import one ISO year of a user's scrobbles
pub fn cmd_import(
    rt: &Runtime,
    config: &Config,
    db_path: Option<&Path>,
    user: &str,
    year: i32,
    api_key: &str,
    page_size: Option<u32>,
) -> anyhow::Result<()> {
    rt.block_on(import(config, db_path, user, year, api_key, page_size))
}

async fn import(
    config: &Config,
    db_path: Option<&Path>,
    user: &str,
    year: i32,
    api_key: &str,
    page_size: Option<u32>,
) -> anyhow::Result<()> {
    let pool = open_db(db_path).await?;
    let client = LastFmClient::with_base_url(
        config.lastfm.base_url.as_str(),
        config.lastfm.request_timeout(),
    )?;
    let importer = ImportCoordinator::new(pool, client)
        .page_size(page_size.unwrap_or(config.lastfm.page_size));

    // Ctrl-C stops before the next page; nothing is committed.
    let cancel = CancellationToken::new();
    let on_ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!(target: "import", "Interrupted, cancelling import");
                cancel.cancel();
            }
        })
    };

    println!("Importing {year} for {user}...");
    let request = ImportRequest {
        user,
        year,
        api_key,
    };
    let result = importer.import_year(&request, &cancel).await;
    on_ctrl_c.abort();
    let summary = result?;

    if summary.fetched.is_none() {
        println!("Already up to date.");
    }
    println!("Start:    {}", local(summary.coverage.start));
    println!("End:      {}", local(summary.coverage.end));
    println!("Imported: {} plays", summary.imported);
    Ok(())
}

fn local(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
