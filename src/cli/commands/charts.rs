//! Chart commands.

use std::path::Path;

use tokio::runtime::Runtime;

use super::{fit, open_db};
use crate::charts::{WeeklyChartAggregator, YearlyChartAggregator};

const TRACK_WIDTH: usize = 40;
const ARTIST_WIDTH: usize = 30;

/// Print the top tracks of one ISO week
pub fn cmd_weekly(
    rt: &Runtime,
    db_path: Option<&Path>,
    user: &str,
    year: i32,
    week: u32,
) -> anyhow::Result<()> {
    rt.block_on(weekly(db_path, user, year, week))
}

async fn weekly(db_path: Option<&Path>, user: &str, year: i32, week: u32) -> anyhow::Result<()> {
    let pool = open_db(db_path).await?;
    let mut conn = pool.acquire().await?;
    let chart = WeeklyChartAggregator::new()
        .weekly_chart(&mut conn, user, year, week)
        .await?;

    println!("Top tracks of {user} in week {week} of {year}");
    if chart.is_empty() {
        println!("No plays in this week.");
        return Ok(());
    }

    println!(
        "{:>4}  {:<40}  {:<30}  {:>5}",
        "#", "Track", "Artist", "Plays"
    );
    for entry in &chart {
        println!(
            "{:>4}  {:<40}  {:<30}  {:>5}",
            entry.rank,
            fit(&entry.name, TRACK_WIDTH),
            fit(&entry.artist, ARTIST_WIDTH),
            entry.plays
        );
    }
    Ok(())
}

/// Print the top tracks of one ISO year
pub fn cmd_yearly(rt: &Runtime, db_path: Option<&Path>, user: &str, year: i32) -> anyhow::Result<()> {
    rt.block_on(yearly(db_path, user, year))
}

async fn yearly(db_path: Option<&Path>, user: &str, year: i32) -> anyhow::Result<()> {
    let pool = open_db(db_path).await?;
    let mut conn = pool.acquire().await?;
    let chart = YearlyChartAggregator::new()
        .yearly_chart(&mut conn, user, year)
        .await?;

    println!("Top tracks of {user} in {year}");
    if chart.is_empty() {
        println!("No plays in this year.");
        return Ok(());
    }

    println!(
        "{:>4}  {:<40}  {:<30}  {:>5}  {:>6}",
        "#", "Track", "Artist", "Plays", "Points"
    );
    for entry in &chart {
        println!(
            "{:>4}  {:<40}  {:<30}  {:>5}  {:>6}",
            entry.rank,
            fit(&entry.name, TRACK_WIDTH),
            fit(&entry.artist, ARTIST_WIDTH),
            entry.plays,
            entry.points
        );
    }
    Ok(())
}
