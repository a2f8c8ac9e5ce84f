//! Weekly and yearly charts computed from stored plays.
//!
//! Both charts are read-only views over committed plays and refuse to rank
//! a period that was not fully imported.
//!
//! - **Weekly**: tracks ranked by plays in one ISO week, then by most recent
//!   play, top [`CHART_SIZE`]
//! - **Yearly**: every weekly rank `r` is worth `21 - r` points; tracks are
//!   ranked by their points summed over the year
//!
//! Remaining ties fall back to the lower track id so a chart never depends
//! on row order.

mod weekly;
mod yearly;

use std::cmp::Ordering;

pub use weekly::{WeeklyChartAggregator, WeeklyChartEntry};
pub use yearly::{YearlyChartAggregator, YearlyChartEntry};

/// Maximum number of entries in any chart
pub const CHART_SIZE: usize = 20;

/// Points earned by a weekly chart position (20 for first, 1 for twentieth).
pub fn points_for_rank(rank: u32) -> u32 {
    (CHART_SIZE as u32 + 1).saturating_sub(rank)
}

/// Sort `items`, keep the top [`CHART_SIZE`] and pair them with ranks from 1.
fn top_ranked<T>(mut items: Vec<T>, order: impl Fn(&T, &T) -> Ordering) -> Vec<(u32, T)> {
    items.sort_by(|a, b| order(a, b));
    items.truncate(CHART_SIZE);
    (1u32..).zip(items).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_for_rank() {
        assert_eq!(points_for_rank(1), 20);
        assert_eq!(points_for_rank(4), 17);
        assert_eq!(points_for_rank(20), 1);
        assert_eq!(points_for_rank(21), 0);
    }

    #[test]
    fn test_top_ranked_truncates_and_numbers() {
        let ranked = top_ranked((0..30).collect(), |a: &i32, b: &i32| b.cmp(a));
        assert_eq!(ranked.len(), CHART_SIZE);
        assert_eq!(ranked[0], (1, 29));
        assert_eq!(ranked[19], (20, 10));
    }
}
