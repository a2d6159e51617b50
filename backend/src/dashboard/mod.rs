//! Read-only views over the task collection: day/status filtering and the
//! statistics shown on the dashboard. Nothing here mutates or caches.

pub mod filter;
pub mod stats;

pub use filter::{StatusFilter, by_due_day, by_status, completion_rate};
pub use stats::{
    CategoryStat, MAX_TREND_WINDOW_DAYS, TrendPoint, category_stats, completion_trend,
    priority_distribution,
};

/// `round(100 * part / whole)` with halves rounded up, `0` for an empty whole.
pub(crate) fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    ((200 * part + whole) / (2 * whole)) as u8
}

#[cfg(test)]
mod tests {
    use super::percent;

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(4, 10), 40);
        assert_eq!(percent(5, 5), 100);
    }
}
