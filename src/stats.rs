use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counters for one pipeline run, appended to the optional summary log.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub case_records: usize,
    pub rainfall_records: usize,
    pub case_keys: usize,
    pub rainfall_keys: usize,
    pub joined_rows: usize,
    pub dropped_keys: usize,
}

impl RunSummary {
    pub fn started_now() -> Self {
        RunSummary {
            started_at: Utc::now(),
            ..Default::default()
        }
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    /// Share of distinct keys that made it into the output.
    pub fn match_pct(&self) -> f64 {
        Self::pct(self.joined_rows, self.joined_rows + self.dropped_keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(RunSummary::pct(10, 0), 0.0);
    }

    #[test]
    fn test_pct_normal_values() {
        assert_eq!(RunSummary::pct(50, 100), 50.0);
        assert_eq!(RunSummary::pct(1, 4), 25.0);
    }

    #[test]
    fn test_match_pct() {
        let summary = RunSummary {
            joined_rows: 3,
            dropped_keys: 1,
            ..Default::default()
        };
        assert_eq!(summary.match_pct(), 75.0);
        assert_eq!(RunSummary::default().match_pct(), 0.0);
    }

    #[test]
    fn test_started_now_has_no_counts() {
        let summary = RunSummary::started_now();
        assert_eq!(summary.case_records, 0);
        assert_eq!(summary.joined_rows, 0);
    }
}
