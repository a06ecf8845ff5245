//! Summary statistics for temporal values

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Start, end and spread of a set of instants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalSummary {
    pub count: usize,
    /// Earliest instant
    pub start: Option<DateTime<Utc>>,
    /// Latest instant
    pub end: Option<DateTime<Utc>>,
    /// Median instant (mean of the middle pair for even counts)
    pub median: Option<DateTime<Utc>>,
}

impl TemporalSummary {
    pub fn from_data(data: &[DateTime<Utc>]) -> Self {
        let mut sorted = data.to_vec();
        sorted.sort();

        let count = sorted.len();
        let median = match count {
            0 => None,
            n if n % 2 == 1 => Some(sorted[n / 2]),
            n => {
                let lower = sorted[n / 2 - 1];
                let upper = sorted[n / 2];
                Some(lower + Duration::milliseconds((upper - lower).num_milliseconds() / 2))
            }
        };

        Self {
            count,
            start: sorted.first().copied(),
            end: sorted.last().copied(),
            median,
        }
    }

    /// Time between the earliest and latest instant
    pub fn duration(&self) -> Duration {
        match (self.start, self.end) {
            (Some(start), Some(end)) => end - start,
            _ => Duration::zero(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).single().unwrap()
    }

    #[test]
    fn test_temporal_summary() {
        let data = vec![instant(30), instant(10), instant(20), instant(40)];
        let summary = TemporalSummary::from_data(&data);

        assert_eq!(summary.count, 4);
        assert_eq!(summary.start, Some(instant(10)));
        assert_eq!(summary.end, Some(instant(40)));
        assert_eq!(summary.median, Some(instant(25)));
        assert_eq!(summary.duration(), Duration::seconds(30));
    }

    #[test]
    fn test_empty_temporal_summary() {
        let summary = TemporalSummary::from_data(&[]);
        assert!(summary.is_empty());
        assert_eq!(summary.duration(), Duration::zero());
        assert!(summary.median.is_none());
    }
}
