//! Category counts

use serde::{Deserialize, Serialize};

/// Per-category occurrence counts in category order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    pub count: usize,
    /// `(label, count)` for every known category, including zero counts
    pub category_counts: Vec<(String, usize)>,
}

impl CategoricalSummary {
    /// Count `values` against `categories`
    ///
    /// Labels absent from `categories` are appended in first-seen order.
    pub fn from_data<S: AsRef<str>>(values: &[S], categories: &[String]) -> Self {
        let mut category_counts: Vec<(String, usize)> =
            categories.iter().map(|c| (c.clone(), 0)).collect();

        for value in values {
            let label = value.as_ref();
            match category_counts.iter_mut().find(|(c, _)| c == label) {
                Some((_, n)) => *n += 1,
                None => category_counts.push((label.to_string(), 1)),
            }
        }

        Self {
            count: values.len(),
            category_counts,
        }
    }

    pub fn count_for(&self, label: &str) -> usize {
        self.category_counts
            .iter()
            .find(|(c, _)| c == label)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    /// Most frequent category; the earliest wins ties
    pub fn mode(&self) -> Option<&str> {
        let mut best: Option<&(String, usize)> = None;
        for entry in &self.category_counts {
            if entry.1 > 0 && best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(label, _)| label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_counts() {
        let categories = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        let summary = CategoricalSummary::from_data(&["x", "x", "y", "w"], &categories);

        assert_eq!(summary.count, 4);
        assert_eq!(summary.count_for("x"), 2);
        assert_eq!(summary.count_for("z"), 0);
        assert_eq!(summary.count_for("w"), 1);
        assert_eq!(summary.category_counts.len(), 4);
        assert_eq!(summary.mode(), Some("x"));
    }

    #[test]
    fn test_mode_of_empty() {
        let summary = CategoricalSummary::from_data::<&str>(&[], &["a".to_string()]);
        assert_eq!(summary.mode(), None);
    }
}
