use crate::harvest::errors::ErrorKind;
use std::collections::BTreeMap;

/// Counters for one run, reset at the start of every run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Papers seen: decoded documents for lean sources, parsed records for
    /// the structured source.
    pub total: usize,
    /// Papers that passed the keyword filter.
    pub filtered: usize,
    pub downloaded: usize,
    /// Document transfers that failed after resolution.
    pub failed: usize,
    /// Listing pages that could not be fetched.
    pub listings_failed: usize,
    pub skipped: BTreeMap<ErrorKind, usize>,
}

impl RunStatistics {
    pub fn record_skip(&mut self, kind: ErrorKind) {
        *self.skipped.entry(kind).or_insert(0) += 1;
    }

    pub fn skipped(&self, kind: ErrorKind) -> usize {
        self.skipped.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_are_counted_per_kind() {
        let mut stats = RunStatistics::default();
        stats.record_skip(ErrorKind::Resolution);
        stats.record_skip(ErrorKind::Resolution);
        stats.record_skip(ErrorKind::TooShort);

        assert_eq!(stats.skipped(ErrorKind::Resolution), 2);
        assert_eq!(stats.skipped(ErrorKind::TooShort), 1);
        assert_eq!(stats.skipped(ErrorKind::Transport), 0);
        assert_eq!(stats.total_skipped(), 3);
    }
}
