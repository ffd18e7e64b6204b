//! Outcome accounting for a sync pass.

use std::fmt;

/// Tally of one sync pass over a listing.
///
/// `created` counts records mapped for the first time, `updated` records
/// whose sync record was already attached to a local object, `skipped`
/// records that failed mapping and were passed over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl SyncReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that were actually written, created and updated together.
    pub fn processed(&self) -> usize {
        self.created + self.updated
    }

    /// Fold another report into this one.
    pub fn absorb(&mut self, other: SyncReport) {
        self.fetched += other.fetched;
        self.created += other.created;
        self.updated += other.updated;
        self.skipped += other.skipped;
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fetched, {} created, {} updated, {} skipped",
            self.fetched, self.created, self.updated, self.skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_sums_counters() {
        let mut total = SyncReport {
            fetched: 2,
            created: 1,
            updated: 1,
            skipped: 0,
        };
        total.absorb(SyncReport {
            fetched: 3,
            created: 0,
            updated: 2,
            skipped: 1,
        });
        assert_eq!(total.fetched, 5);
        assert_eq!(total.processed(), 4);
        assert_eq!(total.skipped, 1);
    }

    #[test]
    fn test_display_narration() {
        let report = SyncReport {
            fetched: 4,
            created: 3,
            updated: 0,
            skipped: 1,
        };
        assert_eq!(report.to_string(), "4 fetched, 3 created, 0 updated, 1 skipped");
    }
}
