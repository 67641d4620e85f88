//! Change counters collected by a repair pass.
use crate::common::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Per-stage change counts of one [`TableRepairer::repair`](super::TableRepairer::repair) call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    /// Borderless tables turned into paragraphs
    pub fake_tables_flattened: usize,
    /// Tables built from tab-delimited paragraphs
    pub tab_tables_built: usize,
    /// Tables whose divergent row groups were restructured
    pub internal_tables_fixed: usize,
    /// Tables merged into the table before them
    pub tables_joined: usize,
    /// Repeated heading rows removed
    pub headings_removed: usize,
    /// Row pairs joined across a page break
    pub rows_joined: usize,
    /// Tables abandoned because of a structural fault
    pub failures: usize,
}

impl RepairReport {
    /// Sum of all change counters, failures excluded.
    pub fn total_changes(&self) -> usize {
        self.fake_tables_flattened
            + self.tab_tables_built
            + self.internal_tables_fixed
            + self.tables_joined
            + self.headings_removed
            + self.rows_joined
    }

    /// Whether the pass left the tree untouched.
    #[inline]
    pub fn is_unchanged(&self) -> bool {
        self.total_changes() == 0
    }

    /// Add the counters of `other` to this report.
    pub fn merge(&mut self, other: &RepairReport) {
        self.fake_tables_flattened += other.fake_tables_flattened;
        self.tab_tables_built += other.tab_tables_built;
        self.internal_tables_fixed += other.internal_tables_fixed;
        self.tables_joined += other.tables_joined;
        self.headings_removed += other.headings_removed;
        self.rows_joined += other.rows_joined;
        self.failures += other.failures;
    }

    /// Dump the counters as YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_saphyr::to_string(self)
            .map_err(|e| Error::Other(format!("Failed to serialize repair report: {}", e)))
    }
}

impl fmt::Display for RepairReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fake={} tab={} internal={} joined-tables={} headings={} joined-rows={} failures={}",
            self.fake_tables_flattened,
            self.tab_tables_built,
            self.internal_tables_fixed,
            self.tables_joined,
            self.headings_removed,
            self.rows_joined,
            self.failures
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_and_merge() {
        let mut a = RepairReport {
            tab_tables_built: 2,
            failures: 1,
            ..Default::default()
        };
        let b = RepairReport {
            rows_joined: 3,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.total_changes(), 5);
        assert_eq!(a.failures, 1);
        assert!(!a.is_unchanged());
        assert!(RepairReport::default().is_unchanged());
    }

    #[test]
    fn test_yaml_dump() {
        let report = RepairReport {
            headings_removed: 1,
            ..Default::default()
        };
        let yaml = report.to_yaml_string().unwrap();
        assert!(yaml.contains("headings_removed: 1"));
    }
}
