//! Per-document state threaded through one repair pass.
use super::config::RepairOptions;
use super::report::RepairReport;
use crate::common::Result;
use crate::tree::NodeId;
use fixedbitset::FixedBitSet;
use log::warn;

/// State owned by a single pass over one document.
///
/// Nothing here outlives the pass. Tables that hit a structural fault are
/// quarantined so later stages leave them alone.
#[derive(Debug)]
pub struct RepairContext {
    pub options: RepairOptions,
    pub report: RepairReport,
    quarantined: FixedBitSet,
}

impl RepairContext {
    pub fn new(options: RepairOptions) -> Self {
        Self {
            options,
            report: RepairReport::default(),
            quarantined: FixedBitSet::new(),
        }
    }

    /// Whether an earlier stage gave up on `table`.
    #[inline]
    pub fn is_quarantined(&self, table: NodeId) -> bool {
        self.quarantined.contains(table.index())
    }

    pub fn quarantine(&mut self, table: NodeId) {
        self.quarantined.grow(table.index() + 1);
        self.quarantined.insert(table.index());
    }

    /// Run one stage on one table or container, containing local faults.
    ///
    /// A local fault is logged, counted and quarantines `subject`; the pass
    /// then moves on with `Ok(None)`. Any other error is returned as is.
    pub fn guard<T>(
        &mut self,
        subject: NodeId,
        stage: &str,
        op: impl FnOnce() -> Result<T>,
    ) -> Result<Option<T>> {
        if self.is_quarantined(subject) {
            return Ok(None);
        }
        match op() {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_local() => {
                warn!("{} aborted on {}: {}", stage, subject, err);
                self.report.failures += 1;
                self.quarantine(subject);
                Ok(None)
            },
            Err(err) => Err(err),
        }
    }
}
