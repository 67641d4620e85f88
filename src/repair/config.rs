/// Configuration types for the table repair pass.
///
/// This module defines the options that switch repair stages on and off and
/// tune the tab-table heuristics.
use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration options for [`TableRepairer`](super::TableRepairer).
///
/// # Examples
///
/// ```rust
/// use tablemend::repair::RepairOptions;
///
/// // Create with defaults
/// let options = RepairOptions::default();
///
/// // Or customize
/// let options = RepairOptions::new()
///     .with_fake_tables(false)
///     .with_min_tab_rows(3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairOptions {
    /// Flatten tables without any visible border into paragraphs
    pub flatten_fake_tables: bool,
    /// Leave tables that reference a table style alone when flattening,
    /// since their borders may come from the style
    pub skip_styled_tables: bool,
    /// Turn runs of tab-delimited paragraphs into tables
    pub build_tab_tables: bool,
    /// Restructure rows whose cell count diverges from the table grid
    pub fix_internal_tables: bool,
    /// Merge adjacent tables with the same column count
    pub join_sibling_tables: bool,
    /// Remove repeated headings and join rows cut by a page break
    pub fix_divided_tables: bool,
    /// Collapse consecutive tabs into one column boundary at body level
    pub treat_tab_run_as_single_tab: bool,
    /// Minimum number of consecutive tabbed paragraphs that form a table
    pub min_tab_rows: usize,
    /// How deep tab tables may be nested inside freshly built cells
    pub max_nesting_depth: usize,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            flatten_fake_tables: true,
            skip_styled_tables: true,
            build_tab_tables: true,
            fix_internal_tables: true,
            join_sibling_tables: true,
            fix_divided_tables: true,
            treat_tab_run_as_single_tab: false,
            min_tab_rows: 2,
            max_nesting_depth: 8,
        }
    }
}

impl RepairOptions {
    /// Create a new `RepairOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from YAML. Missing keys keep their defaults.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tablemend::repair::RepairOptions;
    ///
    /// let options = RepairOptions::from_yaml_str("min_tab_rows: 4\nflatten_fake_tables: false\n")?;
    /// assert_eq!(options.min_tab_rows, 4);
    /// assert!(!options.flatten_fake_tables);
    /// assert!(options.build_tab_tables);
    /// # Ok::<(), tablemend::Error>(())
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_saphyr::from_str(yaml)
            .map_err(|e| Error::Config(format!("Failed to parse repair options: {}", e)))
    }

    /// Dump options as YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_saphyr::to_string(self)
            .map_err(|e| Error::Config(format!("Failed to serialize repair options: {}", e)))
    }

    #[inline]
    pub fn with_fake_tables(mut self, enabled: bool) -> Self {
        self.flatten_fake_tables = enabled;
        self
    }

    #[inline]
    pub fn with_skip_styled_tables(mut self, skip: bool) -> Self {
        self.skip_styled_tables = skip;
        self
    }

    #[inline]
    pub fn with_tab_tables(mut self, enabled: bool) -> Self {
        self.build_tab_tables = enabled;
        self
    }

    #[inline]
    pub fn with_internal_tables(mut self, enabled: bool) -> Self {
        self.fix_internal_tables = enabled;
        self
    }

    #[inline]
    pub fn with_sibling_join(mut self, enabled: bool) -> Self {
        self.join_sibling_tables = enabled;
        self
    }

    #[inline]
    pub fn with_divided_tables(mut self, enabled: bool) -> Self {
        self.fix_divided_tables = enabled;
        self
    }

    /// Set the tab-run policy for body-level paragraphs.
    ///
    /// Paragraphs inside freshly built cells always collapse tab runs.
    #[inline]
    pub fn with_tab_run_as_single_tab(mut self, single: bool) -> Self {
        self.treat_tab_run_as_single_tab = single;
        self
    }

    /// Set the minimum number of consecutive tabbed paragraphs for a table.
    ///
    /// Values below 1 are raised to 1.
    #[inline]
    pub fn with_min_tab_rows(mut self, rows: usize) -> Self {
        self.min_tab_rows = rows.max(1);
        self
    }

    #[inline]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }
}
