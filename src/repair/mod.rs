//! Table repair for documents that went through a lossy conversion.
//!
//! Legacy converters leave tables in odd shapes: typewriter-style columns
//! built from tabs, borderless tables used for layout, tables split across
//! pages with the heading row repeated, and blocks of finer-grained rows
//! that really are a small table inside a larger one. This module detects
//! those shapes and rewrites the tree in place.
//!
//! # Quick Start
//!
//! ```rust
//! use tablemend::repair::{RepairOptions, TableRepairer};
//! use tablemend::tree::Tree;
//!
//! # fn main() -> Result<(), tablemend::Error> {
//! let mut tree = Tree::new();
//! let body = tree.root();
//! tree.add_paragraph(body, "Name\tRole")?;
//! tree.add_paragraph(body, "Ada\tEngineer")?;
//!
//! let report = TableRepairer::new(RepairOptions::default()).repair(&mut tree)?;
//! assert_eq!(report.tab_tables_built, 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Stages
//!
//! A pass runs, in order:
//! - [`fake_table`]: flatten tables that draw no line anywhere
//! - [`tab_table`]: build tables from runs of tab-delimited paragraphs
//! - [`internal_table`]: restructure rows whose cell count diverges
//! - [`sibling`]: merge directly adjacent tables with the same column count
//! - [`divided_table`]: remove repeated headings and join split rows
//!
//! Each stage sees the tree as left by the previous one. A structural fault
//! in one table is logged and that table is skipped for the rest of the
//! pass; the other tables are still repaired.
pub mod config;
pub mod context;
pub mod divided_table;
pub mod fake_table;
pub mod inline;
pub mod internal_table;
pub mod report;
pub mod sibling;
pub mod tab_columns;
pub mod tab_table;


pub use config::RepairOptions;
pub use context::RepairContext;
pub use divided_table::{
    JoinScore, fix_table_with_divided_rows, fix_table_with_repeated_headers, should_join_cells,
    should_join_rows, try_join_rows,
};
pub use fake_table::{convert_fake_table_to_paragraphs, is_fake_table};
pub use internal_table::try_fix_internal_table;
pub use report::RepairReport;
pub use sibling::join_adjacent_tables;
pub use tab_columns::{ColumnRange, TabColumns, evaluate_column_ranges};
pub use tab_table::build_table_from_tabbed_paragraphs;

use crate::common::Result;
use crate::tree::{NodeId, NodeType, Tree};
use log::info;

/// Runs every enabled repair stage over a whole document.
#[derive(Debug, Clone, Default)]
pub struct TableRepairer {
    options: RepairOptions,
}

impl TableRepairer {
    pub fn new(options: RepairOptions) -> Self {
        Self { options }
    }

    #[inline]
    pub fn options(&self) -> &RepairOptions {
        &self.options
    }

    /// Repair every table of `tree` in place.
    ///
    /// Only errors that are not tied to a single table, such as a dangling
    /// handle in the body itself, end the pass early.
    pub fn repair(&self, tree: &mut Tree) -> Result<RepairReport> {
        let mut ctx = RepairContext::new(self.options.clone());

        if ctx.options.flatten_fake_tables {
            flatten_fake_tables(tree, &mut ctx)?;
        }
        if ctx.options.build_tab_tables {
            build_tab_tables(tree, &mut ctx)?;
        }
        if ctx.options.fix_internal_tables {
            fix_internal_tables(tree, &mut ctx)?;
        }
        if ctx.options.join_sibling_tables {
            join_sibling_tables(tree, &mut ctx)?;
        }
        if ctx.options.fix_divided_tables {
            fix_divided_tables(tree, &mut ctx)?;
        }

        info!("table repair finished: {}", ctx.report);
        Ok(ctx.report)
    }
}

/// Live, unquarantined tables of the tree, innermost first.
fn tables_innermost_first(tree: &Tree, ctx: &RepairContext) -> Vec<NodeId> {
    let mut tables = tree.descendants_of_type(tree.root(), NodeType::Table);
    tables.retain(|t| !ctx.is_quarantined(*t));
    tables.reverse();
    tables
}

/// Body plus every cell, in document order.
fn block_containers(tree: &Tree) -> Vec<NodeId> {
    let root = tree.root();
    let mut containers = vec![root];
    containers.extend(tree.descendants_of_type(root, NodeType::Cell));
    containers
}

/// The table guarding faults raised inside `container`.
fn guard_subject(tree: &Tree, container: NodeId) -> NodeId {
    tree.ancestor_of_type(container, NodeType::Table)
        .unwrap_or(container)
}

fn flatten_fake_tables(tree: &mut Tree, ctx: &mut RepairContext) -> Result<()> {
    for table in tables_innermost_first(tree, ctx) {
        if !tree.is_alive(table) {
            continue;
        }
        if ctx.options.skip_styled_tables && tree.table_props(table)?.style.is_some() {
            continue;
        }
        if let Some(true) =
            ctx.guard(table, "fake-table", || convert_fake_table_to_paragraphs(tree, table))?
        {
            ctx.report.fake_tables_flattened += 1;
        }
    }
    Ok(())
}

fn build_tab_tables(tree: &mut Tree, ctx: &mut RepairContext) -> Result<()> {
    let body_single = ctx.options.treat_tab_run_as_single_tab;
    let min_rows = ctx.options.min_tab_rows;
    let max_depth = ctx.options.max_nesting_depth;
    for container in block_containers(tree) {
        if !tree.is_alive(container) {
            continue;
        }
        // Cell content always collapses tab runs.
        let single = body_single || tree.is(container, NodeType::Cell);
        let subject = guard_subject(tree, container);
        let built = ctx.guard(subject, "tab-table", || {
            tab_table::convert_tabbed_paragraphs(tree, container, single, min_rows, max_depth)
        })?;
        ctx.report.tab_tables_built += built.unwrap_or(0);
    }
    Ok(())
}

fn fix_internal_tables(tree: &mut Tree, ctx: &mut RepairContext) -> Result<()> {
    for table in tables_innermost_first(tree, ctx) {
        if !tree.is_alive(table) {
            continue;
        }
        if let Some(true) =
            ctx.guard(table, "internal-table", || try_fix_internal_table(tree, table))?
        {
            ctx.report.internal_tables_fixed += 1;
        }
    }
    Ok(())
}

fn join_sibling_tables(tree: &mut Tree, ctx: &mut RepairContext) -> Result<()> {
    for container in block_containers(tree) {
        if !tree.is_alive(container) {
            continue;
        }
        let subject = guard_subject(tree, container);
        let joined =
            ctx.guard(subject, "sibling-join", || join_adjacent_tables(tree, container))?;
        ctx.report.tables_joined += joined.unwrap_or(0);
    }
    Ok(())
}

fn fix_divided_tables(tree: &mut Tree, ctx: &mut RepairContext) -> Result<()> {
    for table in tables_innermost_first(tree, ctx) {
        if !tree.is_alive(table) {
            continue;
        }
        let headings = ctx.guard(table, "repeated-headers", || {
            fix_table_with_repeated_headers(tree, table)
        })?;
        match headings {
            Some((removed, joined)) if removed > 0 => {
                ctx.report.headings_removed += removed;
                ctx.report.rows_joined += joined;
            },
            Some(_) => {
                let joined = ctx.guard(table, "divided-rows", || {
                    fix_table_with_divided_rows(tree, table)
                })?;
                ctx.report.rows_joined += joined.unwrap_or(0);
            },
            None => {},
        }
    }
    Ok(())
}
