//! Rows whose cell count diverges from the rest of their table.
//!
//! Converters often emit a block of finer-grained rows in the middle of a
//! table when the source laid out a small table inside a larger one. Such a
//! block is either flattened back to tab-joined text (when no line separates
//! its cells) or moved into a nested table inside the row above it.
use super::inline::tab_join_cells;
use crate::common::{Error, Result};
use crate::tree::{BorderSide, GridColumn, NodeId, NodeKind, NodeType, TableProperties, Tree};
use fixedbitset::FixedBitSet;
use log::debug;
use std::ops::Range;

/// A maximal run of consecutive rows sharing one cell count.
#[derive(Debug, Clone)]
struct RowGroup {
    rows: Vec<NodeId>,
    cell_count: usize,
}

impl RowGroup {
    /// First and last cell index holding content in any row of the group.
    fn content_span(&self, tree: &Tree) -> Result<Option<(usize, usize)>> {
        let mut span: Option<(usize, usize)> = None;
        for &row in &self.rows {
            for (index, cell) in tree.cells(row)?.into_iter().enumerate() {
                if tree.is_empty_cell(cell) {
                    continue;
                }
                span = Some(match span {
                    None => (index, index),
                    Some((first, last)) => (first.min(index), last.max(index)),
                });
            }
        }
        Ok(span)
    }
}

fn row_groups(tree: &Tree, rows: &[NodeId]) -> Result<Vec<RowGroup>> {
    let mut groups: Vec<RowGroup> = Vec::new();
    for &row in rows {
        let count = tree.cell_count(row)?;
        match groups.last_mut() {
            Some(group) if group.cell_count == count => group.rows.push(row),
            _ => groups.push(RowGroup {
                rows: vec![row],
                cell_count: count,
            }),
        }
    }
    Ok(groups)
}

/// Restructure the row groups of `table` that hold more cells than the
/// sparsest rows.
///
/// Tables with fewer than three grid columns or two rows are never touched.
/// Returns whether anything changed; a group that cannot be repaired is left
/// as it is.
pub fn try_fix_internal_table(tree: &mut Tree, table: NodeId) -> Result<bool> {
    let rows = tree.rows(table)?;
    if tree.column_count(table)? <= 2 || rows.len() < 2 {
        return Ok(false);
    }

    // Repairing one group can give the next one a usable row above.
    let mut changed = false;
    while fix_divergent_groups(tree, table)? {
        changed = true;
    }

    if changed {
        let removed = remove_redundant_columns(tree, table)?;
        if removed > 0 {
            debug!("dropped {} redundant grid columns from table {}", removed, table);
        }
    }
    Ok(changed)
}

/// One sweep over the row groups of `table`. Returns whether a group changed.
fn fix_divergent_groups(tree: &mut Tree, table: NodeId) -> Result<bool> {
    let groups = row_groups(tree, &tree.rows(table)?)?;
    let base = groups.iter().map(|g| g.cell_count).min().unwrap_or(0);
    if groups.iter().all(|g| g.cell_count == base) {
        return Ok(false);
    }

    let mut changed = false;
    for group in groups.iter().filter(|g| g.cell_count > base) {
        if remove_fake_internal_table(tree, group, base)? {
            debug!(
                "flattened borderless cells in {} rows of table {}",
                group.rows.len(),
                table
            );
            changed = true;
            continue;
        }
        if let Some(inner) = extract_internal_table(tree, table, group, base)? {
            debug!(
                "moved {} rows of table {} into nested table {}",
                group.rows.len(),
                table,
                inner
            );
            changed = true;
        }
    }
    Ok(changed)
}

/// Runs of two or more adjacent cells in `row` with no line between them.
///
/// Runs holding a nested table are left out.
fn borderless_runs(tree: &Tree, row: NodeId) -> Result<Vec<Vec<NodeId>>> {
    let mut runs = Vec::new();
    let mut current: Vec<NodeId> = Vec::new();
    for cell in tree.cells(row)? {
        let continues = match current.last() {
            Some(&previous) => !tree.has_visible_edge_between(previous, cell)?,
            None => false,
        };
        if !continues {
            if current.len() > 1 {
                runs.push(std::mem::take(&mut current));
            }
            current.clear();
        }
        current.push(cell);
    }
    if current.len() > 1 {
        runs.push(current);
    }
    runs.retain(|run| !run.iter().any(|c| tree.contains_type(*c, NodeType::Table)));
    Ok(runs)
}

/// Collapse borderless cell runs in every row of `group` until each row
/// holds `base` cells.
///
/// Applies only when every row of the group can get down to `base` cells
/// that way. Runs are consumed left to right; a run is only partly merged
/// when fewer cells are left to remove than it could absorb.
fn remove_fake_internal_table(tree: &mut Tree, group: &RowGroup, base: usize) -> Result<bool> {
    let excess = group.cell_count.saturating_sub(base);
    if excess == 0 {
        return Ok(false);
    }
    let mut plan = Vec::with_capacity(group.rows.len());
    for &row in &group.rows {
        let runs = borderless_runs(tree, row)?;
        let mergeable: usize = runs.iter().map(|run| run.len() - 1).sum();
        if mergeable < excess {
            return Ok(false);
        }
        plan.push(runs);
    }
    for runs in plan {
        let mut left = excess;
        for run in runs {
            if left == 0 {
                break;
            }
            let take = (run.len() - 1).min(left);
            collapse_cells(tree, &run[..=take])?;
            left -= take;
        }
    }
    Ok(true)
}

/// Merge `run` into its first cell, content tab-joined line by line.
fn collapse_cells(tree: &mut Tree, run: &[NodeId]) -> Result<()> {
    let (&first, rest) = run
        .split_first()
        .ok_or_else(|| Error::MalformedInput("empty cell run".to_string()))?;

    let mut span = 0;
    let mut width = Some(0u32);
    for &cell in run {
        let props = tree.cell_props(cell)?;
        span += props.span();
        width = width.zip(props.width).map(|(a, b)| a.saturating_add(b));
    }
    let right = match rest.last() {
        Some(&last) => tree.cell_props(last)?.borders.get(BorderSide::Right).cloned(),
        None => tree.cell_props(first)?.borders.get(BorderSide::Right).cloned(),
    };

    let lines = tab_join_cells(tree, run)?;
    for child in tree.children(first).to_vec() {
        tree.remove(child)?;
    }
    for line in lines {
        tree.append_child(first, line)?;
    }
    if tree.children(first).is_empty() {
        let empty = tree.new_paragraph(Default::default());
        tree.append_child(first, empty)?;
    }
    for &cell in rest {
        tree.remove(cell)?;
    }

    let props = tree.cell_props_mut(first)?;
    props.grid_span = span as u32;
    props.width = width;
    props.borders.set(BorderSide::Right, right);
    Ok(())
}

/// Grid range shared by cell `index` in every row, if it is the same everywhere.
fn uniform_grid_range(tree: &Tree, rows: &[NodeId], index: usize) -> Result<Option<Range<usize>>> {
    let mut shared: Option<Range<usize>> = None;
    for &row in rows {
        let range = tree.cell_grid_range(tree.cell_at(row, index)?)?;
        match &shared {
            Some(seen) if *seen != range => return Ok(None),
            Some(_) => {},
            None => shared = Some(range),
        }
    }
    Ok(shared)
}

fn sum_widths(grid: &[GridColumn], range: Range<usize>) -> Option<u32> {
    range
        .map(|c| grid.get(c).and_then(|col| col.width))
        .try_fold(0u32, |acc, w| w.map(|w| acc.saturating_add(w)))
}

/// Move the content columns of `group` into a table nested in the row above.
///
/// Needs a content span that leaves out at least one column and a preceding
/// row that is not itself divergent. A uniform column just left of the
/// content becomes the nested table's indentation; otherwise it is carried
/// along as a spacer column.
fn extract_internal_table(
    tree: &mut Tree,
    table: NodeId,
    group: &RowGroup,
    base: usize,
) -> Result<Option<NodeId>> {
    let Some((first, last)) = group.content_span(tree)? else {
        return Ok(None);
    };
    if first == 0 && last + 1 >= group.cell_count {
        return Ok(None);
    }
    let Some(&head) = group.rows.first() else {
        return Ok(None);
    };
    let Some(previous) = tree.previous_sibling(head) else {
        return Ok(None);
    };
    if !tree.is(previous, NodeType::Row) || tree.cell_count(previous)? > base {
        return Ok(None);
    }

    let (select_from, indent_column) = match first.checked_sub(1) {
        Some(column) => match uniform_grid_range(tree, &group.rows, column)? {
            Some(range) => (first, Some(range)),
            None => (column, None),
        },
        None => (first, None),
    };

    let mut start = usize::MAX;
    let mut end = 0;
    for &row in &group.rows {
        start = start.min(tree.cell_grid_start(tree.cell_at(row, select_from)?)?);
        end = end.max(tree.cell_grid_range(tree.cell_at(row, last)?)?.end);
    }
    if start >= end {
        return Ok(None);
    }

    let target = match tree.merged_cell(previous, start)? {
        Some(cell) => cell,
        None => tree.cells(previous)?.last().copied().ok_or_else(|| {
            Error::MalformedInput(format!("row {} above an internal table has no cells", previous))
        })?,
    };

    let parent_grid = tree.grid(table)?.to_vec();
    let grid: Vec<GridColumn> = (start..end)
        .map(|c| parent_grid.get(c).copied().unwrap_or_default())
        .collect();
    let indent = match indent_column {
        Some(range) => {
            let target_start = tree.cell_grid_start(target)?;
            if target_start < range.end {
                sum_widths(&parent_grid, target_start..range.end)
            } else {
                None
            }
        },
        None => None,
    };
    let parent_props = tree.table_props(table)?;
    let mut props = TableProperties {
        style: parent_props.style.clone(),
        borders: parent_props.borders.clone(),
        indent,
        grid,
        width: None,
    };
    props.width = props.grid_width();
    let columns = props.grid.len();
    let inner = tree.create(NodeKind::Table(props));

    for &row in &group.rows {
        let new_row = tree.clone_shallow(row)?;
        tree.append_child(inner, new_row)?;
        let cells = tree.cells(row)?;
        let selected = cells.get(select_from..=last).ok_or_else(|| {
            Error::MalformedInput(format!("row {} is shorter than its row group", row))
        })?;
        for &cell in selected {
            tree.append_child(new_row, cell)?;
        }
        let occupancy = tree.row_occupancy(new_row)?;
        if occupancy < columns
            && let Some(tail) = tree.last_child(new_row)
        {
            let span = tree.cell_span(tail)?;
            tree.set_cell_span(tail, span + columns - occupancy)?;
        }
    }

    tree.cell_props_mut(target)?.v_merge = None;
    tree.append_child(target, inner)?;
    let trailing = tree.new_paragraph(Default::default());
    tree.append_child(target, trailing)?;
    for &row in &group.rows {
        tree.remove(row)?;
    }
    remove_redundant_columns(tree, inner)?;
    Ok(Some(inner))
}

/// Drop grid columns where no cell of `table` starts.
///
/// Cells crossing a dropped column lose one span and its width goes to the
/// column on its left. Returns the number of columns dropped.
fn remove_redundant_columns(tree: &mut Tree, table: NodeId) -> Result<usize> {
    let rows = tree.rows(table)?;
    if rows.is_empty() {
        return Ok(0);
    }
    let count = tree.column_count(table)?;
    let mut starts = FixedBitSet::with_capacity(count);
    for &row in &rows {
        let mut start = 0;
        for cell in tree.cells(row)? {
            if start < count {
                starts.insert(start);
            }
            start += tree.cell_span(cell)?;
        }
    }

    let mut grid = tree.grid(table)?.to_vec();
    let mut removed = 0;
    for column in (1..count).rev() {
        if starts.contains(column) {
            continue;
        }
        for &row in &rows {
            if let Some(cell) = tree.merged_cell(row, column)? {
                let span = tree.cell_span(cell)?;
                tree.set_cell_span(cell, span.saturating_sub(1))?;
            }
        }
        if column < grid.len() {
            let dropped = grid.remove(column);
            if let Some(left) = grid.get_mut(column - 1) {
                left.width = match (left.width, dropped.width) {
                    (Some(a), Some(b)) => Some(a.saturating_add(b)),
                    (a, b) => a.or(b),
                };
            }
        }
        removed += 1;
    }
    if removed > 0 && !grid.is_empty() {
        tree.set_grid(table, grid)?;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Border, Borders};

    fn widths(tree: &Tree, table: NodeId) -> Vec<Option<u32>> {
        tree.grid(table).unwrap().iter().map(|c| c.width).collect()
    }

    fn set_widths(tree: &mut Tree, table: NodeId, width: u32) {
        let count = tree.column_count(table).unwrap();
        tree.table_props_mut(table).unwrap().width = Some(0);
        tree.set_grid(table, vec![GridColumn::with_width(width); count])
            .unwrap();
    }

    fn texts(tree: &Tree, row: NodeId) -> Vec<String> {
        tree.cells(row).unwrap().into_iter().map(|c| tree.text(c)).collect()
    }

    #[test]
    fn test_small_or_uniform_tables_untouched() {
        let mut tree = Tree::new();
        let body = tree.root();
        let narrow = tree
            .add_table(body, &[&["a"], &["b", "c"]], Borders::all(Border::single()))
            .unwrap();
        assert!(!try_fix_internal_table(&mut tree, narrow).unwrap());

        let uniform = tree
            .add_table(body, &[&["a", "b", "c"], &["d", "e", "f"]], Borders::all(Border::single()))
            .unwrap();
        assert!(!try_fix_internal_table(&mut tree, uniform).unwrap());
    }

    #[test]
    fn test_borderless_cells_collapse_to_text() {
        let mut tree = Tree::new();
        let body = tree.root();
        let mut borders = Borders::all(Border::single());
        borders.inside_v = None;
        let table = tree
            .add_table(body, &[&["Item", "Notes"], &["a", "b", "c", "d"], &["e", "f", "g", "h"]], borders)
            .unwrap();
        set_widths(&mut tree, table, 1000);
        let rows = tree.rows(table).unwrap();
        let head = tree.cells(rows[0]).unwrap();
        tree.set_cell_span(head[0], 2).unwrap();
        tree.set_cell_span(head[1], 2).unwrap();
        tree.cell_props_mut(head[0])
            .unwrap()
            .borders
            .set(BorderSide::Right, Some(Border::single()));
        for &row in &rows[1..] {
            let cell = tree.cell_at(row, 1).unwrap();
            tree.cell_props_mut(cell)
                .unwrap()
                .borders
                .set(BorderSide::Right, Some(Border::single()));
        }

        assert!(try_fix_internal_table(&mut tree, table).unwrap());
        assert_eq!(texts(&tree, rows[1]), vec!["a\tb", "c\td"]);
        assert_eq!(texts(&tree, rows[2]), vec!["e\tf", "g\th"]);
        assert_eq!(widths(&tree, table), vec![Some(2000), Some(2000)]);
        assert_eq!(tree.table_props(table).unwrap().width, Some(4000));
        for row in tree.rows(table).unwrap() {
            assert_eq!(tree.row_occupancy(row).unwrap(), 2);
        }
        assert!(!try_fix_internal_table(&mut tree, table).unwrap());
    }

    #[test]
    fn test_borderless_rows_collapse_only_to_sparsest_count() {
        let mut tree = Tree::new();
        let body = tree.root();
        let mut borders = Borders::all(Border::single());
        borders.inside_v = None;
        let table = tree
            .add_table(
                body,
                &[
                    &["Name", "Role", "Team"],
                    &["a", "b", "c", "d", "e"],
                    &["f", "g", "h", "i", "j"],
                ],
                borders,
            )
            .unwrap();
        let rows = tree.rows(table).unwrap();

        assert!(try_fix_internal_table(&mut tree, table).unwrap());
        assert_eq!(texts(&tree, rows[0]), vec!["Name", "Role", "Team"]);
        assert_eq!(texts(&tree, rows[1]), vec!["a\tb\tc", "d", "e"]);
        assert_eq!(texts(&tree, rows[2]), vec!["f\tg\th", "i", "j"]);
        for &row in &rows {
            assert_eq!(tree.row_occupancy(row).unwrap(), 5);
        }

        assert!(!try_fix_internal_table(&mut tree, table).unwrap());
        assert_eq!(texts(&tree, rows[0]), vec!["Name", "Role", "Team"]);
    }

    #[test]
    fn test_consecutive_groups_nest_into_row_above() {
        let mut tree = Tree::new();
        let body = tree.root();
        let table = tree
            .add_table(
                body,
                &[
                    &["Parameters"],
                    &["", "", "x", "1"],
                    &["", "", "", "y", "2"],
                ],
                Borders::all(Border::single()),
            )
            .unwrap();
        let rows = tree.rows(table).unwrap();

        assert!(try_fix_internal_table(&mut tree, table).unwrap());
        assert_eq!(tree.rows(table).unwrap(), vec![rows[0]]);
        let target = tree.cell_at(rows[0], 0).unwrap();
        let nested = tree
            .children(target)
            .iter()
            .filter(|c| tree.is(**c, NodeType::Table))
            .count();
        assert_eq!(nested, 2);
        assert!(!try_fix_internal_table(&mut tree, table).unwrap());
    }

    #[test]
    fn test_content_columns_move_to_nested_table() {
        let mut tree = Tree::new();
        let body = tree.root();
        let table = tree
            .add_table(
                body,
                &[
                    &["Parameters"],
                    &["", "", "x", "1"],
                    &["", "", "y", "2"],
                    &["Total", "3"],
                ],
                Borders::all(Border::single()),
            )
            .unwrap();
        set_widths(&mut tree, table, 1000);
        let rows = tree.rows(table).unwrap();
        let last = tree.cells(rows[3]).unwrap();
        tree.set_cell_span(last[0], 2).unwrap();
        tree.set_cell_span(last[1], 2).unwrap();

        assert!(try_fix_internal_table(&mut tree, table).unwrap());

        let remaining = tree.rows(table).unwrap();
        assert_eq!(remaining, vec![rows[0], rows[3]]);
        let target = tree.cell_at(rows[0], 0).unwrap();
        let blocks: Vec<NodeType> = tree
            .children(target)
            .iter()
            .map(|c| tree.node_type(*c).unwrap())
            .collect();
        assert_eq!(blocks, vec![NodeType::Paragraph, NodeType::Table, NodeType::Paragraph]);

        let inner = tree.children(target)[1];
        let inner_rows = tree.rows(inner).unwrap();
        assert_eq!(texts(&tree, inner_rows[0]), vec!["x", "1"]);
        assert_eq!(texts(&tree, inner_rows[1]), vec!["y", "2"]);
        let inner_props = tree.table_props(inner).unwrap();
        assert_eq!(inner_props.indent, Some(2000));
        assert_eq!(inner_props.width, Some(2000));

        assert_eq!(widths(&tree, table), vec![Some(2000), Some(2000)]);
        assert_eq!(tree.cell_span(target).unwrap(), 2);
        assert_eq!(tree.row_occupancy(rows[3]).unwrap(), 2);
    }

    #[test]
    fn test_group_without_row_above_is_left_alone() {
        let mut tree = Tree::new();
        let body = tree.root();
        let table = tree
            .add_table(
                body,
                &[&["", "x", "1"], &["Total"]],
                Borders::all(Border::single()),
            )
            .unwrap();
        assert!(!try_fix_internal_table(&mut tree, table).unwrap());
        assert_eq!(tree.rows(table).unwrap().len(), 2);
    }
}
