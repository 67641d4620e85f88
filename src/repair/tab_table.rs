//! Turning runs of tab-delimited paragraphs into tables.
use super::inline::{paragraph_props, relocate_into_cell};
use super::tab_columns::{TabColumns, evaluate_column_ranges};
use crate::common::{Error, Result};
use crate::tree::{Border, Borders, CellProperties, NodeId, NodeType, Tree};
use log::debug;

/// Build a table from tab-delimited `paragraphs`.
///
/// Each paragraph with column evidence becomes one row and each of its
/// ranges one cell; the original inline nodes are moved into the cells. The
/// table is inserted before the first paragraph and every input paragraph is
/// removed. Returns `None`, leaving the tree untouched, when no paragraph has
/// more than one column.
///
/// The grid is as wide as the widest paragraph; shorter rows widen their
/// last cell so every row fills the grid.
pub fn build_table_from_tabbed_paragraphs(
    tree: &mut Tree,
    paragraphs: &[NodeId],
    treat_tab_run_as_single_tab: bool,
) -> Result<Option<NodeId>> {
    let Some(&first) = paragraphs.first() else {
        return Ok(None);
    };

    let mut rows: Vec<(NodeId, TabColumns)> = Vec::with_capacity(paragraphs.len());
    for &para in paragraphs {
        let columns = evaluate_column_ranges(tree, para, treat_tab_run_as_single_tab)?;
        if !columns.is_empty() {
            rows.push((para, columns));
        }
    }
    let column_count = rows.iter().map(|(_, c)| c.len()).max().unwrap_or(0);
    if column_count <= 1 {
        return Ok(None);
    }
    if tree.parent(first).is_none() {
        return Err(Error::MalformedInput(format!("paragraph {} is detached", first)));
    }

    let table = tree.new_table(column_count, Borders::all(Border::single()));
    tree.insert_before(first, table)?;

    for (para, columns) in &rows {
        let row = tree.add_row(table)?;
        let last = columns.len() - 1;
        for index in 0..columns.len() {
            let mut props = CellProperties::default();
            if index == last {
                props.grid_span = (column_count - last) as u32;
            }
            let cell = tree.add_cell(row, props)?;
            let items = columns.column(index);
            if items.is_empty() {
                let props = paragraph_props(tree, *para)?;
                let empty = tree.new_paragraph(props);
                tree.append_child(cell, empty)?;
            } else {
                relocate_into_cell(tree, items, cell)?;
            }
        }
    }

    for &para in paragraphs {
        if tree.is_alive(para) {
            tree.remove(para)?;
        }
    }
    if tree.next_sibling(table).is_none() {
        let trailing = tree.new_paragraph(Default::default());
        tree.insert_after(table, trailing)?;
    }

    debug!(
        "built table {} with {} rows and {} columns from tabbed paragraphs",
        table,
        rows.len(),
        column_count
    );
    Ok(Some(table))
}

/// Consecutive paragraphs of `container` that hold at least one tab marker.
pub fn tabbed_paragraph_groups(tree: &Tree, container: NodeId) -> Vec<Vec<NodeId>> {
    let mut groups = Vec::new();
    let mut current = Vec::new();
    for &child in tree.children(container) {
        if tree.is(child, NodeType::Paragraph) && tree.contains_type(child, NodeType::Tab) {
            current.push(child);
        } else if !current.is_empty() {
            groups.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// Build tables from every qualifying group of tabbed paragraphs in
/// `container`, then look for tab tables inside the new cells.
///
/// Cells of a freshly built table are scanned with tab runs collapsed, up to
/// `max_depth` levels deep. Returns the number of tables built.
pub fn convert_tabbed_paragraphs(
    tree: &mut Tree,
    container: NodeId,
    treat_tab_run_as_single_tab: bool,
    min_rows: usize,
    max_depth: usize,
) -> Result<usize> {
    let mut built = 0;
    for group in tabbed_paragraph_groups(tree, container) {
        if group.len() < min_rows.max(1) {
            continue;
        }
        let built_table =
            build_table_from_tabbed_paragraphs(tree, &group, treat_tab_run_as_single_tab)?;
        let Some(table) = built_table else {
            continue;
        };
        built += 1;
        if max_depth == 0 {
            continue;
        }
        for row in tree.rows(table)? {
            for cell in tree.cells(row)? {
                built += convert_tabbed_paragraphs(tree, cell, true, min_rows, max_depth - 1)?;
            }
        }
    }
    Ok(built)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{HyperlinkProperties, NodeKind};

    fn body_with(lines: &[&str]) -> (Tree, Vec<NodeId>) {
        let mut tree = Tree::new();
        let body = tree.root();
        let paras = lines
            .iter()
            .map(|l| tree.add_paragraph(body, l).unwrap())
            .collect();
        (tree, paras)
    }

    fn cell_texts(tree: &Tree, table: NodeId) -> Vec<Vec<String>> {
        tree.rows(table)
            .unwrap()
            .into_iter()
            .map(|r| tree.cells(r).unwrap().into_iter().map(|c| tree.text(c)).collect())
            .collect()
    }

    #[test]
    fn test_two_by_three() {
        let (mut tree, paras) = body_with(&["A\tB\tC", "D\tE\tF"]);
        let table = build_table_from_tabbed_paragraphs(&mut tree, &paras, false)
            .unwrap()
            .unwrap();
        assert_eq!(tree.column_count(table).unwrap(), 3);
        assert_eq!(
            cell_texts(&tree, table),
            vec![vec!["A", "B", "C"], vec!["D", "E", "F"]]
        );
        assert!(paras.iter().all(|p| !tree.is_alive(*p)));
        // Trailing paragraph keeps the body from ending on a table.
        let after = tree.next_sibling(table).unwrap();
        assert!(tree.is_empty_paragraph(after));
        assert!(tree.has_visible_border(table).unwrap());
    }

    #[test]
    fn test_single_column_is_not_a_table() {
        let (mut tree, paras) = body_with(&["A\t", "\tB"]);
        let built = build_table_from_tabbed_paragraphs(&mut tree, &paras, true).unwrap();
        assert!(built.is_none());
        assert!(paras.iter().all(|p| tree.is_alive(*p)));
    }

    #[test]
    fn test_short_row_spans_rest() {
        let (mut tree, paras) = body_with(&["A\tB\tC", "D\tE"]);
        let table = build_table_from_tabbed_paragraphs(&mut tree, &paras, false)
            .unwrap()
            .unwrap();
        let rows = tree.rows(table).unwrap();
        assert_eq!(tree.row_occupancy(rows[1]).unwrap(), 3);
        assert_eq!(tree.cell_span(tree.cell_at(rows[1], 1).unwrap()).unwrap(), 2);
    }

    #[test]
    fn test_empty_range_becomes_empty_cell() {
        let (mut tree, paras) = body_with(&["A\t\tC", "D\tE\tF"]);
        let table = build_table_from_tabbed_paragraphs(&mut tree, &paras, false)
            .unwrap()
            .unwrap();
        let row = tree.rows(table).unwrap()[0];
        let middle = tree.cell_at(row, 1).unwrap();
        assert!(tree.is_empty_cell(middle));
        assert_eq!(tree.children_of_type(middle, NodeType::Paragraph).len(), 1);
    }

    #[test]
    fn test_table_followed_by_content_gets_no_padding() {
        let (mut tree, paras) = body_with(&["A\tB", "C\tD", "after"]);
        let table = build_table_from_tabbed_paragraphs(&mut tree, &paras[..2], false)
            .unwrap()
            .unwrap();
        assert_eq!(tree.next_sibling(table), Some(paras[2]));
        assert_eq!(tree.children(tree.root()).len(), 2);
    }

    #[test]
    fn test_groups_break_on_plain_paragraphs() {
        let (mut tree, _) = body_with(&["A\tB", "C\tD", "plain", "E\tF"]);
        let body = tree.root();
        let groups = tabbed_paragraph_groups(&tree, body);
        assert_eq!(groups.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 1]);

        let built = convert_tabbed_paragraphs(&mut tree, body, false, 2, 4).unwrap();
        assert_eq!(built, 1);
        let again = convert_tabbed_paragraphs(&mut tree, body, false, 2, 4).unwrap();
        assert_eq!(again, 0);
    }

    #[test]
    fn test_new_cells_are_scanned_for_tabs() {
        let (mut tree, paras) = body_with(&["Name\t"]);
        let body = tree.root();
        let link = tree.create(NodeKind::Hyperlink(HyperlinkProperties {
            rel_id: Some("rId1".to_string()),
            anchor: None,
        }));
        let run = tree.new_run(Default::default(), "x\ty").unwrap();
        tree.append_child(link, run).unwrap();
        tree.append_child(paras[0], link).unwrap();

        // The hyperlink is one item, so its tab never splits the new cell.
        let built = convert_tabbed_paragraphs(&mut tree, body, false, 1, 4).unwrap();
        assert_eq!(built, 1);
        let table = tree.first_child(body).unwrap();
        assert_eq!(cell_texts(&tree, table), vec![vec!["Name", "x\ty"]]);
        let cell = tree.cell_at(tree.rows(table).unwrap()[0], 1).unwrap();
        assert_eq!(tree.descendants_of_type(cell, NodeType::Hyperlink), vec![link]);
        assert!(!tree.contains_type(cell, NodeType::Table));

        let again = convert_tabbed_paragraphs(&mut tree, body, false, 1, 4).unwrap();
        assert_eq!(again, 0);
    }

    #[test]
    fn test_tabbed_lines_inside_existing_cell() {
        let mut tree = Tree::new();
        let body = tree.root();
        let outer = tree
            .add_table(body, &[&["A\t\tB", "side"]], Borders::all(Border::single()))
            .unwrap();
        let cell = tree.cell_at(tree.rows(outer).unwrap()[0], 0).unwrap();
        tree.add_paragraph(cell, "C\t\tD").unwrap();

        let built = convert_tabbed_paragraphs(&mut tree, cell, true, 2, 4).unwrap();
        assert_eq!(built, 1);
        let inner = tree.first_child(cell).unwrap();
        assert!(tree.is(inner, NodeType::Table));
        assert_eq!(tree.column_count(inner).unwrap(), 2);
        assert_eq!(
            cell_texts(&tree, inner),
            vec![vec!["A", "B"], vec!["C", "D"]]
        );
        // A cell must not end on a table.
        let after = tree.next_sibling(inner).unwrap();
        assert!(tree.is_empty_paragraph(after));
    }
}
