//! Borderless tables that only lay out text.
//!
//! A table that draws no line anywhere reads as plain paragraphs on the page.
//! Flattening turns each row into tab-separated paragraphs, which the tab
//! table builder can later rebuild into a real table if the columns hold up.
use super::inline::tab_join_cells;
use crate::common::Result;
use crate::tree::{NodeId, NodeType, Tree};
use log::debug;

/// Whether neither `table` nor any of its cells declares a visible border.
pub fn is_fake_table(tree: &Tree, table: NodeId) -> Result<bool> {
    Ok(!tree.has_visible_border(table)?)
}

/// Replace a fake `table` with tab-joined paragraphs, one line per row.
///
/// Tables with a visible border and tables holding a nested table are left
/// alone. Returns whether the table was replaced.
pub fn convert_fake_table_to_paragraphs(tree: &mut Tree, table: NodeId) -> Result<bool> {
    if !is_fake_table(tree, table)? {
        return Ok(false);
    }
    if tree.contains_type(table, NodeType::Table) {
        return Ok(false);
    }
    let parent = tree.parent(table);

    let mut lines = 0;
    for row in tree.rows(table)? {
        let cells = tree.cells(row)?;
        for para in tab_join_cells(tree, &cells)? {
            tree.insert_before(table, para)?;
            lines += 1;
        }
    }
    tree.remove(table)?;

    // A cell may not be left without a block.
    if let Some(parent) = parent
        && tree.is(parent, NodeType::Cell)
        && tree.children(parent).is_empty()
    {
        let empty = tree.new_paragraph(Default::default());
        tree.append_child(parent, empty)?;
    }

    debug!("flattened fake table {} into {} paragraphs", table, lines);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Border, BorderSide, Borders};

    #[test]
    fn test_predicate() {
        let mut tree = Tree::new();
        let body = tree.root();
        let plain = tree.add_table(body, &[&["a", "b"]], Borders::default()).unwrap();
        assert!(is_fake_table(&tree, plain).unwrap());

        let nil = tree.add_table(body, &[&["a"]], Borders::all(Border::nil())).unwrap();
        assert!(is_fake_table(&tree, nil).unwrap());

        let lined = tree.add_table(body, &[&["a", "b"]], Borders::default()).unwrap();
        let row = tree.rows(lined).unwrap()[0];
        let cell = tree.cell_at(row, 1).unwrap();
        tree.cell_props_mut(cell)
            .unwrap()
            .borders
            .set(BorderSide::Bottom, Some(Border::single()));
        assert!(!is_fake_table(&tree, lined).unwrap());
    }

    #[test]
    fn test_flatten_rows_to_tabbed_lines() {
        let mut tree = Tree::new();
        let body = tree.root();
        let table = tree
            .add_table(body, &[&["Name", "Role"], &["Ada", "Engineer"]], Borders::default())
            .unwrap();
        assert!(convert_fake_table_to_paragraphs(&mut tree, table).unwrap());
        assert!(!tree.is_alive(table));

        let texts: Vec<String> = tree.children(body).iter().map(|p| tree.text(*p)).collect();
        assert_eq!(texts, vec!["Name\tRole", "Ada\tEngineer"]);
    }

    #[test]
    fn test_bordered_table_is_kept() {
        let mut tree = Tree::new();
        let body = tree.root();
        let table = tree
            .add_table(body, &[&["a", "b"]], Borders::all(Border::single()))
            .unwrap();
        assert!(!convert_fake_table_to_paragraphs(&mut tree, table).unwrap());
        assert!(tree.is_alive(table));
    }

    #[test]
    fn test_nested_table_blocks_flattening() {
        let mut tree = Tree::new();
        let body = tree.root();
        let outer = tree.add_table(body, &[&["a", "b"]], Borders::default()).unwrap();
        let row = tree.rows(outer).unwrap()[0];
        let cell = tree.cell_at(row, 0).unwrap();
        tree.add_table(cell, &[&["x"]], Borders::all(Border::single())).unwrap();
        assert!(!convert_fake_table_to_paragraphs(&mut tree, outer).unwrap());
    }

    #[test]
    fn test_flattened_inner_table_leaves_cell_paragraph() {
        let mut tree = Tree::new();
        let body = tree.root();
        let outer = tree
            .add_table(body, &[&["a"]], Borders::all(Border::single()))
            .unwrap();
        let cell = tree.cell_at(tree.rows(outer).unwrap()[0], 0).unwrap();
        let first = tree.first_child(cell).unwrap();
        tree.remove(first).unwrap();
        let inner = tree.add_table(cell, &[], Borders::default()).unwrap();

        assert!(convert_fake_table_to_paragraphs(&mut tree, inner).unwrap());
        assert_eq!(tree.children_of_type(cell, NodeType::Paragraph).len(), 1);
    }
}
