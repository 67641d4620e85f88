//! Merging tables that follow each other directly.
use crate::common::Result;
use crate::tree::{NodeId, NodeType, Tree};
use log::debug;

/// Absorb every directly following table with the same column count into
/// `table`. Returns the number of tables absorbed.
pub fn join_table_with_next(tree: &mut Tree, table: NodeId) -> Result<usize> {
    let columns = tree.column_count(table)?;
    let mut joined = 0;
    while let Some(next) = tree.next_sibling(table) {
        if !tree.is(next, NodeType::Table) || tree.column_count(next)? != columns {
            break;
        }
        tree.move_children(next, table)?;
        tree.remove(next)?;
        debug!("joined table {} into table {}", next, table);
        joined += 1;
    }
    Ok(joined)
}

/// Join adjacent tables with matching column counts among the children of
/// `container`. Returns the number of tables removed.
pub fn join_adjacent_tables(tree: &mut Tree, container: NodeId) -> Result<usize> {
    let mut joined = 0;
    for table in tree.children_of_type(container, NodeType::Table) {
        if tree.is_alive(table) {
            joined += join_table_with_next(tree, table)?;
        }
    }
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Border, Borders};

    #[test]
    fn test_chain_of_tables_joins_into_first() {
        let mut tree = Tree::new();
        let body = tree.root();
        let borders = Borders::all(Border::single());
        let first = tree.add_table(body, &[&["a", "b"]], borders.clone()).unwrap();
        let second = tree.add_table(body, &[&["c", "d"]], borders.clone()).unwrap();
        let third = tree.add_table(body, &[&["e", "f"], &["g", "h"]], borders).unwrap();

        assert_eq!(join_adjacent_tables(&mut tree, body).unwrap(), 2);
        assert!(!tree.is_alive(second) && !tree.is_alive(third));
        assert_eq!(tree.rows(first).unwrap().len(), 4);
        assert_eq!(join_adjacent_tables(&mut tree, body).unwrap(), 0);
    }

    #[test]
    fn test_mismatch_or_gap_blocks_join() {
        let mut tree = Tree::new();
        let body = tree.root();
        let borders = Borders::all(Border::single());
        let two = tree.add_table(body, &[&["a", "b"]], borders.clone()).unwrap();
        let three = tree.add_table(body, &[&["a", "b", "c"]], borders.clone()).unwrap();
        tree.add_paragraph(body, "between").unwrap();
        let after = tree.add_table(body, &[&["x", "y", "z"]], borders).unwrap();

        assert_eq!(join_adjacent_tables(&mut tree, body).unwrap(), 0);
        assert!(tree.is_alive(two) && tree.is_alive(three) && tree.is_alive(after));
    }
}
