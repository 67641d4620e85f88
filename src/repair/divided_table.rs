//! Tables cut in two by a page boundary.
//!
//! Two traces are left behind: the heading row repeated on the new page, and
//! a row whose cells were split mid-sentence so the text continues in the
//! row below. Heading copies are removed and continued rows are joined back.
use super::inline::append_text;
use crate::common::{Error, Result};
use crate::tree::{BorderSide, NodeId, NodeKind, NodeType, Tree};
use log::debug;

/// How strongly two vertically adjacent cells look like one cell cut in two.
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JoinScore {
    /// An explicit separator was drawn between the cells
    DefinitelyNot = -2,
    ProbablyNot = -1,
    Uncertain = 0,
    Probably = 1,
    Definitely = 2,
}

impl JoinScore {
    #[inline]
    pub fn value(self) -> i8 {
        self as i8
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self.value() > 0
    }
}

fn is_explicit_nil(tree: &Tree, cell: NodeId, side: BorderSide) -> Result<bool> {
    Ok(tree
        .cell_props(cell)?
        .borders
        .get(side)
        .is_some_and(|b| b.is_nil()))
}

fn first_block(tree: &Tree, cell: NodeId) -> Option<NodeId> {
    tree.first_child(cell)
}

fn last_block(tree: &Tree, cell: NodeId) -> Option<NodeId> {
    tree.last_child(cell)
}

/// At least two words and some punctuation.
fn looks_like_sentence(text: &str) -> bool {
    let words = text
        .split_whitespace()
        .filter(|w| w.chars().any(char::is_alphabetic))
        .count();
    words >= 2
        && text
            .chars()
            .any(|c| matches!(c, '.' | '!' | '?' | ',' | ';' | ':'))
}

/// Score whether `lower` continues the content of `upper`.
pub fn should_join_cells(tree: &Tree, upper: NodeId, lower: NodeId) -> Result<JoinScore> {
    tree.expect_type(upper, NodeType::Cell)?;
    tree.expect_type(lower, NodeType::Cell)?;

    if is_explicit_nil(tree, upper, BorderSide::Bottom)?
        && is_explicit_nil(tree, lower, BorderSide::Top)?
    {
        return Ok(JoinScore::DefinitelyNot);
    }

    let upper_para = match last_block(tree, upper) {
        Some(block) if tree.is(block, NodeType::Paragraph) && !tree.is_empty_cell(upper) => block,
        _ => return Ok(JoinScore::Uncertain),
    };
    let lower_para = match first_block(tree, lower) {
        Some(block) if tree.is(block, NodeType::Paragraph) => block,
        _ => return Ok(JoinScore::Uncertain),
    };

    if tree.is_empty_paragraph(lower_para) {
        return Ok(if tree.is_empty_cell(lower) {
            JoinScore::Uncertain
        } else {
            JoinScore::Definitely
        });
    }

    let upper_text = tree.text(upper_para);
    let upper_text = upper_text.trim_end();
    if upper_text.ends_with(',') {
        return Ok(JoinScore::Definitely);
    }
    if upper_text.ends_with(['.', '!', '?', ':']) {
        return Ok(JoinScore::Uncertain);
    }

    let lower_text = tree.text(lower_para);
    let lower_text = lower_text.trim_start();
    if !looks_like_sentence(upper_text) && !looks_like_sentence(lower_text) {
        return Ok(JoinScore::Uncertain);
    }
    if !lower_text.starts_with(char::is_alphabetic) {
        return Ok(JoinScore::ProbablyNot);
    }
    Ok(JoinScore::Probably)
}

/// Whether `lower` looks like the continuation of `upper`.
///
/// Rows need the same number of cells. Any aligned pair scoring
/// [`JoinScore::DefinitelyNot`] vetoes the join; otherwise one positive pair
/// is enough.
pub fn should_join_rows(tree: &Tree, upper: NodeId, lower: NodeId) -> Result<bool> {
    let upper_cells = tree.cells(upper)?;
    let lower_cells = tree.cells(lower)?;
    if upper_cells.len() != lower_cells.len() || upper_cells.is_empty() {
        return Ok(false);
    }
    let mut positive = false;
    for (&a, &b) in upper_cells.iter().zip(&lower_cells) {
        match should_join_cells(tree, a, b)? {
            JoinScore::DefinitelyNot => return Ok(false),
            score if score.is_positive() => positive = true,
            _ => {},
        }
    }
    Ok(positive)
}

/// Whether [`join_divided_cells`] can merge `lower` into `upper`.
pub fn can_join_cells(tree: &Tree, upper: NodeId, lower: NodeId) -> Result<bool> {
    if tree.cell_span(upper)? != tree.cell_span(lower)? {
        return Ok(false);
    }
    let Some(head) = first_block(tree, lower) else {
        return Ok(true);
    };
    if !tree.is(head, NodeType::Paragraph) {
        return Ok(false);
    }
    if tree.is_empty_paragraph(head) {
        return Ok(true);
    }
    Ok(last_block(tree, upper).is_some_and(|b| tree.is(b, NodeType::Paragraph)))
}

/// Spaces to put between the end of `upper` and the start of `lower`.
fn separator(upper: &str, lower: &str) -> &'static str {
    if upper.is_empty() || upper.ends_with(char::is_whitespace) || lower.starts_with(char::is_whitespace)
    {
        ""
    } else if lower.starts_with(char::is_uppercase) {
        "  "
    } else {
        " "
    }
}

fn same_link(tree: &Tree, a: NodeId, b: NodeId) -> bool {
    match (tree.kind(a), tree.kind(b)) {
        (Ok(NodeKind::Hyperlink(x)), Ok(NodeKind::Hyperlink(y))) => x.same_target(y),
        _ => false,
    }
}

/// Append the content of `lower` to `upper`, separated by spaces.
///
/// When both paragraphs meet in links to the same target, the second link is
/// dissolved into the first.
fn join_paragraphs(tree: &mut Tree, upper: NodeId, lower: NodeId) -> Result<()> {
    let sep = separator(&tree.text(upper), &tree.text(lower));
    let tail = tree.last_child(upper);
    let head = tree.first_child(lower);
    if let (Some(tail), Some(head)) = (tail, head)
        && same_link(tree, tail, head)
    {
        append_text(tree, tail, sep)?;
        tree.move_children(head, tail)?;
        tree.remove(head)?;
    } else {
        append_text(tree, upper, sep)?;
    }
    tree.move_children(lower, upper)
}

/// Merge the content of `lower` into `upper`.
///
/// A blank leading paragraph in `lower` is dropped and the remaining blocks
/// are appended. Otherwise the last paragraph of `upper` and the first of
/// `lower` become one paragraph.
pub fn join_divided_cells(tree: &mut Tree, upper: NodeId, lower: NodeId) -> Result<()> {
    let Some(head) = first_block(tree, lower) else {
        return Ok(());
    };
    if tree.is_empty_paragraph(head) {
        tree.remove(head)?;
        return tree.move_children(lower, upper);
    }
    let tail = last_block(tree, upper)
        .filter(|b| tree.is(*b, NodeType::Paragraph))
        .ok_or_else(|| {
            Error::MalformedInput(format!("cell {} does not end with a paragraph", upper))
        })?;
    join_paragraphs(tree, tail, head)?;
    tree.remove(head)?;
    tree.move_children(lower, upper)
}

/// Join `lower` into `upper` when it looks like a continuation.
///
/// Every aligned cell pair is checked before anything moves, so the rows
/// are either joined completely or left untouched.
pub fn try_join_rows(tree: &mut Tree, upper: NodeId, lower: NodeId) -> Result<bool> {
    if !should_join_rows(tree, upper, lower)? {
        return Ok(false);
    }
    let upper_cells = tree.cells(upper)?;
    let lower_cells = tree.cells(lower)?;
    for (&a, &b) in upper_cells.iter().zip(&lower_cells) {
        if !can_join_cells(tree, a, b)? {
            return Ok(false);
        }
    }
    for (&a, &b) in upper_cells.iter().zip(&lower_cells) {
        join_divided_cells(tree, a, b)?;
    }
    tree.remove(lower)?;
    debug!("joined row {} into row {}", lower, upper);
    Ok(true)
}

/// Remove copies of the heading row and join the rows around each copy.
///
/// Returns `(headings removed, rows joined)`.
pub fn fix_table_with_repeated_headers(tree: &mut Tree, table: NodeId) -> Result<(usize, usize)> {
    let rows = tree.rows(table)?;
    let Some((&head, rest)) = rows.split_first() else {
        return Ok((0, 0));
    };
    let heading = tree.text(head);
    if heading.trim().is_empty() {
        return Ok((0, 0));
    }

    let mut removed = 0;
    let mut joined = 0;
    for &row in rest {
        if !tree.is_alive(row) || tree.text(row) != heading {
            continue;
        }
        let before = tree.previous_sibling(row);
        let after = tree.next_sibling(row);
        tree.remove(row)?;
        removed += 1;
        debug!("removed repeated heading row {} from table {}", row, table);

        if let (Some(upper), Some(lower)) = (before, after)
            && upper != head
            && try_join_rows(tree, upper, lower)?
        {
            joined += 1;
        }
    }
    Ok((removed, joined))
}

/// Join every adjacent row pair of `table` that looks continued.
///
/// After a join the merged row is compared with its new neighbour. Returns
/// the number of rows joined.
pub fn fix_table_with_divided_rows(tree: &mut Tree, table: NodeId) -> Result<usize> {
    tree.expect_type(table, NodeType::Table)?;
    let mut joined = 0;
    loop {
        let mut pass = 0;
        let mut current = tree.first_child(table);
        while let Some(upper) = current {
            let Some(lower) = tree.next_sibling(upper) else {
                break;
            };
            if try_join_rows(tree, upper, lower)? {
                pass += 1;
            } else {
                current = Some(lower);
            }
        }
        if pass == 0 {
            return Ok(joined);
        }
        joined += pass;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Border, Borders, HyperlinkProperties, RunProperties};

    fn two_rows(upper: &[&str], lower: &[&str]) -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new();
        let body = tree.root();
        let table = tree
            .add_table(body, &[upper, lower], Borders::all(Border::single()))
            .unwrap();
        let rows = tree.rows(table).unwrap();
        (tree, table, rows[0], rows[1])
    }

    fn score(upper: &str, lower: &str) -> JoinScore {
        let (tree, _, a, b) = two_rows(&[upper], &[lower]);
        should_join_cells(&tree, tree.cell_at(a, 0).unwrap(), tree.cell_at(b, 0).unwrap()).unwrap()
    }

    #[test]
    fn test_scores() {
        assert_eq!(score("Apples, pears,", "and plums"), JoinScore::Definitely);
        assert_eq!(score("The end.", "Next part here."), JoinScore::Uncertain);
        assert_eq!(score("Alice", "Bob"), JoinScore::Uncertain);
        assert_eq!(score("See section", "about widgets."), JoinScore::Probably);
        assert_eq!(score("See section", "42 widgets, total."), JoinScore::ProbablyNot);
        assert_eq!(score("", "about widgets."), JoinScore::Uncertain);
        assert!(JoinScore::Probably.is_positive());
        assert_eq!(JoinScore::DefinitelyNot.value(), -2);
    }

    #[test]
    fn test_blank_lead_paragraph_scores_definitely() {
        let (mut tree, _, a, b) = two_rows(&["Some text"], &[""]);
        let lower = tree.cell_at(b, 0).unwrap();
        let upper = tree.cell_at(a, 0).unwrap();
        assert_eq!(should_join_cells(&tree, upper, lower).unwrap(), JoinScore::Uncertain);

        tree.add_paragraph(lower, "more text").unwrap();
        assert_eq!(should_join_cells(&tree, upper, lower).unwrap(), JoinScore::Definitely);
    }

    #[test]
    fn test_explicit_nil_vetoes() {
        let (mut tree, _, a, b) = two_rows(&["Apples,", "x"], &["pears", "y"]);
        let upper = tree.cell_at(a, 0).unwrap();
        let lower = tree.cell_at(b, 0).unwrap();
        tree.cell_props_mut(upper)
            .unwrap()
            .borders
            .set(BorderSide::Bottom, Some(Border::nil()));
        tree.cell_props_mut(lower)
            .unwrap()
            .borders
            .set(BorderSide::Top, Some(Border::nil()));
        assert_eq!(should_join_cells(&tree, upper, lower).unwrap(), JoinScore::DefinitelyNot);
        assert!(!should_join_rows(&tree, a, b).unwrap());
    }

    #[test]
    fn test_join_inserts_single_space() {
        let (mut tree, table, a, b) = two_rows(&["See section", "x"], &["about widgets.", "y"]);
        assert!(try_join_rows(&mut tree, a, b).unwrap());
        assert!(!tree.is_alive(b));
        assert_eq!(tree.rows(table).unwrap(), vec![a]);
        assert_eq!(tree.text(tree.cell_at(a, 0).unwrap()), "See section about widgets.");
        assert_eq!(tree.text(tree.cell_at(a, 1).unwrap()), "x y");
    }

    #[test]
    fn test_uppercase_continuation_gets_extra_space() {
        assert_eq!(separator("word", "Next"), "  ");
        assert_eq!(separator("word ", "next"), "");
        assert_eq!(separator("", "next"), "");
        assert_eq!(separator("word", "next"), " ");
    }

    #[test]
    fn test_blank_lead_paragraph_is_dropped() {
        let (mut tree, _, a, b) = two_rows(&["Intro"], &[""]);
        let upper = tree.cell_at(a, 0).unwrap();
        let lower = tree.cell_at(b, 0).unwrap();
        tree.add_paragraph(lower, "Second paragraph").unwrap();
        join_divided_cells(&mut tree, upper, lower).unwrap();
        assert_eq!(tree.children(upper).len(), 2);
        assert_eq!(tree.text(upper), "Intro\nSecond paragraph");
    }

    #[test]
    fn test_matching_links_merge() {
        let (mut tree, _, a, b) = two_rows(&[""], &[""]);
        let link = HyperlinkProperties {
            rel_id: Some("rId7".to_string()),
            anchor: None,
        };
        let linked = |tree: &mut Tree, row: NodeId, text: &str| {
            let cell = tree.cell_at(row, 0).unwrap();
            let para = tree.first_child(cell).unwrap();
            let hyperlink = tree.create(NodeKind::Hyperlink(link.clone()));
            let run = tree.new_run(RunProperties::default(), text).unwrap();
            tree.append_child(hyperlink, run).unwrap();
            tree.append_child(para, hyperlink).unwrap();
            (cell, para)
        };
        let (upper, upper_para) = linked(&mut tree, a, "the user");
        let (lower, _) = linked(&mut tree, b, "guide");

        join_divided_cells(&mut tree, upper, lower).unwrap();
        let links = tree.descendants_of_type(upper_para, NodeType::Hyperlink);
        assert_eq!(links.len(), 1);
        assert_eq!(tree.text(links[0]), "the user guide");
    }

    #[test]
    fn test_row_join_is_atomic() {
        let (mut tree, _, a, b) = two_rows(&["Apples,", "left"], &["pears", ""]);
        let blocked = tree.cell_at(b, 1).unwrap();
        let para = tree.first_child(blocked).unwrap();
        tree.remove(para).unwrap();
        tree.add_table(blocked, &[&["nested"]], Borders::all(Border::single()))
            .unwrap();
        tree.add_paragraph(blocked, "").unwrap();

        let before_upper = tree.text(a);
        let before_lower = tree.text(b);
        assert!(should_join_rows(&tree, a, b).unwrap());
        assert!(!try_join_rows(&mut tree, a, b).unwrap());
        assert_eq!(tree.text(a), before_upper);
        assert_eq!(tree.text(b), before_lower);
        assert!(tree.is_alive(b));
    }

    #[test]
    fn test_repeated_heading_removed() {
        let mut tree = Tree::new();
        let body = tree.root();
        let rows: [&[&str]; 10] = [
            &["Name", "Role"],
            &["Ada", "Engineer"],
            &["Grace", "Admiral"],
            &["Linus", "Maintainer"],
            &["Ken", "Designer of"],
            &["Name", "Role"],
            &["Dennis", "Author"],
            &["Bjarne", "Author"],
            &["Guido", "Author"],
            &["Rob", "Author"],
        ];
        let table = tree.add_table(body, &rows, Borders::all(Border::single())).unwrap();
        let before = tree.rows(table).unwrap();

        let (removed, joined) = fix_table_with_repeated_headers(&mut tree, table).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(joined, 0);
        assert!(!tree.is_alive(before[5]));
        let after = tree.rows(table).unwrap();
        assert_eq!(after.len(), 9);
        assert_eq!(tree.next_sibling(before[4]), Some(before[6]));
    }

    #[test]
    fn test_divided_rows_idempotent() {
        let mut tree = Tree::new();
        let body = tree.root();
        let table = tree
            .add_table(
                body,
                &[&["Apples,"], &["pears,"], &["and plums"], &["2 kg."], &["Next"]],
                Borders::all(Border::single()),
            )
            .unwrap();
        let joined = fix_table_with_divided_rows(&mut tree, table).unwrap();
        assert_eq!(joined, 2);
        let rows = tree.rows(table).unwrap();
        assert_eq!(tree.text(rows[0]), "Apples, pears, and plums");
        assert_eq!(fix_table_with_divided_rows(&mut tree, table).unwrap(), 0);
    }
}
