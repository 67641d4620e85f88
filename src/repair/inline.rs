//! Moving inline content between paragraphs and cells.
//!
//! Relocation always moves the original nodes so formatting travels with the
//! text. Items that were lifted out of a run are re-wrapped in a shallow copy
//! of that run.
use crate::common::{Error, Result};
use crate::tree::{NodeId, NodeKind, NodeType, ParagraphProperties, RunProperties, Tree};

/// Inline members of `paragraph`, with every run that holds a tab marker
/// expanded into its items.
///
/// Tabs become positions of their own, comparable to the text around them.
pub fn flatten_inline(tree: &Tree, paragraph: NodeId) -> Vec<NodeId> {
    let mut items = Vec::with_capacity(tree.children(paragraph).len());
    for &member in tree.children(paragraph) {
        let expand = tree.is(member, NodeType::Run)
            && tree.children(member).iter().any(|c| tree.is(*c, NodeType::Tab));
        if expand {
            items.extend_from_slice(tree.children(member));
        } else {
            items.push(member);
        }
    }
    items
}

/// Paragraph an inline item currently belongs to.
fn owning_paragraph(tree: &Tree, item: NodeId) -> Result<NodeId> {
    tree.ancestor_of_type(item, NodeType::Paragraph)
        .ok_or_else(|| Error::MalformedInput(format!("inline item {} has no paragraph", item)))
}

/// Move `items` into `cell`, opening one output paragraph per source paragraph.
///
/// Consecutive items lifted from the same run share one copy of that run.
/// Returns the paragraphs created inside `cell`.
pub fn relocate_into_cell(tree: &mut Tree, items: &[NodeId], cell: NodeId) -> Result<Vec<NodeId>> {
    let mut created = Vec::new();
    let mut owner: Option<NodeId> = None;
    let mut target: Option<NodeId> = None;
    let mut wrapper: Option<(NodeId, NodeId)> = None;

    for &item in items {
        let source_para = owning_paragraph(tree, item)?;
        let para = match (owner, target) {
            (Some(o), Some(t)) if o == source_para => t,
            _ => {
                let props = paragraph_props(tree, source_para)?;
                let para = tree.new_paragraph(props);
                tree.append_child(cell, para)?;
                created.push(para);
                owner = Some(source_para);
                target = Some(para);
                wrapper = None;
                para
            },
        };
        move_inline(tree, item, para, &mut wrapper)?;
    }
    Ok(created)
}

/// Move one inline item to the end of `para`.
///
/// `wrapper` remembers the last (source run, copied run) pair so items from
/// the same run end up in the same copy.
fn move_inline(
    tree: &mut Tree,
    item: NodeId,
    para: NodeId,
    wrapper: &mut Option<(NodeId, NodeId)>,
) -> Result<()> {
    let parent = tree
        .parent(item)
        .ok_or_else(|| Error::MalformedInput(format!("inline item {} is detached", item)))?;
    if tree.is(parent, NodeType::Run) {
        let copy = match *wrapper {
            Some((source, copy)) if source == parent && tree.parent(copy) == Some(para) => copy,
            _ => {
                let copy = tree.clone_shallow(parent)?;
                tree.append_child(para, copy)?;
                *wrapper = Some((parent, copy));
                copy
            },
        };
        tree.append_child(copy, item)
    } else {
        *wrapper = None;
        tree.append_child(para, item)
    }
}

pub(crate) fn paragraph_props(tree: &Tree, paragraph: NodeId) -> Result<ParagraphProperties> {
    match tree.kind(paragraph)? {
        NodeKind::Paragraph(props) => Ok(props.clone()),
        other => Err(Error::UnexpectedKind {
            expected: NodeType::Paragraph,
            found: other.node_type(),
        }),
    }
}

/// Formatting of the last run in `paragraph`, if any.
pub(crate) fn last_run_props(tree: &Tree, paragraph: NodeId) -> Option<RunProperties> {
    tree.descendants_of_type(paragraph, NodeType::Run)
        .last()
        .and_then(|run| match tree.kind(*run) {
            Ok(NodeKind::Run(props)) => Some(props.clone()),
            _ => None,
        })
}

/// Append a tab marker to `paragraph`, wrapped in a run.
pub fn append_tab(tree: &mut Tree, paragraph: NodeId) -> Result<()> {
    let props = last_run_props(tree, paragraph).unwrap_or_default();
    let run = tree.create(NodeKind::Run(props));
    let tab = tree.create(NodeKind::Tab);
    tree.append_child(run, tab)?;
    tree.append_child(paragraph, run)
}

/// Append plain `text` at the end of `member`.
///
/// Extends the trailing text span when there is one, otherwise adds a new
/// run formatted like the last run of the member.
pub fn append_text(tree: &mut Tree, member: NodeId, text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    let mut cursor = member;
    while let Some(last) = tree.last_child(cursor) {
        cursor = last;
    }
    if cursor != member
        && let NodeKind::Text(span) = tree.kind_mut(cursor)?
    {
        span.push_str(text);
        return Ok(());
    }

    let span = tree.create(NodeKind::Text(text.to_string()));
    match tree.node_type(member)? {
        NodeType::Run => tree.append_child(member, span),
        NodeType::Paragraph | NodeType::Hyperlink => {
            let props = last_run_props(tree, member).unwrap_or_default();
            let run = tree.create(NodeKind::Run(props));
            tree.append_child(run, span)?;
            tree.append_child(member, run)
        },
        other => Err(Error::MalformedInput(format!(
            "cannot append text to {:?} {}",
            other, member
        ))),
    }
}

/// Flatten a run of cells into tab-joined paragraphs.
///
/// Line `k` of the output holds paragraph `k` of every cell, left to right,
/// separated by one tab. A cell with fewer paragraphs contributes an empty
/// column to the remaining lines. The returned paragraphs are detached; the
/// source paragraphs are left empty in place.
///
/// Cells holding a nested table are a structural conflict and are refused.
pub fn tab_join_cells(tree: &mut Tree, cells: &[NodeId]) -> Result<Vec<NodeId>> {
    let mut columns: Vec<Vec<NodeId>> = Vec::with_capacity(cells.len());
    for &cell in cells {
        tree.expect_type(cell, NodeType::Cell)?;
        if tree.contains_type(cell, NodeType::Table) {
            return Err(Error::MalformedInput(format!(
                "cell {} holds a nested table and cannot be flattened",
                cell
            )));
        }
        columns.push(tree.children_of_type(cell, NodeType::Paragraph));
    }

    let lines = columns.iter().map(Vec::len).max().unwrap_or(0);
    let mut out = Vec::with_capacity(lines);
    for line in 0..lines {
        let props = columns
            .iter()
            .find_map(|paras| paras.get(line))
            .map(|p| paragraph_props(tree, *p))
            .transpose()?
            .unwrap_or_default();
        let para = tree.new_paragraph(props);
        for (col, paras) in columns.iter().enumerate() {
            if col > 0 {
                append_tab(tree, para)?;
            }
            if let Some(&source) = paras.get(line) {
                tree.move_children(source, para)?;
            }
        }
        out.push(para);
    }
    Ok(out)
}
