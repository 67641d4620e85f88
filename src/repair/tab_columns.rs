//! Splitting a paragraph into column ranges at tab markers.
use super::inline::flatten_inline;
use crate::common::Result;
use crate::tree::{NodeId, NodeType, Tree};
use smallvec::SmallVec;

/// A contiguous span of flattened inline items destined for one cell.
///
/// Positions are inclusive indices into [`TabColumns::items`]. An empty
/// range has neither end set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnRange {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl ColumnRange {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
    }

    fn extend(&mut self, index: usize) {
        if self.start.is_none() {
            self.start = Some(index);
        }
        self.end = Some(index);
    }

    /// Items covered by this range.
    pub fn nodes<'a>(&self, items: &'a [NodeId]) -> &'a [NodeId] {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start <= end && end < items.len() => &items[start..=end],
            _ => &[],
        }
    }
}

/// Column evidence found in one paragraph.
#[derive(Debug, Clone, Default)]
pub struct TabColumns {
    /// Flattened inline items of the paragraph
    pub items: Vec<NodeId>,
    /// Column ranges, left to right
    pub ranges: SmallVec<[ColumnRange; 8]>,
}

impl TabColumns {
    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Items of column `index`.
    pub fn column(&self, index: usize) -> &[NodeId] {
        self.ranges
            .get(index)
            .map(|r| r.nodes(&self.items))
            .unwrap_or(&[])
    }
}

/// Split `paragraph` into column ranges at its tab markers.
///
/// A range opens at the first non-blank item after a tab and closes at the
/// last item before the next one; blank items leading a column are skipped.
///
/// With `treat_tab_run_as_single_tab`, consecutive tabs (and blank text
/// between them) form a single boundary and ranges without content are
/// pruned. Without it every tab is a boundary and empty ranges, leading and
/// trailing ones included, are kept so the caller can judge symmetry.
///
/// A paragraph without any content yields no ranges at all: it carries no
/// column evidence, whatever tabs it holds.
pub fn evaluate_column_ranges(
    tree: &Tree,
    paragraph: NodeId,
    treat_tab_run_as_single_tab: bool,
) -> Result<TabColumns> {
    tree.expect_type(paragraph, NodeType::Paragraph)?;
    let items = flatten_inline(tree, paragraph);
    let mut ranges: SmallVec<[ColumnRange; 8]> = SmallVec::new();
    let mut current = ColumnRange::default();

    for (index, &item) in items.iter().enumerate() {
        if tree.is(item, NodeType::Tab) {
            if !treat_tab_run_as_single_tab || !current.is_empty() {
                ranges.push(current);
            }
            current = ColumnRange::default();
            continue;
        }
        if current.is_empty() && tree.is_blank(item) {
            continue;
        }
        current.extend(index);
    }
    if !treat_tab_run_as_single_tab || !current.is_empty() {
        ranges.push(current);
    }

    if ranges.iter().all(ColumnRange::is_empty) {
        ranges.clear();
    }
    Ok(TabColumns { items, ranges })
}
