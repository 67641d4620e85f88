//! Arena-backed document tree.
use super::node::{NodeId, NodeKind, NodeType};
use super::props::{ParagraphProperties, RunProperties};
use crate::common::{Error, Result};

#[derive(Debug, Clone)]
struct Slot {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    alive: bool,
}

/// A document tree of paragraphs, tables and inline content.
///
/// Nodes live in an arena and are addressed by [`NodeId`]. Handles collected
/// before a mutation keep pointing at the same nodes afterwards, which is what
/// lets the repair stages snapshot a list of tables or rows and then mutate
/// the tree freely while walking it.
///
/// # Example
///
/// ```rust
/// use tablemend::tree::Tree;
///
/// let mut tree = Tree::new();
/// let body = tree.root();
/// let para = tree.add_paragraph(body, "Name\tRole")?;
/// assert_eq!(tree.text(para), "Name\tRole");
/// # Ok::<(), tablemend::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Slot>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree holding an empty body.
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                kind: NodeKind::Body,
                parent: None,
                children: Vec::new(),
                alive: true,
            }],
            root: NodeId::from_index(0),
        }
    }

    /// The body node.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, the body included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.alive).count()
    }

    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    /// Upper bound of node indices handed out so far.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Create a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::from_index(self.slots.len());
        self.slots.push(Slot {
            kind,
            parent: None,
            children: Vec::new(),
            alive: true,
        });
        id
    }

    fn slot(&self, id: NodeId) -> Result<&Slot> {
        match self.slots.get(id.index()) {
            Some(slot) if slot.alive => Ok(slot),
            _ => Err(Error::NodeNotFound(id)),
        }
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot> {
        match self.slots.get_mut(id.index()) {
            Some(slot) if slot.alive => Ok(slot),
            _ => Err(Error::NodeNotFound(id)),
        }
    }

    #[inline]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.slots.get(id.index()).is_some_and(|s| s.alive)
    }

    pub fn kind(&self, id: NodeId) -> Result<&NodeKind> {
        Ok(&self.slot(id)?.kind)
    }

    pub fn kind_mut(&mut self, id: NodeId) -> Result<&mut NodeKind> {
        Ok(&mut self.slot_mut(id)?.kind)
    }

    pub fn node_type(&self, id: NodeId) -> Result<NodeType> {
        Ok(self.slot(id)?.kind.node_type())
    }

    /// `true` if `id` is live and of type `ty`.
    #[inline]
    pub fn is(&self, id: NodeId, ty: NodeType) -> bool {
        self.slot(id).is_ok_and(|s| s.kind.node_type() == ty)
    }

    /// Fail with [`Error::UnexpectedKind`] unless `id` is of type `ty`.
    pub fn expect_type(&self, id: NodeId, ty: NodeType) -> Result<()> {
        let found = self.node_type(id)?;
        if found == ty {
            Ok(())
        } else {
            Err(Error::UnexpectedKind { expected: ty, found })
        }
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).ok().and_then(|s| s.parent)
    }

    /// Children of `id`, empty for leaves and removed nodes.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|s| s.children.as_slice()).unwrap_or(&[])
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Children of `id` with type `ty`.
    pub fn children_of_type(&self, id: NodeId, ty: NodeType) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.is(*c, ty))
            .collect()
    }

    /// Position of `id` among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// All nodes below `id` in document order, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Descendants of `id` with type `ty`, in document order.
    pub fn descendants_of_type(&self, id: NodeId, ty: NodeType) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|d| self.is(*d, ty))
            .collect()
    }

    /// Whether any descendant of `id` has type `ty`.
    pub fn contains_type(&self, id: NodeId, ty: NodeType) -> bool {
        self.children(id)
            .iter()
            .any(|c| self.is(*c, ty) || self.contains_type(*c, ty))
    }

    /// Closest ancestor of `id` with type `ty`.
    pub fn ancestor_of_type(&self, id: NodeId, ty: NodeType) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if self.is(node, ty) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Nesting depth of `id` below the root.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(node) = current {
            depth += 1;
            current = self.parent(node);
        }
        depth
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    fn check_link(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let child_type = self.node_type(child)?;
        let parent_kind = self.kind(parent)?;
        if !parent_kind.accepts(child_type) {
            return Err(Error::MalformedInput(format!(
                "{:?} {} cannot hold {:?} {}",
                parent_kind.node_type(),
                parent,
                child_type,
                child
            )));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(Error::MalformedInput(format!(
                "{} cannot be moved below its own descendant {}",
                child, parent
            )));
        }
        Ok(())
    }

    /// Unlink `id` from its parent. The node and its subtree stay alive.
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        if let Some(parent) = self.slot(id)?.parent {
            self.slot_mut(parent)?.children.retain(|c| *c != id);
            self.slot_mut(id)?.parent = None;
        }
        Ok(())
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_link(parent, child)?;
        self.detach(child)?;
        self.slot_mut(parent)?.children.push(child);
        self.slot_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Move `node` to the position right before `anchor`.
    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) -> Result<()> {
        self.insert_relative(anchor, node, 0)
    }

    /// Move `node` to the position right after `anchor`.
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) -> Result<()> {
        self.insert_relative(anchor, node, 1)
    }

    fn insert_relative(&mut self, anchor: NodeId, node: NodeId, offset: usize) -> Result<()> {
        if anchor == node {
            return Ok(());
        }
        let parent = self
            .parent(anchor)
            .ok_or_else(|| Error::MalformedInput(format!("{} has no parent", anchor)))?;
        self.check_link(parent, node)?;
        self.detach(node)?;
        let index = self
            .index_in_parent(anchor)
            .ok_or_else(|| Error::MalformedInput(format!("{} is not linked", anchor)))?;
        self.slot_mut(parent)?.children.insert(index + offset, node);
        self.slot_mut(node)?.parent = Some(parent);
        Ok(())
    }

    /// Unlink `id` and drop it together with its subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(Error::MalformedInput("the body cannot be removed".to_string()));
        }
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if let Some(slot) = self.slots.get_mut(node.index()) {
                slot.alive = false;
                slot.parent = None;
                stack.append(&mut slot.children);
            }
        }
        Ok(())
    }

    /// Move every child of `from` to the end of `to`.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        let children = self.children(from).to_vec();
        for child in children {
            self.append_child(to, child)?;
        }
        Ok(())
    }

    /// Copy `id` without its children. The copy is detached.
    pub fn clone_shallow(&mut self, id: NodeId) -> Result<NodeId> {
        let kind = self.kind(id)?.clone();
        Ok(self.create(kind))
    }

    /// Copy `id` with its whole subtree. The copy is detached.
    pub fn clone_deep(&mut self, id: NodeId) -> Result<NodeId> {
        let copy = self.clone_shallow(id)?;
        let children = self.children(id).to_vec();
        for child in children {
            let child_copy = self.clone_deep(child)?;
            self.slot_mut(copy)?.children.push(child_copy);
            self.slot_mut(child_copy)?.parent = Some(copy);
        }
        Ok(copy)
    }

    // ------------------------------------------------------------------
    // Builders
    // ------------------------------------------------------------------

    /// Create a detached empty paragraph.
    pub fn new_paragraph(&mut self, props: ParagraphProperties) -> NodeId {
        self.create(NodeKind::Paragraph(props))
    }

    /// Create a detached run holding `text`, with `\t` split into tab markers
    /// and `\n` into breaks.
    pub fn new_run(&mut self, props: RunProperties, text: &str) -> Result<NodeId> {
        let run = self.create(NodeKind::Run(props));
        let mut buffer = String::new();
        for ch in text.chars() {
            let marker = match ch {
                '\t' => Some(NodeKind::Tab),
                '\n' => Some(NodeKind::Break),
                _ => None,
            };
            match marker {
                Some(kind) => {
                    if !buffer.is_empty() {
                        let span = self.create(NodeKind::Text(std::mem::take(&mut buffer)));
                        self.append_child(run, span)?;
                    }
                    let item = self.create(kind);
                    self.append_child(run, item)?;
                },
                None => buffer.push(ch),
            }
        }
        if !buffer.is_empty() {
            let span = self.create(NodeKind::Text(buffer));
            self.append_child(run, span)?;
        }
        Ok(run)
    }

    /// Append a paragraph holding a single run of `text` to `parent`.
    pub fn add_paragraph(&mut self, parent: NodeId, text: &str) -> Result<NodeId> {
        let para = self.new_paragraph(ParagraphProperties::default());
        if !text.is_empty() {
            let run = self.new_run(RunProperties::default(), text)?;
            self.append_child(para, run)?;
        }
        self.append_child(parent, para)?;
        Ok(para)
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    /// Plain text of a subtree.
    ///
    /// Tabs render as `\t` and breaks as `\n`. Cells separate their blocks
    /// with `\n`, rows separate cells with `\t` and tables separate rows
    /// with `\n`. Only meant for comparisons, never for re-parsing.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_text(id, &mut out);
        out
    }

    fn write_text(&self, id: NodeId, out: &mut String) {
        let Ok(kind) = self.kind(id) else {
            return;
        };
        let separator = match kind {
            NodeKind::Text(s) => {
                out.push_str(s);
                return;
            },
            NodeKind::Tab => {
                out.push('\t');
                return;
            },
            NodeKind::Break => {
                out.push('\n');
                return;
            },
            NodeKind::Paragraph(_) | NodeKind::Run(_) | NodeKind::Hyperlink(_) => None,
            NodeKind::Body | NodeKind::Cell(_) | NodeKind::Table(_) => Some('\n'),
            NodeKind::Row(_) => Some('\t'),
        };
        for (i, child) in self.children(id).iter().enumerate() {
            if i > 0
                && let Some(sep) = separator
            {
                out.push(sep);
            }
            self.write_text(*child, out);
        }
    }

    /// Whether the subtree renders to nothing but whitespace.
    pub fn is_blank(&self, id: NodeId) -> bool {
        self.text(id).trim().is_empty()
    }

    /// A paragraph with no visible text.
    pub fn is_empty_paragraph(&self, id: NodeId) -> bool {
        self.is(id, NodeType::Paragraph) && self.is_blank(id)
    }

    /// A cell with no visible text and no nested table.
    pub fn is_empty_cell(&self, id: NodeId) -> bool {
        self.is(id, NodeType::Cell)
            && !self.contains_type(id, NodeType::Table)
            && self.is_blank(id)
    }

    /// Number of characters rendered below `id`.
    pub fn char_count(&self, id: NodeId) -> usize {
        self.text(id).chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TableProperties;

    #[test]
    fn test_add_paragraph_splits_tabs() {
        let mut tree = Tree::new();
        let para = tree.add_paragraph(tree.root(), "A\tB\tC").unwrap();
        let run = tree.first_child(para).unwrap();
        let types: Vec<NodeType> = tree
            .children(run)
            .iter()
            .map(|c| tree.node_type(*c).unwrap())
            .collect();
        assert_eq!(
            types,
            vec![
                NodeType::Text,
                NodeType::Tab,
                NodeType::Text,
                NodeType::Tab,
                NodeType::Text
            ]
        );
        assert_eq!(tree.text(para), "A\tB\tC");
    }

    #[test]
    fn test_siblings_and_insert() {
        let mut tree = Tree::new();
        let body = tree.root();
        let a = tree.add_paragraph(body, "a").unwrap();
        let c = tree.add_paragraph(body, "c").unwrap();
        let b = tree.new_paragraph(Default::default());
        tree.insert_before(c, b).unwrap();
        assert_eq!(tree.next_sibling(a), Some(b));
        assert_eq!(tree.previous_sibling(c), Some(b));
        assert_eq!(tree.previous_sibling(a), None);
        assert_eq!(tree.next_sibling(c), None);

        tree.insert_after(c, a).unwrap();
        assert_eq!(tree.children(body), &[b, c, a]);
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut tree = Tree::new();
        let para = tree.add_paragraph(tree.root(), "gone").unwrap();
        let run = tree.first_child(para).unwrap();
        tree.remove(para).unwrap();
        assert!(!tree.is_alive(para));
        assert!(!tree.is_alive(run));
        assert!(tree.is_empty());
        assert!(matches!(tree.kind(para), Err(Error::NodeNotFound(_))));
    }

    #[test]
    fn test_check_link_rejects_wrong_kind() {
        let mut tree = Tree::new();
        let run = tree.new_run(Default::default(), "x").unwrap();
        let err = tree.append_child(tree.root(), run).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut tree = Tree::new();
        let table = tree.create(NodeKind::Table(TableProperties::with_columns(1)));
        tree.append_child(tree.root(), table).unwrap();
        let row = tree.create(NodeKind::Row(Default::default()));
        tree.append_child(table, row).unwrap();
        let cell = tree.create(NodeKind::Cell(Default::default()));
        tree.append_child(row, cell).unwrap();
        assert!(tree.append_child(cell, table).is_err());
    }

    #[test]
    fn test_clone_deep_is_detached_copy() {
        let mut tree = Tree::new();
        let para = tree.add_paragraph(tree.root(), "copy me").unwrap();
        let copy = tree.clone_deep(para).unwrap();
        assert_eq!(tree.parent(copy), None);
        assert_eq!(tree.text(copy), "copy me");
        assert_ne!(tree.first_child(copy), tree.first_child(para));
    }

    #[test]
    fn test_blank_predicates() {
        let mut tree = Tree::new();
        let blank = tree.add_paragraph(tree.root(), " \t ").unwrap();
        let full = tree.add_paragraph(tree.root(), "x").unwrap();
        assert!(tree.is_empty_paragraph(blank));
        assert!(!tree.is_empty_paragraph(full));
        assert_eq!(tree.descendants_of_type(tree.root(), NodeType::Paragraph), vec![blank, full]);
    }
}
