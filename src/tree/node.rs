//! Node handles and the closed set of node kinds.
use super::props::{
    CellProperties, HyperlinkProperties, ParagraphProperties, RowProperties, RunProperties,
    TableProperties,
};
use std::fmt;

/// Stable handle to a node in a [`Tree`](super::Tree).
///
/// Handles are arena indices. They stay valid across any mutation of the
/// tree; a removed node keeps its index but no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Arena index of this node.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discriminant of [`NodeKind`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Body,
    Paragraph,
    Run,
    Text,
    Tab,
    Break,
    Hyperlink,
    Table,
    Row,
    Cell,
}

/// Node kind together with its property record.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Document body or any other block container root
    Body,
    /// Block: holds runs, hyperlinks and bare inline items
    Paragraph(ParagraphProperties),
    /// Inline: holds text, tab and break items
    Run(RunProperties),
    /// Leaf text span
    Text(String),
    /// Leaf tab marker
    Tab,
    /// Leaf line break
    Break,
    /// Inline: holds runs
    Hyperlink(HyperlinkProperties),
    /// Block: holds rows
    Table(TableProperties),
    /// Holds cells
    Row(RowProperties),
    /// Holds paragraphs and nested tables
    Cell(CellProperties),
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Body => NodeType::Body,
            NodeKind::Paragraph(_) => NodeType::Paragraph,
            NodeKind::Run(_) => NodeType::Run,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Tab => NodeType::Tab,
            NodeKind::Break => NodeType::Break,
            NodeKind::Hyperlink(_) => NodeType::Hyperlink,
            NodeKind::Table(_) => NodeType::Table,
            NodeKind::Row(_) => NodeType::Row,
            NodeKind::Cell(_) => NodeType::Cell,
        }
    }

    /// Kinds that may hold children.
    pub fn is_container(&self) -> bool {
        !matches!(self, NodeKind::Text(_) | NodeKind::Tab | NodeKind::Break)
    }

    /// Whether `child` may be placed directly under a node of this kind.
    pub fn accepts(&self, child: NodeType) -> bool {
        match self {
            NodeKind::Body | NodeKind::Cell(_) => {
                matches!(child, NodeType::Paragraph | NodeType::Table)
            },
            NodeKind::Paragraph(_) => matches!(
                child,
                NodeType::Run | NodeType::Hyperlink | NodeType::Text | NodeType::Tab | NodeType::Break
            ),
            NodeKind::Run(_) => matches!(child, NodeType::Text | NodeType::Tab | NodeType::Break),
            NodeKind::Hyperlink(_) => matches!(child, NodeType::Run),
            NodeKind::Table(_) => child == NodeType::Row,
            NodeKind::Row(_) => child == NodeType::Cell,
            NodeKind::Text(_) | NodeKind::Tab | NodeKind::Break => false,
        }
    }
}

impl NodeType {
    /// Paragraphs and tables.
    #[inline]
    pub fn is_block(self) -> bool {
        matches!(self, NodeType::Paragraph | NodeType::Table)
    }

    /// Members that can appear inside a paragraph.
    #[inline]
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            NodeType::Run | NodeType::Hyperlink | NodeType::Text | NodeType::Tab | NodeType::Break
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts() {
        assert!(NodeKind::Body.accepts(NodeType::Table));
        assert!(!NodeKind::Body.accepts(NodeType::Run));
        assert!(NodeKind::Paragraph(Default::default()).accepts(NodeType::Tab));
        assert!(!NodeKind::Hyperlink(Default::default()).accepts(NodeType::Text));
        assert!(!NodeKind::Tab.accepts(NodeType::Text));
    }

    #[test]
    fn test_display() {
        assert_eq!(NodeId::from_index(7).to_string(), "#7");
    }
}
