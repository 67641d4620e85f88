//! Reading a WordprocessingML body into a [`Tree`].
use crate::common::{Error, Result};
use crate::tree::{
    Border, BorderSide, BorderStyle, GridColumn, HyperlinkProperties, NodeId, NodeKind, NodeType,
    RunProperties, Tree, VMerge,
};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Elements whose whole subtree carries nothing the tree models.
const SKIPPED: &[&[u8]] = &[
    b"sectPr",
    b"drawing",
    b"pict",
    b"object",
    b"instrText",
    b"delText",
    b"del",
    b"moveFrom",
    b"Fallback",
];

/// Where border side elements currently land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BorderTarget {
    Table(NodeId),
    Cell(NodeId),
}

struct BodyReader {
    tree: Tree,
    /// Open containers, the body at the bottom
    stack: Vec<NodeId>,
    skip_depth: usize,
    in_ppr: bool,
    in_rpr: bool,
    in_tblpr: bool,
    in_trpr: bool,
    in_tcpr: bool,
    in_grid: bool,
    in_text: bool,
    borders: Option<BorderTarget>,
}

fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

fn attr_u32(e: &BytesStart<'_>, name: &[u8]) -> Option<u32> {
    attr_value(e, name).and_then(|v| v.trim().parse().ok())
}

/// `w:val` of an on/off property; a missing value means on.
fn attr_on_off(e: &BytesStart<'_>) -> bool {
    !matches!(attr_value(e, b"val").as_deref(), Some("0" | "false" | "off"))
}

/// Width in DXA, ignoring percentage and auto widths.
fn attr_dxa(e: &BytesStart<'_>) -> Option<u32> {
    match attr_value(e, b"type").as_deref() {
        None | Some("dxa") => attr_u32(e, b"w"),
        _ => None,
    }
}

fn parse_border(e: &BytesStart<'_>) -> Border {
    let color = attr_value(e, b"color").filter(|c| c != "auto");
    Border {
        style: attr_value(e, b"val")
            .map(|v| BorderStyle::from_val(&v))
            .unwrap_or_default(),
        size: attr_u32(e, b"sz").unwrap_or(0),
        color,
    }
}

/// Resolve the name of a general entity reference (`amp`, `#x41`, `#65`).
fn resolve_reference(name: &str) -> Result<String> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => number.parse(),
        }
        .map_err(|_| Error::Xml(format!("invalid character reference &{};", name)))?;
        return char::from_u32(code)
            .map(String::from)
            .ok_or_else(|| Error::Xml(format!("invalid character reference &{};", name)));
    }
    quick_xml::escape::resolve_predefined_entity(name)
        .map(str::to_string)
        .ok_or_else(|| Error::Xml(format!("unknown entity &{};", name)))
}

impl BodyReader {
    fn new() -> Self {
        let tree = Tree::new();
        let root = tree.root();
        Self {
            tree,
            stack: vec![root],
            skip_depth: 0,
            in_ppr: false,
            in_rpr: false,
            in_tblpr: false,
            in_trpr: false,
            in_tcpr: false,
            in_grid: false,
            in_text: false,
            borders: None,
        }
    }

    fn top(&self) -> NodeId {
        self.stack.last().copied().unwrap_or_else(|| self.tree.root())
    }

    /// Nearest open node of type `ty`.
    fn open_of_type(&self, ty: NodeType) -> Option<NodeId> {
        self.stack.iter().rev().copied().find(|n| self.tree.is(*n, ty))
    }

    fn open_node(&mut self, kind: NodeKind, empty: bool) -> Result<NodeId> {
        let node = self.tree.create(kind);
        let parent = self.top();
        self.tree.append_child(parent, node)?;
        if !empty {
            self.stack.push(node);
        }
        Ok(node)
    }

    fn close_node(&mut self, ty: NodeType) {
        if self.stack.len() > 1 && self.tree.is(self.top(), ty) {
            self.stack.pop();
        }
    }

    /// Add a leaf inline item to the innermost run or paragraph.
    fn push_inline(&mut self, kind: NodeKind) -> Result<()> {
        let top = self.top();
        if self.tree.is(top, NodeType::Run) || self.tree.is(top, NodeType::Paragraph) {
            let item = self.tree.create(kind);
            self.tree.append_child(top, item)?;
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let top = self.top();
        if !self.tree.is(top, NodeType::Run) {
            return Ok(());
        }
        if let Some(last) = self.tree.last_child(top)
            && let NodeKind::Text(span) = self.tree.kind_mut(last)?
        {
            span.push_str(text);
            return Ok(());
        }
        self.push_inline(NodeKind::Text(text.to_string()))
    }

    fn run_props_mut(&mut self) -> Result<Option<&mut RunProperties>> {
        let top = self.top();
        match self.tree.kind_mut(top)? {
            NodeKind::Run(props) => Ok(Some(props)),
            _ => Ok(None),
        }
    }

    fn set_border(&mut self, side: BorderSide, border: Border) -> Result<()> {
        match self.borders {
            Some(BorderTarget::Table(table)) => {
                self.tree.table_props_mut(table)?.borders.set(side, Some(border))
            },
            Some(BorderTarget::Cell(cell)) => {
                self.tree.cell_props_mut(cell)?.borders.set(side, Some(border))
            },
            None => {},
        }
        Ok(())
    }

    fn start(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<()> {
        let name = e.local_name();
        let name = name.as_ref();

        if self.skip_depth > 0 {
            if !empty {
                self.skip_depth += 1;
            }
            return Ok(());
        }
        if SKIPPED.contains(&name) {
            if !empty {
                self.skip_depth = 1;
            }
            return Ok(());
        }

        if let Some(side) = BorderSide::from_local_name(name)
            && self.borders.is_some()
        {
            return self.set_border(side, parse_border(e));
        }

        match name {
            b"p" => {
                self.open_node(NodeKind::Paragraph(Default::default()), empty)?;
            },
            b"pPr" => self.in_ppr = !empty,
            b"pStyle" if self.in_ppr => {
                if let Some(para) = self.open_of_type(NodeType::Paragraph)
                    && let NodeKind::Paragraph(props) = self.tree.kind_mut(para)?
                {
                    props.style = attr_value(e, b"val");
                }
            },
            b"shd" => {
                let fill = attr_value(e, b"fill").filter(|f| f != "auto");
                if self.in_tcpr {
                    if let Some(cell) = self.open_of_type(NodeType::Cell) {
                        self.tree.cell_props_mut(cell)?.shading = fill;
                    }
                } else if self.in_ppr
                    && let Some(para) = self.open_of_type(NodeType::Paragraph)
                    && let NodeKind::Paragraph(props) = self.tree.kind_mut(para)?
                {
                    props.shading = fill;
                }
            },
            b"r" if !self.in_ppr => {
                self.open_node(NodeKind::Run(Default::default()), empty)?;
            },
            b"rPr" if !self.in_ppr => self.in_rpr = !empty,
            b"b" if self.in_rpr => {
                let on = attr_on_off(e);
                if let Some(props) = self.run_props_mut()? {
                    props.bold = Some(on);
                }
            },
            b"i" if self.in_rpr => {
                let on = attr_on_off(e);
                if let Some(props) = self.run_props_mut()? {
                    props.italic = Some(on);
                }
            },
            b"rFonts" if self.in_rpr => {
                let font = attr_value(e, b"ascii");
                if let Some(props) = self.run_props_mut()? {
                    props.font = font;
                }
            },
            b"sz" if self.in_rpr => {
                let size = attr_u32(e, b"val");
                if let Some(props) = self.run_props_mut()? {
                    props.size = size;
                }
            },
            b"t" => self.in_text = !empty,
            b"tab" if !self.in_ppr => self.push_inline(NodeKind::Tab)?,
            b"br" | b"cr" if !self.in_ppr => self.push_inline(NodeKind::Break)?,
            b"hyperlink" => {
                let props = HyperlinkProperties {
                    rel_id: attr_value(e, b"id"),
                    anchor: attr_value(e, b"anchor"),
                };
                self.open_node(NodeKind::Hyperlink(props), empty)?;
            },
            b"tbl" => {
                self.open_node(NodeKind::Table(Default::default()), empty)?;
            },
            b"tblPr" => self.in_tblpr = !empty,
            b"tblStyle" if self.in_tblpr => {
                if let Some(table) = self.open_of_type(NodeType::Table) {
                    self.tree.table_props_mut(table)?.style = attr_value(e, b"val");
                }
            },
            b"tblW" if self.in_tblpr => {
                if let Some(table) = self.open_of_type(NodeType::Table) {
                    self.tree.table_props_mut(table)?.width = attr_dxa(e);
                }
            },
            b"tblInd" if self.in_tblpr => {
                if let Some(table) = self.open_of_type(NodeType::Table) {
                    self.tree.table_props_mut(table)?.indent = attr_dxa(e);
                }
            },
            b"tblBorders" if self.in_tblpr && !empty => {
                self.borders = self.open_of_type(NodeType::Table).map(BorderTarget::Table);
            },
            b"tblGrid" => self.in_grid = !empty,
            b"gridCol" if self.in_grid => {
                if let Some(table) = self.open_of_type(NodeType::Table) {
                    let width = attr_u32(e, b"w");
                    self.tree.table_props_mut(table)?.grid.push(GridColumn { width });
                }
            },
            b"tr" => {
                self.open_node(NodeKind::Row(Default::default()), empty)?;
            },
            b"trPr" => self.in_trpr = !empty,
            b"tblHeader" | b"cantSplit" if self.in_trpr => {
                let on = attr_on_off(e);
                if let Some(row) = self.open_of_type(NodeType::Row)
                    && let NodeKind::Row(props) = self.tree.kind_mut(row)?
                {
                    if name == b"tblHeader" {
                        props.header = on;
                    } else {
                        props.cant_split = on;
                    }
                }
            },
            b"tc" => {
                self.open_node(NodeKind::Cell(Default::default()), empty)?;
            },
            b"tcPr" => self.in_tcpr = !empty,
            b"tcW" if self.in_tcpr => {
                if let Some(cell) = self.open_of_type(NodeType::Cell) {
                    self.tree.cell_props_mut(cell)?.width = attr_dxa(e);
                }
            },
            b"gridSpan" if self.in_tcpr => {
                if let Some(cell) = self.open_of_type(NodeType::Cell) {
                    let span = attr_u32(e, b"val").unwrap_or(1).max(1);
                    self.tree.cell_props_mut(cell)?.grid_span = span;
                }
            },
            b"vMerge" if self.in_tcpr => {
                if let Some(cell) = self.open_of_type(NodeType::Cell) {
                    let state = match attr_value(e, b"val").as_deref() {
                        Some("restart") => VMerge::Restart,
                        _ => VMerge::Continue,
                    };
                    self.tree.cell_props_mut(cell)?.v_merge = Some(state);
                }
            },
            b"tcBorders" if self.in_tcpr && !empty => {
                self.borders = self.open_of_type(NodeType::Cell).map(BorderTarget::Cell);
            },
            _ => {},
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return;
        }
        match name {
            b"p" => self.close_node(NodeType::Paragraph),
            b"pPr" => self.in_ppr = false,
            b"r" => self.close_node(NodeType::Run),
            b"rPr" => self.in_rpr = false,
            b"t" => self.in_text = false,
            b"hyperlink" => self.close_node(NodeType::Hyperlink),
            b"tbl" => self.close_node(NodeType::Table),
            b"tblPr" => self.in_tblpr = false,
            b"tblBorders" | b"tcBorders" => self.borders = None,
            b"tblGrid" => self.in_grid = false,
            b"tr" => self.close_node(NodeType::Row),
            b"trPr" => self.in_trpr = false,
            b"tc" => self.close_node(NodeType::Cell),
            b"tcPr" => self.in_tcpr = false,
            _ => {},
        }
    }
}

/// Parse a `document.xml` part or a bare `<w:body>` fragment.
///
/// Only the body vocabulary the repair stages use is kept; other elements
/// are passed through transparently or, for drawings, deleted text and
/// section properties, dropped with their content.
///
/// # Examples
///
/// ```rust
/// use tablemend::ooxml::read_body;
///
/// let xml = r#"<w:body><w:p><w:r><w:t>A</w:t><w:tab/><w:t>B</w:t></w:r></w:p></w:body>"#;
/// let tree = read_body(xml)?;
/// assert_eq!(tree.text(tree.root()), "A\tB");
/// # Ok::<(), tablemend::Error>(())
/// ```
pub fn read_body(xml: &str) -> Result<Tree> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut body = BodyReader::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => body.start(&e, false)?,
            Event::Empty(e) => body.start(&e, true)?,
            Event::End(e) => body.end(e.local_name().as_ref()),
            Event::Text(e) if body.in_text && body.skip_depth == 0 => {
                let raw = std::str::from_utf8(&e)?;
                let text = quick_xml::escape::unescape(raw)?;
                body.push_text(&text)?;
            },
            Event::CData(e) if body.in_text && body.skip_depth == 0 => {
                let text = std::str::from_utf8(&e)?;
                body.push_text(text)?;
            },
            Event::GeneralRef(e) if body.in_text && body.skip_depth == 0 => {
                let name = std::str::from_utf8(&e)?;
                let text = resolve_reference(name)?;
                body.push_text(&text)?;
            },
            Event::Eof => break,
            _ => {},
        }
    }

    if body.stack.len() > 1 {
        return Err(Error::Xml(format!(
            "{} elements left open at end of input",
            body.stack.len() - 1
        )));
    }
    Ok(body.tree)
}
