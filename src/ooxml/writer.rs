//! Serializing a [`Tree`] back to a WordprocessingML body.
use crate::common::{Error, Result};
use crate::tree::{
    Border, BorderSide, Borders, NodeId, NodeKind, NodeType, RunProperties, Tree, VMerge,
};
use quick_xml::escape::escape;
use std::fmt::Write as FmtWrite;

/// Serialize the body of `tree` as a `<w:body>` element.
///
/// The output uses the `w` and `r` prefixes without declaring them, so it is
/// meant to be spliced into an existing `document.xml`.
pub fn write_body(tree: &Tree) -> Result<String> {
    let mut xml = String::with_capacity(tree.len() * 32);
    xml.push_str("<w:body>");
    for &child in tree.children(tree.root()) {
        write_block(tree, child, &mut xml)?;
    }
    xml.push_str("</w:body>");
    Ok(xml)
}

fn write_block(tree: &Tree, node: NodeId, xml: &mut String) -> Result<()> {
    match tree.kind(node)? {
        NodeKind::Paragraph(_) => write_paragraph(tree, node, xml),
        NodeKind::Table(_) => write_table(tree, node, xml),
        other => Err(Error::MalformedInput(format!(
            "{:?} node {} cannot appear at block level",
            other.node_type(),
            node
        ))),
    }
}

fn write_paragraph(tree: &Tree, para: NodeId, xml: &mut String) -> Result<()> {
    let NodeKind::Paragraph(props) = tree.kind(para)? else {
        return Err(Error::UnexpectedKind {
            expected: NodeType::Paragraph,
            found: tree.node_type(para)?,
        });
    };

    if tree.children(para).is_empty() && props.style.is_none() && props.shading.is_none() {
        xml.push_str("<w:p/>");
        return Ok(());
    }

    xml.push_str("<w:p>");
    if props.style.is_some() || props.shading.is_some() {
        xml.push_str("<w:pPr>");
        if let Some(ref style) = props.style {
            write!(xml, "<w:pStyle w:val=\"{}\"/>", escape(style.as_str()))?;
        }
        if let Some(ref fill) = props.shading {
            write!(xml, "<w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"{}\"/>", escape(fill.as_str()))?;
        }
        xml.push_str("</w:pPr>");
    }

    // Bare inline leaves directly under the paragraph get a run of their own
    let mut loose = Vec::new();
    for &child in tree.children(para) {
        match tree.node_type(child)? {
            NodeType::Text | NodeType::Tab | NodeType::Break => loose.push(child),
            _ => {
                flush_loose(tree, &mut loose, xml)?;
                write_inline(tree, child, xml)?;
            },
        }
    }
    flush_loose(tree, &mut loose, xml)?;

    xml.push_str("</w:p>");
    Ok(())
}

fn flush_loose(tree: &Tree, loose: &mut Vec<NodeId>, xml: &mut String) -> Result<()> {
    if loose.is_empty() {
        return Ok(());
    }
    xml.push_str("<w:r>");
    for leaf in loose.drain(..) {
        write_leaf(tree, leaf, xml)?;
    }
    xml.push_str("</w:r>");
    Ok(())
}

fn write_inline(tree: &Tree, node: NodeId, xml: &mut String) -> Result<()> {
    match tree.kind(node)? {
        NodeKind::Run(props) => {
            xml.push_str("<w:r>");
            write_run_properties(props, xml)?;
            for &leaf in tree.children(node) {
                write_leaf(tree, leaf, xml)?;
            }
            xml.push_str("</w:r>");
        },
        NodeKind::Hyperlink(props) => {
            xml.push_str("<w:hyperlink");
            if let Some(ref id) = props.rel_id {
                write!(xml, " r:id=\"{}\"", escape(id.as_str()))?;
            }
            if let Some(ref anchor) = props.anchor {
                write!(xml, " w:anchor=\"{}\"", escape(anchor.as_str()))?;
            }
            xml.push('>');
            let mut loose = Vec::new();
            for &child in tree.children(node) {
                if tree.is(child, NodeType::Run) {
                    flush_loose(tree, &mut loose, xml)?;
                    write_inline(tree, child, xml)?;
                } else {
                    loose.push(child);
                }
            }
            flush_loose(tree, &mut loose, xml)?;
            xml.push_str("</w:hyperlink>");
        },
        other => {
            return Err(Error::MalformedInput(format!(
                "{:?} node {} cannot appear inside a paragraph",
                other.node_type(),
                node
            )));
        },
    }
    Ok(())
}

fn write_run_properties(props: &RunProperties, xml: &mut String) -> Result<()> {
    if props.is_empty() {
        return Ok(());
    }
    xml.push_str("<w:rPr>");
    if let Some(ref font) = props.font {
        let font = escape(font.as_str());
        write!(xml, "<w:rFonts w:ascii=\"{}\" w:hAnsi=\"{}\"/>", font, font)?;
    }
    match props.bold {
        Some(true) => xml.push_str("<w:b/>"),
        Some(false) => xml.push_str("<w:b w:val=\"0\"/>"),
        None => {},
    }
    match props.italic {
        Some(true) => xml.push_str("<w:i/>"),
        Some(false) => xml.push_str("<w:i w:val=\"0\"/>"),
        None => {},
    }
    if let Some(size) = props.size {
        write!(xml, "<w:sz w:val=\"{}\"/>", size)?;
    }
    xml.push_str("</w:rPr>");
    Ok(())
}

fn write_leaf(tree: &Tree, leaf: NodeId, xml: &mut String) -> Result<()> {
    match tree.kind(leaf)? {
        NodeKind::Text(text) => {
            write!(xml, "<w:t xml:space=\"preserve\">{}</w:t>", escape(text.as_str()))?;
        },
        NodeKind::Tab => xml.push_str("<w:tab/>"),
        NodeKind::Break => xml.push_str("<w:br/>"),
        other => {
            return Err(Error::MalformedInput(format!(
                "{:?} node {} cannot appear inside a run",
                other.node_type(),
                leaf
            )));
        },
    }
    Ok(())
}

fn write_border(xml: &mut String, side: BorderSide, border: &Border) -> Result<()> {
    write!(
        xml,
        "<w:{} w:val=\"{}\" w:sz=\"{}\" w:space=\"0\" w:color=\"{}\"/>",
        side.as_str(),
        border.style.as_str(),
        border.size,
        border.color.as_deref().unwrap_or("auto")
    )?;
    Ok(())
}

/// Write only the declared sides, in schema order.
fn write_borders(xml: &mut String, element: &str, borders: &Borders) -> Result<()> {
    if borders.is_empty() {
        return Ok(());
    }
    write!(xml, "<w:{}>", element)?;
    for side in BorderSide::ALL {
        if let Some(border) = borders.get(side) {
            write_border(xml, side, border)?;
        }
    }
    write!(xml, "</w:{}>", element)?;
    Ok(())
}

fn write_table(tree: &Tree, table: NodeId, xml: &mut String) -> Result<()> {
    let props = tree.table_props(table)?;
    xml.push_str("<w:tbl>");

    xml.push_str("<w:tblPr>");
    if let Some(ref style) = props.style {
        write!(xml, "<w:tblStyle w:val=\"{}\"/>", escape(style.as_str()))?;
    }
    match props.width {
        Some(width) => write!(xml, "<w:tblW w:w=\"{}\" w:type=\"dxa\"/>", width)?,
        None => xml.push_str("<w:tblW w:w=\"0\" w:type=\"auto\"/>"),
    }
    if let Some(indent) = props.indent {
        write!(xml, "<w:tblInd w:w=\"{}\" w:type=\"dxa\"/>", indent)?;
    }
    write_borders(xml, "tblBorders", &props.borders)?;
    xml.push_str("</w:tblPr>");

    xml.push_str("<w:tblGrid>");
    for column in &props.grid {
        match column.width {
            Some(width) => write!(xml, "<w:gridCol w:w=\"{}\"/>", width)?,
            None => xml.push_str("<w:gridCol/>"),
        }
    }
    xml.push_str("</w:tblGrid>");

    for row in tree.rows(table)? {
        write_row(tree, row, xml)?;
    }

    xml.push_str("</w:tbl>");
    Ok(())
}

fn write_row(tree: &Tree, row: NodeId, xml: &mut String) -> Result<()> {
    let props = tree.row_props(row)?;
    xml.push_str("<w:tr>");
    if props.header || props.cant_split {
        xml.push_str("<w:trPr>");
        if props.cant_split {
            xml.push_str("<w:cantSplit/>");
        }
        if props.header {
            xml.push_str("<w:tblHeader/>");
        }
        xml.push_str("</w:trPr>");
    }
    for cell in tree.cells(row)? {
        write_cell(tree, cell, xml)?;
    }
    xml.push_str("</w:tr>");
    Ok(())
}

fn write_cell(tree: &Tree, cell: NodeId, xml: &mut String) -> Result<()> {
    let props = tree.cell_props(cell)?;
    xml.push_str("<w:tc>");

    xml.push_str("<w:tcPr>");
    if let Some(width) = props.width {
        write!(xml, "<w:tcW w:w=\"{}\" w:type=\"dxa\"/>", width)?;
    }
    if props.span() > 1 {
        write!(xml, "<w:gridSpan w:val=\"{}\"/>", props.span())?;
    }
    match props.v_merge {
        Some(VMerge::Restart) => xml.push_str("<w:vMerge w:val=\"restart\"/>"),
        Some(VMerge::Continue) => xml.push_str("<w:vMerge/>"),
        None => {},
    }
    write_borders(xml, "tcBorders", &props.borders)?;
    if let Some(ref fill) = props.shading {
        write!(xml, "<w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"{}\"/>", escape(fill.as_str()))?;
    }
    xml.push_str("</w:tcPr>");

    let blocks = tree.children(cell);
    if blocks.is_empty() {
        // A cell must end with a paragraph
        xml.push_str("<w:p/>");
    }
    for &block in blocks {
        write_block(tree, block, xml)?;
    }

    xml.push_str("</w:tc>");
    Ok(())
}
