//! WordprocessingML body codec.
//!
//! Converts the `<w:body>` of a `document.xml` part to a
//! [`Tree`](crate::tree::Tree) and back.
//! Only the vocabulary that table repair reads or writes is modelled:
//! paragraphs, runs, text, tabs, breaks, hyperlinks and tables with their
//! borders, grid, spans and vertical merges. Anything else inside the body
//! is not preserved, apart from the final section properties, which
//! [`repair_xml`] carries over unchanged.
//!
//! # Example
//!
//! ```rust
//! use tablemend::ooxml::repair_xml;
//! use tablemend::repair::RepairOptions;
//!
//! let xml = concat!(
//!     "<w:document><w:body>",
//!     "<w:p><w:r><w:t>Name</w:t><w:tab/><w:t>Role</w:t></w:r></w:p>",
//!     "<w:p><w:r><w:t>Ada</w:t><w:tab/><w:t>Engineer</w:t></w:r></w:p>",
//!     "</w:body></w:document>",
//! );
//! let (repaired, report) = repair_xml(xml, &RepairOptions::default())?;
//! assert_eq!(report.tab_tables_built, 1);
//! assert!(repaired.starts_with("<w:document><w:body><w:tbl>"));
//! # Ok::<(), tablemend::Error>(())
//! ```
pub mod reader;
pub mod writer;

pub use reader::read_body;
pub use writer::write_body;

use crate::common::Result;
use crate::repair::{RepairOptions, RepairReport, TableRepairer};

const BODY_START: &str = "<w:body";
const BODY_END: &str = "</w:body>";

/// The last `<w:sectPr>` element of `body`, if any.
fn section_properties(body: &str) -> Option<&str> {
    let start = body.rfind("<w:sectPr")?;
    let rest = &body[start..];
    let end = match rest.find("</w:sectPr>") {
        Some(pos) => pos + "</w:sectPr>".len(),
        None => rest.find("/>")? + 2,
    };
    Some(&rest[..end])
}

/// Repair the tables of a `document.xml` part.
///
/// The body is replaced by its repaired serialization while everything
/// before and after it is kept byte for byte. Input without a `<w:body>`
/// element is returned as a bare body.
pub fn repair_xml(xml: &str, options: &RepairOptions) -> Result<(String, RepairReport)> {
    let mut tree = read_body(xml)?;
    let report = TableRepairer::new(options.clone()).repair(&mut tree)?;
    let mut body = write_body(&tree)?;

    let (Some(start), Some(end)) = (xml.find(BODY_START), xml.rfind(BODY_END)) else {
        return Ok((body, report));
    };
    if end < start {
        return Ok((body, report));
    }

    if let Some(sect) = section_properties(&xml[start..end]) {
        body.truncate(body.len() - BODY_END.len());
        body.push_str(sect);
        body.push_str(BODY_END);
    }

    let mut out = String::with_capacity(xml.len() + body.len());
    out.push_str(&xml[..start]);
    out.push_str(&body);
    out.push_str(&xml[end + BODY_END.len()..]);
    Ok((out, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_properties_survive() {
        let xml = concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?><w:document><w:body>"#,
            "<w:p><w:r><w:t>only text</w:t></w:r></w:p>",
            r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr>"#,
            "</w:body></w:document>",
        );
        let (out, report) = repair_xml(xml, &RepairOptions::default()).unwrap();
        assert_eq!(report.total_changes(), 0);
        assert!(out.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><w:document><w:body>"#));
        assert!(out.ends_with(r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr></w:body></w:document>"#));
        assert!(out.contains("only text"));
    }

    #[test]
    fn test_bare_fragment_without_body() {
        let (out, _) =
            repair_xml("<w:p><w:r><w:t>x</w:t></w:r></w:p>", &RepairOptions::default()).unwrap();
        assert_eq!(
            out,
            r#"<w:body><w:p><w:r><w:t xml:space="preserve">x</w:t></w:r></w:p></w:body>"#
        );
    }

    #[test]
    fn test_borderless_layout_table_is_flattened() {
        let xml = concat!(
            "<w:document><w:body><w:tbl><w:tblPr/><w:tblGrid><w:gridCol/><w:gridCol/></w:tblGrid>",
            "<w:tr><w:tc><w:p><w:r><w:t>left</w:t></w:r></w:p></w:tc>",
            "<w:tc><w:p><w:r><w:t>right</w:t></w:r></w:p></w:tc></w:tr>",
            "</w:tbl></w:body></w:document>",
        );
        let (out, report) = repair_xml(xml, &RepairOptions::default()).unwrap();
        assert_eq!(report.fake_tables_flattened, 1);
        assert!(!out.contains("<w:tbl>"));
        let tree = read_body(&out).unwrap();
        assert_eq!(tree.text(tree.root()), "left\tright");
    }
}
