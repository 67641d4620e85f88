//! Tablemend - table repair for converted word-processing documents
//!
//! Documents that went through a lossy conversion (legacy binary formats,
//! PDF or OCR pipelines, plain-text exports) rarely keep their tables
//! intact. This library finds the usual damage and rewrites the document
//! tree in place.
//!
//! # Features
//!
//! - **Tab tables**: consecutive tab-delimited paragraphs become a real table
//! - **Fake tables**: borderless layout tables are flattened back to paragraphs
//! - **Internal tables**: row groups with diverging cell counts become nested tables
//! - **Divided tables**: page-split rows are rejoined and repeated headings removed
//! - **Sibling tables**: adjacent tables with the same shape are merged
//! - **OOXML codec**: read and write the body of a `document.xml` part
//!
//! # Example - Repairing an in-memory tree
//!
//! ```rust
//! use tablemend::{RepairOptions, TableRepairer, Tree};
//!
//! # fn main() -> Result<(), tablemend::Error> {
//! let mut tree = Tree::new();
//! let body = tree.root();
//! tree.add_paragraph(body, "Item\tQty")?;
//! tree.add_paragraph(body, "Bolts\t12")?;
//! tree.add_paragraph(body, "Nuts\t40")?;
//!
//! let report = TableRepairer::new(RepairOptions::default()).repair(&mut tree)?;
//! println!("{}", report);
//! assert_eq!(report.tab_tables_built, 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Repairing a DOCX body
//!
//! ```no_run
//! use tablemend::RepairOptions;
//! use tablemend::ooxml::repair_xml;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let xml = std::fs::read_to_string("word/document.xml")?;
//! let options = RepairOptions::from_yaml_str("min_tab_rows: 3\n")?;
//! let (repaired, report) = repair_xml(&xml, &options)?;
//! std::fs::write("word/document.xml", repaired)?;
//! println!("{} changes", report.total_changes());
//! # Ok(())
//! # }
//! ```

/// Shared error type
pub mod common;

/// Arena document tree
///
/// Paragraphs, runs, tables, rows and cells addressed by stable [`NodeId`]
/// handles, with the navigation and mutation primitives the repair stages use.
pub mod tree;

/// Table repair stages and the top-level pass
pub mod repair;

/// WordprocessingML body reader and writer
#[cfg(feature = "ooxml")]
pub mod ooxml;

pub use common::{Error, Result};
pub use repair::{RepairOptions, RepairReport, TableRepairer};
pub use tree::{NodeId, NodeKind, NodeType, Tree};
