//! Generic document tree the repair stages operate on.
//!
//! The tree models just enough of a word-processing body for table repair:
//! paragraphs with runs, text, tab and break items, hyperlinks, and tables
//! with rows and cells. Node kinds form a closed enum, so every `match` over
//! [`NodeKind`] is checked for exhaustiveness by the compiler.
//!
//! # Architecture
//!
//! - `Tree`: the arena, navigation, mutation and text rendering
//! - `NodeId`: stable handle that survives any mutation
//! - `NodeKind` / `NodeType`: node kind with and without its properties
//! - `props`: shallow property records cloned by value
//!
//! # Example
//!
//! ```rust
//! use tablemend::tree::{Border, Borders, Tree};
//!
//! let mut tree = Tree::new();
//! let table = tree.add_table(tree.root(), &[&["a", "b"], &["c", "d"]], Borders::all(Border::single()))?;
//! for row in tree.rows(table)? {
//!     for cell in tree.cells(row)? {
//!         println!("Cell: {}", tree.text(cell));
//!     }
//! }
//! # Ok::<(), tablemend::Error>(())
//! ```
pub mod document;
pub mod node;
pub mod props;
pub mod table;

pub use document::Tree;
pub use node::{NodeId, NodeKind, NodeType};
pub use props::{
    Border, BorderSide, BorderStyle, Borders, CellProperties, GridColumn, HyperlinkProperties,
    ParagraphProperties, RowProperties, RunProperties, TableProperties, VMerge,
};
