//! Table navigation and property access on [`Tree`].
use super::document::Tree;
use super::node::{NodeId, NodeKind, NodeType};
use super::props::{
    Border, BorderSide, Borders, CellProperties, GridColumn, RowProperties, TableProperties,
};
use crate::common::{Error, Result};
use std::ops::Range;

impl Tree {
    pub fn table_props(&self, table: NodeId) -> Result<&TableProperties> {
        match self.kind(table)? {
            NodeKind::Table(props) => Ok(props),
            other => Err(Error::UnexpectedKind {
                expected: NodeType::Table,
                found: other.node_type(),
            }),
        }
    }

    pub fn table_props_mut(&mut self, table: NodeId) -> Result<&mut TableProperties> {
        match self.kind_mut(table)? {
            NodeKind::Table(props) => Ok(props),
            other => Err(Error::UnexpectedKind {
                expected: NodeType::Table,
                found: other.node_type(),
            }),
        }
    }

    pub fn row_props(&self, row: NodeId) -> Result<&RowProperties> {
        match self.kind(row)? {
            NodeKind::Row(props) => Ok(props),
            other => Err(Error::UnexpectedKind {
                expected: NodeType::Row,
                found: other.node_type(),
            }),
        }
    }

    pub fn cell_props(&self, cell: NodeId) -> Result<&CellProperties> {
        match self.kind(cell)? {
            NodeKind::Cell(props) => Ok(props),
            other => Err(Error::UnexpectedKind {
                expected: NodeType::Cell,
                found: other.node_type(),
            }),
        }
    }

    pub fn cell_props_mut(&mut self, cell: NodeId) -> Result<&mut CellProperties> {
        match self.kind_mut(cell)? {
            NodeKind::Cell(props) => Ok(props),
            other => Err(Error::UnexpectedKind {
                expected: NodeType::Cell,
                found: other.node_type(),
            }),
        }
    }

    /// Rows of `table` in order.
    pub fn rows(&self, table: NodeId) -> Result<Vec<NodeId>> {
        self.expect_type(table, NodeType::Table)?;
        Ok(self.children_of_type(table, NodeType::Row))
    }

    /// Cells of `row` in order.
    pub fn cells(&self, row: NodeId) -> Result<Vec<NodeId>> {
        self.expect_type(row, NodeType::Row)?;
        Ok(self.children_of_type(row, NodeType::Cell))
    }

    /// Cell at `index` in `row`.
    ///
    /// An index past the end is a structural fault, not a heuristic miss.
    pub fn cell_at(&self, row: NodeId, index: usize) -> Result<NodeId> {
        let cells = self.cells(row)?;
        cells.get(index).copied().ok_or_else(|| {
            Error::MalformedInput(format!(
                "cell {} requested from row {} holding {} cells",
                index,
                row,
                cells.len()
            ))
        })
    }

    #[inline]
    pub fn cell_count(&self, row: NodeId) -> Result<usize> {
        Ok(self.cells(row)?.len())
    }

    /// Table owning `row`.
    pub fn table_of_row(&self, row: NodeId) -> Result<NodeId> {
        self.parent(row)
            .filter(|p| self.is(*p, NodeType::Table))
            .ok_or_else(|| Error::MalformedInput(format!("row {} is not inside a table", row)))
    }

    /// Row owning `cell`.
    pub fn row_of_cell(&self, cell: NodeId) -> Result<NodeId> {
        self.parent(cell)
            .filter(|p| self.is(*p, NodeType::Row))
            .ok_or_else(|| Error::MalformedInput(format!("cell {} is not inside a row", cell)))
    }

    /// Declared grid of `table`.
    pub fn grid(&self, table: NodeId) -> Result<&[GridColumn]> {
        Ok(&self.table_props(table)?.grid)
    }

    /// Replace the grid of `table`, keeping the declared width in step.
    pub fn set_grid(&mut self, table: NodeId, grid: Vec<GridColumn>) -> Result<()> {
        let props = self.table_props_mut(table)?;
        props.grid = grid;
        if props.width.is_some() {
            props.width = props.grid_width();
        }
        Ok(())
    }

    /// Number of grid columns of `table`.
    ///
    /// Falls back to the widest row when the grid was never declared.
    pub fn column_count(&self, table: NodeId) -> Result<usize> {
        let declared = self.grid(table)?.len();
        if declared > 0 {
            return Ok(declared);
        }
        let mut widest = 0;
        for row in self.rows(table)? {
            widest = widest.max(self.row_occupancy(row)?);
        }
        Ok(widest)
    }

    /// Grid columns occupied by `cell`.
    pub fn cell_span(&self, cell: NodeId) -> Result<usize> {
        Ok(self.cell_props(cell)?.span())
    }

    pub fn set_cell_span(&mut self, cell: NodeId, span: usize) -> Result<()> {
        self.cell_props_mut(cell)?.grid_span = span.max(1) as u32;
        Ok(())
    }

    /// Sum of the spans of the cells in `row`.
    pub fn row_occupancy(&self, row: NodeId) -> Result<usize> {
        let mut total = 0;
        for cell in self.cells(row)? {
            total += self.cell_span(cell)?;
        }
        Ok(total)
    }

    /// First grid column occupied by `cell`.
    pub fn cell_grid_start(&self, cell: NodeId) -> Result<usize> {
        let row = self.row_of_cell(cell)?;
        let mut start = 0;
        for sibling in self.cells(row)? {
            if sibling == cell {
                return Ok(start);
            }
            start += self.cell_span(sibling)?;
        }
        Err(Error::MalformedInput(format!("cell {} not found in row {}", cell, row)))
    }

    /// Grid columns occupied by `cell`.
    pub fn cell_grid_range(&self, cell: NodeId) -> Result<Range<usize>> {
        let start = self.cell_grid_start(cell)?;
        Ok(start..start + self.cell_span(cell)?)
    }

    /// Cell of `row` covering grid column `column`, if the row reaches that far.
    pub fn merged_cell(&self, row: NodeId, column: usize) -> Result<Option<NodeId>> {
        let mut start = 0;
        for cell in self.cells(row)? {
            let span = self.cell_span(cell)?;
            if (start..start + span).contains(&column) {
                return Ok(Some(cell));
            }
            start += span;
        }
        Ok(None)
    }

    /// The cell covering grid column `column` in every row of `table`.
    pub fn cells_in_column(&self, table: NodeId, column: usize) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        for row in self.rows(table)? {
            if let Some(cell) = self.merged_cell(row, column)? {
                out.push(cell);
            }
        }
        Ok(out)
    }

    /// Border drawn on `side` of `cell`.
    ///
    /// A side the cell does not declare falls back to the table: outer edges
    /// use the matching table border, interior edges use `insideH`/`insideV`.
    pub fn effective_border(&self, cell: NodeId, side: BorderSide) -> Result<Option<Border>> {
        if let Some(border) = self.cell_props(cell)?.borders.get(side) {
            return Ok(Some(border.clone()));
        }
        let row = self.row_of_cell(cell)?;
        let table = self.table_of_row(row)?;
        let table_side = match side {
            BorderSide::Top if self.previous_sibling(row).is_some() => BorderSide::InsideH,
            BorderSide::Bottom if self.next_sibling(row).is_some() => BorderSide::InsideH,
            BorderSide::Left if self.previous_sibling(cell).is_some() => BorderSide::InsideV,
            BorderSide::Right if self.next_sibling(cell).is_some() => BorderSide::InsideV,
            other => other,
        };
        Ok(self.table_props(table)?.borders.get(table_side).cloned())
    }

    /// Whether the edge between two horizontally adjacent cells draws a line.
    pub fn has_visible_edge_between(&self, left: NodeId, right: NodeId) -> Result<bool> {
        let left_side = self.effective_border(left, BorderSide::Right)?;
        let right_side = self.effective_border(right, BorderSide::Left)?;
        Ok(left_side.is_some_and(|b| b.is_visible()) || right_side.is_some_and(|b| b.is_visible()))
    }

    /// Whether `table` or any of its own cells declares a visible border.
    pub fn has_visible_border(&self, table: NodeId) -> Result<bool> {
        if self.table_props(table)?.borders.any_visible() {
            return Ok(true);
        }
        for row in self.rows(table)? {
            for cell in self.cells(row)? {
                if self.cell_props(cell)?.borders.any_visible() {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Create a detached table with `columns` grid columns and the given borders.
    pub fn new_table(&mut self, columns: usize, borders: Borders) -> NodeId {
        let mut props = TableProperties::with_columns(columns);
        props.borders = borders;
        self.create(NodeKind::Table(props))
    }

    /// Append an empty row to `table`.
    pub fn add_row(&mut self, table: NodeId) -> Result<NodeId> {
        let row = self.create(NodeKind::Row(RowProperties::default()));
        self.append_child(table, row)?;
        Ok(row)
    }

    /// Append an empty cell with the given properties to `row`.
    pub fn add_cell(&mut self, row: NodeId, props: CellProperties) -> Result<NodeId> {
        let cell = self.create(NodeKind::Cell(props));
        self.append_child(row, cell)?;
        Ok(cell)
    }

    /// Build a table of plain-text cells and append it to `parent`.
    ///
    /// Each inner slice is a row; cell text is split on `\t` and `\n` like
    /// [`Tree::add_paragraph`]. The grid is as wide as the longest row and
    /// shorter rows get their last cell widened.
    pub fn add_table(&mut self, parent: NodeId, rows: &[&[&str]], borders: Borders) -> Result<NodeId> {
        let columns = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let table = self.new_table(columns, borders);
        self.append_child(parent, table)?;
        for texts in rows {
            let row = self.add_row(table)?;
            for (i, text) in texts.iter().enumerate() {
                let mut props = CellProperties::default();
                if i + 1 == texts.len() {
                    props.grid_span = (columns - i) as u32;
                }
                let cell = self.add_cell(row, props)?;
                self.add_paragraph(cell, text)?;
            }
        }
        Ok(table)
    }
}
