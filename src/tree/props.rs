//! Shallow property records attached to tree nodes.
//!
//! Every record is a plain value type. Cloning a node clones its record by
//! value, so no property sub-tree is ever shared between two nodes.
use serde::{Deserialize, Serialize};

/// Border styles for tables and cells.
///
/// `Nil` and `None` both draw nothing. `Nil` is kept apart because an
/// explicit `nil` on both sides of a row boundary is a deliberate statement
/// by the author, while `None` usually comes from a converter default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BorderStyle {
    Nil,
    #[default]
    None,
    Single,
    Thick,
    Double,
    Dotted,
    Dashed,
    DotDash,
    DotDotDash,
    Triple,
    Wave,
    /// Any other visible OOXML border art
    Other,
}

impl BorderStyle {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::None => "none",
            Self::Single => "single",
            Self::Thick => "thick",
            Self::Double => "double",
            Self::Dotted => "dotted",
            Self::Dashed => "dashed",
            Self::DotDash => "dotDash",
            Self::DotDotDash => "dotDotDash",
            Self::Triple => "triple",
            Self::Wave => "wave",
            Self::Other => "single",
        }
    }

    /// Parse a `w:val` border value.
    pub fn from_val(val: &str) -> Self {
        match val {
            "nil" => Self::Nil,
            "none" => Self::None,
            "single" => Self::Single,
            "thick" => Self::Thick,
            "double" => Self::Double,
            "dotted" => Self::Dotted,
            "dashed" => Self::Dashed,
            "dotDash" => Self::DotDash,
            "dotDotDash" => Self::DotDotDash,
            "triple" => Self::Triple,
            "wave" => Self::Wave,
            _ => Self::Other,
        }
    }

    /// Whether a border of this style draws a line.
    #[inline]
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Nil | Self::None)
    }
}

/// Border definition for one side of a table or cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Border {
    /// Border style
    pub style: BorderStyle,
    /// Border width in eighths of a point (e.g., 8 = 1pt, 24 = 3pt)
    pub size: u32,
    /// Border color in hex RGB format, `None` for `auto`
    pub color: Option<String>,
}

impl Default for Border {
    fn default() -> Self {
        Self::single()
    }
}

impl Border {
    /// A plain 1/2pt single line.
    pub fn single() -> Self {
        Self {
            style: BorderStyle::Single,
            size: 4,
            color: Some("000000".to_string()),
        }
    }

    /// An explicit `nil` border.
    pub fn nil() -> Self {
        Self {
            style: BorderStyle::Nil,
            size: 0,
            color: None,
        }
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.style.is_visible()
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        self.style == BorderStyle::Nil
    }
}

/// One side of a border set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderSide {
    Top,
    Left,
    Bottom,
    Right,
    InsideH,
    InsideV,
}

impl BorderSide {
    pub const ALL: [BorderSide; 6] = [
        BorderSide::Top,
        BorderSide::Left,
        BorderSide::Bottom,
        BorderSide::Right,
        BorderSide::InsideH,
        BorderSide::InsideV,
    ];

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Left => "left",
            Self::Bottom => "bottom",
            Self::Right => "right",
            Self::InsideH => "insideH",
            Self::InsideV => "insideV",
        }
    }

    pub(crate) fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"top" => Some(Self::Top),
            b"left" | b"start" => Some(Self::Left),
            b"bottom" => Some(Self::Bottom),
            b"right" | b"end" => Some(Self::Right),
            b"insideH" => Some(Self::InsideH),
            b"insideV" => Some(Self::InsideV),
            _ => None,
        }
    }
}

/// Borders on all sides. `None` means "not declared here".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borders {
    pub top: Option<Border>,
    pub left: Option<Border>,
    pub bottom: Option<Border>,
    pub right: Option<Border>,
    pub inside_h: Option<Border>,
    pub inside_v: Option<Border>,
}

impl Borders {
    /// The same border on every side.
    pub fn all(border: Border) -> Self {
        Self {
            top: Some(border.clone()),
            left: Some(border.clone()),
            bottom: Some(border.clone()),
            right: Some(border.clone()),
            inside_h: Some(border.clone()),
            inside_v: Some(border),
        }
    }

    pub fn get(&self, side: BorderSide) -> Option<&Border> {
        match side {
            BorderSide::Top => self.top.as_ref(),
            BorderSide::Left => self.left.as_ref(),
            BorderSide::Bottom => self.bottom.as_ref(),
            BorderSide::Right => self.right.as_ref(),
            BorderSide::InsideH => self.inside_h.as_ref(),
            BorderSide::InsideV => self.inside_v.as_ref(),
        }
    }

    pub fn set(&mut self, side: BorderSide, border: Option<Border>) {
        let slot = match side {
            BorderSide::Top => &mut self.top,
            BorderSide::Left => &mut self.left,
            BorderSide::Bottom => &mut self.bottom,
            BorderSide::Right => &mut self.right,
            BorderSide::InsideH => &mut self.inside_h,
            BorderSide::InsideV => &mut self.inside_v,
        };
        *slot = border;
    }

    /// Whether any declared side draws a line.
    pub fn any_visible(&self) -> bool {
        BorderSide::ALL
            .iter()
            .any(|side| self.get(*side).is_some_and(Border::is_visible))
    }

    pub fn is_empty(&self) -> bool {
        BorderSide::ALL.iter().all(|side| self.get(*side).is_none())
    }
}

/// Vertical merge state for table cells (`<w:vMerge>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VMerge {
    /// Starts a vertical merge (`<w:vMerge w:val="restart"/>`)
    Restart,
    /// Continues a vertical merge from above (`<w:vMerge/>`)
    Continue,
}

/// One column of a table grid (`<w:gridCol>`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridColumn {
    /// Width in DXA units (twentieth of a point)
    pub width: Option<u32>,
}

impl GridColumn {
    pub fn with_width(width: u32) -> Self {
        Self { width: Some(width) }
    }
}

/// Table properties (`<w:tblPr>` plus `<w:tblGrid>`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableProperties {
    /// Table style ID
    pub style: Option<String>,
    /// Declared table width in DXA units
    pub width: Option<u32>,
    /// Left indentation in DXA units
    pub indent: Option<u32>,
    /// Table-level borders
    pub borders: Borders,
    /// Column grid
    pub grid: Vec<GridColumn>,
}

impl TableProperties {
    /// A grid of `columns` columns with unset widths.
    pub fn with_columns(columns: usize) -> Self {
        Self {
            grid: vec![GridColumn::default(); columns],
            ..Self::default()
        }
    }

    /// Sum of the grid widths, or `None` if any column width is unset.
    pub fn grid_width(&self) -> Option<u32> {
        self.grid
            .iter()
            .try_fold(0u32, |acc, col| col.width.map(|w| acc.saturating_add(w)))
    }
}

/// Row properties (`<w:trPr>`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowProperties {
    /// Repeated as a heading row on every page (`<w:tblHeader>`)
    pub header: bool,
    /// Row may not break across pages (`<w:cantSplit>`)
    pub cant_split: bool,
}

/// Cell properties (`<w:tcPr>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellProperties {
    /// Cell width in DXA units
    pub width: Option<u32>,
    /// Number of grid columns occupied, at least 1
    pub grid_span: u32,
    /// Vertical merge state
    pub v_merge: Option<VMerge>,
    /// Cell borders overriding the table borders
    pub borders: Borders,
    /// Background fill in hex RGB format
    pub shading: Option<String>,
}

impl Default for CellProperties {
    fn default() -> Self {
        Self {
            width: None,
            grid_span: 1,
            v_merge: None,
            borders: Borders::default(),
            shading: None,
        }
    }
}

impl CellProperties {
    #[inline]
    pub fn span(&self) -> usize {
        self.grid_span.max(1) as usize
    }
}

/// Paragraph properties (`<w:pPr>`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParagraphProperties {
    /// Paragraph style ID
    pub style: Option<String>,
    /// Background fill in hex RGB format
    pub shading: Option<String>,
}

/// Run properties (`<w:rPr>`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunProperties {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    /// ASCII font name
    pub font: Option<String>,
    /// Font size in half-points (e.g., 24 = 12pt)
    pub size: Option<u32>,
}

impl RunProperties {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Hyperlink target (`<w:hyperlink>`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HyperlinkProperties {
    /// Relationship ID of an external target
    pub rel_id: Option<String>,
    /// Bookmark name of an internal target
    pub anchor: Option<String>,
}

impl HyperlinkProperties {
    /// Whether two links point at the same place.
    pub fn same_target(&self, other: &Self) -> bool {
        (self.rel_id.is_some() || self.anchor.is_some()) && self == other
    }
}
