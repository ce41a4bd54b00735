//! Generic rendering model shared by every record set.

use std::fmt;

/// One table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Float(f64),
    /// Missing value (undefined std, zero baseline, ...). Renders empty.
    Null,
}

impl Cell {
    pub fn text(s: &str) -> Self {
        Cell::Text(s.to_string())
    }

    /// Widen an `f32` through its shortest decimal form, so `12.3f32`
    /// renders as `12.3` rather than `12.300000190734863`.
    pub fn from_f32(v: f32) -> Self {
        let widened = v.to_string().parse::<f64>().unwrap_or(f64::from(v));
        Cell::Float(widened)
    }

    pub fn from_option(v: Option<f64>) -> Self {
        v.map_or(Cell::Null, Cell::Float)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            // A missing measurement renders like a missing cell.
            Cell::Float(v) if v.is_nan() => Ok(()),
            // Debug keeps a trailing ".0" on integral floats and is round-trip exact.
            Cell::Float(v) => write!(f, "{v:?}"),
            Cell::Null => Ok(()),
        }
    }
}

/// Ordered columns, rows of cells, and a per-row highlight flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub highlighted: Vec<bool>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let highlighted = vec![false; rows.len()];
        Self {
            columns,
            rows,
            highlighted,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// A column is numeric when every non-null cell in it is a float
    /// and at least one such cell exists.
    pub fn is_numeric_column(&self, index: usize) -> bool {
        let mut seen = false;
        for row in &self.rows {
            match row.get(index) {
                Some(Cell::Float(_)) => seen = true,
                Some(Cell::Null) | None => {}
                Some(Cell::Text(_)) => return false,
            }
        }
        seen
    }

    pub fn is_highlighted(&self, row: usize) -> bool {
        self.highlighted.get(row).copied().unwrap_or(false)
    }
}
