//! Edge anchor calculation on table cards.

use serde::{Deserialize, Serialize};

use crate::model::{Point, Table};

/// Fixed card dimensions shared by the router, renderer and canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TableGeometry {
    pub width: f64,
    pub header_height: f64,
    pub row_height: f64,
}

impl Default for TableGeometry {
    fn default() -> Self {
        Self {
            width: 240.0,
            header_height: 48.0,
            row_height: 32.0,
        }
    }
}

impl TableGeometry {
    /// Vertical offset of a column's anchor from the top of its table.
    ///
    /// Collapsed tables, table-level links and unknown columns anchor on the
    /// header midpoint.
    pub fn anchor_offset(&self, table: &Table, column_id: Option<&str>) -> f64 {
        let header_mid = self.header_height / 2.0;
        if table.is_collapsed {
            return header_mid;
        }
        match column_id.and_then(|id| table.column_index(id)) {
            Some(index) => {
                self.header_height + index as f64 * self.row_height + self.row_height / 2.0
            }
            None => header_mid,
        }
    }

    pub fn table_height(&self, table: &Table) -> f64 {
        if table.is_collapsed {
            self.header_height
        } else {
            self.header_height + table.columns.len() as f64 * self.row_height
        }
    }

    pub fn center(&self, table: &Table) -> Point {
        Point::new(
            table.position.x + self.width / 2.0,
            table.position.y + self.table_height(table) / 2.0,
        )
    }
}

/// Horizontal sides an edge uses on its two tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeSides {
    pub start_x: f64,
    pub end_x: f64,
    /// True when `from` lies left of `to`: exit right edge, enter left edge.
    pub left_to_right: bool,
}

/// Choose exit/entry edges from the relative horizontal position of two tables.
pub fn edge_sides(from: &Table, to: &Table, width: f64) -> EdgeSides {
    let left_to_right = from.position.x < to.position.x;
    if left_to_right {
        EdgeSides {
            start_x: from.position.x + width,
            end_x: to.position.x,
            left_to_right,
        }
    } else {
        EdgeSides {
            start_x: from.position.x,
            end_x: to.position.x + width,
            left_to_right,
        }
    }
}
