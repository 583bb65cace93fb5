//! Data structures for layout computation.

use serde::Serialize;

use crate::model::{Point, RelationType, Table};

/// Resolves table ids to tables for the router.
pub trait TableLookup {
    fn table(&self, id: &str) -> Option<&Table>;
}

impl TableLookup for [Table] {
    fn table(&self, id: &str) -> Option<&Table> {
        self.iter().find(|t| t.id == id)
    }
}

impl TableLookup for Vec<Table> {
    fn table(&self, id: &str) -> Option<&Table> {
        self.as_slice().table(id)
    }
}

/// Cubic Bezier from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CubicBezier {
    pub start: Point,
    pub control1: Point,
    pub control2: Point,
    pub end: Point,
}

impl CubicBezier {
    pub fn point_at(&self, t: f64) -> Point {
        let u = 1.0 - t;
        let w0 = u * u * u;
        let w1 = 3.0 * u * u * t;
        let w2 = 3.0 * u * t * t;
        let w3 = t * t * t;
        Point::new(
            w0 * self.start.x + w1 * self.control1.x + w2 * self.control2.x + w3 * self.end.x,
            w0 * self.start.y + w1 * self.control1.y + w2 * self.control2.y + w3 * self.end.y,
        )
    }

    /// Point at t = 0.5, where the relation label sits.
    pub fn midpoint(&self) -> Point {
        self.point_at(0.5)
    }

    pub fn to_svg_path(&self) -> String {
        format!(
            "M {} {} C {} {}, {} {}, {} {}",
            self.start.x,
            self.start.y,
            self.control1.x,
            self.control1.y,
            self.control2.x,
            self.control2.y,
            self.end.x,
            self.end.y
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerKind {
    /// Single perpendicular bar for a "one" endpoint.
    Tick,
    /// Three converging prongs for a "many" endpoint.
    CrowsFoot,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EndpointMarker {
    pub kind: MarkerKind,
    pub at: Point,
    /// +1.0 or -1.0: horizontal direction pointing away from the table edge.
    pub outward: f64,
}

/// Position of one relationship among all relationships joining the same table pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SiblingSlot {
    pub index: usize,
    pub total: usize,
}

impl Default for SiblingSlot {
    fn default() -> Self {
        Self { index: 0, total: 1 }
    }
}

/// A relationship with its computed curve and markers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedEdge {
    pub relationship_id: String,
    pub relation_type: RelationType,
    pub path: CubicBezier,
    pub label_anchor: Point,
    pub start_marker: EndpointMarker,
    pub end_marker: EndpointMarker,
    pub vertical_offset: f64,
    pub is_self_ref: bool,
}

/// A positioned table card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// The complete layout result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramLayout {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<RoutedEdge>,
    pub width: f64,
    pub height: f64,
}

impl DiagramLayout {
    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, relationship_id: &str) -> Option<&RoutedEdge> {
        self.edges.iter().find(|e| e.relationship_id == relationship_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midpoint_matches_weighted_form() {
        let curve = CubicBezier {
            start: Point::new(0.0, 0.0),
            control1: Point::new(80.0, 10.0),
            control2: Point::new(120.0, 90.0),
            end: Point::new(200.0, 100.0),
        };
        let m = curve.midpoint();
        let x = (0.0 + 3.0 * 80.0 + 3.0 * 120.0 + 200.0) / 8.0;
        let y = (0.0 + 3.0 * 10.0 + 3.0 * 90.0 + 100.0) / 8.0;
        assert!((m.x - x).abs() < 1e-9);
        assert!((m.y - y).abs() < 1e-9);
    }

    #[test]
    fn test_endpoints() {
        let curve = CubicBezier {
            start: Point::new(1.0, 2.0),
            control1: Point::new(3.0, 4.0),
            control2: Point::new(5.0, 6.0),
            end: Point::new(7.0, 8.0),
        };
        assert_eq!(curve.point_at(0.0), curve.start);
        assert_eq!(curve.point_at(1.0), curve.end);
        assert_eq!(curve.to_svg_path(), "M 1 2 C 3 4, 5 6, 7 8");
    }
}
