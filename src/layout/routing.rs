//! Edge routing and marker placement.

use serde::{Deserialize, Serialize};

use crate::model::{Cardinality, Point, RelationType, Relationship, Table};

use super::anchors::{TableGeometry, edge_sides};
use super::types::{
    CubicBezier, EndpointMarker, MarkerKind, RoutedEdge, SiblingSlot, TableLookup,
};

const TICK_INSET: f64 = 10.0;
const TICK_HALF: f64 = 6.0;
const FOOT_LENGTH: f64 = 12.0;
const FOOT_SPREAD: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RoutingConfig {
    /// Upper bound on the horizontal control-point pull.
    pub max_curvature: f64,
    /// Vertical distance between fanned sibling edges.
    pub sibling_spacing: f64,
    /// How far a self-referencing loop reaches out of the table.
    pub self_loop_reach: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_curvature: 120.0,
            sibling_spacing: 30.0,
            self_loop_reach: 60.0,
        }
    }
}

/// Calculate the vertical fan-out offset for centered sibling distribution.
#[inline]
pub fn sibling_offset(index: usize, total: usize, spacing: f64) -> f64 {
    if total <= 1 {
        0.0
    } else {
        (index as f64 - (total - 1) as f64 / 2.0) * spacing
    }
}

fn marker_kind(side: Cardinality) -> MarkerKind {
    match side {
        Cardinality::One => MarkerKind::Tick,
        Cardinality::Many => MarkerKind::CrowsFoot,
    }
}

impl EndpointMarker {
    /// Line segments drawing this marker, outside the table edge.
    pub fn segments(&self) -> Vec<(Point, Point)> {
        let Point { x, y } = self.at;
        match self.kind {
            MarkerKind::Tick => {
                let bar_x = x + self.outward * TICK_INSET;
                vec![(Point::new(bar_x, y - TICK_HALF), Point::new(bar_x, y + TICK_HALF))]
            }
            MarkerKind::CrowsFoot => {
                let apex = Point::new(x + self.outward * FOOT_LENGTH, y);
                vec![
                    (apex, Point::new(x, y - FOOT_SPREAD)),
                    (apex, Point::new(x, y)),
                    (apex, Point::new(x, y + FOOT_SPREAD)),
                ]
            }
        }
    }
}

/// Route one relationship between two tables.
///
/// `slot` must come from grouping all relationships by unordered table pair
/// (see [`super::analysis::assign_sibling_slots`]).
#[allow(clippy::too_many_arguments)]
pub fn route_relationship(
    relationship_id: &str,
    from: &Table,
    to: &Table,
    from_column: Option<&str>,
    to_column: Option<&str>,
    relation_type: RelationType,
    slot: SiblingSlot,
    geometry: &TableGeometry,
    config: &RoutingConfig,
) -> RoutedEdge {
    let vertical_offset = sibling_offset(slot.index, slot.total, config.sibling_spacing);
    let y1 = from.position.y + geometry.anchor_offset(from, from_column);
    let y2 = to.position.y + geometry.anchor_offset(to, to_column);

    if from.id == to.id {
        return route_self_ref(
            relationship_id,
            from,
            y1,
            y2,
            relation_type,
            vertical_offset,
            geometry,
            config,
        );
    }

    let sides = edge_sides(from, to, geometry.width);
    let (x1, x2) = (sides.start_x, sides.end_x);
    let curvature = ((x1 - x2).abs() / 2.0).min(config.max_curvature);
    let exit = if sides.left_to_right { 1.0 } else { -1.0 };

    let path = CubicBezier {
        start: Point::new(x1, y1),
        control1: Point::new(x1 + exit * curvature, y1 + vertical_offset),
        control2: Point::new(x2 - exit * curvature, y2 + vertical_offset),
        end: Point::new(x2, y2),
    };

    RoutedEdge {
        relationship_id: relationship_id.to_string(),
        relation_type,
        label_anchor: path.midpoint(),
        start_marker: EndpointMarker {
            kind: marker_kind(relation_type.from_side()),
            at: path.start,
            outward: exit,
        },
        end_marker: EndpointMarker {
            kind: marker_kind(relation_type.to_side()),
            at: path.end,
            outward: -exit,
        },
        path,
        vertical_offset,
        is_self_ref: false,
    }
}

/// Loop out of and back into the right edge of a single table.
#[allow(clippy::too_many_arguments)]
fn route_self_ref(
    relationship_id: &str,
    table: &Table,
    mut y1: f64,
    mut y2: f64,
    relation_type: RelationType,
    vertical_offset: f64,
    geometry: &TableGeometry,
    config: &RoutingConfig,
) -> RoutedEdge {
    let x = table.position.x + geometry.width;
    if y1 == y2 {
        y1 -= geometry.row_height / 4.0;
        y2 += geometry.row_height / 4.0;
    }
    let reach = config.self_loop_reach + vertical_offset.abs();

    let path = CubicBezier {
        start: Point::new(x, y1),
        control1: Point::new(x + reach, y1 + vertical_offset),
        control2: Point::new(x + reach, y2 + vertical_offset),
        end: Point::new(x, y2),
    };

    RoutedEdge {
        relationship_id: relationship_id.to_string(),
        relation_type,
        label_anchor: path.midpoint(),
        start_marker: EndpointMarker {
            kind: marker_kind(relation_type.from_side()),
            at: path.start,
            outward: 1.0,
        },
        end_marker: EndpointMarker {
            kind: marker_kind(relation_type.to_side()),
            at: path.end,
            outward: 1.0,
        },
        path,
        vertical_offset,
        is_self_ref: true,
    }
}

/// Route a stored relationship, or `None` when either table is gone.
pub fn route_by_id<L: TableLookup + ?Sized>(
    tables: &L,
    relationship: &Relationship,
    slot: SiblingSlot,
    geometry: &TableGeometry,
    config: &RoutingConfig,
) -> Option<RoutedEdge> {
    let from = tables.table(&relationship.from_table_id)?;
    let to = tables.table(&relationship.to_table_id)?;
    Some(route_relationship(
        &relationship.id,
        from,
        to,
        relationship.from_column_id.as_deref(),
        relationship.to_column_id.as_deref(),
        relationship.typ,
        slot,
        geometry,
        config,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, ColumnType};

    fn pair() -> (Table, Table) {
        let a = Table::new(
            "a",
            vec![
                Column::new("x", ColumnType::Int).with_id("ax"),
                Column::new("y", ColumnType::Int).with_id("ay"),
            ],
        )
        .at(0.0, 100.0);
        let b = Table::new("b", vec![Column::new("x", ColumnType::Int).with_id("bx")])
            .at(600.0, 0.0);
        (a, b)
    }

    fn route(from: &Table, to: &Table, typ: RelationType, slot: SiblingSlot) -> RoutedEdge {
        route_relationship(
            "r",
            from,
            to,
            from.columns.first().map(|c| c.id.as_str()),
            to.columns.first().map(|c| c.id.as_str()),
            typ,
            slot,
            &TableGeometry::default(),
            &RoutingConfig::default(),
        )
    }

    #[test]
    fn test_sibling_offsets() {
        let offsets: Vec<f64> = (0..3).map(|i| sibling_offset(i, 3, 30.0)).collect();
        assert_eq!(offsets, vec![-30.0, 0.0, 30.0]);
        assert_eq!(sibling_offset(0, 1, 30.0), 0.0);
        assert_eq!(sibling_offset(0, 2, 30.0), -15.0);
    }

    #[test]
    fn test_left_to_right_route() {
        let (a, b) = pair();
        let edge = route(&a, &b, RelationType::OneToOne, SiblingSlot::default());
        assert_eq!(edge.path.start, Point::new(240.0, 100.0 + 64.0));
        assert_eq!(edge.path.end, Point::new(600.0, 64.0));
        // dx = 360 so the pull is clamped to 120
        assert_eq!(edge.path.control1, Point::new(360.0, 164.0));
        assert_eq!(edge.path.control2, Point::new(480.0, 64.0));
        assert_eq!(edge.label_anchor, edge.path.midpoint());
        assert_eq!(edge.start_marker.outward, 1.0);
        assert_eq!(edge.end_marker.outward, -1.0);
    }

    #[test]
    fn test_short_distance_curvature() {
        let (a, mut b) = pair();
        b.position.x = 300.0;
        let edge = route(&a, &b, RelationType::OneToOne, SiblingSlot::default());
        // dx = 60, pull = 30
        assert_eq!(edge.path.control1.x, 270.0);
        assert_eq!(edge.path.control2.x, 270.0);
    }

    #[test]
    fn test_swapping_ends_swaps_sides_and_markers() {
        let (a, b) = pair();
        let forward = route(&a, &b, RelationType::OneToMany, SiblingSlot::default());
        assert_eq!(forward.start_marker.kind, MarkerKind::Tick);
        assert_eq!(forward.end_marker.kind, MarkerKind::CrowsFoot);

        let backward = route(&b, &a, RelationType::OneToMany, SiblingSlot::default());
        assert_eq!(backward.path.start, Point::new(600.0, 64.0));
        assert_eq!(backward.path.end, Point::new(240.0, 164.0));
        assert_eq!(backward.start_marker.outward, -1.0);
        // the fan stays on the `to` end, which is now table a
        assert_eq!(backward.start_marker.kind, MarkerKind::Tick);
        assert_eq!(backward.end_marker.kind, MarkerKind::CrowsFoot);
        assert_eq!(backward.end_marker.at, Point::new(240.0, 164.0));
    }

    #[test]
    fn test_marker_kinds_per_type() {
        let (a, b) = pair();
        let kinds = |t| {
            let e = route(&a, &b, t, SiblingSlot::default());
            (e.start_marker.kind, e.end_marker.kind)
        };
        use MarkerKind::*;
        assert_eq!(kinds(RelationType::OneToOne), (Tick, Tick));
        assert_eq!(kinds(RelationType::OneToMany), (Tick, CrowsFoot));
        assert_eq!(kinds(RelationType::ManyToOne), (CrowsFoot, Tick));
        assert_eq!(kinds(RelationType::ManyToMany), (CrowsFoot, CrowsFoot));
    }

    #[test]
    fn test_siblings_fan_control_points() {
        let (a, b) = pair();
        let base = route(&a, &b, RelationType::OneToOne, SiblingSlot::default());
        let first = route(&a, &b, RelationType::OneToOne, SiblingSlot { index: 0, total: 3 });
        let last = route(&a, &b, RelationType::OneToOne, SiblingSlot { index: 2, total: 3 });
        assert_eq!(first.vertical_offset, -30.0);
        assert_eq!(first.path.control1.y, base.path.control1.y - 30.0);
        assert_eq!(first.path.control2.y, base.path.control2.y - 30.0);
        assert_eq!(last.path.control1.y, base.path.control1.y + 30.0);
        // endpoints stay on the columns
        assert_eq!(first.path.start, base.path.start);
        assert_eq!(last.path.end, base.path.end);
    }

    #[test]
    fn test_marker_segments() {
        let tick = EndpointMarker {
            kind: MarkerKind::Tick,
            at: Point::new(100.0, 50.0),
            outward: -1.0,
        };
        assert_eq!(
            tick.segments(),
            vec![(Point::new(90.0, 44.0), Point::new(90.0, 56.0))]
        );

        let foot = EndpointMarker {
            kind: MarkerKind::CrowsFoot,
            at: Point::new(100.0, 50.0),
            outward: 1.0,
        };
        let segs = foot.segments();
        assert_eq!(segs.len(), 3);
        assert!(segs.iter().all(|(apex, _)| *apex == Point::new(112.0, 50.0)));
        assert_eq!(segs[0].1, Point::new(100.0, 42.0));
        assert_eq!(segs[2].1, Point::new(100.0, 58.0));
    }

    #[test]
    fn test_self_reference_loops_on_right_edge() {
        let (a, _) = pair();
        let edge = route_relationship(
            "self",
            &a,
            &a,
            Some("ax"),
            Some("ay"),
            RelationType::OneToMany,
            SiblingSlot::default(),
            &TableGeometry::default(),
            &RoutingConfig::default(),
        );
        assert!(edge.is_self_ref);
        assert_eq!(edge.path.start.x, 240.0);
        assert_eq!(edge.path.end.x, 240.0);
        assert_eq!(edge.path.control1.x, 300.0);
        assert_eq!(edge.end_marker.outward, 1.0);
    }

    #[test]
    fn test_missing_table_is_not_renderable() {
        let (a, b) = pair();
        let tables = vec![a.clone()];
        let rel = Relationship::between_tables(&a.id, &b.id, RelationType::OneToOne);
        let routed = route_by_id(
            &tables,
            &rel,
            SiblingSlot::default(),
            &TableGeometry::default(),
            &RoutingConfig::default(),
        );
        assert!(routed.is_none());
    }
}
