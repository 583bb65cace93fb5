//! Layout engine core implementation.

use tracing::debug;

use crate::model::{Group, Relationship, Table};

use super::analysis::assign_sibling_slots;
use super::anchors::TableGeometry;
use super::routing::{RoutingConfig, route_by_id};
use super::types::{DiagramLayout, LayoutNode};

const CANVAS_MARGIN: f64 = 40.0;

/// Layout engine configuration and computation.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    pub geometry: TableGeometry,
    pub routing: RoutingConfig,
}

impl LayoutEngine {
    pub fn new(geometry: TableGeometry, routing: RoutingConfig) -> Self {
        Self { geometry, routing }
    }

    /// Position table cards and route every renderable relationship.
    ///
    /// Relationships pointing at a table that no longer exists are skipped.
    pub fn layout(
        &self,
        tables: &[Table],
        groups: &[Group],
        relationships: &[Relationship],
    ) -> DiagramLayout {
        let nodes: Vec<LayoutNode> = tables
            .iter()
            .map(|t| LayoutNode {
                id: t.id.clone(),
                x: t.position.x,
                y: t.position.y,
                width: self.geometry.width,
                height: self.geometry.table_height(t),
            })
            .collect();

        let slots = assign_sibling_slots(relationships);
        let edges = relationships
            .iter()
            .zip(slots)
            .filter_map(|(rel, slot)| {
                let routed = route_by_id(tables, rel, slot, &self.geometry, &self.routing);
                if routed.is_none() {
                    debug!(relationship = %rel.id, "skipping relationship with missing table");
                }
                routed
            })
            .collect::<Vec<_>>();

        let mut max_x: f64 = 0.0;
        let mut max_y: f64 = 0.0;
        for n in &nodes {
            max_x = max_x.max(n.x + n.width);
            max_y = max_y.max(n.y + n.height);
        }
        for g in groups {
            max_x = max_x.max(g.position.x + g.size.width);
            max_y = max_y.max(g.position.y + g.size.height);
        }
        for e in &edges {
            for p in [e.path.control1, e.path.control2] {
                max_x = max_x.max(p.x);
                max_y = max_y.max(p.y);
            }
        }

        DiagramLayout {
            nodes,
            edges,
            width: max_x + CANVAS_MARGIN,
            height: max_y + CANVAS_MARGIN,
        }
    }
}
