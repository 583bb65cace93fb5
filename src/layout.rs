//! Relationship routing between table cards.
//!
//! Edges are cubic Beziers leaving each table roughly perpendicular to its
//! left or right edge, anchored at the referenced column's row. Several
//! relationships between the same pair of tables are fanned vertically.

mod analysis;
mod anchors;
mod engine;
mod routing;
mod types;

pub use analysis::assign_sibling_slots;
pub use anchors::{EdgeSides, TableGeometry, edge_sides};
pub use engine::LayoutEngine;
pub use routing::{RoutingConfig, route_by_id, route_relationship, sibling_offset};
pub use types::{
    CubicBezier, DiagramLayout, EndpointMarker, LayoutNode, MarkerKind, RoutedEdge, SiblingSlot,
    TableLookup,
};
