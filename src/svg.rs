use crate::layout::{DiagramLayout, LayoutNode, RoutedEdge, TableGeometry};
use crate::measure::TextMetrics;
use crate::model::{Group, RelationType, Table};
use crate::state::DiagramState;
use std::fmt::Write;

pub struct SvgRenderer {
    metrics: TextMetrics,
    geometry: TableGeometry,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            metrics: TextMetrics::default(),
            geometry: TableGeometry::default(),
        }
    }
}

impl SvgRenderer {
    pub fn new(geometry: TableGeometry) -> Self {
        Self {
            geometry,
            ..Self::default()
        }
    }

    /// Render groups, then relationships, then tables on top.
    pub fn render(&self, state: &DiagramState, layout: &DiagramLayout) -> String {
        let mut svg = String::new();

        writeln!(
            &mut svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            layout.width, layout.height, layout.width, layout.height
        )
        .unwrap();

        writeln!(
            &mut svg,
            r#"<style>
  .group-bg {{ stroke-width: 2; stroke-dasharray: 6 4; }}
  .group-name {{ font-family: sans-serif; font-size: 12px; font-weight: bold; }}
  .table-bg {{ fill: #fff; stroke-width: 2; }}
  .table-name {{ font-family: sans-serif; font-size: 14px; font-weight: bold; fill: #0f172a; }}
  .column-text {{ font-family: monospace; font-size: 12px; fill: #334155; }}
  .column-type {{ font-family: monospace; font-size: 10px; fill: #94a3b8; }}
  .key {{ font-weight: bold; }}
  .edge {{ fill: none; opacity: 0.6; }}
  .marker {{ stroke: #64748b; stroke-width: 1.5; }}
  .edge-label-bg {{ fill: #fff; stroke: #e2e8f0; }}
  .edge-label {{ font-family: sans-serif; font-size: 9px; font-weight: 900; fill: #64748b; }}
  .rel-1-1 {{ stroke: #3b82f6; stroke-width: 2; }}
  .rel-1-n {{ stroke: #6366f1; stroke-width: 3; }}
  .rel-n-1 {{ stroke: #a855f7; stroke-width: 3; }}
  .rel-n-n {{ stroke: #db2777; stroke-width: 4; stroke-dasharray: 2 2; }}
</style>"#
        )
        .unwrap();

        for group in &state.groups {
            self.render_group(&mut svg, group);
        }

        for edge in &layout.edges {
            self.render_edge(&mut svg, edge);
        }

        for table in &state.tables {
            if let Some(node) = layout.node(&table.id) {
                self.render_table(&mut svg, node, table, state);
            }
        }

        writeln!(&mut svg, "</svg>").unwrap();
        svg
    }

    fn render_group(&self, svg: &mut String, group: &Group) {
        writeln!(
            svg,
            r#"<rect class="group-bg" x="{}" y="{}" width="{}" height="{}" rx="24" fill="{}" fill-opacity="0.03" stroke="{}" stroke-opacity="0.25" />"#,
            group.position.x,
            group.position.y,
            group.size.width,
            group.size.height,
            escape_xml(&group.color),
            escape_xml(&group.color)
        )
        .unwrap();
        writeln!(
            svg,
            r#"<text class="group-name" x="{}" y="{}" fill="{}">{}</text>"#,
            group.position.x + 20.0,
            group.position.y + 28.0,
            escape_xml(&group.color),
            escape_xml(&group.name)
        )
        .unwrap();
    }

    fn render_table(&self, svg: &mut String, node: &LayoutNode, table: &Table, state: &DiagramState) {
        let (x, y, w) = (node.x, node.y, node.width);
        let header_h = self.geometry.header_height;

        writeln!(
            svg,
            r#"<rect class="table-bg" x="{}" y="{}" width="{}" height="{}" rx="12" stroke="{}" />"#,
            x,
            y,
            w,
            node.height,
            escape_xml(&table.color)
        )
        .unwrap();

        // One translucent stripe per linked table color
        let mut colors: Vec<&str> = Vec::new();
        for linked in state.linked_tables(&table.id) {
            if !colors.contains(&linked.color.as_str()) {
                colors.push(&linked.color);
            }
        }
        if !colors.is_empty() {
            let stripe_w = w / colors.len() as f64;
            for (i, color) in colors.iter().enumerate() {
                writeln!(
                    svg,
                    r#"<rect class="stripe" x="{}" y="{}" width="{}" height="{}" fill="{}" fill-opacity="0.15" />"#,
                    x + i as f64 * stripe_w,
                    y + header_h,
                    stripe_w,
                    node.height - header_h,
                    escape_xml(color)
                )
                .unwrap();
            }
        }

        let name = self
            .metrics
            .truncate(&table.name, w - self.metrics.padding_x * 2.0);
        writeln!(
            svg,
            r#"<text class="table-name" x="{}" y="{}">{}</text>"#,
            x + self.metrics.padding_x,
            y + header_h / 2.0 + 5.0,
            escape_xml(&name)
        )
        .unwrap();

        if table.is_collapsed {
            return;
        }

        writeln!(
            svg,
            r##"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="#e2e8f0" stroke-width="1" />"##,
            x,
            y + header_h,
            x + w,
            y + header_h
        )
        .unwrap();

        for (i, col) in table.columns.iter().enumerate() {
            let row_mid = y + self.geometry.anchor_offset(table, Some(&col.id));
            let class = if col.is_key { "column-text key" } else { "column-text" };
            let prefix = if col.is_key { "◆ " } else { "  " };
            writeln!(
                svg,
                r#"<text class="{}" x="{}" y="{}" data-index="{}">{}{}</text>"#,
                class,
                x + self.metrics.padding_x,
                row_mid + 4.0,
                i,
                prefix,
                escape_xml(&col.name)
            )
            .unwrap();
            writeln!(
                svg,
                r#"<text class="column-type" x="{}" y="{}" text-anchor="end">{}</text>"#,
                x + w - self.metrics.padding_x,
                row_mid + 4.0,
                col.typ.as_str()
            )
            .unwrap();
        }
    }

    fn render_edge(&self, svg: &mut String, edge: &RoutedEdge) {
        writeln!(
            svg,
            r#"<path class="edge {}" d="{}" data-relationship="{}" />"#,
            relation_class(edge.relation_type),
            edge.path.to_svg_path(),
            escape_xml(&edge.relationship_id)
        )
        .unwrap();

        for marker in [&edge.start_marker, &edge.end_marker] {
            for (a, b) in marker.segments() {
                writeln!(
                    svg,
                    r#"<line class="marker" x1="{}" y1="{}" x2="{}" y2="{}" />"#,
                    a.x, a.y, b.x, b.y
                )
                .unwrap();
            }
        }

        let label = edge.relation_type.as_str();
        let box_w = self.metrics.label_width(label);
        let anchor = edge.label_anchor;
        writeln!(
            svg,
            r#"<rect class="edge-label-bg" x="{}" y="{}" width="{}" height="20" rx="6" />"#,
            anchor.x - box_w / 2.0,
            anchor.y - 10.0,
            box_w
        )
        .unwrap();
        writeln!(
            svg,
            r#"<text class="edge-label" x="{}" y="{}" text-anchor="middle">{}</text>"#,
            anchor.x,
            anchor.y + 4.0,
            label
        )
        .unwrap();
    }
}

fn relation_class(t: RelationType) -> &'static str {
    match t {
        RelationType::OneToOne => "rel-1-1",
        RelationType::OneToMany => "rel-1-n",
        RelationType::ManyToOne => "rel-n-1",
        RelationType::ManyToMany => "rel-n-n",
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutEngine;
    use crate::model::{Column, ColumnType};
    use crate::state::TableDraft;

    fn render(state: &DiagramState) -> String {
        let layout = state.layout(&LayoutEngine::default());
        SvgRenderer::default().render(state, &layout)
    }

    #[test]
    fn test_render_basic() {
        let mut state = DiagramState::default();
        state
            .add_table(TableDraft::named("users").with_columns(vec![
                Column::key("id", ColumnType::Int),
                Column::new("email", ColumnType::String),
            ]))
            .unwrap();
        let svg = render(&state);

        assert!(svg.contains("<svg"));
        assert!(svg.contains("users"));
        assert!(svg.contains("◆ id"));
        assert!(svg.contains("Main Project"));
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn test_render_with_edges() {
        let mut state = DiagramState::default();
        let a = state.add_table(TableDraft::named("users").at(0.0, 0.0)).unwrap();
        let b = state.add_table(TableDraft::named("orders").at(500.0, 0.0)).unwrap();
        state
            .add_relationship(&a, None, &b, None, RelationType::OneToMany)
            .unwrap();
        let svg = render(&state);

        assert!(svg.contains(r#"class="edge rel-1-n""#));
        assert!(svg.contains(">1:N</text>"));
        // one tick plus three crow's-foot prongs
        assert_eq!(svg.matches(r#"class="marker""#).count(), 4);
        assert!(svg.contains(r#"class="stripe""#));
    }

    #[test]
    fn test_collapsed_table_hides_columns() {
        let mut state = DiagramState::default();
        let id = state
            .add_table(
                TableDraft::named("users").with_columns(vec![Column::new("email", ColumnType::String)]),
            )
            .unwrap();
        state.toggle_collapse(&id).unwrap();
        let svg = render(&state);
        assert!(!svg.contains("email"));
    }

    #[test]
    fn test_escapes_names() {
        let mut state = DiagramState::default();
        state.add_table(TableDraft::named("a<b>")).unwrap();
        let svg = render(&state);
        assert!(svg.contains("a&lt;b&gt;"));
    }
}
