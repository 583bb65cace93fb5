//! Pointer interaction on the zoomable canvas.
//!
//! Pointer coordinates arrive in screen space and are divided by the zoom
//! factor before they touch table or group positions.

use crate::layout::TableGeometry;
use crate::model::{Point, Size, Table};
use crate::state::{DiagramState, MIN_GROUP_SIZE, StateError};

/// Scrollable region hosting the canvas.
pub trait Viewport {
    fn scroll_offset(&self) -> Point;
    fn set_scroll_offset(&mut self, offset: Point);
    /// Visible size of the scroll container in screen pixels.
    fn visible_size(&self) -> Size;
}

/// A viewport with no backing element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedViewport {
    pub offset: Point,
    pub size: Size,
}

impl Viewport for FixedViewport {
    fn scroll_offset(&self) -> Point {
        self.offset
    }

    fn set_scroll_offset(&mut self, offset: Point) {
        self.offset = offset;
    }

    fn visible_size(&self) -> Size {
        self.size
    }
}

pub fn to_canvas(pointer: Point, zoom: f64) -> Point {
    Point::new(pointer.x / zoom, pointer.y / zoom)
}

/// Scroll so the table's center sits in the middle of the viewport.
pub fn center_on_table<V: Viewport + ?Sized>(
    viewport: &mut V,
    table: &Table,
    zoom: f64,
    geometry: &TableGeometry,
) {
    let center = geometry.center(table);
    let visible = viewport.visible_size();
    let offset = Point::new(
        (center.x * zoom - visible.width / 2.0).max(0.0),
        (center.y * zoom - visible.height / 2.0).max(0.0),
    );
    viewport.set_scroll_offset(offset);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragTarget {
    Table(String),
    Group(String),
}

/// One pointer-down .. pointer-up move gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct DragGesture {
    target: DragTarget,
    /// Pointer position relative to the entity origin, in canvas units.
    grab: Point,
    zoom: f64,
}

impl DragGesture {
    pub fn begin(
        state: &DiagramState,
        target: DragTarget,
        pointer: Point,
    ) -> Result<Self, StateError> {
        let origin = match &target {
            DragTarget::Table(id) => {
                state
                    .tables
                    .iter()
                    .find(|t| &t.id == id)
                    .ok_or_else(|| StateError::UnknownTable(id.clone()))?
                    .position
            }
            DragTarget::Group(id) => {
                state
                    .group(id)
                    .ok_or_else(|| StateError::UnknownGroup(id.clone()))?
                    .position
            }
        };
        let p = to_canvas(pointer, state.zoom);
        Ok(Self {
            target,
            grab: Point::new(p.x - origin.x, p.y - origin.y),
            zoom: state.zoom,
        })
    }

    /// Apply a pointer move. Group drags carry their primary-group tables.
    pub fn update(&self, state: &mut DiagramState, pointer: Point) -> Result<Point, StateError> {
        let p = to_canvas(pointer, self.zoom);
        let position = Point::new(p.x - self.grab.x, p.y - self.grab.y);
        match &self.target {
            DragTarget::Table(id) => state.move_table(id, position)?,
            DragTarget::Group(id) => state.move_group(id, position)?,
        }
        Ok(position)
    }

    /// Pointer released or left the canvas.
    pub fn end(self) -> DragTarget {
        self.target
    }
}

/// Group resize from the bottom-right handle.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeGesture {
    group_id: String,
    start_pointer: Point,
    start_size: Size,
}

impl ResizeGesture {
    pub fn begin(state: &DiagramState, group_id: &str, pointer: Point) -> Result<Self, StateError> {
        let group = state
            .group(group_id)
            .ok_or_else(|| StateError::UnknownGroup(group_id.to_string()))?;
        Ok(Self {
            group_id: group_id.to_string(),
            start_pointer: pointer,
            start_size: group.size,
        })
    }

    pub fn update(&self, state: &mut DiagramState, pointer: Point) -> Result<Size, StateError> {
        let size = Size::new(
            (self.start_size.width + pointer.x - self.start_pointer.x).max(MIN_GROUP_SIZE.width),
            (self.start_size.height + pointer.y - self.start_pointer.y).max(MIN_GROUP_SIZE.height),
        );
        state.resize_group(&self.group_id, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DEFAULT_GROUP_ID;
    use crate::state::TableDraft;

    #[test]
    fn test_drag_table_at_zoom() {
        let mut state = DiagramState::default();
        state.set_zoom(2.0);
        let id = state
            .add_table(TableDraft::named("t").at(100.0, 100.0))
            .unwrap();

        // grab 10 canvas units into the card
        let drag = DragGesture::begin(&state, DragTarget::Table(id.clone()), Point::new(220.0, 220.0))
            .unwrap();
        let pos = drag.update(&mut state, Point::new(320.0, 260.0)).unwrap();
        assert_eq!(pos, Point::new(150.0, 120.0));
        assert_eq!(drag.end(), DragTarget::Table(id));
    }

    #[test]
    fn test_drag_group_carries_tables() {
        let mut state = DiagramState::default();
        let id = state
            .add_table(TableDraft::named("t").at(100.0, 100.0))
            .unwrap();
        let drag = DragGesture::begin(
            &state,
            DragTarget::Group(DEFAULT_GROUP_ID.to_string()),
            Point::new(50.0, 50.0),
        )
        .unwrap();
        drag.update(&mut state, Point::new(80.0, 70.0)).unwrap();

        let group = state.group(DEFAULT_GROUP_ID).unwrap();
        assert_eq!(group.position, Point::new(70.0, 60.0));
        let table = state.tables.iter().find(|t| t.id == id).unwrap();
        assert_eq!(table.position, Point::new(130.0, 120.0));
    }

    #[test]
    fn test_drag_unknown_target() {
        let state = DiagramState::default();
        let err = DragGesture::begin(&state, DragTarget::Table("x".into()), Point::default());
        assert!(err.is_err());
    }

    #[test]
    fn test_resize_minimum() {
        let mut state = DiagramState::default();
        let resize = ResizeGesture::begin(&state, DEFAULT_GROUP_ID, Point::new(0.0, 0.0)).unwrap();
        let size = resize.update(&mut state, Point::new(-1000.0, 50.0)).unwrap();
        assert_eq!(size, Size::new(200.0, 650.0));
    }

    #[test]
    fn test_center_on_table() {
        let table = Table::new("t", vec![]).at(1000.0, 500.0);
        let mut viewport = FixedViewport {
            offset: Point::default(),
            size: Size::new(800.0, 600.0),
        };
        center_on_table(&mut viewport, &table, 1.0, &TableGeometry::default());
        // center = (1120, 524)
        assert_eq!(viewport.scroll_offset(), Point::new(720.0, 224.0));

        let near = Table::new("n", vec![]).at(0.0, 0.0);
        center_on_table(&mut viewport, &near, 1.0, &TableGeometry::default());
        assert_eq!(viewport.scroll_offset(), Point::new(0.0, 0.0));
    }
}
