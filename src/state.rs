//! The diagram being edited and every mutation the editor performs on it.
//!
//! Each operation validates its input before touching any collection, so a
//! rejected edit leaves the state exactly as it was.

use tracing::{debug, info};

use crate::autolink::{AutoLinkOptions, compute_auto_links};
use crate::layout::{DiagramLayout, LayoutEngine, TableLookup};
use crate::model::{
    Column, ColumnType, DEFAULT_COLORS, Group, GroupId, Point, RelationType, Relationship,
    RelationshipId, Size, Table, TableId, TableMetadata, new_id,
};

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 2.0;
pub const ZOOM_STEP: f64 = 0.1;
pub const MIN_GROUP_SIZE: Size = Size::new(200.0, 150.0);

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StateError {
    #[error("A table named '{0}' already exists")]
    DuplicateTableName(String),
    #[error("A group named '{0}' already exists")]
    DuplicateGroupName(String),
    #[error("Table '{0}' must belong to at least one group")]
    NoGroups(String),
    #[error("Unknown group: {0}")]
    UnknownGroup(String),
    #[error("Unknown table: {0}")]
    UnknownTable(String),
    #[error("Unknown column {column} in table {table}")]
    UnknownColumn { table: String, column: String },
    #[error("Unknown relationship: {0}")]
    UnknownRelationship(String),
    #[error("All columns of table '{0}' must have a name")]
    BlankColumnName(String),
    #[error("At least one group must remain")]
    LastGroup,
}

/// Form input for a new table; unset fields take editor defaults.
#[derive(Debug, Clone, Default)]
pub struct TableDraft {
    pub name: Option<String>,
    pub description: String,
    pub color: Option<String>,
    pub group_ids: Vec<GroupId>,
    pub columns: Vec<Column>,
    pub position: Option<Point>,
    pub metadata: Option<TableMetadata>,
}

impl TableDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    pub fn in_groups(mut self, group_ids: Vec<GroupId>) -> Self {
        self.group_ids = group_ids;
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Point::new(x, y));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroupDraft {
    pub name: Option<String>,
    pub color: Option<String>,
    pub position: Option<Point>,
    pub size: Option<Size>,
}

impl GroupDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagramState {
    pub tables: Vec<Table>,
    pub groups: Vec<Group>,
    pub relationships: Vec<Relationship>,
    pub zoom: f64,
    pub autolink: AutoLinkOptions,
}

impl Default for DiagramState {
    fn default() -> Self {
        Self {
            tables: Vec::new(),
            groups: vec![Group::default_group()],
            relationships: Vec::new(),
            zoom: 1.0,
            autolink: AutoLinkOptions::default(),
        }
    }
}

impl TableLookup for DiagramState {
    fn table(&self, id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == id)
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

impl DiagramState {
    pub fn with_autolink(mut self, options: AutoLinkOptions) -> Self {
        self.autolink = options;
        self
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| same_name(&t.name, name))
    }

    fn table_mut(&mut self, id: &str) -> Result<&mut Table, StateError> {
        self.tables
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StateError::UnknownTable(id.to_string()))
    }

    fn group_mut(&mut self, id: &str) -> Result<&mut Group, StateError> {
        self.groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| StateError::UnknownGroup(id.to_string()))
    }

    fn validate_table(&self, table: &Table) -> Result<(), StateError> {
        if self
            .tables
            .iter()
            .any(|t| t.id != table.id && same_name(&t.name, &table.name))
        {
            return Err(StateError::DuplicateTableName(table.name.clone()));
        }
        if table.group_ids.is_empty() {
            return Err(StateError::NoGroups(table.name.clone()));
        }
        if let Some(missing) = table.group_ids.iter().find(|g| self.group(g).is_none()) {
            return Err(StateError::UnknownGroup(missing.clone()));
        }
        if table.columns.iter().any(|c| c.name.trim().is_empty()) {
            return Err(StateError::BlankColumnName(table.name.clone()));
        }
        Ok(())
    }

    /// Run auto-linking over the full table set, returning how many links were added.
    pub fn relink(&mut self) -> usize {
        let outcome = compute_auto_links(&self.tables, &self.relationships, &self.autolink);
        let added = outcome.apply(&mut self.relationships);
        if added > 0 {
            info!(added, "auto-linked relationships");
        }
        added
    }

    pub fn add_table(&mut self, draft: TableDraft) -> Result<TableId, StateError> {
        let n = self.tables.len();
        let cascade = 100.0 + (n % 8) as f64 * 30.0;
        let group_ids = if draft.group_ids.is_empty() {
            self.groups.iter().take(1).map(|g| g.id.clone()).collect()
        } else {
            draft.group_ids
        };

        let table = Table {
            id: new_id(),
            name: draft.name.unwrap_or_else(|| "new_table".to_string()),
            description: draft.description,
            color: draft
                .color
                .unwrap_or_else(|| DEFAULT_COLORS[n % DEFAULT_COLORS.len()].to_string()),
            group_ids,
            columns: draft.columns,
            position: draft.position.unwrap_or(Point::new(cascade, cascade)),
            is_collapsed: false,
            metadata: draft.metadata,
        };
        self.validate_table(&table)?;

        let id = table.id.clone();
        info!(table = %table.name, "adding table");
        self.tables.push(table);
        self.relink();
        Ok(id)
    }

    pub fn update_table(&mut self, table: Table) -> Result<(), StateError> {
        if self.table(&table.id).is_none() {
            return Err(StateError::UnknownTable(table.id));
        }
        self.validate_table(&table)?;

        info!(table = %table.name, "updating table");
        let slot = self.table_mut(&table.id)?;
        *slot = table;
        self.relink();
        Ok(())
    }

    /// Delete a table and every relationship touching it.
    pub fn delete_table(&mut self, id: &str) -> Result<usize, StateError> {
        let index = self
            .tables
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| StateError::UnknownTable(id.to_string()))?;
        let table = self.tables.remove(index);

        let before = self.relationships.len();
        self.relationships.retain(|r| !r.touches(id));
        let removed = before - self.relationships.len();
        info!(table = %table.name, removed, "deleted table");
        Ok(removed)
    }

    pub fn add_group(&mut self, draft: GroupDraft) -> Result<GroupId, StateError> {
        let name = draft.name.unwrap_or_else(|| "New Group".to_string());
        if self.groups.iter().any(|g| same_name(&g.name, &name)) {
            return Err(StateError::DuplicateGroupName(name));
        }
        let mut group = Group::new(name, draft.color.unwrap_or_else(|| "#000000".to_string()));
        if let Some(position) = draft.position {
            group.position = position;
        }
        if let Some(size) = draft.size {
            group.size = clamp_group_size(size);
        }

        let id = group.id.clone();
        info!(group = %group.name, "adding group");
        self.groups.push(group);
        Ok(id)
    }

    pub fn update_group(&mut self, group: Group) -> Result<(), StateError> {
        if self.group(&group.id).is_none() {
            return Err(StateError::UnknownGroup(group.id));
        }
        if self
            .groups
            .iter()
            .any(|g| g.id != group.id && same_name(&g.name, &group.name))
        {
            return Err(StateError::DuplicateGroupName(group.name));
        }
        let slot = self.group_mut(&group.id)?;
        *slot = group;
        Ok(())
    }

    /// Remove a group; tables left without any group fall back to the first remaining one.
    pub fn delete_group(&mut self, id: &str) -> Result<(), StateError> {
        if self.group(id).is_none() {
            return Err(StateError::UnknownGroup(id.to_string()));
        }
        if self.groups.len() <= 1 {
            return Err(StateError::LastGroup);
        }

        self.groups.retain(|g| g.id != id);
        self.repair_group_refs();
        info!(group = %id, "deleted group");
        Ok(())
    }

    /// Drop group ids that no longer exist; tables left without a group join the first one.
    ///
    /// Returns the number of tables that were changed.
    pub fn repair_group_refs(&mut self) -> usize {
        let Some(fallback) = self.groups.first().map(|g| g.id.clone()) else {
            return 0;
        };
        let known: Vec<&str> = self.groups.iter().map(|g| g.id.as_str()).collect();
        let mut repaired = 0;
        for table in &mut self.tables {
            let before = table.group_ids.len();
            table.group_ids.retain(|g| known.contains(&g.as_str()));
            let mut changed = table.group_ids.len() != before;
            if table.group_ids.is_empty() {
                debug!(table = %table.name, group = %fallback, "moving table to fallback group");
                table.group_ids.push(fallback.clone());
                changed = true;
            }
            if changed {
                repaired += 1;
            }
        }
        repaired
    }

    /// True if any relationship joins the two tables, in either direction.
    pub fn has_relationship_between(&self, a: &str, b: &str) -> bool {
        self.relationships.iter().any(|r| r.joins_tables(a, b))
    }

    pub fn add_relationship(
        &mut self,
        from_table: &str,
        from_column: Option<&str>,
        to_table: &str,
        to_column: Option<&str>,
        typ: RelationType,
    ) -> Result<RelationshipId, StateError> {
        for (table_id, column_id) in [(from_table, from_column), (to_table, to_column)] {
            let table = self
                .table(table_id)
                .ok_or_else(|| StateError::UnknownTable(table_id.to_string()))?;
            if let Some(column_id) = column_id {
                if table.column(column_id).is_none() {
                    return Err(StateError::UnknownColumn {
                        table: table_id.to_string(),
                        column: column_id.to_string(),
                    });
                }
            }
        }

        let rel = Relationship {
            id: new_id(),
            from_table_id: from_table.to_string(),
            from_column_id: from_column.map(str::to_string),
            to_table_id: to_table.to_string(),
            to_column_id: to_column.map(str::to_string),
            typ,
        };
        let id = rel.id.clone();
        info!(from = %from_table, to = %to_table, kind = typ.as_str(), "adding relationship");
        self.relationships.push(rel);
        Ok(id)
    }

    pub fn delete_relationship(&mut self, id: &str) -> Result<(), StateError> {
        let before = self.relationships.len();
        self.relationships.retain(|r| r.id != id);
        if self.relationships.len() == before {
            return Err(StateError::UnknownRelationship(id.to_string()));
        }
        Ok(())
    }

    /// Flip the collapsed flag, returning the new value.
    pub fn toggle_collapse(&mut self, id: &str) -> Result<bool, StateError> {
        let table = self.table_mut(id)?;
        table.is_collapsed = !table.is_collapsed;
        Ok(table.is_collapsed)
    }

    pub fn move_table(&mut self, id: &str, position: Point) -> Result<(), StateError> {
        self.table_mut(id)?.position = position;
        Ok(())
    }

    /// Move a group; tables whose primary group it is move by the same delta.
    pub fn move_group(&mut self, id: &str, position: Point) -> Result<(), StateError> {
        let group = self.group_mut(id)?;
        let dx = position.x - group.position.x;
        let dy = position.y - group.position.y;
        group.position = position;

        for table in &mut self.tables {
            if table.primary_group() == Some(id) {
                table.position.x += dx;
                table.position.y += dy;
            }
        }
        Ok(())
    }

    /// Resize a group, returning the size actually applied.
    pub fn resize_group(&mut self, id: &str, size: Size) -> Result<Size, StateError> {
        let size = clamp_group_size(size);
        self.group_mut(id)?.size = size;
        Ok(size)
    }

    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.zoom = if zoom.is_finite() {
            zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            1.0
        };
        self.zoom
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.set_zoom(self.zoom + ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.set_zoom(self.zoom - ZOOM_STEP)
    }

    /// Tables whose name or any column name contains `term`, ignoring case.
    pub fn filter_tables(&self, term: &str) -> Vec<&Table> {
        let term = term.to_lowercase();
        self.tables
            .iter()
            .filter(|t| {
                t.name.to_lowercase().contains(&term)
                    || t.columns.iter().any(|c| c.name.to_lowercase().contains(&term))
            })
            .collect()
    }

    /// Distinct tables on the other end of `id`'s relationships.
    pub fn linked_tables(&self, id: &str) -> Vec<&Table> {
        let mut linked: Vec<&Table> = Vec::new();
        for rel in self
            .relationships
            .iter()
            .filter(|r| r.touches(id) && !r.is_self_ref())
        {
            let other = if rel.from_table_id == id {
                &rel.to_table_id
            } else {
                &rel.from_table_id
            };
            if let Some(table) = self.table(other) {
                if !linked.iter().any(|t| t.id == table.id) {
                    linked.push(table);
                }
            }
        }
        linked
    }

    /// Append the users/posts sample schema, skipping names already taken.
    pub fn import_samples(&mut self) -> usize {
        let group = self.groups.first().map(|g| g.id.clone());
        let samples = [
            (
                "users",
                "Application users registry",
                "#3b82f6",
                vec![
                    Column::key("id", ColumnType::Int),
                    Column::new("username", ColumnType::String),
                    Column::new("email", ColumnType::String),
                ],
                Point::new(200.0, 200.0),
            ),
            (
                "posts",
                "Blog posts content",
                "#ef4444",
                vec![
                    Column::key("id", ColumnType::Int),
                    Column::new("author_id", ColumnType::Int),
                    Column::new("title", ColumnType::String),
                ],
                Point::new(550.0, 300.0),
            ),
        ];

        let mut added = 0;
        for (name, description, color, columns, position) in samples {
            if self.table_by_name(name).is_some() {
                debug!(table = name, "sample table already present");
                continue;
            }
            let mut table = Table::new(name, columns);
            table.description = description.to_string();
            table.color = color.to_string();
            table.group_ids = group.iter().cloned().collect();
            table.position = position;
            self.tables.push(table);
            added += 1;
        }
        if added > 0 {
            info!(added, "imported sample tables");
            self.relink();
        }
        added
    }

    /// Drop everything and start again from the default state.
    pub fn reset(&mut self) {
        let autolink = std::mem::take(&mut self.autolink);
        *self = Self::default().with_autolink(autolink);
        info!("workspace reset");
    }

    pub fn layout(&self, engine: &LayoutEngine) -> DiagramLayout {
        engine.layout(&self.tables, &self.groups, &self.relationships)
    }
}

fn clamp_group_size(size: Size) -> Size {
    Size::new(
        size.width.max(MIN_GROUP_SIZE.width),
        size.height.max(MIN_GROUP_SIZE.height),
    )
}
