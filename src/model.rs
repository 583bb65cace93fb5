//! Tables, groups and relationships as they are stored and exchanged.

use serde::{Deserialize, Serialize};

pub type TableId = String;
pub type ColumnId = String;
pub type GroupId = String;
pub type RelationshipId = String;

pub const DEFAULT_COLORS: [&str; 8] = [
    "#3b82f6", "#ef4444", "#10b981", "#f59e0b", "#8b5cf6", "#ec4899", "#06b6d4", "#6366f1",
];

pub const DEFAULT_GROUP_ID: &str = "default";
pub const DEFAULT_GROUP_NAME: &str = "Main Project";

/// Fresh opaque identifier for any entity.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColumnType {
    #[serde(rename = "INT", alias = "int", alias = "Int")]
    Int,
    #[serde(rename = "NUMERIC", alias = "numeric", alias = "Numeric")]
    Numeric,
    #[default]
    #[serde(rename = "STRING", alias = "string", alias = "String")]
    String,
    #[serde(rename = "DATE", alias = "date", alias = "Date")]
    Date,
    #[serde(rename = "DATETIME", alias = "datetime", alias = "Datetime")]
    Datetime,
    #[serde(rename = "BOOLEAN", alias = "boolean", alias = "Boolean")]
    Boolean,
    #[serde(rename = "BINARY", alias = "binary", alias = "Binary")]
    Binary,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "INT",
            Self::Numeric => "NUMERIC",
            Self::String => "STRING",
            Self::Date => "DATE",
            Self::Datetime => "DATETIME",
            Self::Boolean => "BOOLEAN",
            Self::Binary => "BINARY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub name: String,
    #[serde(default)]
    pub is_key: bool,
    #[serde(default, rename = "type")]
    pub typ: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, typ: ColumnType) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            is_key: false,
            typ,
        }
    }

    pub fn key(name: impl Into<String>, typ: ColumnType) -> Self {
        Self {
            is_key: true,
            ..Self::new(name, typ)
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: TableId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub group_ids: Vec<GroupId>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub position: Point,
    #[serde(default)]
    pub is_collapsed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TableMetadata>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            description: String::new(),
            color: DEFAULT_COLORS[0].to_string(),
            group_ids: vec![DEFAULT_GROUP_ID.to_string()],
            columns,
            position: Point::default(),
            is_collapsed: false,
            metadata: None,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Point::new(x, y);
        self
    }

    /// The group whose drag movement carries this table along.
    pub fn primary_group(&self) -> Option<&str> {
        self.group_ids.first().map(|s| s.as_str())
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn column_index(&self, id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default = "default_group_position")]
    pub position: Point,
    #[serde(default)]
    pub size: Size,
}

fn default_group_position() -> Point {
    Point::new(40.0, 40.0)
}

impl Group {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            color: color.into(),
            position: default_group_position(),
            size: Size::default(),
        }
    }

    pub fn default_group() -> Self {
        Self {
            id: DEFAULT_GROUP_ID.to_string(),
            ..Self::new(DEFAULT_GROUP_NAME, DEFAULT_COLORS[0])
        }
    }
}

/// Multiplicity of one relationship endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RelationType {
    #[default]
    #[serde(rename = "1:1")]
    OneToOne,
    #[serde(rename = "1:N")]
    OneToMany,
    #[serde(rename = "N:1")]
    ManyToOne,
    #[serde(rename = "N:N")]
    ManyToMany,
}

impl RelationType {
    pub const ALL: [RelationType; 4] = [
        Self::OneToOne,
        Self::OneToMany,
        Self::ManyToOne,
        Self::ManyToMany,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneToOne => "1:1",
            Self::OneToMany => "1:N",
            Self::ManyToOne => "N:1",
            Self::ManyToMany => "N:N",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str().eq_ignore_ascii_case(s))
    }

    pub fn from_side(&self) -> Cardinality {
        match self {
            Self::OneToOne | Self::OneToMany => Cardinality::One,
            Self::ManyToOne | Self::ManyToMany => Cardinality::Many,
        }
    }

    pub fn to_side(&self) -> Cardinality {
        match self {
            Self::OneToOne | Self::ManyToOne => Cardinality::One,
            Self::OneToMany | Self::ManyToMany => Cardinality::Many,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: RelationshipId,
    pub from_table_id: TableId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_column_id: Option<ColumnId>,
    pub to_table_id: TableId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_column_id: Option<ColumnId>,
    #[serde(rename = "type", default)]
    pub typ: RelationType,
}

impl Relationship {
    pub fn between_columns(
        from_table: &str,
        from_column: &str,
        to_table: &str,
        to_column: &str,
        typ: RelationType,
    ) -> Self {
        Self {
            id: new_id(),
            from_table_id: from_table.to_string(),
            from_column_id: Some(from_column.to_string()),
            to_table_id: to_table.to_string(),
            to_column_id: Some(to_column.to_string()),
            typ,
        }
    }

    pub fn between_tables(from_table: &str, to_table: &str, typ: RelationType) -> Self {
        Self {
            id: new_id(),
            from_table_id: from_table.to_string(),
            from_column_id: None,
            to_table_id: to_table.to_string(),
            to_column_id: None,
            typ,
        }
    }

    /// Undirected test for a link between two (table, column) endpoints.
    pub fn connects(&self, a_table: &str, a_column: &str, b_table: &str, b_column: &str) -> bool {
        let from = (self.from_table_id.as_str(), self.from_column_id.as_deref());
        let to = (self.to_table_id.as_str(), self.to_column_id.as_deref());
        let a = (a_table, Some(a_column));
        let b = (b_table, Some(b_column));
        (from == a && to == b) || (from == b && to == a)
    }

    /// Undirected test for any link between two tables.
    pub fn joins_tables(&self, a: &str, b: &str) -> bool {
        (self.from_table_id == a && self.to_table_id == b)
            || (self.from_table_id == b && self.to_table_id == a)
    }

    pub fn touches(&self, table_id: &str) -> bool {
        self.from_table_id == table_id || self.to_table_id == table_id
    }

    pub fn is_self_ref(&self) -> bool {
        self.from_table_id == self.to_table_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_type_sides() {
        assert_eq!(RelationType::OneToMany.from_side(), Cardinality::One);
        assert_eq!(RelationType::OneToMany.to_side(), Cardinality::Many);
        assert_eq!(RelationType::ManyToOne.from_side(), Cardinality::Many);
        assert_eq!(RelationType::ManyToOne.to_side(), Cardinality::One);
        assert_eq!(RelationType::from_str("n:n"), Some(RelationType::ManyToMany));
        assert_eq!(RelationType::from_str("2:1"), None);
    }

    #[test]
    fn test_connects_is_undirected() {
        let rel = Relationship::between_columns("a", "a1", "b", "b1", RelationType::OneToOne);
        assert!(rel.connects("a", "a1", "b", "b1"));
        assert!(rel.connects("b", "b1", "a", "a1"));
        assert!(!rel.connects("a", "a2", "b", "b1"));
        assert!(rel.joins_tables("b", "a"));
    }

    #[test]
    fn test_table_level_link_never_connects_columns() {
        let rel = Relationship::between_tables("a", "b", RelationType::OneToOne);
        assert!(!rel.connects("a", "x", "b", "y"));
        assert!(rel.joins_tables("a", "b"));
    }

    #[test]
    fn test_column_serialization() {
        let col = Column::key("id", ColumnType::Int).with_id("c1");
        let json = serde_json::to_string(&col).unwrap();
        assert_eq!(json, r#"{"id":"c1","name":"id","isKey":true,"type":"INT"}"#);
    }

    #[test]
    fn test_early_variant_records_load_with_defaults() {
        let table: Table = serde_json::from_str(
            r#"{"id":"t1","name":"users","columns":[{"id":"c1","name":"email","isKey":false}]}"#,
        )
        .unwrap();
        assert_eq!(table.columns[0].typ, ColumnType::String);
        assert!(!table.is_collapsed);
        assert!(table.metadata.is_none());

        let group: Group =
            serde_json::from_str(r##"{"id":"g","name":"Main","color":"#000"}"##).unwrap();
        assert_eq!(group.size, Size::default());

        let rel: Relationship = serde_json::from_str(
            r#"{"id":"r","fromTableId":"a","toTableId":"b","type":"1:N"}"#,
        )
        .unwrap();
        assert_eq!(rel.from_column_id, None);
        assert_eq!(rel.typ, RelationType::OneToMany);
    }

    #[test]
    fn test_lowercase_type_alias() {
        let col: Column = serde_json::from_str(r#"{"id":"c","name":"d","type":"datetime"}"#).unwrap();
        assert_eq!(col.typ, ColumnType::Datetime);
    }
}
