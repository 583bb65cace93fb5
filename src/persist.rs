//! Saving and restoring diagram state as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{Group, Relationship, Table};
use crate::state::DiagramState;

pub const STORAGE_KEY: &str = "sql-planner-state-v2";
pub const FORMAT_VERSION: &str = "2";

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid state JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk layout. Every field is optional so partial documents merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<Table>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Group>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Vec<Relationship>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl PersistedState {
    pub fn from_state(state: &DiagramState) -> Self {
        Self {
            tables: Some(state.tables.clone()),
            groups: Some(state.groups.clone()),
            relationships: Some(state.relationships.clone()),
            zoom: Some(state.zoom),
            last_updated: None,
            version: None,
        }
    }

    /// Overlay the fields present in this document onto `state`.
    pub fn merge_into(self, state: &mut DiagramState) {
        if let Some(tables) = self.tables {
            state.tables = tables;
        }
        // a document with an empty group list would break the one-group invariant
        if let Some(groups) = self.groups.filter(|g| !g.is_empty()) {
            state.groups = groups;
        }
        if let Some(relationships) = self.relationships {
            state.relationships = relationships;
        }
        if let Some(zoom) = self.zoom {
            state.set_zoom(zoom);
        }
        let repaired = state.repair_group_refs();
        if repaired > 0 {
            warn!(tables = repaired, "reassigned tables with unknown groups");
        }
    }
}

/// Parse `json` and merge it onto `state`.
pub fn merge_json(state: &mut DiagramState, json: &str) -> Result<(), PersistError> {
    let doc: PersistedState = serde_json::from_str(json)?;
    doc.merge_into(state);
    Ok(())
}

/// Restore state from `json`, falling back to the default state when it cannot be parsed.
pub fn load_or_default(json: &str) -> DiagramState {
    let mut state = DiagramState::default();
    if let Err(e) = merge_json(&mut state, json) {
        warn!(error = %e, "failed to parse saved state, starting empty");
        return DiagramState::default();
    }
    state
}

/// Compact form written to local storage after every change.
pub fn to_json(state: &DiagramState) -> Result<String, PersistError> {
    Ok(serde_json::to_string(&PersistedState::from_state(state))?)
}

/// Pretty export document stamped with `now` and the format version.
pub fn export_json(state: &DiagramState, now: DateTime<Utc>) -> Result<String, PersistError> {
    let doc = PersistedState {
        last_updated: Some(now),
        version: Some(FORMAT_VERSION.to_string()),
        ..PersistedState::from_state(state)
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("schema-{}.json", date.format("%Y-%m-%d"))
}

/// Key-value storage holding one serialized state.
pub trait StateStore {
    fn load(&self) -> Result<Option<String>, PersistError>;
    fn save(&mut self, json: &str) -> Result<(), PersistError>;
    fn clear(&mut self) -> Result<(), PersistError>;

    /// Load the stored state, or the default state if nothing usable is stored.
    fn restore(&self) -> DiagramState {
        match self.load() {
            Ok(Some(json)) => load_or_default(&json),
            Ok(None) => DiagramState::default(),
            Err(e) => {
                warn!(error = %e, "failed to read saved state, starting empty");
                DiagramState::default()
            }
        }
    }

    fn persist(&mut self, state: &DiagramState) -> Result<(), PersistError> {
        let json = to_json(state)?;
        self.save(&json)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    value: Option<String>,
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, PersistError> {
        Ok(self.value.clone())
    }

    fn save(&mut self, json: &str) -> Result<(), PersistError> {
        self.value = Some(json.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistError> {
        self.value = None;
        Ok(())
    }
}

/// Stores state in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StateStore for FileStore {
    fn load(&self) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(&self.path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&mut self, json: &str) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        debug!(path = %self.path.display(), bytes = json.len(), "saving state");
        fs::write(&self.path, json).map_err(|e| self.io_error(e))
    }

    fn clear(&mut self) -> Result<(), PersistError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}
