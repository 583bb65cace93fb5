//! Relationship inference from matching column names.
//!
//! Every unordered pair of tables is scanned in input order. Two columns
//! match when their names are equal ignoring case (and, under
//! [`MatchMode::NameAndType`], their types agree). A match that is not
//! already covered by a relationship in either direction yields a new
//! `1:1` link from the earlier table to the later one.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Column, RelationType, Relationship, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    NameOnly,
    #[default]
    NameAndType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkGranularity {
    /// One relationship per matching column pair.
    #[default]
    Column,
    /// One table-to-table relationship per matching table pair, without column references.
    Table,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AutoLinkOptions {
    pub match_mode: MatchMode,
    pub granularity: LinkGranularity,
    /// Fact tables never link to each other.
    pub skip_fact_pairs: bool,
    pub fact_prefix: String,
    /// Two key columns never link to each other (surrogate `id` keys).
    pub skip_key_pairs: bool,
}

impl Default for AutoLinkOptions {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::NameAndType,
            granularity: LinkGranularity::Column,
            skip_fact_pairs: true,
            fact_prefix: "FCT".to_string(),
            skip_key_pairs: true,
        }
    }
}

impl AutoLinkOptions {
    /// Unconditional name matching with table-level links.
    ///
    /// Links still run from the earlier table to the later one in input order,
    /// whichever of the two was added last.
    pub fn loose() -> Self {
        Self {
            match_mode: MatchMode::NameOnly,
            granularity: LinkGranularity::Table,
            skip_fact_pairs: false,
            skip_key_pairs: false,
            ..Self::default()
        }
    }

    fn is_fact_table(&self, table: &Table) -> bool {
        let prefix = self.fact_prefix.as_bytes();
        let name = table.name.as_bytes();
        !prefix.is_empty()
            && name.len() >= prefix.len()
            && name[..prefix.len()].eq_ignore_ascii_case(prefix)
    }

    fn columns_match(&self, a: &Column, b: &Column) -> bool {
        if a.name.trim().is_empty() || b.name.trim().is_empty() {
            return false;
        }
        if self.skip_key_pairs && a.is_key && b.is_key {
            return false;
        }
        if !names_equal(&a.name, &b.name) {
            return false;
        }
        match self.match_mode {
            MatchMode::NameOnly => true,
            MatchMode::NameAndType => a.typ == b.typ,
        }
    }
}

fn names_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// Result of an auto-link pass.
#[derive(Debug, Clone, PartialEq)]
pub enum AutoLinkOutcome {
    NoChange,
    /// Newly synthesized relationships in pair order, then column order.
    Created(Vec<Relationship>),
}

impl AutoLinkOutcome {
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    pub fn created(&self) -> &[Relationship] {
        match self {
            Self::NoChange => &[],
            Self::Created(rels) => rels,
        }
    }

    /// Append the new relationships, returning how many were added.
    pub fn apply(self, relationships: &mut Vec<Relationship>) -> usize {
        match self {
            Self::NoChange => 0,
            Self::Created(rels) => {
                let n = rels.len();
                relationships.extend(rels);
                n
            }
        }
    }
}

/// Compute the relationships implied by matching columns that do not exist yet.
pub fn compute_auto_links(
    tables: &[Table],
    existing: &[Relationship],
    options: &AutoLinkOptions,
) -> AutoLinkOutcome {
    let mut created: Vec<Relationship> = Vec::new();

    for (i, a) in tables.iter().enumerate() {
        for b in &tables[i + 1..] {
            if a.id == b.id {
                continue;
            }
            if options.skip_fact_pairs && options.is_fact_table(a) && options.is_fact_table(b) {
                debug!(from = %a.name, to = %b.name, "skipping fact table pair");
                continue;
            }

            match options.granularity {
                LinkGranularity::Column => link_columns(a, b, existing, options, &mut created),
                LinkGranularity::Table => link_tables(a, b, existing, options, &mut created),
            }
        }
    }

    if created.is_empty() {
        AutoLinkOutcome::NoChange
    } else {
        AutoLinkOutcome::Created(created)
    }
}

fn link_columns(
    a: &Table,
    b: &Table,
    existing: &[Relationship],
    options: &AutoLinkOptions,
    created: &mut Vec<Relationship>,
) {
    for col_a in &a.columns {
        for col_b in &b.columns {
            if !options.columns_match(col_a, col_b) {
                continue;
            }
            let linked = existing
                .iter()
                .chain(created.iter())
                .any(|r| r.connects(&a.id, &col_a.id, &b.id, &col_b.id));
            if linked {
                continue;
            }

            debug!(
                from = %a.name,
                to = %b.name,
                column = %col_a.name,
                "auto-linking matching columns"
            );
            created.push(Relationship::between_columns(
                &a.id,
                &col_a.id,
                &b.id,
                &col_b.id,
                RelationType::OneToOne,
            ));
        }
    }
}

fn link_tables(
    a: &Table,
    b: &Table,
    existing: &[Relationship],
    options: &AutoLinkOptions,
    created: &mut Vec<Relationship>,
) {
    let has_match = a
        .columns
        .iter()
        .any(|col_a| b.columns.iter().any(|col_b| options.columns_match(col_a, col_b)));
    if !has_match {
        return;
    }
    let linked = existing
        .iter()
        .chain(created.iter())
        .any(|r| r.joins_tables(&a.id, &b.id));
    if linked {
        return;
    }

    debug!(from = %a.name, to = %b.name, "auto-linking tables");
    created.push(Relationship::between_tables(&a.id, &b.id, RelationType::OneToOne));
}
