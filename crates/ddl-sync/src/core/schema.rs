//! Catalog model: schemas, their objects, parent links and fill targets.
//!
//! These types are built once per run by the catalog reader and never
//! mutated afterwards. Per-object processing state lives in the
//! orchestrator's state arena, indexed by the position of the object
//! inside its schema.

use super::kind::{FillMode, ObjectKind, TemplateKey};
use serde::{Deserialize, Serialize};

/// Outcome of processing one object or fill target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectState {
    /// Not processed yet.
    #[default]
    Unprocessed,
    /// Existing file already matched the database.
    NoChange,
    /// File did not exist (or was empty) and was created.
    Insert,
    /// File existed with different content and was rewritten.
    Update,
    /// Path resolution, read, fetch or write failed.
    Error,
    /// No output path configured for the kind.
    Ignore,
}

impl ObjectState {
    /// Whether the state can no longer change within a run.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ObjectState::Unprocessed)
    }
}

/// One catalog object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbObject {
    pub kind: ObjectKind,
    pub name: String,
}

impl DbObject {
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Parent → child relation used only to fill `{{parent-name}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub parent_kind: ObjectKind,
    pub parent_name: String,
    pub kind: ObjectKind,
    pub name: String,
}

impl Link {
    /// Link from a table to one of its dependents.
    pub fn to_table(table: impl Into<String>, kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            parent_kind: ObjectKind::Table,
            parent_name: table.into(),
            kind,
            name: name.into(),
        }
    }
}

/// Table selected for a data dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillTarget {
    /// Table name.
    pub name: String,

    /// Primary key columns in key order.
    pub primary_key: Vec<String>,

    /// Dump mode.
    pub mode: FillMode,

    /// Row limit, only used in demo mode.
    pub count: u32,
}

impl FillTarget {
    pub fn template_key(&self) -> TemplateKey {
        TemplateKey::for_fill(self.mode)
    }
}

/// A target schema with everything enumerated for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,

    /// Objects in processing order.
    pub objects: Vec<DbObject>,

    pub links: Vec<Link>,

    pub fill_targets: Vec<FillTarget>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// True when there is nothing to process.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.fill_targets.is_empty()
    }

    /// Distinct object kinds in first-seen order with their counts.
    pub fn kind_counts(&self) -> Vec<(ObjectKind, usize)> {
        let mut counts: Vec<(ObjectKind, usize)> = Vec::new();
        for object in &self.objects {
            match counts.iter_mut().find(|(kind, _)| *kind == object.kind) {
                Some((_, count)) => *count += 1,
                None => counts.push((object.kind, 1)),
            }
        }
        counts
    }

    /// Number of fill targets in the given mode.
    pub fn fill_count(&self, mode: FillMode) -> usize {
        self.fill_targets.iter().filter(|t| t.mode == mode).count()
    }
}
