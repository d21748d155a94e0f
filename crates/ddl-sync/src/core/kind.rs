//! Object kinds and template keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog object kind.
///
/// Closed set: anything else the catalog reports is not mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectKind {
    Table,
    View,
    MaterializedView,
    Index,
    Trigger,
    Package,
    PackageBody,
    Procedure,
    Function,
    Type,
    TypeBody,
    Sequence,
    Synonym,
    Job,
}

impl ObjectKind {
    /// Every kind, in declaration order.
    pub const ALL: [ObjectKind; 14] = [
        ObjectKind::Table,
        ObjectKind::View,
        ObjectKind::MaterializedView,
        ObjectKind::Index,
        ObjectKind::Trigger,
        ObjectKind::Package,
        ObjectKind::PackageBody,
        ObjectKind::Procedure,
        ObjectKind::Function,
        ObjectKind::Type,
        ObjectKind::TypeBody,
        ObjectKind::Sequence,
        ObjectKind::Synonym,
        ObjectKind::Job,
    ];

    /// Name used in logs and in the catalog after `' '` → `'_'`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Table => "TABLE",
            ObjectKind::View => "VIEW",
            ObjectKind::MaterializedView => "MATERIALIZED_VIEW",
            ObjectKind::Index => "INDEX",
            ObjectKind::Trigger => "TRIGGER",
            ObjectKind::Package => "PACKAGE",
            ObjectKind::PackageBody => "PACKAGE_BODY",
            ObjectKind::Procedure => "PROCEDURE",
            ObjectKind::Function => "FUNCTION",
            ObjectKind::Type => "TYPE",
            ObjectKind::TypeBody => "TYPE_BODY",
            ObjectKind::Sequence => "SEQUENCE",
            ObjectKind::Synonym => "SYNONYM",
            ObjectKind::Job => "JOB",
        }
    }

    /// `OBJECT_TYPE` value as stored in `ALL_OBJECTS`.
    pub fn catalog_name(&self) -> &'static str {
        match self {
            ObjectKind::MaterializedView => "MATERIALIZED VIEW",
            ObjectKind::PackageBody => "PACKAGE BODY",
            ObjectKind::TypeBody => "TYPE BODY",
            other => other.as_str(),
        }
    }

    /// Parse a catalog object type, accepting both `' '` and `'_'` separators.
    pub fn from_catalog(name: &str) -> Option<Self> {
        let normalized = name.trim().to_uppercase().replace(' ', "_");
        ObjectKind::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
    }

    /// Object type argument for `DBMS_METADATA.GET_DDL`.
    pub fn metadata_name(&self) -> &'static str {
        match self {
            ObjectKind::Job => "PROCOBJ",
            other => other.as_str(),
        }
    }

    /// Kinds whose output path may reference a parent table.
    pub fn has_parent(&self) -> bool {
        matches!(self, ObjectKind::Index | ObjectKind::Trigger)
    }

    /// Kinds whose extracted text goes through the SQL pretty-printer.
    pub fn is_declarative(&self) -> bool {
        matches!(
            self,
            ObjectKind::Table
                | ObjectKind::View
                | ObjectKind::MaterializedView
                | ObjectKind::Index
                | ObjectKind::Sequence
                | ObjectKind::Job
        )
    }

    /// Body kind stored after its spec kind.
    pub fn is_body(&self) -> bool {
        matches!(self, ObjectKind::PackageBody | ObjectKind::TypeBody)
    }

    /// Processing priority: tables, then views, then the rest, bodies last.
    pub fn priority(&self) -> u8 {
        match self {
            ObjectKind::Table => 0,
            ObjectKind::View => 1,
            k if k.is_body() => 3,
            _ => 2,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data dump mode of a fill target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    /// Every row, ascending by primary key.
    Full,
    /// A few rows, descending by primary key with nulls last.
    Demo,
}

impl FillMode {
    /// Label used in statistics.
    pub fn label(&self) -> &'static str {
        match self {
            FillMode::Full => "TABLE FILL FULL",
            FillMode::Demo => "TABLE FILL DEMO",
        }
    }
}

/// Lookup key of the path template dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplateKey {
    Object(ObjectKind),
    TableFillFull,
    TableFillDemo,
}

impl TemplateKey {
    /// Every key, objects first.
    pub fn all() -> impl Iterator<Item = TemplateKey> {
        ObjectKind::ALL
            .into_iter()
            .map(TemplateKey::Object)
            .chain([TemplateKey::TableFillFull, TemplateKey::TableFillDemo])
    }

    pub fn for_fill(mode: FillMode) -> Self {
        match mode {
            FillMode::Full => TemplateKey::TableFillFull,
            FillMode::Demo => TemplateKey::TableFillDemo,
        }
    }

    /// Whether `{{parent-name}}` can be resolved for this key.
    pub fn has_parent(&self) -> bool {
        match self {
            TemplateKey::Object(kind) => kind.has_parent(),
            TemplateKey::TableFillFull | TemplateKey::TableFillDemo => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKey::Object(kind) => kind.as_str(),
            TemplateKey::TableFillFull => "TABLE_FILL_FULL",
            TemplateKey::TableFillDemo => "TABLE_FILL_DEMO",
        }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
