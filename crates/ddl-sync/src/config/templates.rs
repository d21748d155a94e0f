//! Output path templates keyed by object kind.

use super::ObjectsConfig;
use crate::core::{ObjectKind, TemplateKey};
use crate::error::{Result, SyncError};
use std::collections::BTreeMap;
use tracing::warn;

/// Placeholder replaced by the schema name.
pub const SCHEMA_NAME: &str = "{{schema-name}}";

/// Placeholder replaced by the object name.
pub const OBJECT_NAME: &str = "{{object-name}}";

/// Placeholder replaced by the parent table name.
pub const PARENT_NAME: &str = "{{parent-name}}";

/// Path template of every configured kind.
///
/// Keys without a template are simply absent; objects of those kinds are
/// ignored by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathTemplates {
    templates: BTreeMap<TemplateKey, String>,
}

impl PathTemplates {
    /// Collect the `dir` of every kind and both fill modes.
    pub fn from_config(objects: &ObjectsConfig) -> Self {
        let mut templates = BTreeMap::new();
        for key in TemplateKey::all() {
            let dir = match key {
                TemplateKey::Object(kind) => objects.output(kind).dir.as_ref(),
                TemplateKey::TableFillFull => objects.table_fill_full.dir.as_ref(),
                TemplateKey::TableFillDemo => objects.table_fill_demo.dir.as_ref(),
            };
            if let Some(dir) = dir {
                if dir.contains(PARENT_NAME) && !key.has_parent() {
                    warn!(
                        "template for {} uses {} but {} objects have no parent",
                        key, PARENT_NAME, key
                    );
                }
                templates.insert(key, dir.clone());
            }
        }
        Self { templates }
    }

    pub fn get(&self, key: TemplateKey) -> Option<&str> {
        self.templates.get(&key).map(String::as_str)
    }

    /// Whether objects of this kind are written.
    pub fn has_kind(&self, kind: ObjectKind) -> bool {
        self.templates.contains_key(&TemplateKey::Object(kind))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Fail when two keys share the same template string.
    pub fn check_unique(&self) -> Result<()> {
        let mut seen: BTreeMap<&str, Vec<TemplateKey>> = BTreeMap::new();
        for (key, template) in &self.templates {
            seen.entry(template.as_str()).or_default().push(*key);
        }

        let duplicates: Vec<String> = seen
            .into_iter()
            .filter(|(_, keys)| keys.len() > 1)
            .map(|(template, keys)| {
                let names: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
                format!("\"{}\" ({})", template, names.join(", "))
            })
            .collect();

        if duplicates.is_empty() {
            Ok(())
        } else {
            Err(SyncError::Config(format!(
                "duplicate path templates: {}",
                duplicates.join("; ")
            )))
        }
    }
}
