//! Output path resolution from templates.

use crate::config::{PathTemplates, OBJECT_NAME, PARENT_NAME, SCHEMA_NAME};
use crate::core::{Link, ObjectKind, TemplateKey};
use crate::error::{Result, SyncError};
use regex::Regex;
use std::sync::OnceLock;

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

fn placeholder_pattern() -> Result<&'static Regex> {
    if let Some(pattern) = PLACEHOLDER.get() {
        return Ok(pattern);
    }
    let pattern = Regex::new(r"\{\{[^}]*\}\}").map_err(|e| SyncError::Config(e.to_string()))?;
    let _ = PLACEHOLDER.set(pattern);
    PLACEHOLDER
        .get()
        .ok_or_else(|| SyncError::Config("placeholder pattern unavailable".into()))
}

/// Resolve the output path of one object or fill target.
///
/// `{{schema-name}}` and `{{object-name}}` are always substituted. For keys
/// that can carry a parent, `{{parent-name}}` comes from the links whose
/// `(kind, name)` match the object, the last match winning; fill targets are
/// their own parent. Any placeholder left afterwards fails the resolution.
pub fn resolve_path(
    key: TemplateKey,
    name: &str,
    schema_name: &str,
    templates: &PathTemplates,
    links: &[Link],
) -> Result<String> {
    let template = templates
        .get(key)
        .ok_or_else(|| SyncError::MissingTemplate(key.to_string()))?;

    let mut path = template
        .replace(SCHEMA_NAME, schema_name)
        .replace(OBJECT_NAME, name);

    if key.has_parent() {
        let parent = match key {
            TemplateKey::Object(kind) => parent_of(kind, name, links),
            TemplateKey::TableFillFull | TemplateKey::TableFillDemo => Some(name),
        };
        if let Some(parent) = parent {
            path = path.replace(PARENT_NAME, parent);
        }
    }

    let mut unresolved: Vec<String> = Vec::new();
    for m in placeholder_pattern()?.find_iter(&path) {
        if !unresolved.iter().any(|u| u == m.as_str()) {
            unresolved.push(m.as_str().to_string());
        }
    }
    if unresolved.is_empty() {
        Ok(path)
    } else {
        Err(SyncError::UnresolvedPlaceholders {
            path,
            placeholders: unresolved,
        })
    }
}

fn parent_of<'a>(kind: ObjectKind, name: &str, links: &'a [Link]) -> Option<&'a str> {
    links
        .iter()
        .filter(|l| l.kind == kind && l.name == name)
        .last()
        .map(|l| l.parent_name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObjectsConfig;

    fn templates() -> PathTemplates {
        let mut objects = ObjectsConfig::default();
        objects.table.dir = Some("out/{{schema-name}}/TABLE/{{object-name}}.sql".into());
        objects.view.dir = Some("out/{{schema-name}}/VIEW/{{parent-name}}.{{object-name}}.sql".into());
        objects.index.dir =
            Some("out/{{schema-name}}/INDEX/{{parent-name}}.{{object-name}}.sql".into());
        objects.trigger.dir =
            Some("out/{{schema-name}}/TRIGGER/{{parent-name}}/{{object-name}}.sql".into());
        objects.sequence.dir = Some("out/{{schema}}/{{object-name}}.{{ext}}.{{schema}}".into());
        objects.table_fill_demo.dir =
            Some("out/{{schema-name}}/DEMO/{{parent-name}}.sql".into());
        PathTemplates::from_config(&objects)
    }

    #[test]
    fn test_plain_substitution() {
        let path = resolve_path(
            TemplateKey::Object(ObjectKind::Table),
            "EMP",
            "HR",
            &templates(),
            &[],
        )
        .unwrap();
        assert_eq!(path, "out/HR/TABLE/EMP.sql");
    }

    #[test]
    fn test_index_parent_last_match_wins() {
        let links = vec![
            Link::to_table("OLD_EMP", ObjectKind::Index, "EMP_IDX"),
            Link::to_table("DEPT", ObjectKind::Index, "DEPT_IDX"),
            Link::to_table("EMP", ObjectKind::Index, "EMP_IDX"),
        ];
        let path = resolve_path(
            TemplateKey::Object(ObjectKind::Index),
            "EMP_IDX",
            "HR",
            &templates(),
            &links,
        )
        .unwrap();
        assert_eq!(path, "out/HR/INDEX/EMP.EMP_IDX.sql");
    }

    #[test]
    fn test_trigger_uses_trigger_links_only() {
        let links = vec![
            Link::to_table("DEPT", ObjectKind::Index, "EMP_BIU"),
            Link::to_table("EMP", ObjectKind::Trigger, "EMP_BIU"),
        ];
        let path = resolve_path(
            TemplateKey::Object(ObjectKind::Trigger),
            "EMP_BIU",
            "HR",
            &templates(),
            &links,
        )
        .unwrap();
        assert_eq!(path, "out/HR/TRIGGER/EMP/EMP_BIU.sql");
    }

    #[test]
    fn test_fill_target_is_its_own_parent() {
        let path = resolve_path(TemplateKey::TableFillDemo, "EMP", "HR", &templates(), &[]).unwrap();
        assert_eq!(path, "out/HR/DEMO/EMP.sql");
    }

    #[test]
    fn test_index_without_link_fails() {
        let err = resolve_path(
            TemplateKey::Object(ObjectKind::Index),
            "ORPHAN_IDX",
            "HR",
            &templates(),
            &[],
        )
        .unwrap_err();
        match err {
            SyncError::UnresolvedPlaceholders { placeholders, .. } => {
                assert_eq!(placeholders, vec!["{{parent-name}}".to_string()])
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parent_never_substituted_for_parentless_kind() {
        let links = vec![Link::to_table("EMP", ObjectKind::View, "V_EMP")];
        let err = resolve_path(
            TemplateKey::Object(ObjectKind::View),
            "V_EMP",
            "HR",
            &templates(),
            &links,
        )
        .unwrap_err();
        assert!(err.to_string().contains("{{parent-name}}"));
    }

    #[test]
    fn test_each_unresolved_placeholder_named_once() {
        let err = resolve_path(
            TemplateKey::Object(ObjectKind::Sequence),
            "SEQ",
            "HR",
            &templates(),
            &[],
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "bad filename \"out/{{schema}}/SEQ.{{ext}}.{{schema}}\", no value for placeholder(s) {{schema}}, {{ext}}"
        );
    }

    #[test]
    fn test_missing_template() {
        let err = resolve_path(
            TemplateKey::Object(ObjectKind::Synonym),
            "SYN",
            "HR",
            &templates(),
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::MissingTemplate(_)));
    }
}
