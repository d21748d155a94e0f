//! Configuration loading and validation.

mod templates;
mod types;
mod validation;

pub use templates::{PathTemplates, OBJECT_NAME, PARENT_NAME, SCHEMA_NAME};
pub use types::*;

use crate::error::Result;
use std::path::Path;

/// Starter configuration written by `ddl-sync init`.
const CONFIG_TEMPLATE: &str = r#"# ddl-sync configuration
log:
  dir: ./log
  # rewrite: fixed file names, truncated on every run
  # append: new timestamped files on every run
  mode: rewrite

connection:
  host: localhost
  port: 1521
  service: XEPDB1
  login: SCOTT
  password: tiger
  odbc_driver: Oracle 21 ODBC driver

objects:
  schema:
    # include: only listed schemas, exclude: every schema but the listed ones
    mode: include
    list: [SCOTT]
  storage:
    allow_storage: false
    allow_tablespace: false

  # Remove a kind (or its dir) to skip it.
  # Placeholders: {{schema-name}}, {{object-name}}, {{parent-name}} (index, trigger, fills)
  table:
    dir: "out/{{schema-name}}/TABLE/{{object-name}}.sql"
  view:
    dir: "out/{{schema-name}}/VIEW/{{object-name}}.sql"
  materialized_view:
    dir: "out/{{schema-name}}/MATERIALIZED_VIEW/{{object-name}}.sql"
  index:
    dir: "out/{{schema-name}}/INDEX/{{parent-name}}.{{object-name}}.sql"
  trigger:
    dir: "out/{{schema-name}}/TRIGGER/{{parent-name}}.{{object-name}}.sql"
  package:
    dir: "out/{{schema-name}}/PACKAGE/{{object-name}}.sql"
  # Without package_body/type_body the body is stored in the spec file.
  # package_body:
  #   dir: "out/{{schema-name}}/PACKAGE_BODY/{{object-name}}.sql"
  procedure:
    dir: "out/{{schema-name}}/PROCEDURE/{{object-name}}.sql"
  function:
    dir: "out/{{schema-name}}/FUNCTION/{{object-name}}.sql"
  type:
    dir: "out/{{schema-name}}/TYPE/{{object-name}}.sql"
  # type_body:
  #   dir: "out/{{schema-name}}/TYPE_BODY/{{object-name}}.sql"
  sequence:
    dir: "out/{{schema-name}}/SEQUENCE/{{object-name}}.sql"
  synonym:
    dir: "out/{{schema-name}}/SYNONYM/{{object-name}}.sql"
  job:
    dir: "out/{{schema-name}}/JOB/{{object-name}}.sql"

  # Complete dumps of the listed tables (SCHEMA.TABLE).
  table_fill_full:
    dir: "out/{{schema-name}}/TABLE_FILL_FULL/{{object-name}}.sql"
    list: []
    ignore_exists: false

  # A few rows of every other table with a primary key.
  table_fill_demo:
    dir: "out/{{schema-name}}/TABLE_FILL_DEMO/{{object-name}}.sql"
    count: 3
    ignore_exists: true
"#;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Commented starter configuration.
    pub fn template() -> &'static str {
        CONFIG_TEMPLATE
    }

    /// Path templates of every configured kind.
    pub fn path_templates(&self) -> PathTemplates {
        PathTemplates::from_config(&self.objects)
    }

    /// PL/SQL block run once per session to shape `DBMS_METADATA` output.
    pub fn session_init_script(&self) -> String {
        let params = [
            ("SQLTERMINATOR", true),
            ("CONSTRAINTS", true),
            ("REF_CONSTRAINTS", true),
            ("EMIT_SCHEMA", true),
            ("CONSTRAINTS_AS_ALTER", false),
            ("STORAGE", self.objects.storage.allow_storage),
            ("TABLESPACE", self.objects.storage.allow_tablespace),
            ("BODY", !self.objects.separate_bodies()),
        ];

        let mut script = String::from("BEGIN\n");
        for (name, enabled) in params {
            script.push_str(&format!(
                "  DBMS_METADATA.SET_TRANSFORM_PARAM(DBMS_METADATA.SESSION_TRANSFORM, '{}', {});\n",
                name,
                if enabled { "TRUE" } else { "FALSE" }
            ));
        }
        script.push_str("END;");
        script
    }
}
