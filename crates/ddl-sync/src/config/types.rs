//! Configuration type definitions.

use crate::core::{FillMode, ObjectKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log file settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Database connection (Oracle via ODBC).
    pub connection: ConnectionConfig,

    /// What to extract and where to write it.
    pub objects: ObjectsConfig,
}

/// Log file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Directory for log files.
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    /// File naming mode (default: rewrite).
    #[serde(default)]
    pub mode: LogMode,

    /// File name prefix (default: "ddl-sync").
    #[serde(default = "default_log_prefix")]
    pub prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            mode: LogMode::default(),
            prefix: default_log_prefix(),
        }
    }
}

/// Log file naming mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogMode {
    /// Fixed file names, truncated on every run.
    #[default]
    Rewrite,

    /// New timestamped files on every run.
    Append,
}

/// Database connection configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database host.
    pub host: String,

    /// Listener port (default: 1521).
    #[serde(default = "default_oracle_port")]
    pub port: u16,

    /// Service name.
    pub service: String,

    /// Username.
    pub login: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// Name of the installed ODBC driver.
    #[serde(default = "default_odbc_driver")]
    pub odbc_driver: String,
}

impl ConnectionConfig {
    /// `host:port/service` for logs and connect strings.
    pub fn address(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.service)
    }

    /// Build an ODBC connection string.
    ///
    /// Credentials are braced so `;` and `}` inside them survive.
    pub fn connection_string(&self) -> String {
        format!(
            "Driver={{{}}};DBQ={};UID={};PWD={};",
            self.odbc_driver,
            self.address(),
            braced(&self.login),
            braced(&self.password)
        )
    }
}

/// `{value}` with every `}` doubled, as ODBC attribute values expect.
fn braced(value: &str) -> String {
    format!("{{{}}}", value.replace('}', "}}"))
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("service", &self.service)
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .field("odbc_driver", &self.odbc_driver)
            .finish()
    }
}

/// Object selection and output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectsConfig {
    /// Which schemas to process.
    #[serde(default)]
    pub schema: SchemaFilter,

    /// Storage clauses in table and materialized view DDL.
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub table: OutputConfig,
    #[serde(default)]
    pub view: OutputConfig,
    #[serde(default)]
    pub materialized_view: OutputConfig,
    #[serde(default)]
    pub index: OutputConfig,
    #[serde(default)]
    pub trigger: OutputConfig,
    #[serde(default)]
    pub package: OutputConfig,
    /// When unset, package spec and body share the package file.
    #[serde(default)]
    pub package_body: OutputConfig,
    #[serde(default)]
    pub procedure: OutputConfig,
    #[serde(default)]
    pub function: OutputConfig,
    #[serde(default, rename = "type")]
    pub r#type: OutputConfig,
    /// When unset, type spec and body share the type file.
    #[serde(default)]
    pub type_body: OutputConfig,
    #[serde(default)]
    pub sequence: OutputConfig,
    #[serde(default)]
    pub synonym: OutputConfig,
    #[serde(default)]
    pub job: OutputConfig,

    /// Complete data dumps for listed tables.
    #[serde(default)]
    pub table_fill_full: FillFullConfig,

    /// Short data samples for every other table with a primary key.
    #[serde(default)]
    pub table_fill_demo: FillDemoConfig,
}

impl ObjectsConfig {
    /// Output settings of an object kind.
    pub fn output(&self, kind: ObjectKind) -> &OutputConfig {
        match kind {
            ObjectKind::Table => &self.table,
            ObjectKind::View => &self.view,
            ObjectKind::MaterializedView => &self.materialized_view,
            ObjectKind::Index => &self.index,
            ObjectKind::Trigger => &self.trigger,
            ObjectKind::Package => &self.package,
            ObjectKind::PackageBody => &self.package_body,
            ObjectKind::Procedure => &self.procedure,
            ObjectKind::Function => &self.function,
            ObjectKind::Type => &self.r#type,
            ObjectKind::TypeBody => &self.type_body,
            ObjectKind::Sequence => &self.sequence,
            ObjectKind::Synonym => &self.synonym,
            ObjectKind::Job => &self.job,
        }
    }

    /// Whether a fill mode has an output path.
    pub fn fill_enabled(&self, mode: FillMode) -> bool {
        match mode {
            FillMode::Full => self.table_fill_full.dir.is_some(),
            FillMode::Demo => self.table_fill_demo.dir.is_some() && self.table_fill_demo.count() > 0,
        }
    }

    /// Whether an existing non-empty fill script is left alone.
    pub fn fill_ignore_exists(&self, mode: FillMode) -> bool {
        match mode {
            FillMode::Full => self.table_fill_full.ignore_exists,
            FillMode::Demo => self.table_fill_demo.ignore_exists,
        }
    }

    /// Whether package/type bodies get their own files.
    pub fn separate_bodies(&self) -> bool {
        self.package_body.dir.is_some() || self.type_body.dir.is_some()
    }
}

/// Schema include/exclude policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaFilter {
    /// Schema names, compared case-insensitively.
    #[serde(default)]
    pub list: Vec<String>,

    /// How the list is applied (default: include).
    #[serde(default)]
    pub mode: SchemaMode,
}

impl SchemaFilter {
    /// Apply the policy to the catalog's schema list, keeping catalog order.
    pub fn apply(&self, catalog: &[String]) -> Vec<String> {
        let listed: Vec<String> = self.list.iter().map(|s| s.to_uppercase()).collect();
        catalog
            .iter()
            .filter(|name| {
                let hit = listed.contains(&name.to_uppercase());
                match self.mode {
                    SchemaMode::Include => hit,
                    SchemaMode::Exclude => !hit,
                }
            })
            .cloned()
            .collect()
    }
}

/// Schema list mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaMode {
    /// Process only listed schemas.
    #[default]
    Include,

    /// Process every schema except the listed ones.
    #[serde(alias = "except")]
    Exclude,
}

/// Storage clause switches for extracted DDL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Keep STORAGE (INITIAL, NEXT, MINEXTENTS...) clauses.
    #[serde(default)]
    pub allow_storage: bool,

    /// Keep TABLESPACE clauses.
    #[serde(default)]
    pub allow_tablespace: bool,
}

/// Output path template of one kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Path template; absent means the kind is not written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// Full data dump configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FillFullConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    /// Tables to dump completely, as `SCHEMA.TABLE`.
    #[serde(default)]
    pub list: Vec<String>,

    /// Keep an existing non-empty script instead of regenerating it.
    #[serde(default)]
    pub ignore_exists: bool,
}

/// Demo data dump configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FillDemoConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    /// Rows per table (default: 3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    /// Keep an existing non-empty script instead of regenerating it.
    #[serde(default)]
    pub ignore_exists: bool,
}

impl FillDemoConfig {
    pub fn count(&self) -> u32 {
        self.count.unwrap_or(DEFAULT_DEMO_COUNT)
    }
}

/// Rows per demo dump when no count is configured.
pub const DEFAULT_DEMO_COUNT: u32 = 3;

// Default value functions for serde
fn default_log_dir() -> PathBuf {
    PathBuf::from("log")
}

fn default_log_prefix() -> String {
    "ddl-sync".to_string()
}

fn default_oracle_port() -> u16 {
    1521
}

fn default_odbc_driver() -> String {
    "Oracle 21 ODBC driver".to_string()
}
