//! Sync engine - main workflow coordinator.

mod state;

pub use state::RunState;

use crate::catalog::CatalogReader;
use crate::config::{Config, PathTemplates};
use crate::connection::{ConnectionManager, Driver};
use crate::core::{DbObject, FillTarget, Link, ObjectState, Schema, TemplateKey};
use crate::ddl::{trim_script, DdlFetcher};
use crate::error::Result;
use crate::fill::FillFetcher;
use crate::fs::FileStore;
use crate::path::resolve_path;
use crate::stats::StatsReporter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{error, info};

/// Result of a sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Target schemas enumerated.
    pub schemas: usize,

    /// Objects and fill targets processed (ignored ones excluded).
    pub processed: usize,

    /// Files created.
    pub inserted: usize,

    /// Files rewritten.
    pub updated: usize,

    /// Files already up to date.
    pub unchanged: usize,

    /// Objects that failed.
    pub errors: usize,

    /// Objects of kinds without an output path.
    pub ignored: usize,
}

impl RunSummary {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Formats the `[NN.N%]` progress prefix.
struct Progress {
    done: usize,
    total: usize,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self { done: 0, total }
    }

    fn advance(&mut self) -> String {
        self.done += 1;
        progress_label(self.done, self.total)
    }
}

fn progress_label(done: usize, total: usize) -> String {
    let percent = if total == 0 {
        100.0
    } else {
        done as f64 * 100.0 / total as f64
    };
    format!("{:0>5}", format!("{:.1}%", percent))
}

/// Drives one sync run over a single connection.
pub struct SyncEngine<'a, D: Driver, F: FileStore> {
    conn: &'a ConnectionManager<D>,
    config: &'a Config,
    templates: PathTemplates,
    files: F,
}

impl<'a, D: Driver, F: FileStore> SyncEngine<'a, D, F> {
    pub fn new(conn: &'a ConnectionManager<D>, config: &'a Config, files: F) -> Self {
        Self {
            conn,
            config,
            templates: config.path_templates(),
            files,
        }
    }

    /// Run the sync.
    ///
    /// Catalog failures abort the run. Failures of single objects are
    /// logged, recorded as `error` and never stop the run.
    pub async fn run(&self) -> Result<RunSummary> {
        let started_at = Utc::now();

        let schemas = CatalogReader::new(self.conn, &self.config.objects)
            .read()
            .await?;
        let mut state = RunState::new(&schemas);

        let stats = StatsReporter::new(&self.templates);
        for (index, kinds) in stats.pre_run(&schemas).iter().enumerate() {
            state.ignore_kinds(index, &schemas[index], kinds);
        }

        let mut progress = Progress::new(state.pending());

        for (si, schema) in schemas.iter().enumerate() {
            if schema.is_empty() {
                continue;
            }
            info!("start schema \"{}\"", schema.name);

            for (oi, object) in schema.objects.iter().enumerate() {
                if state.object(si, oi) == ObjectState::Ignore {
                    continue;
                }
                let percent = progress.advance();
                let outcome = self.sync_object(schema, object, &percent).await;
                state.set_object(si, oi, outcome);
            }

            for (fi, target) in schema.fill_targets.iter().enumerate() {
                if state.fill(si, fi) == ObjectState::Ignore {
                    continue;
                }
                let percent = progress.advance();
                let outcome = self.sync_fill(schema, target, &percent).await;
                state.set_fill(si, fi, outcome);
            }

            info!("stop schema \"{}\"", schema.name);
        }

        stats.post_run(&schemas, &state);

        let completed_at = Utc::now();
        let duration_seconds = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
        let inserted = state.count(ObjectState::Insert);
        let updated = state.count(ObjectState::Update);
        let unchanged = state.count(ObjectState::NoChange);
        let errors = state.count(ObjectState::Error);

        Ok(RunSummary {
            started_at,
            completed_at,
            duration_seconds,
            schemas: schemas.len(),
            processed: inserted + updated + unchanged + errors,
            inserted,
            updated,
            unchanged,
            errors,
            ignored: state.count(ObjectState::Ignore),
        })
    }

    async fn sync_object(&self, schema: &Schema, object: &DbObject, percent: &str) -> ObjectState {
        let fetcher = DdlFetcher::new(self.conn);
        self.sync_file(
            TemplateKey::Object(object.kind),
            &object.name,
            schema,
            &schema.links,
            percent,
            false,
            || fetcher.fetch(&schema.name, object),
        )
        .await
    }

    async fn sync_fill(&self, schema: &Schema, target: &FillTarget, percent: &str) -> ObjectState {
        let fetcher = FillFetcher::new(self.conn);
        self.sync_file(
            target.template_key(),
            &target.name,
            schema,
            &[],
            percent,
            self.config.objects.fill_ignore_exists(target.mode),
            || fetcher.fetch(&schema.name, target),
        )
        .await
    }

    /// Resolve, read, fetch, compare and write one script.
    #[allow(clippy::too_many_arguments)]
    async fn sync_file<Fetch, Fut>(
        &self,
        key: TemplateKey,
        name: &str,
        schema: &Schema,
        links: &[Link],
        percent: &str,
        ignore_exists: bool,
        fetch: Fetch,
    ) -> ObjectState
    where
        Fetch: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let path = match resolve_path(key, name, &schema.name, &self.templates, links) {
            Ok(path) => path,
            Err(e) => {
                error!("{}", e);
                return ObjectState::Error;
            }
        };

        let current = match self.files.read(&path).await {
            Ok(text) => text,
            Err(e) => {
                error!(detail = %e, "on read current file \"{}\"", path);
                return ObjectState::Error;
            }
        };
        let current = trim_script(&current);

        if ignore_exists && !current.is_empty() {
            info!("[{}] exists file with script \"{}\"", percent, path);
            return ObjectState::NoChange;
        }

        let actual = match fetch().await {
            Ok(text) => text,
            Err(e) => {
                error!(
                    detail = %e,
                    "on exec query in Oracle \"{}\"",
                    self.config.connection.address()
                );
                return ObjectState::Error;
            }
        };
        let actual = trim_script(&actual);

        let (outcome, verb) = if current.is_empty() {
            (ObjectState::Insert, "create")
        } else if actual != current {
            (ObjectState::Update, "update")
        } else {
            info!("[{}] no changes for file \"{}\"", percent, path);
            return ObjectState::NoChange;
        };

        match self.files.write(&path, actual).await {
            Ok(()) => {
                info!("[{}] {} file \"{}\"", percent, verb, path);
                outcome
            }
            Err(e) => {
                error!(detail = %e, "on {} file \"{}\"", verb, path);
                ObjectState::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConnectionConfig, LogConfig, ObjectsConfig, SchemaFilter, SchemaMode};
    use crate::connection::mock::{text_row, MockDriver, MockLog};
    use crate::core::{RawRow, RawValue};
    use crate::error::SyncError;
    use crate::fs::LocalFileStore;
    use std::path::Path;
    use tempfile::TempDir;

    fn config(root: &Path) -> Config {
        let dir = |kind: &str| {
            Some(format!(
                "{}/{{{{schema-name}}}}/{}/{{{{object-name}}}}.sql",
                root.display(),
                kind
            ))
        };
        let mut objects = ObjectsConfig {
            schema: SchemaFilter {
                mode: SchemaMode::Include,
                list: vec!["HR".into()],
            },
            ..Default::default()
        };
        objects.table.dir = dir("TABLE");
        objects.view.dir = dir("VIEW");
        objects.index.dir = Some(format!(
            "{}/{{{{schema-name}}}}/INDEX/{{{{parent-name}}}}.{{{{object-name}}}}.sql",
            root.display()
        ));
        objects.table_fill_demo.dir = dir("DEMO");
        objects.table_fill_demo.count = Some(1);
        objects.table_fill_demo.ignore_exists = true;

        Config {
            log: LogConfig::default(),
            connection: ConnectionConfig {
                host: "db".into(),
                port: 1521,
                service: "XEPDB1".into(),
                login: "scott".into(),
                password: "tiger".into(),
                odbc_driver: "Oracle".into(),
            },
            objects,
        }
    }

    /// A small HR schema: two tables, a view, a synonym, an orphan index.
    fn hr(sql: &str) -> Result<Vec<RawRow>> {
        if sql.contains("FROM ALL_USERS") {
            return Ok(vec![text_row(&[("SCHEMANAME", "HR")])]);
        }
        if sql.contains("FROM ALL_OBJECTS") {
            return Ok(vec![
                text_row(&[("OWNER", "HR"), ("OBJECT_TYPE", "TABLE"), ("OBJECT_NAME", "EMP")]),
                text_row(&[("OWNER", "HR"), ("OBJECT_TYPE", "TABLE"), ("OBJECT_NAME", "DEPT")]),
                text_row(&[("OWNER", "HR"), ("OBJECT_TYPE", "VIEW"), ("OBJECT_NAME", "BROKEN")]),
                text_row(&[("OWNER", "HR"), ("OBJECT_TYPE", "SYNONYM"), ("OBJECT_NAME", "S1")]),
            ]);
        }
        if sql.contains("FROM ALL_INDEXES") {
            return Ok(vec![text_row(&[
                ("TABLE_OWNER", "HR"),
                ("TABLE_NAME", "EMP"),
                ("INDEX_NAME", "EMP_IDX"),
            ])]);
        }
        if sql.contains("FROM ALL_TRIGGERS") {
            return Ok(vec![]);
        }
        if sql.contains("FROM ALL_CONSTRAINTS cons") {
            return Ok(vec![text_row(&[
                ("OWNER", "HR"),
                ("TABLE_NAME", "EMP"),
                ("COLUMN_NAME", "ID"),
            ])]);
        }
        if sql.contains("COMMENTS") {
            return Ok(vec![]);
        }
        if sql.contains("'VIEW', 'BROKEN'") {
            return Err(SyncError::database("ORA-31603: object \"BROKEN\" of type VIEW not found"));
        }
        if sql.contains("GET_DDL('SYNONYM'") {
            panic!("ignored kinds must not be fetched");
        }
        if let Some(start) = sql.find("GET_DDL('") {
            let rest = &sql[start + 9..];
            let kind = &rest[..rest.find('\'').unwrap_or(0)];
            let name = rest.split("', '").nth(1).unwrap_or("");
            let text = format!("CREATE {} {}", kind, name);
            return Ok(vec![text_row(&[("TEXT", text.as_str())])]);
        }
        if sql.starts_with("SELECT * FROM \"HR\".\"EMP\"") {
            return Ok(vec![vec![("ID".to_string(), RawValue::Int(1))]]);
        }
        Ok(vec![])
    }

    async fn engine_parts(root: &Path) -> (ConnectionManager<MockDriver>, MockLog, Config) {
        let driver = MockDriver::new(hr);
        let log = driver.log();
        let conn = ConnectionManager::new(driver);
        let config = config(root);
        conn.open(config.connection.clone(), None).await.unwrap();
        (conn, log, config)
    }

    fn read(path: std::path::PathBuf) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_progress_label() {
        assert_eq!(progress_label(1, 20), "05.0%");
        assert_eq!(progress_label(1, 3), "33.3%");
        assert_eq!(progress_label(3, 3), "100.0%");
    }

    #[tokio::test]
    async fn test_first_run_creates_files() {
        let dir = TempDir::new().unwrap();
        let (conn, log, config) = engine_parts(dir.path()).await;

        let summary = SyncEngine::new(&conn, &config, LocalFileStore)
            .run()
            .await
            .unwrap();

        assert_eq!(summary.schemas, 1);
        assert_eq!(summary.inserted, 4); // EMP, DEPT, EMP_IDX, demo fill of EMP
        assert_eq!(summary.errors, 1); // BROKEN view
        assert_eq!(summary.ignored, 1); // synonym
        assert_eq!(summary.processed, 5);

        let root = dir.path().join("HR");
        assert!(read(root.join("TABLE/EMP.sql")).starts_with("CREATE"));
        assert!(read(root.join("INDEX/EMP.EMP_IDX.sql")).contains("EMP_IDX"));
        assert_eq!(
            read(root.join("DEMO/EMP.sql")),
            "INSERT INTO \"HR\".\"EMP\" (\"ID\")\nSELECT 1 FROM DUAL;"
        );
        assert!(!root.join("VIEW/BROKEN.sql").exists());
        assert!(!log
            .statements()
            .iter()
            .any(|s| s.contains("GET_DDL('SYNONYM'")));
    }

    #[tokio::test]
    async fn test_second_run_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let (conn, _, config) = engine_parts(dir.path()).await;
        let engine = SyncEngine::new(&conn, &config, LocalFileStore);
        engine.run().await.unwrap();

        let summary = engine.run().await.unwrap();
        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.unchanged, 4);
        assert_eq!(summary.errors, 1);
    }

    #[tokio::test]
    async fn test_changed_file_is_updated() {
        let dir = TempDir::new().unwrap();
        let (conn, _, config) = engine_parts(dir.path()).await;
        let engine = SyncEngine::new(&conn, &config, LocalFileStore);
        engine.run().await.unwrap();

        let emp = dir.path().join("HR/TABLE/EMP.sql");
        std::fs::write(&emp, "-- edited by hand").unwrap();
        let dept = dir.path().join("HR/TABLE/DEPT.sql");
        let original = read(dept.clone());
        std::fs::write(&dept, format!("\n\n{}\n  \n", original)).unwrap();

        let summary = engine.run().await.unwrap();
        assert_eq!(summary.updated, 1);
        assert!(read(emp).starts_with("CREATE"));
        // whitespace-only difference is not a change and the file is left alone
        assert_eq!(read(dept), format!("\n\n{}\n  \n", original));
    }

    #[tokio::test]
    async fn test_ignore_exists_skips_fetch() {
        let dir = TempDir::new().unwrap();
        let (conn, log, config) = engine_parts(dir.path()).await;
        let demo = dir.path().join("HR/DEMO/EMP.sql");
        std::fs::create_dir_all(demo.parent().unwrap()).unwrap();
        std::fs::write(&demo, "-- keep me").unwrap();

        SyncEngine::new(&conn, &config, LocalFileStore)
            .run()
            .await
            .unwrap();

        assert_eq!(read(demo), "-- keep me");
        assert!(!log
            .statements()
            .iter()
            .any(|s| s.starts_with("SELECT * FROM")));
    }

    #[tokio::test]
    async fn test_unresolved_placeholder_is_object_error() {
        let dir = TempDir::new().unwrap();
        let (conn, _, mut config) = engine_parts(dir.path()).await;
        config.objects.table.dir = Some(format!("{}/{{{{owner}}}}/{{{{object-name}}}}.sql", dir.path().display()));

        let summary = SyncEngine::new(&conn, &config, LocalFileStore)
            .run()
            .await
            .unwrap();
        assert_eq!(summary.errors, 3); // EMP, DEPT and BROKEN
        assert_eq!(summary.inserted, 2);
    }

    #[tokio::test]
    async fn test_catalog_failure_aborts_run() {
        let dir = TempDir::new().unwrap();
        let conn = ConnectionManager::new(MockDriver::new(|_| {
            Err(SyncError::database("ORA-00942: table or view does not exist"))
        }));
        let config = config(dir.path());
        conn.open(config.connection.clone(), None).await.unwrap();

        let err = SyncEngine::new(&conn, &config, LocalFileStore)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Catalog { .. }));
    }

    #[tokio::test]
    async fn test_summary_serializes() {
        let dir = TempDir::new().unwrap();
        let (conn, _, config) = engine_parts(dir.path()).await;
        let summary = SyncEngine::new(&conn, &config, LocalFileStore)
            .run()
            .await
            .unwrap();
        let json = summary.to_json().unwrap();
        assert!(json.contains("\"inserted\": 4"));
    }
}
