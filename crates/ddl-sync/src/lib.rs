//! # ddl-sync
//!
//! Mirror an Oracle database catalog into a tree of SQL script files.
//!
//! Every run enumerates the selected schemas, fetches the DDL of each
//! object through `DBMS_METADATA`, normalizes it and writes it to a path
//! built from a per-kind template. A file is only rewritten when its
//! content actually changed, so the tree can live in version control.
//! Tables with a primary key can also be dumped as `INSERT` scripts,
//! either completely or as a few demo rows.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ddl_sync::{Config, ConnectionManager, LocalFileStore, OdbcDriver, SyncEngine};
//!
//! #[tokio::main]
//! async fn main() -> ddl_sync::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let conn = ConnectionManager::new(OdbcDriver::new());
//!     conn.open(config.connection.clone(), Some(config.session_init_script()))
//!         .await?;
//!     let summary = SyncEngine::new(&conn, &config, LocalFileStore).run().await?;
//!     println!("{} created, {} updated", summary.inserted, summary.updated);
//!     conn.close().await
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod connection;
pub mod core;
pub mod ddl;
pub mod error;
pub mod fill;
pub mod fs;
pub mod logging;
pub mod orchestrator;
pub mod path;
pub mod stats;

// Re-exports for convenient access
pub use config::{Config, ConnectionConfig, LogConfig, ObjectsConfig, PathTemplates};
pub use connection::{ConnectionManager, Driver, OdbcDriver, RetryPolicy};
pub use core::{DbObject, FillMode, FillTarget, Link, ObjectKind, ObjectState, Schema, TemplateKey};
pub use error::{Result, SyncError};
pub use fs::{FileStore, LocalFileStore};
pub use logging::{FileLogGuard, FileLogLayer};
pub use orchestrator::{RunState, RunSummary, SyncEngine};
