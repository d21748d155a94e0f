//! Catalog enumeration.
//!
//! Reads the target schemas, their objects, index and trigger links and
//! the tables selected for data dumps from the Oracle data dictionary.

use crate::config::{ObjectsConfig, SchemaFilter};
use crate::connection::{ConnectionManager, Driver};
use crate::core::value::quote_literal;
use crate::core::{DbObject, FillMode, FillTarget, Link, ObjectKind, Row, Schema};
use crate::error::{Result, SyncError};
use tracing::debug;

/// Name prefixes of system-generated objects that are never mirrored.
const SYSTEM_NAME_PATTERNS: &[&str] = &["SYS_IOT_OVER_%", "SYS_IL%", "SYS_PLSQL_%", "BIN$%"];

/// Table named in the full-dump list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedTable {
    pub schema: String,
    pub table: String,
}

impl QualifiedTable {
    fn matches(&self, schema: &str, table: &str) -> bool {
        self.schema.eq_ignore_ascii_case(schema) && self.table.eq_ignore_ascii_case(table)
    }
}

/// Check the full-dump list for duplicates and `SCHEMA.TABLE` form.
pub fn parse_fill_list(list: &[String]) -> Result<Vec<QualifiedTable>> {
    let mut duplicates: Vec<&str> = Vec::new();
    for (i, item) in list.iter().enumerate() {
        let repeated = list[..i].iter().any(|prev| prev.eq_ignore_ascii_case(item));
        if repeated && !duplicates.iter().any(|d| d.eq_ignore_ascii_case(item)) {
            duplicates.push(item);
        }
    }
    if !duplicates.is_empty() {
        return Err(SyncError::Config(format!(
            "in \"table_fill_full.list\" non unique table(s): \"{}\"",
            duplicates.join("\",\"")
        )));
    }

    list.iter()
        .map(|item| {
            let parts: Vec<&str> = item.split('.').collect();
            match parts.as_slice() {
                [schema, table] if !schema.trim().is_empty() && !table.trim().is_empty() => {
                    Ok(QualifiedTable {
                        schema: schema.trim().to_string(),
                        table: table.trim().to_string(),
                    })
                }
                _ => Err(SyncError::Config(format!(
                    "in \"table_fill_full.list\" bad table name \"{}\"",
                    item
                ))),
            }
        })
        .collect()
}

/// Reads everything a run needs from the data dictionary.
pub struct CatalogReader<'a, D: Driver> {
    conn: &'a ConnectionManager<D>,
    objects: &'a ObjectsConfig,
}

impl<'a, D: Driver> CatalogReader<'a, D> {
    pub fn new(conn: &'a ConnectionManager<D>, objects: &'a ObjectsConfig) -> Self {
        Self { conn, objects }
    }

    /// Enumerate the target schemas.
    ///
    /// An empty target set is a successful, empty result. Any failed
    /// dictionary query fails the whole read.
    pub async fn read(&self) -> Result<Vec<Schema>> {
        let fill_full = self.objects.fill_enabled(FillMode::Full);
        let fill_demo = self.objects.fill_enabled(FillMode::Demo);

        let full_list = if fill_full || fill_demo {
            parse_fill_list(&self.objects.table_fill_full.list)?
        } else {
            Vec::new()
        };

        let names = self.target_schemas(&self.objects.schema).await?;
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let mut schemas: Vec<Schema> = names.iter().map(Schema::new).collect();
        let owners = names
            .iter()
            .map(|n| quote_literal(n))
            .collect::<Vec<_>>()
            .join(",");

        let rows = self.query("object list", &self.objects_sql(&owners)).await?;
        for row in &rows {
            let owner = required(row, "OWNER")?;
            let name = required(row, "OBJECT_NAME")?;
            let object_type = required(row, "OBJECT_TYPE")?;
            match ObjectKind::from_catalog(&object_type) {
                Some(kind) => push_object(&mut schemas, &owner, DbObject::new(kind, name)),
                None => debug!("skipping {} {}.{}", object_type, owner, name),
            }
        }

        let rows = self.query("index links", &index_links_sql(&owners)).await?;
        for row in &rows {
            let owner = required(row, "TABLE_OWNER")?;
            let table = required(row, "TABLE_NAME")?;
            let index = required(row, "INDEX_NAME")?;
            push_object(&mut schemas, &owner, DbObject::new(ObjectKind::Index, index.clone()));
            push_link(&mut schemas, &owner, Link::to_table(table, ObjectKind::Index, index));
        }

        let rows = self.query("trigger links", &trigger_links_sql(&owners)).await?;
        for row in &rows {
            let owner = required(row, "TABLE_OWNER")?;
            let table = required(row, "TABLE_NAME")?;
            let trigger = required(row, "TRIGGER_NAME")?;
            push_link(&mut schemas, &owner, Link::to_table(table, ObjectKind::Trigger, trigger));
        }

        for schema in &mut schemas {
            schema.objects.sort_by_key(|o| o.kind.priority());
        }

        if fill_full || fill_demo {
            let rows = self.query("primary keys", &primary_keys_sql(&owners)).await?;
            let count = self.objects.table_fill_demo.count();
            for row in &rows {
                let owner = required(row, "OWNER")?;
                let table = required(row, "TABLE_NAME")?;
                let column = required(row, "COLUMN_NAME")?;
                let Some(schema) = schemas.iter_mut().find(|s| s.name == owner) else {
                    continue;
                };
                if let Some(target) = schema.fill_targets.iter_mut().find(|t| t.name == table) {
                    target.primary_key.push(column);
                    continue;
                }
                let mode = if fill_full && full_list.iter().any(|t| t.matches(&owner, &table)) {
                    FillMode::Full
                } else {
                    FillMode::Demo
                };
                let enabled = match mode {
                    FillMode::Full => fill_full,
                    FillMode::Demo => fill_demo,
                };
                if enabled {
                    schema.fill_targets.push(FillTarget {
                        name: table,
                        primary_key: vec![column],
                        mode,
                        count,
                    });
                }
            }
        }

        Ok(schemas)
    }

    async fn target_schemas(&self, filter: &SchemaFilter) -> Result<Vec<String>> {
        let rows = self
            .query(
                "schema list",
                "SELECT USERNAME AS SCHEMANAME FROM ALL_USERS WHERE ORACLE_MAINTAINED = 'N' ORDER BY USERNAME",
            )
            .await?;
        let catalog = rows
            .iter()
            .map(|row| required(row, "SCHEMANAME"))
            .collect::<Result<Vec<_>>>()?;
        Ok(filter.apply(&catalog))
    }

    fn objects_sql(&self, owners: &str) -> String {
        let mut skipped = vec![quote_literal(ObjectKind::Index.catalog_name())];
        if self.objects.package_body.dir.is_none() {
            skipped.push(quote_literal(ObjectKind::PackageBody.catalog_name()));
        }
        if self.objects.type_body.dir.is_none() {
            skipped.push(quote_literal(ObjectKind::TypeBody.catalog_name()));
        }
        let names = SYSTEM_NAME_PATTERNS
            .iter()
            .map(|p| format!("OBJECT_NAME NOT LIKE {}", quote_literal(p)))
            .collect::<Vec<_>>()
            .join(" AND ");

        format!(
            "SELECT OWNER, REPLACE(OBJECT_TYPE, ' ', '_') AS OBJECT_TYPE, OBJECT_NAME\n\
             FROM ALL_OBJECTS\n\
             WHERE TEMPORARY = 'N' AND STATUS = 'VALID' AND OBJECT_TYPE NOT IN ({}) AND OWNER IN ({})\n\
             AND {}\n\
             ORDER BY\n\
             CASE WHEN OBJECT_TYPE = 'TABLE' THEN 1 ELSE 2 END,\n\
             CASE WHEN OBJECT_TYPE = 'VIEW' THEN 1 ELSE 2 END,\n\
             CASE WHEN OBJECT_TYPE IN ('PACKAGE BODY', 'TYPE BODY') THEN 2 ELSE 1 END,\n\
             OWNER, OBJECT_NAME",
            skipped.join(","),
            owners,
            names
        )
    }

    async fn query(&self, context: &str, sql: &str) -> Result<Vec<Row>> {
        self.conn
            .exec(sql)
            .await
            .map_err(|e| SyncError::catalog(context, e))
    }
}

fn index_links_sql(owners: &str) -> String {
    format!(
        "SELECT i.TABLE_OWNER, i.TABLE_NAME, i.INDEX_NAME\n\
         FROM ALL_INDEXES i\n\
         LEFT JOIN ALL_CONSTRAINTS c ON i.TABLE_OWNER = c.OWNER AND i.TABLE_NAME = c.TABLE_NAME AND i.INDEX_NAME = c.INDEX_NAME\n\
         WHERE i.TABLE_OWNER IN ({}) AND i.STATUS = 'VALID'\n\
         AND (c.CONSTRAINT_TYPE IS NULL OR c.CONSTRAINT_TYPE NOT IN ('P', 'U'))",
        owners
    )
}

fn trigger_links_sql(owners: &str) -> String {
    format!(
        "SELECT TABLE_OWNER, TABLE_NAME, TRIGGER_NAME\n\
         FROM ALL_TRIGGERS\n\
         WHERE TABLE_OWNER IN ({})",
        owners
    )
}

fn primary_keys_sql(owners: &str) -> String {
    format!(
        "SELECT cons.OWNER, cons.TABLE_NAME, cols.COLUMN_NAME\n\
         FROM ALL_CONSTRAINTS cons\n\
         JOIN ALL_CONS_COLUMNS cols ON cons.OWNER = cols.OWNER AND cons.CONSTRAINT_NAME = cols.CONSTRAINT_NAME\n\
         WHERE cons.CONSTRAINT_TYPE = 'P' AND cons.OWNER IN ({}) AND cols.TABLE_NAME NOT LIKE 'BIN$%'\n\
         ORDER BY cons.OWNER, cons.TABLE_NAME, cols.POSITION",
        owners
    )
}

fn required(row: &Row, column: &str) -> Result<String> {
    row.get_string(column).ok_or_else(|| SyncError::Catalog {
        context: "row".into(),
        message: format!("column {} is missing or NULL", column),
    })
}

fn push_object(schemas: &mut [Schema], owner: &str, object: DbObject) {
    if let Some(schema) = schemas.iter_mut().find(|s| s.name == owner) {
        schema.objects.push(object);
    }
}

fn push_link(schemas: &mut [Schema], owner: &str, link: Link) {
    if let Some(schema) = schemas.iter_mut().find(|s| s.name == owner) {
        schema.links.push(link);
    }
}
