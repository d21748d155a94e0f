//! Object definition extraction.

mod format;

pub use format::format_sql;

use crate::connection::{ConnectionManager, Driver};
use crate::core::value::quote_literal;
use crate::core::{DbObject, ObjectKind};
use crate::error::Result;

/// Statement terminator `DBMS_METADATA` may leave after PL/SQL units.
const TERMINATOR: char = '/';

/// Trim leading/trailing blank lines and whitespace.
pub fn trim_script(text: &str) -> &str {
    text.trim()
}

/// Fetches and normalizes object DDL.
pub struct DdlFetcher<'a, D: Driver> {
    conn: &'a ConnectionManager<D>,
}

impl<'a, D: Driver> DdlFetcher<'a, D> {
    pub fn new(conn: &'a ConnectionManager<D>) -> Self {
        Self { conn }
    }

    /// Normalized definition of one object; tables get their comments appended.
    pub async fn fetch(&self, schema: &str, object: &DbObject) -> Result<String> {
        let sql = format!(
            "SELECT DBMS_METADATA.GET_DDL({}, {}, {}) AS TEXT FROM DUAL",
            quote_literal(object.kind.metadata_name()),
            quote_literal(&object.name),
            quote_literal(schema)
        );
        let rows = self.conn.exec(&sql).await?;
        let raw = rows
            .iter()
            .filter_map(|row| row.get_string("TEXT"))
            .collect::<Vec<_>>()
            .join("\n");

        let mut text = strip_terminators(&raw);
        if object.kind.is_declarative() {
            text = format_sql(&text);
        }

        if object.kind == ObjectKind::Table {
            let comments = self.table_comments(schema, &object.name).await?;
            if !comments.is_empty() {
                text = format!("{}\n\n{}", text, comments);
            }
        }

        Ok(trim_script(&text).to_string())
    }

    /// `COMMENT ON` statements for a table and its columns.
    async fn table_comments(&self, schema: &str, table: &str) -> Result<String> {
        let owner = quote_literal(schema);
        let name = quote_literal(table);

        let table_rows = self
            .conn
            .exec(&format!(
                "SELECT COMMENTS FROM ALL_TAB_COMMENTS WHERE OWNER = {} AND TABLE_NAME = {} AND COMMENTS IS NOT NULL",
                owner, name
            ))
            .await?;
        let column_rows = self
            .conn
            .exec(&format!(
                "SELECT COLUMN_NAME, COMMENTS FROM ALL_COL_COMMENTS WHERE OWNER = {} AND TABLE_NAME = {} AND COMMENTS IS NOT NULL",
                owner, name
            ))
            .await?;

        let mut lines = Vec::new();
        for row in &table_rows {
            if let Some(comment) = row.get_string("COMMENTS") {
                lines.push(format!(
                    "COMMENT ON TABLE {}.{} IS {};",
                    schema,
                    table,
                    quote_literal(&comment)
                ));
            }
        }
        for row in &column_rows {
            if let (Some(column), Some(comment)) =
                (row.get_string("COLUMN_NAME"), row.get_string("COMMENTS"))
            {
                lines.push(format!(
                    "COMMENT ON COLUMN {}.{}.{} IS {};",
                    schema,
                    table,
                    column,
                    quote_literal(&comment)
                ));
            }
        }
        Ok(lines.join("\n"))
    }
}

/// Trim, then drop trailing terminators one at a time.
fn strip_terminators(text: &str) -> String {
    let mut text = trim_script(text);
    while let Some(rest) = text.strip_suffix(TERMINATOR) {
        text = trim_script(rest);
    }
    text.to_string()
}
