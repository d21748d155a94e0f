//! Table data dumps as `INSERT ... SELECT ... FROM DUAL` scripts.

use crate::connection::{ConnectionManager, Driver};
use crate::core::{FillMode, FillTarget, Row};
use crate::error::Result;

/// Script written for a table without rows.
pub const NO_DATA: &str = "--NO DATA";

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Build the row query of a fill target.
///
/// Full dumps read every row in ascending key order. Demo dumps read the
/// first `count` rows in descending key order with nulls last.
pub fn fill_query(schema: &str, target: &FillTarget) -> String {
    let mut sql = format!("SELECT * FROM {}.{}", quote_ident(schema), quote_ident(&target.name));

    if !target.primary_key.is_empty() {
        let keys: Vec<String> = target
            .primary_key
            .iter()
            .map(|column| match target.mode {
                FillMode::Full => quote_ident(column),
                FillMode::Demo => format!("{} DESC NULLS LAST", quote_ident(column)),
            })
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&keys.join(", "));
    }

    if target.mode == FillMode::Demo {
        let count = if target.count == 0 {
            crate::config::DEFAULT_DEMO_COUNT
        } else {
            target.count
        };
        sql.push_str(&format!(" FETCH FIRST {} ROWS ONLY", count));
    }

    sql
}

/// Render rows as one `INSERT` with a `UNION ALL` of single-row selects.
pub fn render_insert(schema: &str, table: &str, rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return NO_DATA.to_string();
    };

    let columns: Vec<&str> = first.column_names().collect();
    let header = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");

    // Values are taken by position: quoted column names may differ only in case.
    let selects: Vec<String> = rows
        .iter()
        .map(|row| {
            let mut values: Vec<String> = row
                .columns()
                .iter()
                .take(columns.len())
                .map(|(_, value)| value.to_sql_literal())
                .collect();
            values.resize(columns.len(), "NULL".to_string());
            format!("SELECT {} FROM DUAL", values.join(", "))
        })
        .collect();

    format!(
        "INSERT INTO {}.{} ({})\n{};",
        quote_ident(schema),
        quote_ident(table),
        header,
        selects.join("\nUNION ALL\n")
    )
}

/// Fetches table data for fill targets.
pub struct FillFetcher<'a, D: Driver> {
    conn: &'a ConnectionManager<D>,
}

impl<'a, D: Driver> FillFetcher<'a, D> {
    pub fn new(conn: &'a ConnectionManager<D>) -> Self {
        Self { conn }
    }

    pub async fn fetch(&self, schema: &str, target: &FillTarget) -> Result<String> {
        let rows = self.conn.exec(&fill_query(schema, target)).await?;
        Ok(render_insert(schema, &target.name, &rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;
    use crate::connection::mock::MockDriver;
    use crate::core::{RawValue, Value};

    fn target(mode: FillMode, count: u32) -> FillTarget {
        FillTarget {
            name: "EMP".into(),
            primary_key: vec!["ID".into()],
            mode,
            count,
        }
    }

    fn params() -> ConnectionConfig {
        ConnectionConfig {
            host: "db".into(),
            port: 1521,
            service: "XEPDB1".into(),
            login: "scott".into(),
            password: "tiger".into(),
            odbc_driver: "Oracle".into(),
        }
    }

    /// Answers like Oracle would for a two-row `EMP` table.
    fn emp_table(sql: &str) -> Result<Vec<crate::core::RawRow>> {
        let row = |id: i64, name: &str| {
            vec![
                ("ID".to_string(), RawValue::Int(id)),
                ("NAME".to_string(), RawValue::Text(name.to_string())),
            ]
        };
        let mut rows = vec![row(1, "x"), row(2, "y")];
        if sql.contains("DESC NULLS LAST") {
            rows.reverse();
        }
        if let Some(pos) = sql.find("FETCH FIRST ") {
            let n: usize = sql[pos + 12..]
                .split_whitespace()
                .next()
                .and_then(|s| s.parse().ok())
                .unwrap_or(rows.len());
            rows.truncate(n);
        }
        Ok(rows)
    }

    #[test]
    fn test_full_query() {
        assert_eq!(
            fill_query("HR", &target(FillMode::Full, 3)),
            r#"SELECT * FROM "HR"."EMP" ORDER BY "ID""#
        );
    }

    #[test]
    fn test_demo_query_with_composite_key() {
        let mut t = target(FillMode::Demo, 0);
        t.primary_key.push("SUB".into());
        assert_eq!(
            fill_query("HR", &t),
            r#"SELECT * FROM "HR"."EMP" ORDER BY "ID" DESC NULLS LAST, "SUB" DESC NULLS LAST FETCH FIRST 3 ROWS ONLY"#
        );
    }

    #[test]
    fn test_no_rows() {
        assert_eq!(render_insert("HR", "EMP", &[]), NO_DATA);
    }

    #[test]
    fn test_value_rendering() {
        let rows = vec![Row::new(vec![
            ("ID".into(), Value::Int(7)),
            ("NAME".into(), Value::Text("O'Brien".into())),
            ("NOTE".into(), Value::Null),
        ])];
        assert_eq!(
            render_insert("HR", "EMP", &rows),
            "INSERT INTO \"HR\".\"EMP\" (\"ID\", \"NAME\", \"NOTE\")\nSELECT 7, 'O''Brien', NULL FROM DUAL;"
        );
    }

    #[test]
    fn test_columns_differing_only_in_case() {
        let rows = vec![Row::new(vec![
            ("a".into(), Value::Int(1)),
            ("A".into(), Value::Int(2)),
        ])];
        assert_eq!(
            render_insert("HR", "T", &rows),
            "INSERT INTO \"HR\".\"T\" (\"a\", \"A\")\nSELECT 1, 2 FROM DUAL;"
        );
    }

    #[tokio::test]
    async fn test_full_fill_emits_all_rows_ascending() {
        let conn = ConnectionManager::new(MockDriver::new(emp_table));
        conn.open(params(), None).await.unwrap();
        let text = FillFetcher::new(&conn)
            .fetch("HR", &target(FillMode::Full, 0))
            .await
            .unwrap();
        assert_eq!(
            text,
            "INSERT INTO \"HR\".\"EMP\" (\"ID\", \"NAME\")\nSELECT 1, 'x' FROM DUAL\nUNION ALL\nSELECT 2, 'y' FROM DUAL;"
        );
    }

    #[tokio::test]
    async fn test_demo_fill_emits_greatest_key() {
        let conn = ConnectionManager::new(MockDriver::new(emp_table));
        conn.open(params(), None).await.unwrap();
        let text = FillFetcher::new(&conn)
            .fetch("HR", &target(FillMode::Demo, 1))
            .await
            .unwrap();
        assert_eq!(
            text,
            "INSERT INTO \"HR\".\"EMP\" (\"ID\", \"NAME\")\nSELECT 2, 'y' FROM DUAL;"
        );
    }
}
