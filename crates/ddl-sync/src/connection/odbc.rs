//! Oracle access through the ODBC driver manager.
//!
//! One ODBC environment is created per process and shared by every
//! connection. Rows are fetched one at a time with `get_text`/`get_binary`,
//! which drain long data in chunks, so CLOB columns such as the output of
//! `DBMS_METADATA.GET_DDL` arrive complete.

use super::Driver;
use crate::config::ConnectionConfig;
use crate::core::{BufferedLob, RawRow, RawValue};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use odbc_api::{
    force_send_sync, Connection, ConnectionOptions, Cursor, DataType, Environment,
    ResultSetMetadata,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

fn environment() -> Result<&'static Environment> {
    if let Some(env) = ENVIRONMENT.get() {
        return Ok(env);
    }
    let env = Environment::new().map_err(|e| {
        SyncError::database(format!(
            "Failed to create ODBC environment: {}. \
             Make sure unixODBC and the Oracle Instant Client ODBC driver are installed.",
            e
        ))
    })?;
    // A concurrent initializer may have won; either environment is fine.
    let _ = ENVIRONMENT.set(env);
    ENVIRONMENT
        .get()
        .ok_or_else(|| SyncError::database("ODBC environment unavailable"))
}

type OpenConnection = force_send_sync::Send<Connection<'static>>;

/// Oracle driver on `odbc-api`.
#[derive(Default)]
pub struct OdbcDriver {
    conn: Option<OpenConnection>,
}

impl OdbcDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Driver for OdbcDriver {
    async fn open(&mut self, params: &ConnectionConfig) -> Result<()> {
        let env = environment()?;
        debug!(
            "ODBC connection string (credentials hidden): Driver={{{}}};DBQ={};UID={};...",
            params.odbc_driver,
            params.address(),
            params.login
        );
        let conn = env
            .connect_with_connection_string(
                &params.connection_string(),
                ConnectionOptions::default(),
            )
            .map_err(|e| {
                SyncError::database(format!(
                    "Failed to connect to {} via ODBC: {}",
                    params.address(),
                    e
                ))
            })?;
        info!("Connected to Oracle via ODBC: {}", params.address());
        // SAFETY: the Oracle ODBC driver is thread safe, and the connection
        // is only used through `&mut OdbcDriver` behind the manager's mutex.
        self.conn = Some(unsafe { conn.promote_to_send() });
        Ok(())
    }

    async fn exec(&mut self, sql: &str) -> Result<Vec<RawRow>> {
        let conn = self
            .conn
            .as_ref()
            .ok_or_else(|| SyncError::database("DPI-1010: not connected"))?;
        fetch_all(conn, sql)
    }

    async fn close(&mut self) {
        // ODBC connections are closed when dropped
        self.conn = None;
    }

    fn is_open(&self) -> bool {
        self.conn.is_some()
    }
}

#[derive(Debug, Clone, Copy)]
enum ColumnKind {
    Int,
    Decimal,
    Float,
    Bool,
    LongText,
    LongBinary,
    Text,
}

impl ColumnKind {
    fn of(data_type: DataType) -> Self {
        match data_type {
            DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt => {
                ColumnKind::Int
            }
            DataType::Numeric { .. } | DataType::Decimal { .. } => ColumnKind::Decimal,
            DataType::Float { .. } | DataType::Real | DataType::Double => ColumnKind::Float,
            DataType::Bit => ColumnKind::Bool,
            DataType::LongVarchar { .. } => ColumnKind::LongText,
            DataType::LongVarbinary { .. } => ColumnKind::LongBinary,
            _ => ColumnKind::Text,
        }
    }
}

fn fetch_all(conn: &Connection<'static>, sql: &str) -> Result<Vec<RawRow>> {
    let mut rows = Vec::new();

    let Some(mut cursor) = conn.execute(sql, ()).map_err(SyncError::database)? else {
        return Ok(rows);
    };

    let num_cols = cursor.num_result_cols().map_err(SyncError::database)? as u16;
    let mut columns = Vec::with_capacity(num_cols as usize);
    for col in 1..=num_cols {
        let name = cursor.col_name(col).map_err(SyncError::database)?;
        let kind = ColumnKind::of(cursor.col_data_type(col).map_err(SyncError::database)?);
        columns.push((name, kind));
    }

    let mut buf = Vec::new();
    while let Some(mut row) = cursor.next_row().map_err(SyncError::database)? {
        let mut record = Vec::with_capacity(columns.len());
        for (idx, (name, kind)) in columns.iter().enumerate() {
            let col = idx as u16 + 1;
            buf.clear();
            let present = match kind {
                ColumnKind::LongBinary => row.get_binary(col, &mut buf),
                _ => row.get_text(col, &mut buf),
            }
            .map_err(SyncError::database)?;

            let value = if present {
                convert(*kind, &buf)
            } else {
                RawValue::Null
            };
            record.push((name.clone(), value));
        }
        rows.push(record);
    }

    Ok(rows)
}

/// Convert fetched column bytes into a raw value.
fn convert(kind: ColumnKind, bytes: &[u8]) -> RawValue {
    let text = || String::from_utf8_lossy(bytes).into_owned();
    match kind {
        ColumnKind::LongText | ColumnKind::LongBinary => {
            RawValue::Lob(Arc::new(BufferedLob::new(bytes.to_vec())))
        }
        ColumnKind::Int => {
            let s = text();
            s.trim()
                .parse::<i64>()
                .map(RawValue::Int)
                .unwrap_or(RawValue::Text(s))
        }
        ColumnKind::Decimal => {
            let s = text();
            Decimal::from_str(s.trim())
                .map(RawValue::Decimal)
                .unwrap_or(RawValue::Text(s))
        }
        ColumnKind::Float => {
            let s = text();
            s.trim()
                .parse::<f64>()
                .map(RawValue::Float)
                .unwrap_or(RawValue::Text(s))
        }
        ColumnKind::Bool => match bytes {
            b"1" => RawValue::Bool(true),
            b"0" => RawValue::Bool(false),
            _ => RawValue::Text(text()),
        },
        ColumnKind::Text => RawValue::Text(text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_numbers() {
        assert!(matches!(convert(ColumnKind::Int, b"42"), RawValue::Int(42)));
        match convert(ColumnKind::Decimal, b"10.50") {
            RawValue::Decimal(d) => assert_eq!(d, Decimal::new(1050, 2)),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(convert(ColumnKind::Float, b"1.5"), RawValue::Float(f) if f == 1.5));
    }

    #[test]
    fn test_unparsable_number_stays_text() {
        assert!(matches!(convert(ColumnKind::Decimal, b"abc"), RawValue::Text(s) if s == "abc"));
    }

    #[test]
    fn test_bit_values() {
        assert!(matches!(convert(ColumnKind::Bool, b"1"), RawValue::Bool(true)));
        assert!(matches!(convert(ColumnKind::Bool, b"0"), RawValue::Bool(false)));
    }

    #[test]
    fn test_long_text_is_lob() {
        match convert(ColumnKind::LongText, b"CREATE TABLE T (ID NUMBER)") {
            RawValue::Lob(lob) => {
                assert_eq!(lob.read_to_string().unwrap(), "CREATE TABLE T (ID NUMBER)")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_column_kinds() {
        assert!(matches!(ColumnKind::of(DataType::Integer), ColumnKind::Int));
        assert!(matches!(ColumnKind::of(DataType::Double), ColumnKind::Float));
        assert!(matches!(ColumnKind::of(DataType::Bit), ColumnKind::Bool));
        assert!(matches!(ColumnKind::of(DataType::Date), ColumnKind::Text));
    }

    #[test]
    fn test_driver_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<OdbcDriver>();
    }

    #[tokio::test]
    async fn test_exec_without_open_is_connection_lost() {
        let mut driver = OdbcDriver::new();
        assert!(!driver.is_open());
        let err = driver.exec("SELECT 1 FROM DUAL").await.unwrap_err();
        assert!(err.is_connection_lost());
    }
}
