//! Result-row values.
//!
//! Drivers hand back [`RawRow`]s whose values may still reference large
//! objects or shared nested nodes. The connection manager turns them into
//! owned [`Row`]s with [`materialize_rows`] before anything else sees them.

use crate::error::Result;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Placeholder rendered for a node that contains itself.
pub const CIRCULAR_MARKER: &str = "[Circular]";

/// A large object (CLOB/BLOB/LONG) that must be read before the row is usable.
pub trait LargeObject: Send + Sync + fmt::Debug {
    /// Read the whole object as text.
    fn read_to_string(&self) -> Result<String>;
}

/// Large object already drained from the driver into memory.
#[derive(Debug, Clone)]
pub struct BufferedLob {
    bytes: Vec<u8>,
}

impl BufferedLob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl LargeObject for BufferedLob {
    fn read_to_string(&self) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.bytes).into_owned())
    }
}

/// Column value as produced by a driver.
#[derive(Debug, Clone)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    Float(f64),
    Text(String),
    Lob(Arc<dyn LargeObject>),
    List(Arc<Vec<RawValue>>),
    Record(Arc<RawRecord>),
}

/// Ordered column → value pairs.
pub type RawRecord = Vec<(String, RawValue)>;

/// One driver row.
pub type RawRow = RawRecord;

/// Owned column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Record(Row),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text content, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render as a SQL literal: `NULL`, bare number/boolean, or a quoted string.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            Value::Int(v) => v.to_string(),
            Value::Decimal(v) => v.normalize().to_string(),
            Value::Float(v) if v.is_nan() => "BINARY_DOUBLE_NAN".to_string(),
            Value::Float(v) if v.is_infinite() => {
                (if *v > 0.0 { "BINARY_DOUBLE_INFINITY" } else { "-BINARY_DOUBLE_INFINITY" })
                    .to_string()
            }
            Value::Float(v) => v.to_string(),
            other => quote_literal(&other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v.normalize()),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Record(row) => {
                for (i, (name, value)) in row.columns().iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}={}", name, value)?;
                }
                Ok(())
            }
        }
    }
}

/// Quote a string as a SQL literal, doubling embedded single quotes.
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Materialized result row with columns in select-list order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[(String, Value)] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Value of a column, matched case-insensitively.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    }

    /// Column rendered as text; `None` for NULL or missing columns.
    pub fn get_string(&self, column: &str) -> Option<String> {
        match self.get(column)? {
            Value::Null => None,
            value => Some(value.to_string()),
        }
    }
}

/// Materialize every row, reading large objects and copying nested nodes.
pub fn materialize_rows(rows: Vec<RawRow>) -> Result<Vec<Row>> {
    let mut path = HashSet::new();
    rows.iter()
        .map(|row| materialize_record(row, &mut path))
        .collect()
}

fn materialize_record(record: &RawRecord, path: &mut HashSet<usize>) -> Result<Row> {
    let mut columns = Vec::with_capacity(record.len());
    for (name, value) in record {
        columns.push((name.clone(), materialize_value(value, path)?));
    }
    Ok(Row::new(columns))
}

// `path` holds the addresses of the shared nodes currently being expanded,
// so a node reachable from itself renders as CIRCULAR_MARKER while the same
// node shared by siblings is copied each time. Nodes are immutable `Arc`s, so
// rows built in safe code cannot cycle and the marker branch is never taken
// for driver output.
fn materialize_value(value: &RawValue, path: &mut HashSet<usize>) -> Result<Value> {
    Ok(match value {
        RawValue::Null => Value::Null,
        RawValue::Bool(b) => Value::Bool(*b),
        RawValue::Int(v) => Value::Int(*v),
        RawValue::Decimal(v) => Value::Decimal(*v),
        RawValue::Float(v) => Value::Float(*v),
        RawValue::Text(s) => Value::Text(s.clone()),
        RawValue::Lob(lob) => Value::Text(lob.read_to_string()?),
        RawValue::List(items) => {
            let key = Arc::as_ptr(items) as *const () as usize;
            if !path.insert(key) {
                return Ok(Value::Text(CIRCULAR_MARKER.to_string()));
            }
            let result = items
                .iter()
                .map(|item| materialize_value(item, path))
                .collect::<Result<Vec<_>>>();
            path.remove(&key);
            Value::List(result?)
        }
        RawValue::Record(record) => {
            let key = Arc::as_ptr(record) as *const () as usize;
            if !path.insert(key) {
                return Ok(Value::Text(CIRCULAR_MARKER.to_string()));
            }
            let result = materialize_record(record, path);
            path.remove(&key);
            Value::Record(result?)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;

    #[derive(Debug)]
    struct BrokenLob;

    impl LargeObject for BrokenLob {
        fn read_to_string(&self) -> Result<String> {
            Err(SyncError::database("ORA-22922: nonexistent LOB value"))
        }
    }

    #[test]
    fn test_lob_is_read_into_text() {
        let rows = vec![vec![
            ("ID".to_string(), RawValue::Int(1)),
            (
                "TEXT".to_string(),
                RawValue::Lob(Arc::new(BufferedLob::new(b"CREATE TABLE T".to_vec()))),
            ),
        ]];
        let rows = materialize_rows(rows).unwrap();
        assert_eq!(rows[0].get("text"), Some(&Value::Text("CREATE TABLE T".into())));
        assert_eq!(rows[0].get("ID"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_nested_lobs_are_read() {
        let inner: RawRecord = vec![(
            "BODY".to_string(),
            RawValue::Lob(Arc::new(BufferedLob::new(b"abc".to_vec()))),
        )];
        let list = RawValue::List(Arc::new(vec![
            RawValue::Record(Arc::new(inner)),
            RawValue::Text("x".into()),
        ]));
        let rows = materialize_rows(vec![vec![("ITEMS".to_string(), list)]]).unwrap();
        let expected = Value::List(vec![
            Value::Record(Row::new(vec![("BODY".into(), Value::Text("abc".into()))])),
            Value::Text("x".into()),
        ]);
        assert_eq!(rows[0].get("ITEMS"), Some(&expected));
    }

    #[test]
    fn test_shared_node_is_not_circular() {
        let shared = Arc::new(vec![RawValue::Int(7)]);
        let row = vec![
            ("A".to_string(), RawValue::List(shared.clone())),
            ("B".to_string(), RawValue::List(shared)),
        ];
        let rows = materialize_rows(vec![row]).unwrap();
        assert_eq!(rows[0].get("A"), Some(&Value::List(vec![Value::Int(7)])));
        assert_eq!(rows[0].get("B"), Some(&Value::List(vec![Value::Int(7)])));
    }

    #[test]
    fn test_lob_read_failure_propagates() {
        let rows = vec![vec![("TEXT".to_string(), RawValue::Lob(Arc::new(BrokenLob)))]];
        let err = materialize_rows(rows).unwrap_err();
        assert!(err.to_string().contains("ORA-22922"));
    }

    #[test]
    fn test_sql_literals() {
        assert_eq!(Value::Null.to_sql_literal(), "NULL");
        assert_eq!(Value::Int(42).to_sql_literal(), "42");
        assert_eq!(Value::Bool(true).to_sql_literal(), "TRUE");
        assert_eq!(
            Value::Decimal(Decimal::new(1050, 2)).to_sql_literal(),
            "10.5"
        );
        assert_eq!(Value::Text("O'Brien".into()).to_sql_literal(), "'O''Brien'");
    }

    #[test]
    fn test_non_finite_float_literals() {
        assert_eq!(Value::Float(1.5).to_sql_literal(), "1.5");
        assert_eq!(Value::Float(f64::NAN).to_sql_literal(), "BINARY_DOUBLE_NAN");
        assert_eq!(Value::Float(f64::INFINITY).to_sql_literal(), "BINARY_DOUBLE_INFINITY");
        assert_eq!(
            Value::Float(f64::NEG_INFINITY).to_sql_literal(),
            "-BINARY_DOUBLE_INFINITY"
        );
    }

    #[test]
    fn test_get_string_skips_null() {
        let row = Row::new(vec![
            ("A".into(), Value::Null),
            ("B".into(), Value::Text("b".into())),
        ]);
        assert_eq!(row.get_string("A"), None);
        assert_eq!(row.get_string("b"), Some("b".into()));
        assert_eq!(row.get_string("C"), None);
    }
}
