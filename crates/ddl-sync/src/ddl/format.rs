//! Declarative SQL pretty-printing.

use sqlformat::{FormatOptions, QueryParams};

/// Upper bound on formatter passes while looking for a fixed point.
const MAX_PASSES: usize = 4;

/// Pretty-print declarative SQL.
///
/// The formatter is re-applied until its output stops changing, so
/// formatting already formatted text returns it unchanged.
pub fn format_sql(text: &str) -> String {
    let mut current = format_once(text);
    for _ in 1..MAX_PASSES {
        let next = format_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn format_once(text: &str) -> String {
    sqlformat::format(text, &QueryParams::None, FormatOptions::default())
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_is_idempotent() {
        let ddl = r#"CREATE TABLE "HR"."EMP" ("ID" NUMBER(10,0) NOT NULL ENABLE, "NAME" VARCHAR2(100), CONSTRAINT "EMP_PK" PRIMARY KEY ("ID") ENABLE);"#;
        let once = format_sql(ddl);
        assert_eq!(format_sql(&once), once);
    }

    #[test]
    fn test_format_breaks_lines() {
        let formatted = format_sql("SELECT a, b FROM t WHERE a = 1");
        assert!(formatted.contains('\n'));
        assert!(formatted.starts_with("SELECT"));
    }
}
