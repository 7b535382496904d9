//! JSON storage: an array of row arrays of cell text.

use crate::error::Result;

/// Parse a JSON sheet. `null` cells read as empty.
pub fn parse_json(content: &str) -> Result<Vec<Vec<String>>> {
    let rows: Vec<Vec<Option<String>>> = serde_json::from_str(content)?;
    Ok(rows
        .into_iter()
        .map(|row| row.into_iter().map(Option::unwrap_or_default).collect())
        .collect())
}

pub fn write_json(rows: &[Vec<String>]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SheetError;

    #[test]
    fn test_parse_rows_with_nulls() {
        let rows = parse_json(r#"[["1", null], ["=A1+1", "x"]]"#).unwrap();
        assert_eq!(
            rows,
            vec![vec!["1".to_string(), String::new()], vec!["=A1+1".into(), "x".into()]]
        );
    }

    #[test]
    fn test_written_json_reads_back() {
        let rows = vec![vec!["a \"quoted\"".to_string(), "=SUM(A1:A2)".to_string()]];
        assert_eq!(parse_json(&write_json(&rows).unwrap()).unwrap(), rows);
    }

    #[test]
    fn test_wrong_shape_is_json_error() {
        assert!(matches!(parse_json(r#"{"a": 1}"#), Err(SheetError::Json(_))));
        assert!(matches!(parse_json(r#"[[1, 2]]"#), Err(SheetError::Json(_))));
    }
}
