//! Text extraction for notebook documents.
//!
//! Source files are decoded as UTF-8 text directly. Notebooks (`.ipynb`) are
//! JSON documents; only their code cells are kept, flattened into one text
//! blob so they can be windowed like any other file.

use serde_json::Value;

/// Notebook extraction error. The collector logs it and skips the file.
#[derive(Debug)]
pub enum ExtractError {
    /// The document is not valid JSON.
    Json(String),
    /// The document has no `cells` array.
    MissingCells,
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Json(e) => write!(f, "notebook is not valid JSON: {}", e),
            ExtractError::MissingCells => write!(f, "notebook has no cells array"),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Returns true for notebook documents, by extension.
pub fn is_notebook(path: &std::path::Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("ipynb")
}

/// Flattens a notebook's code cells into plain text.
///
/// Each kept cell's `source` lines are concatenated as-is (they carry their
/// own newlines), and cells are joined with `\n`. Markdown and raw cells are
/// dropped, as are cells whose `source` is not an array. A non-string array
/// element is kept in its JSON form.
pub fn extract_notebook(raw: &str) -> Result<String, ExtractError> {
    let doc: Value = serde_json::from_str(raw).map_err(|e| ExtractError::Json(e.to_string()))?;
    let cells = doc
        .get("cells")
        .and_then(Value::as_array)
        .ok_or(ExtractError::MissingCells)?;

    let code: Vec<String> = cells.iter().filter_map(code_cell_text).collect();
    Ok(code.join("\n"))
}

fn code_cell_text(cell: &Value) -> Option<String> {
    if cell.get("cell_type").and_then(Value::as_str) != Some("code") {
        return None;
    }
    let source = cell.get("source")?.as_array()?;
    let mut text = String::new();
    for line in source {
        match line {
            Value::String(s) => text.push_str(s),
            Value::Null => {}
            other => text.push_str(&other.to_string()),
        }
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_code_cells_only() {
        let nb = r##"{
            "cells": [
                {"cell_type": "markdown", "source": ["# Title\n"]},
                {"cell_type": "code", "source": ["import os\n", "print(os.getcwd())"]},
                {"cell_type": "code", "source": ["x = 1"]}
            ]
        }"##;
        let text = extract_notebook(nb).unwrap();
        assert_eq!(text, "import os\nprint(os.getcwd())\nx = 1");
    }

    #[test]
    fn test_skips_cells_with_non_array_source() {
        let nb = r#"{"cells": [
            {"cell_type": "code", "source": "x = 1"},
            {"cell_type": "code", "source": ["z = 3"]}
        ]}"#;
        assert_eq!(extract_notebook(nb).unwrap(), "z = 3");
    }

    #[test]
    fn test_non_string_source_elements_are_kept() {
        let nb = r#"{"cells": [
            {"cell_type": "code", "source": ["y = ", 2, "\n", true, null]},
            {"cell_type": "code", "source": ["z = 3"]}
        ]}"#;
        assert_eq!(extract_notebook(nb).unwrap(), "y = 2\ntrue\nz = 3");
    }

    #[test]
    fn test_no_code_cells_is_empty_text() {
        let nb = r#"{"cells": [{"cell_type": "raw", "source": ["hi"]}]}"#;
        assert_eq!(extract_notebook(nb).unwrap(), "");
    }

    #[test]
    fn test_invalid_json_is_error() {
        let err = extract_notebook("{not json").unwrap_err();
        assert!(matches!(err, ExtractError::Json(_)));
    }

    #[test]
    fn test_missing_cells_is_error() {
        let err = extract_notebook(r#"{"metadata": {}}"#).unwrap_err();
        assert!(matches!(err, ExtractError::MissingCells));
        assert!(err.to_string().contains("cells"));
    }

    #[test]
    fn test_is_notebook() {
        assert!(is_notebook(std::path::Path::new("a/b.ipynb")));
        assert!(!is_notebook(std::path::Path::new("a/b.py")));
    }
}
