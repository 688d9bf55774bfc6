//! Text reshaping: turn raw OCR lines into the delimited table artifact.
//!
//! The transform is a fixed three-step substitution applied per line, in this
//! order: remove every comma, replace every space with a comma, remove every
//! double quote. It is lossy and non-escaping on purpose: a field that
//! originally contained a comma ("42,00" becomes "4200") or a quoted phrase
//! is silently altered, and downstream consumers depend on exactly this
//! behaviour. Do not swap in a quoting/escaping encoder here without a
//! product decision.
//!
//! Rows from all pages concatenate in page order, then line order, into a
//! single `output.csv` in the run directory, overwriting any previous one.

use crate::error::Pdf2CsvError;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the table artifact inside the run directory.
pub const TABLE_FILE: &str = "output.csv";

/// Apply the fixed substitution rule to one line.
///
/// The three steps run in a fixed order; each is a plain character
/// substitution, so a line containing none of `,`, ` `, `"` passes through
/// unchanged.
pub fn reshape_line(line: &str) -> String {
    let without_commas = line.replace(',', "");
    let with_delimiters = without_commas.replace(' ', ",");
    with_delimiters.replace('"', "")
}

/// Reshape a page's raw OCR text into rows, one per input line.
pub fn reshape_text(text: &str) -> Vec<String> {
    text.lines().map(reshape_line).collect()
}

/// Reshape every text artifact and write the table artifact.
///
/// Returns the table path and the rows that were written.
pub async fn reshape_to_table(
    texts: &[PathBuf],
    run_dir: &Path,
) -> Result<(PathBuf, Vec<String>), Pdf2CsvError> {
    let mut rows = Vec::new();

    for text_path in texts {
        let text = tokio::fs::read_to_string(text_path).await.map_err(|e| {
            Pdf2CsvError::Internal(format!("read {}: {e}", text_path.display()))
        })?;
        rows.extend(reshape_text(&text));
    }

    let table_path = run_dir.join(TABLE_FILE);
    let mut content = String::with_capacity(rows.iter().map(|r| r.len() + 1).sum());
    for row in &rows {
        content.push_str(row);
        content.push('\n');
    }

    tokio::fs::write(&table_path, &content)
        .await
        .map_err(|e| Pdf2CsvError::ArtifactWriteFailed {
            path: table_path.clone(),
            source: e,
        })?;

    info!("Wrote {} row(s) to {}", rows.len(), table_path.display());
    Ok((table_path, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaces_become_delimiters() {
        assert_eq!(reshape_line("Invoice Total 42"), "Invoice,Total,42");
    }

    #[test]
    fn commas_are_removed_not_converted() {
        assert_eq!(reshape_line("42,00"), "4200");
    }

    #[test]
    fn quotes_are_stripped() {
        assert_eq!(reshape_line("\"Invoice\" Total"), "Invoice,Total");
    }

    #[test]
    fn no_special_chars_is_identity() {
        assert_eq!(reshape_line("InvoiceTotal42"), "InvoiceTotal42");
        assert_eq!(reshape_line(""), "");
    }

    #[test]
    fn substitution_order_strips_commas_first() {
        // The comma in the input is removed before spaces become commas, so
        // only the space produces a delimiter.
        assert_eq!(reshape_line("1,5 kg"), "15,kg");
    }

    #[test]
    fn rows_follow_line_order() {
        let rows = reshape_text("a b\nc d\n");
        assert_eq!(rows, vec!["a,b", "c,d"]);
    }

    #[tokio::test]
    async fn table_concatenates_pages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let p1 = dir.path().join("page_1.txt");
        let p2 = dir.path().join("page_2.txt");
        std::fs::write(&p1, "first page\n").unwrap();
        std::fs::write(&p2, "second page\n").unwrap();

        let (table_path, rows) = reshape_to_table(&[p1, p2], dir.path()).await.unwrap();

        assert_eq!(rows, vec!["first,page", "second,page"]);
        let content = std::fs::read_to_string(&table_path).unwrap();
        assert_eq!(content, "first,page\nsecond,page\n");
        assert!(table_path.ends_with(TABLE_FILE));
    }

    #[tokio::test]
    async fn rerun_overwrites_the_table() {
        let dir = tempfile::tempdir().unwrap();
        let p1 = dir.path().join("page_1.txt");

        std::fs::write(&p1, "old content\n").unwrap();
        reshape_to_table(std::slice::from_ref(&p1), dir.path())
            .await
            .unwrap();

        std::fs::write(&p1, "new\n").unwrap();
        let (table_path, _) = reshape_to_table(std::slice::from_ref(&p1), dir.path())
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&table_path).unwrap(), "new\n");
    }
}
