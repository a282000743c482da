//! Uploaded CSV datasets for bulk export.
//!
//! The header row must name a `url` column; a `title` column, when present,
//! supplies the labels. Without a `title` column every row gets a positional
//! label `extracted_text_<row>` (0-based).

use thiserror::Error;

use crate::bulk::BulkItem;

const URL_COLUMN: &str = "url";
const TITLE_COLUMN: &str = "title";
const POSITIONAL_LABEL_PREFIX: &str = "extracted_text_";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Parse CSV bytes into bulk items, one per data row, in file order.
///
/// Rows without a URL are kept (with an empty `url`) so the exporter can
/// account for them; it skips them.
///
/// ```
/// use fancy_web::dataset::read_bulk_items;
///
/// let csv = "url,title\nhttps://blog.naver.com/a/1,First\n,Second\n";
/// let items = read_bulk_items(csv.as_bytes()).unwrap();
/// assert_eq!(items.len(), 2);
/// assert_eq!(items[0].label, "First");
/// assert!(items[1].url.is_empty());
/// ```
pub fn read_bulk_items(bytes: &[u8]) -> Result<Vec<BulkItem>, DatasetError> {
    let text = std::str::from_utf8(bytes)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let url_idx = headers.iter().position(|h| h == URL_COLUMN);
    let title_idx = headers.iter().position(|h| h == TITLE_COLUMN);
    if url_idx.is_none() {
        tracing::warn!(target: "web.dataset", headers = ?headers, "dataset.url_column.missing");
    }

    let mut items = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let cell = |col: Option<usize>| col.and_then(|i| record.get(i)).unwrap_or("");
        let url = cell(url_idx).to_string();
        let label = match title_idx {
            Some(_) => cell(title_idx).to_string(),
            None => format!("{POSITIONAL_LABEL_PREFIX}{idx}"),
        };
        items.push(BulkItem { url, label });
    }

    tracing::debug!(target: "web.dataset", rows = items.len(), "dataset.parsed");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_labels_without_title_column() {
        let csv = "url\nhttps://blog.naver.com/a/1\n\nhttps://blog.naver.com/a/2\n";
        let items = read_bulk_items(csv.as_bytes()).unwrap();
        let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["extracted_text_0", "extracted_text_1"]);
    }

    #[test]
    fn empty_title_cell_stays_empty() {
        let csv = "url,title\nhttps://blog.naver.com/a/1,\n";
        let items = read_bulk_items(csv.as_bytes()).unwrap();
        assert_eq!(items[0].label, "");
    }

    #[test]
    fn short_rows_and_missing_url_column() {
        let csv = "title,url\nonly-title\n";
        let items = read_bulk_items(csv.as_bytes()).unwrap();
        assert_eq!(items, vec![BulkItem::new("", "only-title")]);

        let items = read_bulk_items("name\nx\n".as_bytes()).unwrap();
        assert_eq!(items, vec![BulkItem::new("", "extracted_text_0")]);
    }

    #[test]
    fn strips_byte_order_mark_and_quotes() {
        let csv = "\u{feff}url,title\n\"https://blog.naver.com/a/1\",\"Hello, world\"\n";
        let items = read_bulk_items(csv.as_bytes()).unwrap();
        assert_eq!(items[0].url, "https://blog.naver.com/a/1");
        assert_eq!(items[0].label, "Hello, world");
    }

    #[test]
    fn url_cells_are_kept_verbatim() {
        let csv = "url,title\n\"   \",blank\n";
        let items = read_bulk_items(csv.as_bytes()).unwrap();
        assert_eq!(items, vec![BulkItem::new("   ", "blank")]);
    }

    #[test]
    fn rejects_invalid_utf8() {
        let err = read_bulk_items(&[0x75, 0x72, 0x6c, 0x0a, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, DatasetError::Encoding(_)));
    }
}
