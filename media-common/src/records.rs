use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::MediaError;
use crate::identifier::Identifier;

pub const PUBLIC_ID_COLUMN: &str = "publicId";

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(rename = "publicId", default)]
    public_id: Option<String>,
}

/// Collect the identifiers of a CSV export, in row order.
///
/// Every column other than `publicId` is ignored, and rows whose `publicId`
/// is blank are skipped. Duplicates are kept.
pub fn read_identifiers<R: Read>(reader: R) -> Result<Vec<Identifier>, MediaError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    if !csv_reader
        .headers()?
        .iter()
        .any(|header| header == PUBLIC_ID_COLUMN)
    {
        return Err(MediaError::MissingColumn(PUBLIC_ID_COLUMN.to_string()));
    }

    let mut identifiers = Vec::new();
    let mut skipped = 0;
    for record in csv_reader.deserialize::<Record>() {
        match record?.public_id.as_deref().map(Identifier::new) {
            Some(Ok(identifier)) => identifiers.push(identifier),
            _ => skipped += 1,
        }
    }
    debug!(
        "Read {} identifiers, skipped {skipped} blank rows",
        identifiers.len()
    );

    Ok(identifiers)
}

pub fn read_identifiers_from_path(path: &Path) -> Result<Vec<Identifier>, MediaError> {
    let file = File::open(path)
        .map_err(|e| MediaError::io(format!("CSV file not found: {}", path.display()), e))?;
    read_identifiers(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(csv: &str) -> Vec<String> {
        read_identifiers(csv.as_bytes())
            .unwrap()
            .into_iter()
            .map(|id| id.as_str().to_string())
            .collect()
    }

    #[test]
    fn test_reads_public_id_column_only() {
        let csv = "assetId,publicId,format\n1,editorial/foo,psd\n2,bar/baz,psd\n";
        assert_eq!(ids(csv), vec!["editorial/foo", "bar/baz"]);
    }

    #[test]
    fn test_blank_rows_are_skipped_and_values_trimmed() {
        let csv = "publicId,format\n  editorial/foo  ,psd\n,psd\n   ,psd\nbar/baz,psd\n";
        assert_eq!(ids(csv), vec!["editorial/foo", "bar/baz"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let csv = "publicId\na/b\na/b\n";
        assert_eq!(ids(csv), vec!["a/b", "a/b"]);
    }

    #[test]
    fn test_quoted_values() {
        let csv = "publicId,title\n\"a/b\",\"Hello, world\"\n";
        assert_eq!(ids(csv), vec!["a/b"]);
    }

    #[test]
    fn test_missing_column() {
        let result = read_identifiers("assetId,format\n1,psd\n".as_bytes());
        assert!(matches!(result, Err(MediaError::MissingColumn(c)) if c == "publicId"));
    }

    #[test]
    fn test_empty_input_has_no_header() {
        let result = read_identifiers("".as_bytes());
        assert!(matches!(result, Err(MediaError::MissingColumn(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_identifiers_from_path(&dir.path().join("export.csv"));
        assert!(matches!(result, Err(MediaError::Io { .. })));
    }

    #[test]
    fn test_reads_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        std::fs::write(&path, "publicId\neditorial/foo\n\nbar/baz\n").unwrap();
        let identifiers = read_identifiers_from_path(&path).unwrap();
        assert_eq!(identifiers.len(), 2);
    }
}
