//! Trip extract reading.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use polars::prelude::*;

use crate::error::{IngestError, Result};

/// Maximum file size for an extract (2 GiB default).
pub const MAX_EXTRACT_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Options for [`read_trip_extract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    pub max_file_size: u64,
    /// Rows sampled when inferring column types. `None` (the default) scans
    /// the whole file, so a late decimal or text value widens the column
    /// instead of failing the read.
    pub infer_schema_length: Option<usize>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_file_size: MAX_EXTRACT_FILE_SIZE,
            infer_schema_length: None,
        }
    }
}

impl IngestOptions {
    #[must_use]
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    #[must_use]
    pub fn with_infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = rows;
        self
    }
}

fn open_error(path: &Path, e: std::io::Error) -> IngestError {
    if e.kind() == std::io::ErrorKind::NotFound {
        IngestError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        IngestError::FileRead {
            path: path.to_path_buf(),
            source: e,
        }
    }
}

/// Check file size against a limit.
pub fn check_file_size_with_limit(path: &Path, max_size: u64) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| open_error(path, e))?;

    if metadata.len() > max_size {
        return Err(IngestError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size,
        });
    }

    Ok(())
}

/// Reject UTF-16 input. A UTF-8 BOM is accepted.
pub fn validate_encoding(path: &Path) -> Result<()> {
    let mut file = File::open(path).map_err(|e| open_error(path, e))?;

    let mut buffer = [0u8; 2];
    let bytes_read = file.read(&mut buffer).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    if bytes_read == 2 {
        let encoding = match buffer {
            [0xFF, 0xFE] => Some("UTF-16 LE"),
            [0xFE, 0xFF] => Some("UTF-16 BE"),
            _ => None,
        };
        if let Some(encoding) = encoding {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding,
            });
        }
    }

    Ok(())
}

/// Read the header line, without any BOM.
fn read_header_line(path: &Path) -> Result<Option<String>> {
    let file = File::open(path).map_err(|e| open_error(path, e))?;
    let mut reader = BufReader::new(file);
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .map_err(|e| IngestError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
    if read == 0 {
        return Ok(None);
    }
    let cleaned = line.strip_prefix('\u{feff}').unwrap_or(&line);
    Ok(Some(cleaned.trim_end_matches(['\r', '\n']).to_string()))
}

/// Validate DataFrame shape after loading.
pub fn validate_dataframe_shape(df: &DataFrame, path: &Path) -> Result<()> {
    if df.height() == 0 {
        return Err(IngestError::EmptyDataFrame {
            path: path.to_path_buf(),
        });
    }

    for name in df.get_column_names() {
        if name.trim().is_empty() {
            return Err(IngestError::EmptyColumnName {
                path: path.to_path_buf(),
            });
        }
    }

    Ok(())
}

/// Report every column in `columns` that `df` lacks.
pub fn check_required_columns<'a, I>(df: &DataFrame, columns: I) -> Result<()>
where
    I: IntoIterator<Item = &'a String>,
{
    let present: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
    let missing: Vec<String> = columns
        .into_iter()
        .filter(|c| !present.contains(&c.as_str()))
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(IngestError::MissingColumns { columns: missing })
    }
}

/// Read a trip extract CSV with a single header row.
///
/// Timestamps stay as text here; conversion is a separate normalization step.
pub fn read_trip_extract(path: &Path, options: &IngestOptions) -> Result<DataFrame> {
    check_file_size_with_limit(path, options.max_file_size)?;
    validate_encoding(path)?;

    match read_header_line(path)? {
        Some(header) if !header.trim().is_empty() => {}
        _ => {
            return Err(IngestError::EmptyCsv {
                path: path.to_path_buf(),
            });
        }
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(options.infer_schema_length)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    validate_dataframe_shape(&df, path)?;

    tracing::info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "read trip extract"
    );

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_read_simple_extract() {
        let file = create_temp_csv("A,B,C\n1,2,3\n4,5,6\n");
        let df = read_trip_extract(file.path(), &IngestOptions::default()).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.get_column_names(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_read_extract_with_bom() {
        let file = create_temp_csv("\u{feff}A,B\n1,2\n");
        let df = read_trip_extract(file.path(), &IngestOptions::default()).unwrap();

        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let file = create_temp_csv("");
        let result = read_trip_extract(file.path(), &IngestOptions::default());

        assert!(matches!(result, Err(IngestError::EmptyCsv { .. })));
    }

    #[test]
    fn test_header_without_rows_is_rejected() {
        let file = create_temp_csv("A,B,C\n");
        let result = read_trip_extract(file.path(), &IngestOptions::default());

        assert!(matches!(result, Err(IngestError::EmptyDataFrame { .. })));
    }

    #[test]
    fn test_utf16_bom_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xFF, 0xFE, b'A', 0, b'\n', 0]).unwrap();
        let result = validate_encoding(file.path());

        assert!(matches!(
            result,
            Err(IngestError::UnsupportedEncoding {
                encoding: "UTF-16 LE",
                ..
            })
        ));
    }

    #[test]
    fn test_size_limit() {
        let file = create_temp_csv("A,B\n1,2\n");
        let options = IngestOptions::default().with_max_file_size(4);
        let result = read_trip_extract(file.path(), &options);

        assert!(matches!(result, Err(IngestError::FileTooLarge { max_size: 4, .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = read_trip_extract(
            Path::new("/nonexistent/trips.csv"),
            &IngestOptions::default(),
        );
        assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
    }

    #[test]
    fn test_required_columns_reports_all_missing() {
        let df = df!("A" => [1i64], "C" => [2i64]).unwrap();
        let required = vec!["A".to_string(), "B".to_string(), "D".to_string()];

        match check_required_columns(&df, &required) {
            Err(IngestError::MissingColumns { columns }) => {
                assert_eq!(columns, vec!["B", "D"]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
        assert!(check_required_columns(&df, &required[..1]).is_ok());
    }

    #[test]
    fn test_default_options_scan_every_row() {
        assert_eq!(IngestOptions::default().infer_schema_length, None);
    }
}
