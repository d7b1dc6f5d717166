//! Tabular loading
//!
//! Reads a comma-delimited dataset with a header row into a column-oriented
//! table. Cells may be quoted and may be missing. Every data row must carry
//! exactly as many cells as the header.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::ScreenError;
use crate::types::Value;

/// Columns of the bundled sleep health and lifestyle dataset
pub const SLEEP_HEALTH_COLUMNS: [&str; 13] = [
    "Person ID",
    "Gender",
    "Age",
    "Occupation",
    "Sleep Duration",
    "Quality of Sleep",
    "Physical Activity Level",
    "Stress Level",
    "BMI Category",
    "Blood Pressure",
    "Heart Rate",
    "Daily Steps",
    "Sleep Disorder",
];

/// A named column of cell values
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

/// Immutable column-oriented table; all columns have equal length
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    source: String,
    columns: Vec<Column>,
    row_count: usize,
}

impl ReferenceTable {
    /// Load a delimited file from disk.
    ///
    /// Fails with `NotFound` when the path does not exist and `Parse` when the
    /// content is malformed or not UTF-8.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScreenError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScreenError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path)?;
        let table = Self::from_reader(&path.display().to_string(), file)?;
        tracing::debug!(
            path = %path.display(),
            columns = table.column_count(),
            rows = table.row_count(),
            "loaded table"
        );
        Ok(table)
    }

    /// Parse delimited text. `source` names the origin in errors and provenance.
    pub fn parse(source: &str, text: &str) -> Result<Self, ScreenError> {
        Self::from_reader(source, text.as_bytes())
    }

    /// Parse delimited data from any reader
    pub fn from_reader<R: Read>(source: &str, reader: R) -> Result<Self, ScreenError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let mut columns: Vec<Column> = rdr
            .headers()
            .map_err(|e| parse_error(source, e))?
            .iter()
            .map(|name| Column {
                name: name.trim_start_matches('\u{feff}').trim().to_string(),
                values: Vec::new(),
            })
            .collect();

        if columns.is_empty() {
            return Err(ScreenError::Parse {
                source_name: source.to_string(),
                line: 1,
                message: "missing header row".to_string(),
            });
        }

        let mut row_count = 0;
        for result in rdr.records() {
            let record = result.map_err(|e| parse_error(source, e))?;
            for (column, cell) in columns.iter_mut().zip(record.iter()) {
                column.values.push(Value::parse_cell(cell));
            }
            row_count += 1;
        }

        Ok(Self {
            source: source.to_string(),
            columns,
            row_count,
        })
    }

    /// Where the table was loaded from
    pub fn path(&self) -> &str {
        &self.source
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Values of row `index` in column order
    pub fn row(&self, index: usize) -> Option<Vec<Value>> {
        if index >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| c.values[index].clone()).collect())
    }
}

/// Map a reader error onto `Parse`, keeping the 1-based line of the record
fn parse_error(source: &str, err: csv::Error) -> ScreenError {
    let line = err
        .position()
        .map_or(1, |pos| usize::try_from(pos.line()).unwrap_or(usize::MAX));

    let message = match err.into_kind() {
        csv::ErrorKind::Io(e) => return ScreenError::Io(e),
        csv::ErrorKind::UnequalLengths {
            expected_len,
            len,
            ..
        } => format!("expected {} fields, found {}", expected_len, len),
        csv::ErrorKind::Utf8 { err, .. } => format!("invalid UTF-8 in field {}", err.field() + 1),
        other => format!("{:?}", other),
    };

    ScreenError::Parse {
        source_name: source.to_string(),
        line,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const SAMPLE: &str = "\
Person ID,Gender,Age,Occupation,Sleep Duration,Quality of Sleep,Physical Activity Level,Stress Level,BMI Category,Blood Pressure,Heart Rate,Daily Steps,Sleep Disorder
1,Male,27,Software Engineer,6.1,6,42,6,Overweight,126/83,77,4200,
2,Male,28,Doctor,6.2,6,60,8,Normal,125/80,75,10000,
3,Female,29,Nurse,6.5,5,40,7,Normal Weight,132/87,80,4000,Sleep Apnea
";

    #[test]
    fn test_parse_reference_dataset() {
        let table = ReferenceTable::parse("sample.csv", SAMPLE).unwrap();

        assert_eq!(
            table.column_names(),
            SLEEP_HEALTH_COLUMNS.map(String::from).to_vec()
        );
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.path(), "sample.csv");

        let first = table.row(0).unwrap();
        assert_eq!(first[0], Value::Integer(1));
        assert_eq!(first[3], Value::from("Software Engineer"));
        assert_eq!(first[4], Value::Float(6.1));
        assert!(first[12].is_missing());

        let disorder = table.column("Sleep Disorder").unwrap();
        assert_eq!(disorder.values[2], Value::from("Sleep Apnea"));
        assert!(table.row(3).is_none());
    }

    #[test]
    fn test_quoted_fields_and_crlf() {
        let text =
            "name,notes\r\n\"Doe, Jane\",\"said \"\"hi\"\"\"\r\n\r\nBob,\"two\nlines\"\r\n";
        let table = ReferenceTable::parse("quoted.csv", text).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.row(0).unwrap()[0], Value::from("Doe, Jane"));
        assert_eq!(table.row(0).unwrap()[1], Value::from("said \"hi\""));
        assert_eq!(table.row(1).unwrap()[1], Value::from("two\nlines"));
    }

    #[test]
    fn test_byte_order_mark_is_not_part_of_header() {
        let table = ReferenceTable::parse("bom.csv", "\u{feff}Person ID,Age\n1,27\n").unwrap();

        assert_eq!(table.column_names(), vec!["Person ID", "Age"]);
        assert_eq!(
            table.column("Person ID").unwrap().values,
            vec![Value::Integer(1)]
        );
    }

    #[test]
    fn test_inconsistent_column_count_is_parse_error() {
        let text = "a,b,c\n1,2,3\n4,5\n";
        let err = ReferenceTable::parse("bad.csv", text).unwrap_err();

        match err {
            ScreenError::Parse {
                source_name,
                line,
                message,
            } => {
                assert_eq!(source_name, "bad.csv");
                assert_eq!(line, 3);
                assert_eq!(message, "expected 3 fields, found 2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unbalanced_quote_is_parse_error() {
        let err = ReferenceTable::parse("bad.csv", "a,b\n\"open,1\n").unwrap_err();
        assert!(matches!(err, ScreenError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_empty_text_is_parse_error() {
        let err = ReferenceTable::parse("empty.csv", "\n\n").unwrap_err();
        assert!(matches!(err, ScreenError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_header_only_has_zero_rows() {
        let table = ReferenceTable::parse("header.csv", "a,b\n").unwrap();
        assert_eq!(table.column_count(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");

        let err = ReferenceTable::load(&path).unwrap_err();
        assert!(matches!(err, ScreenError::NotFound { path: p } if p == path));
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let table = ReferenceTable::load(file.path()).unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.path(), file.path().display().to_string());
    }

    #[test]
    fn test_load_invalid_utf8_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"a,b\n1,\xff\xfe\n").unwrap();

        let err = ReferenceTable::load(file.path()).unwrap_err();
        match err {
            ScreenError::Parse { source_name, .. } => {
                assert_eq!(source_name, file.path().display().to_string());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
