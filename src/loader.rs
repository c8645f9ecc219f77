//! Dataset loading.
//!
//! Reads salary records from CSV with a header row. Numeric fields are parsed and every record is
//! validated before it enters the [RecordStore].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{event, Level};

use crate::error::DashboardError;
use crate::models::{RawRecord, Record};
use crate::store::RecordStore;

/// What to do with a row that cannot be converted into a record.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum LoadPolicy {
    /// Abort loading
    #[default]
    Strict,
    /// Log a warning and drop the row
    Skip,
}

/// Load the records of a CSV file.
pub fn load_path(path: &Path, policy: LoadPolicy) -> Result<RecordStore<Record>, DashboardError> {
    let file = File::open(path)?;
    let store = load_reader(file, policy)?;
    event!(
        Level::INFO,
        path = %path.display(),
        records = store.len(),
        "loaded dataset"
    );
    Ok(store)
}

/// Load the records of CSV data read from `reader`.
pub fn load_reader<R: Read>(
    reader: R,
    policy: LoadPolicy,
) -> Result<RecordStore<Record>, DashboardError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();
    let mut skipped = 0;
    for (n, result) in reader.records().enumerate() {
        // Header is line 1.
        let fallback_line = n as u64 + 2;
        let parsed = match result {
            Err(error) if error.is_io_error() => return Err(error.into()),
            Err(error) => {
                let line = error.position().map_or(fallback_line, |p| p.line());
                Err((line, DashboardError::from(error)))
            }
            Ok(row) => {
                let line = row.position().map_or(fallback_line, |p| p.line());
                row.deserialize::<RawRecord>(Some(&headers))
                    .map_err(DashboardError::from)
                    .and_then(Record::try_from)
                    .map_err(|error| (line, error))
            }
        };
        match parsed {
            Ok(record) => records.push(record),
            Err((line, source)) => {
                let error = DashboardError::MalformedRecord {
                    line,
                    source: Box::new(source),
                };
                match policy {
                    LoadPolicy::Strict => return Err(error),
                    LoadPolicy::Skip => {
                        event!(
                            Level::WARN,
                            line,
                            cause = %error_cause(&error),
                            "skipping malformed record"
                        );
                        skipped += 1;
                    }
                }
            }
        }
    }
    if skipped > 0 {
        event!(Level::WARN, skipped, "skipped malformed records");
    }
    Ok(RecordStore::new(records))
}

fn error_cause(error: &DashboardError) -> String {
    match error {
        DashboardError::MalformedRecord { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "\"\",\"rank\",\"discipline\",\"yrs.since.phd\",\"yrs.service\",\"sex\",\"salary\"\n";

    fn load(rows: &str, policy: LoadPolicy) -> Result<RecordStore<Record>, DashboardError> {
        let data = format!("{}{}", HEADER, rows);
        load_reader(data.as_bytes(), policy)
    }

    #[test]
    fn load_published_format() {
        let store = load(
            "\"1\",\"Prof\",\"B\",19,18,\"Male\",139750\n\"2\",\"AsstProf\",\"A\",4,3,\"Female\",79750\n",
            LoadPolicy::Strict,
        )
        .unwrap();
        assert_eq!(
            vec![
                Record::new("Prof", "B", 19, 18, "Male", 139750),
                Record::new("AsstProf", "A", 4, 3, "Female", 79750),
            ],
            store.to_vec()
        );
    }

    #[test]
    fn load_underscored_headers() {
        let data = "rank,discipline,yrs_since_phd,yrs_service,sex,salary\nProf, A ,3,2,Female,90000\n";
        let store = load_reader(data.as_bytes(), LoadPolicy::Strict).unwrap();
        assert_eq!(vec![Record::new("Prof", "A", 3, 2, "Female", 90000)], store.to_vec());
    }

    #[test]
    fn load_empty() {
        let store = load("", LoadPolicy::Strict).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn strict_rejects_non_numeric_salary() {
        let error = load(
            "\"1\",\"Prof\",\"B\",19,18,\"Male\",139750\n\"2\",\"Prof\",\"B\",19,18,\"Male\",lots\n",
            LoadPolicy::Strict,
        )
        .unwrap_err();
        assert_eq!("malformed record on line 3", error.to_string());
        match error {
            DashboardError::MalformedRecord { source, .. } => {
                assert!(matches!(*source, DashboardError::NotAnInteger { field: "salary", .. }))
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn strict_rejects_unknown_sex() {
        let error = load("\"1\",\"Prof\",\"B\",19,18,\"Other\",139750\n", LoadPolicy::Strict)
            .unwrap_err();
        match error {
            DashboardError::MalformedRecord { line, source } => {
                assert_eq!(2, line);
                assert!(matches!(*source, DashboardError::Validation(_)));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn strict_rejects_short_row() {
        let error = load("\"1\",\"Prof\",\"B\",19\n", LoadPolicy::Strict).unwrap_err();
        assert!(matches!(error, DashboardError::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn skip_drops_malformed_rows() {
        let store = load(
            concat!(
                "\"1\",\"Prof\",\"B\",19,18,\"Male\",139750\n",
                "\"2\",\"Prof\",\"\",19,18,\"Male\",139750\n",
                "\"3\",\"Dean\",\"B\",19,18,\"Male\",139750\n",
                "\"4\",\"AssocProf\",\"A\",-1,18,\"Male\",139750\n",
                "\"5\",\"AssocProf\",\"A\",6,6,\"Female\",97000\n",
            ),
            LoadPolicy::Skip,
        )
        .unwrap();
        assert_eq!(2, store.len());
        assert_eq!("Female", store[1].sex);
    }

    #[test]
    fn missing_file() {
        let error = load_path(Path::new("/nonexistent/Salaries.csv"), LoadPolicy::Strict)
            .unwrap_err();
        assert!(matches!(error, DashboardError::Io(_)));
    }
}
