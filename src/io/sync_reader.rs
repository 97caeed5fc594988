//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over operations from a script file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! ```no_run
//! use property_registry::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("script.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(operation) => println!("Replaying {:?}", operation),
//!         Err(e) => eprintln!("Skipping row: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Malformed rows are yielded as `ParseError`s carrying the line number
//!
//! Records are read one at a time; the file is never loaded whole.

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::{Operation, RegistryError};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Streaming iterator over script operations
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    /// Data rows read so far; the header is line 1
    rows: u64,
}

impl SyncReader {
    /// Open a script file
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` if the path does not exist, `IoError` for any
    /// other failure to open it
    pub fn new(path: &Path) -> Result<Self, RegistryError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RegistryError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => RegistryError::IoError {
                message: format!("Failed to open file '{}': {}", path.display(), e),
            },
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self { reader, rows: 0 })
    }
}

impl Iterator for SyncReader {
    type Item = Result<Operation, RegistryError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvRecord>();
        let row = deserializer.next()?;

        self.rows += 1;
        let line = self.rows + 1;

        Some(match row {
            Ok(csv_record) => {
                convert_csv_record(csv_record).map_err(|e| RegistryError::ParseError {
                    line: Some(line),
                    message: e.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        })
    }
}
