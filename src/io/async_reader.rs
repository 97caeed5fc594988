//! Asynchronous CSV reader with batch interface
//!
//! Reads operations from any `futures::io::AsyncRead` with csv-async and hands
//! them out in batches for the concurrent strategy.
//!
//! ```text
//! AsyncRead → AsyncReader → Batches of Operations
//!                  ↓
//!           csv_format module
//!           (CsvRecord, convert_csv_record)
//! ```
//!
//! Malformed rows are logged at `warn` and skipped.

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::Operation;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Batch reader over a script stream
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    /// Data rows read so far; the header is line 1
    rows: u64,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            rows: 0,
        }
    }

    /// Read up to `batch_size` valid operations
    ///
    /// # Returns
    ///
    /// The operations in input order; an empty batch means the stream is exhausted
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Operation> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvRecord>();

        while batch.len() < batch_size {
            let Some(row) = records.next().await else {
                break;
            };
            self.rows += 1;
            let line = self.rows + 1;

            match row {
                Ok(csv_record) => match convert_csv_record(csv_record) {
                    Ok(operation) => batch.push(operation),
                    Err(e) => warn!(line, error = %e, "skipping malformed row"),
                },
                Err(e) => warn!(line, error = %e, "skipping unparseable row"),
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::Cursor;
    use rust_decimal::Decimal;

    const HEADER: &str = "type,caller,property,beneficiary,amount,category,images,address,description,listed\n";

    #[tokio::test]
    async fn test_async_reader_read_batch() {
        let csv_content = format!(
            "{}add,1,,,100,,,,,\nadd,1,,,200,,,,,\nbuy,2,1,,100,,,,,\n",
            HEADER
        );
        let mut async_reader = AsyncReader::new(Cursor::new(csv_content.into_bytes()));

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch.len(), 2);
        assert!(matches!(batch[1], Operation::Add { caller: 1, .. }));

        let batch = async_reader.read_batch(2).await;
        assert_eq!(
            batch,
            vec![Operation::Buy {
                payer: 2,
                id: 1,
                beneficiary: 2,
                tendered: Decimal::new(100, 0),
            }]
        );

        assert!(async_reader.read_batch(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_empty_csv() {
        let mut async_reader = AsyncReader::new(Cursor::new(HEADER.as_bytes().to_vec()));
        assert!(async_reader.read_batch(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_skips_invalid_rows() {
        let csv_content = format!(
            "{}sell,1,1,,5,,,,,\nadd,x,,,5,,,,,\nupdate,1,1,,5,,,,,\nreject,4,,,,,,,,\n",
            HEADER
        );
        let mut async_reader = AsyncReader::new(Cursor::new(csv_content.into_bytes()));

        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch, vec![Operation::RejectTransfers { identity: 4 }]);
    }

    #[tokio::test]
    async fn test_async_reader_handles_quoted_fields() {
        let csv_content = format!(
            "{}add,1,,,75.5,Flat,,\"2 Oak Rd, Shelbyville\",\"Top floor, view\",\n",
            HEADER
        );
        let mut async_reader = AsyncReader::new(Cursor::new(csv_content.into_bytes()));

        let batch = async_reader.read_batch(10).await;
        match &batch[0] {
            Operation::Add { details, .. } => {
                assert_eq!(details.price, Decimal::new(755, 1));
                assert_eq!(details.address, "2 Oak Rd, Shelbyville");
                assert_eq!(details.description, "Top floor, view");
            }
            other => panic!("unexpected operation {:?}", other),
        }
    }
}
