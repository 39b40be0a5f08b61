//! Parquet reading and column extraction over Arrow record batches.
//!
//! Columns are cast to a canonical type before reading, so dictionary
//! encoded strings (pandas categoricals), large strings and any integer or
//! float width are all accepted.

use arrow::array::{Array, ArrayRef, BinaryArray, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use hsm_common::{HsmError, HsmResult};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

/// A Parquet file decoded into record batches plus its file-level metadata.
#[derive(Debug, Clone)]
pub struct ParquetTable {
    pub artifact: &'static str,
    pub batches: Vec<RecordBatch>,
    /// `(key, value)` pairs from the footer
    pub metadata: Vec<(String, String)>,
}

impl ParquetTable {
    pub fn read(artifact: &'static str, bytes: Bytes) -> HsmResult<Self> {
        let parse_err = |e: &dyn std::fmt::Display| HsmError::parse(artifact, e.to_string());

        let builder = ParquetRecordBatchReaderBuilder::try_new(bytes).map_err(|e| parse_err(&e))?;
        let metadata = builder
            .metadata()
            .file_metadata()
            .key_value_metadata()
            .map(|kvs| {
                kvs.iter()
                    .filter_map(|kv| kv.value.clone().map(|v| (kv.key.clone(), v)))
                    .collect()
            })
            .unwrap_or_default();

        let batches = builder
            .build()
            .map_err(|e| parse_err(&e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| parse_err(&e))?;

        Ok(Self {
            artifact,
            batches,
            metadata,
        })
    }

    /// Value of a footer metadata key.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    fn column(&self, batch: &RecordBatch, name: &str, to: &DataType) -> HsmResult<ArrayRef> {
        let array = batch
            .column_by_name(name)
            .ok_or_else(|| HsmError::parse(self.artifact, format!("missing column '{}'", name)))?;
        if array.null_count() > 0 {
            return Err(HsmError::parse(
                self.artifact,
                format!("column '{}' contains {} nulls", name, array.null_count()),
            ));
        }
        cast(array, to).map_err(|e| {
            HsmError::parse(
                self.artifact,
                format!("column '{}' cannot be read as {}: {}", name, to, e),
            )
        })
    }

    /// All values of a string column across batches.
    pub fn strings(&self, name: &str) -> HsmResult<Vec<String>> {
        let mut out = Vec::with_capacity(self.num_rows());
        for batch in &self.batches {
            let array = self.column(batch, name, &DataType::Utf8)?;
            let strings = downcast::<StringArray>(&array, self.artifact, name)?;
            out.extend(strings.iter().map(|s| s.unwrap_or_default().to_string()));
        }
        Ok(out)
    }

    /// All values of a numeric column as `f64`.
    pub fn floats(&self, name: &str) -> HsmResult<Vec<f64>> {
        let mut out = Vec::with_capacity(self.num_rows());
        for batch in &self.batches {
            let array = self.column(batch, name, &DataType::Float64)?;
            let floats = downcast::<Float64Array>(&array, self.artifact, name)?;
            out.extend(floats.values().iter().copied());
        }
        Ok(out)
    }

    /// All values of a binary column (WKB geometries).
    pub fn binaries(&self, name: &str) -> HsmResult<Vec<Vec<u8>>> {
        let mut out = Vec::with_capacity(self.num_rows());
        for batch in &self.batches {
            let array = self.column(batch, name, &DataType::Binary)?;
            let binary = downcast::<BinaryArray>(&array, self.artifact, name)?;
            out.extend(binary.iter().map(|b| b.unwrap_or_default().to_vec()));
        }
        Ok(out)
    }
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef, artifact: &str, name: &str) -> HsmResult<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| HsmError::parse(artifact, format!("column '{}' has an unexpected type", name)))
}
