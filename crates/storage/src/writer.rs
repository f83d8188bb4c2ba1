use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use serde_json::Value;

use crate::errors::StorageError;
use crate::puae::{self, DataItem};

/// Builds the deterministic filename stem the normalize stage parses routing metadata back out
/// of: `<schema>.<table>.<writer_id>`.
pub fn build_extracted_file_stem(schema_name: &str, table_name: &str, writer_id: &str) -> String {
    format!("{schema_name}.{table_name}.{writer_id}")
}

struct Writer {
    path: PathBuf,
    file: BufWriter<File>,
}

/// A small pool of line-delimited JSON file writers keyed by `(schema, table)`, with a single
/// flush barrier (`flush_all`) run once before commit rather than per write.
#[derive(Default)]
pub struct WriterPool {
    writers: BTreeMap<(String, String), Writer>,
}

impl WriterPool {
    pub fn new() -> Self {
        WriterPool::default()
    }

    /// Appends `item` to the writer for `(schema_name, table_name)`, opening a fresh staged file
    /// under `extract_dir` on first use.
    pub fn write(
        &mut self,
        extract_dir: &std::path::Path,
        schema_name: &str,
        table_name: &str,
        item: DataItem,
    ) -> Result<(), StorageError> {
        let key = (schema_name.to_string(), table_name.to_string());
        if !self.writers.contains_key(&key) {
            let stem = build_extracted_file_stem(schema_name, table_name, "0");
            let path = extract_dir.join(stem);
            let file = File::create(&path).map_err(|source| StorageError::WriterFlushFailed {
                writer_key: format!("{schema_name}.{table_name}"),
                source,
            })?;
            self.writers.insert(
                key.clone(),
                Writer {
                    path,
                    file: BufWriter::new(file),
                },
            );
        }
        let writer = self.writers.get_mut(&key).expect("just inserted above");
        let encoded: Value = puae::encode(&item);
        serde_json::to_writer(&mut writer.file, &encoded).map_err(|e| StorageError::WriterFlushFailed {
            writer_key: format!("{schema_name}.{table_name}"),
            source: std::io::Error::new(std::io::ErrorKind::Other, e),
        })?;
        writer
            .file
            .write_all(b"\n")
            .map_err(|source| StorageError::WriterFlushFailed {
                writer_key: format!("{schema_name}.{table_name}"),
                source,
            })
    }

    /// Flushes every open writer. Must be called before `commit_extract_files` so every byte is
    /// durably on disk before files are renamed out of the staging directory.
    pub fn flush_all(&mut self) -> Result<(), StorageError> {
        for ((schema_name, table_name), writer) in &mut self.writers {
            writer
                .file
                .flush()
                .map_err(|source| StorageError::WriterFlushFailed {
                    writer_key: format!("{schema_name}.{table_name}"),
                    source,
                })?;
        }
        Ok(())
    }

    pub fn staged_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.writers.values().map(|w| &w.path)
    }
}
