//! Pull-based extraction: iterate user-declared resources, route their items to partitioned
//! staging files by inferred table name, and atomically commit the batch.
//!
//! The heavy lifting is split across three pieces: [`resource`] owns the `Resource`/`Source`
//! data model and the table-name/table-schema hint closures a resource may declare; [`pipe`]
//! owns the synchronous interleaving iterator that pulls items out of many resources at once;
//! this module ties them to [`storage::WriterPool`] and [`storage::ExtractorStorage`] to produce
//! the staged, committed batch plus the dynamic-tables map describing what was discovered along
//! the way.

mod errors;
mod pipe;
mod resource;

pub use errors::ExtractError;
pub use pipe::{PipeItem, PipeIterator};
pub use resource::{Resource, ResourceItem, Source};

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use schema::{Schema, Table};
use storage::{DataItem, ExtractorStorage, WriterPool};

/// Tables discovered or extended during one extraction run, keyed by normalized table name.
pub type SchemaUpdate = BTreeMap<String, Table>;

/// Pulls every item out of `source`, writes it to a fresh staging directory under `storage`,
/// and commits the batch into the normalize-input folder. Returns the dynamic tables
/// discovered along the way (empty for sources with no dynamic table-name/table-schema hints).
///
/// On any resource failure the staging directory is left in place (see spec.md §4.D "Failure
/// semantics") and the error propagates; no partial commit happens in that case since commit
/// only ever runs after iteration completes successfully.
#[tracing::instrument(skip(source, storage))]
pub fn extract(source: Source, storage: &ExtractorStorage) -> Result<SchemaUpdate, ExtractError> {
    extract_with_cancellation(source, storage, Arc::new(AtomicBool::new(false)))
}

/// As [`extract`], but checks `cancelled` before pulling each item, stopping (without error)
/// partway through and leaving the staging directory uncommitted. Matches the cancellation
/// model in spec.md §5: cancellation is only honored between items, never mid-pull.
#[tracing::instrument(skip(source, storage, cancelled))]
pub fn extract_with_cancellation(
    source: Source,
    storage: &ExtractorStorage,
    cancelled: Arc<AtomicBool>,
) -> Result<SchemaUpdate, ExtractError> {
    let extract_id = storage.create_extract_id()?;
    let extract_dir = storage.extract_path(&extract_id);

    let mut pool = WriterPool::new();
    let mut dynamic = Schema::new("dynamic");

    let mut pipe = PipeIterator::new(source.into_resources(), cancelled);
    while let Some(PipeItem { resource_index, value }) = pipe.next() {
        let resource = pipe.resource(resource_index);
        let schema_name = resource.schema_name().to_string();
        let resource_name = resource.name().to_string();

        let value = match value {
            Ok(v) => v,
            Err(message) => {
                return Err(ExtractError::ResourceFailed {
                    resource: resource_name,
                    message,
                });
            }
        };

        let table_name = resource.table_name_for(&value);
        let normalized = normalize_table_name(&table_name);

        // Only dynamic resources (those with a table-name hint) contribute to the returned
        // dynamic-tables map; a static-name resource's items are routed and written but leave
        // the map untouched (spec.md §8 scenario 5).
        if resource.is_dynamic() {
            match resource.table_delta_for(&normalized, &value) {
                Some(delta) => dynamic.update_table(delta),
                None => {
                    dynamic
                        .tables
                        .entry(normalized.clone())
                        .or_insert_with(|| Table::new(&normalized));
                }
            }
        }

        pool.write(&extract_dir, &schema_name, &normalized, DataItem::Json(value))?;
    }

    pool.flush_all()?;
    storage.commit_extract_files(&extract_id, true)?;

    Ok(dynamic.tables)
}

/// Lowercases and replaces every byte that is not ASCII alphanumeric or `_` with `_`, matching
/// the "normalize the table name" step of spec.md §4.D before it becomes a writer key / filename
/// component.
pub fn normalize_table_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
