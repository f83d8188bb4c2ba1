//! Wires the four core crates together end to end: resolve a storage destination, decide how a
//! sample row is let through the schema contract, then extract a couple of items into it.
//!
//! This is a demonstration binary, not the pipeline orchestrator described in spec.md §2 (that
//! wrapper -- argument parsing, run scheduling, progress reporting -- is explicitly out of
//! scope; see spec.md §1 "Out of scope").

use anyhow::Context;
use serde_json::json;

use config::{
    resolve_configuration, ConfigError, Configuration, EmptyContextProvider, EnvironmentProvider,
    FieldKind, FieldSpec, MemoryProvider, Registry, SectionContext,
};
use extract::{extract, Resource, Source};
use schema::{ColumnSchema, ContractSetting, Schema, Table};
use storage::ExtractorStorage;

const DESTINATION_FIELDS: &[FieldSpec] = &[FieldSpec {
    key: "storage_root",
    kind: FieldKind::Scalar,
    optional: false,
    is_final: false,
}];

#[derive(Debug, Default)]
struct DestinationConfiguration {
    storage_root: Option<String>,
    resolved: bool,
    exception: Option<ConfigError>,
}

impl Configuration for DestinationConfiguration {
    fn type_name(&self) -> &'static str {
        "DestinationConfiguration"
    }

    fn section(&self) -> Option<&str> {
        Some("destination")
    }

    fn fields(&self) -> &'static [FieldSpec] {
        DESTINATION_FIELDS
    }

    fn get_field(&self, key: &str) -> Option<serde_json::Value> {
        match key {
            "storage_root" => self.storage_root.clone().map(serde_json::Value::String),
            _ => None,
        }
    }

    fn set_field(&mut self, key: &str, value: serde_json::Value) -> Result<(), ConfigError> {
        if key == "storage_root" {
            self.storage_root = value.as_str().map(str::to_string);
        }
        Ok(())
    }

    fn is_resolved(&self) -> bool {
        self.resolved
    }

    fn set_resolved(&mut self, resolved: bool) {
        self.resolved = resolved;
    }

    fn exception(&self) -> Option<&ConfigError> {
        self.exception.as_ref()
    }

    fn set_exception(&mut self, err: Option<ConfigError>) {
        self.exception = err;
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let registry = Registry::new(Box::new(EmptyContextProvider))
        .with_provider(Box::new(EnvironmentProvider::new()))
        .with_provider(Box::new(
            MemoryProvider::new("defaults").with_value("destination.storage_root", "./var/pipeline-demo"),
        ));

    let mut destination = DestinationConfiguration::default();
    resolve_configuration(&mut destination, &registry, &SectionContext::default(), &[], None, false)
        .context("resolving destination configuration")?;
    let storage_root = destination.storage_root.expect("resolved above");
    tracing::info!(storage_root, "resolved destination");

    let default_contract: ContractSetting =
        serde_yaml::from_str("{columns: discard_value}").context("parsing contract override")?;
    let mut pipeline_schema = Schema::new("pipeline_demo");
    pipeline_schema.default_contract = Some(default_contract);
    pipeline_schema.update_table(Table::new("orders").with_column(ColumnSchema {
        name: "id".to_string(),
        data_type: Some("bigint".to_string()),
        is_variant: false,
    }));

    let mode = pipeline_schema.resolve_contract_settings_for_table(None, "orders");
    let delta = Table::new("orders").with_column(ColumnSchema {
        name: "discount_code".to_string(),
        data_type: Some("text".to_string()),
        is_variant: false,
    });
    let data = json!({"id": 1, "discount_code": "WELCOME10"}).as_object().unwrap().clone();
    let existing = pipeline_schema.tables.get("orders").cloned();
    let outcome = schema::apply_schema_contract(&mode, "orders", data, delta, existing.as_ref())
        .context("applying schema contract")?;
    match &outcome {
        Some((data, _)) => tracing::info!(?data, "row admitted (new column stripped per contract)"),
        None => tracing::info!("row discarded by contract"),
    }

    let storage = ExtractorStorage::new(storage_root).context("opening extractor storage")?;
    let resource = Resource::from_values(
        "orders",
        "pipeline_demo",
        vec![json!({"id": 1}), json!({"id": 2})],
    );
    let dynamic_tables = extract(Source::new().with_resource(resource), &storage)
        .context("extracting the orders resource")?;
    tracing::info!(discovered = dynamic_tables.len(), "extraction committed");

    Ok(())
}
