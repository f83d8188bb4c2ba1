//! Schema data model and the total, deterministic schema-contract engine.
//!
//! A [`Schema`] is a named collection of [`Table`]s; every incoming `(data, table delta)` pair
//! is run through [`apply_schema_contract`] against a [`ContractTriple`] resolved for that table
//! via [`Schema::resolve_contract_settings_for_table`]. See [`contract`] for the decision logic.

mod contract;
mod errors;
mod model;

pub use contract::apply_schema_contract;
pub use errors::SchemaFrozen;
pub use model::{
    ChangeKind, ColumnSchema, ContractMode, ContractSetting, ContractSlot, ContractTriple, Schema,
    Table,
};
