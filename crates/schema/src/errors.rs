use crate::model::{ChangeKind, ContractSlot};

/// Raised when a `freeze`-mode slot blocks an incoming schema change.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("schema contract froze a {change} change on table {table_name:?} (slot {slot})")]
pub struct SchemaFrozen {
    pub table_name: String,
    pub column_name: Option<String>,
    pub slot: ContractSlot,
    pub change: ChangeKind,
}
