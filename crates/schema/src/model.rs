use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One of the four actions a contract mode slot can take on an incoming change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractMode {
    Evolve,
    DiscardRow,
    DiscardValue,
    Freeze,
}

impl Default for ContractMode {
    fn default() -> Self {
        ContractMode::Evolve
    }
}

/// The three independently-tunable slots of a contract mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractSlot {
    Tables,
    Columns,
    DataType,
}

impl ContractSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractSlot::Tables => "tables",
            ContractSlot::Columns => "columns",
            ContractSlot::DataType => "data_type",
        }
    }
}

impl std::fmt::Display for ContractSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of schema change a contract decision is being made about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    NewTable,
    NewColumn,
    NewVariant,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::NewTable => "new_table",
            ChangeKind::NewColumn => "new_column",
            ChangeKind::NewVariant => "new_variant",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{ tables, columns, data_type }`, fully resolved: every slot carries a concrete mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContractTriple {
    pub tables: ContractMode,
    pub columns: ContractMode,
    pub data_type: ContractMode,
}

impl ContractTriple {
    pub fn slot(&self, slot: ContractSlot) -> ContractMode {
        match slot {
            ContractSlot::Tables => self.tables,
            ContractSlot::Columns => self.columns,
            ContractSlot::DataType => self.data_type,
        }
    }

    fn set_slot(&mut self, slot: ContractSlot, mode: ContractMode) {
        match slot {
            ContractSlot::Tables => self.tables = mode,
            ContractSlot::Columns => self.columns = mode,
            ContractSlot::DataType => self.data_type = mode,
        }
    }

    /// Overlays `setting` onto this triple: an atom replaces all three slots, a partial mapping
    /// replaces only the slots it names and leaves the rest as they were.
    pub fn overlay(&mut self, setting: &ContractSetting) {
        match setting {
            ContractSetting::Atom(mode) => {
                self.tables = *mode;
                self.columns = *mode;
                self.data_type = *mode;
            }
            ContractSetting::Partial {
                tables,
                columns,
                data_type,
            } => {
                if let Some(m) = tables {
                    self.set_slot(ContractSlot::Tables, *m);
                }
                if let Some(m) = columns {
                    self.set_slot(ContractSlot::Columns, *m);
                }
                if let Some(m) = data_type {
                    self.set_slot(ContractSlot::DataType, *m);
                }
            }
        }
    }
}

/// A contract override as it is serialized on a schema or table: either a single atom that
/// broadcasts to every slot, or a partial mapping of the slots to override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContractSetting {
    Atom(ContractMode),
    Partial {
        #[serde(skip_serializing_if = "Option::is_none")]
        tables: Option<ContractMode>,
        #[serde(skip_serializing_if = "Option::is_none")]
        columns: Option<ContractMode>,
        #[serde(skip_serializing_if = "Option::is_none")]
        data_type: Option<ContractMode>,
    },
}

/// A single column's declared shape. A column is *complete* once it carries a concrete
/// `data_type`; incomplete columns behave as absent for contract purposes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_variant: bool,
}

impl ColumnSchema {
    pub fn is_complete(&self) -> bool {
        self.data_type.is_some()
    }
}

/// A table: its own columns plus an optional contract override and an optional parent (for
/// nested/child tables produced by normalization).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnSchema>,
    #[serde(rename = "schema_contract", skip_serializing_if = "Option::is_none")]
    pub contract: Option<ContractSetting>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Table {
            name: name.into(),
            parent: None,
            columns: BTreeMap::new(),
            contract: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_column(mut self, column: ColumnSchema) -> Self {
        self.columns.insert(column.name.clone(), column);
        self
    }

    pub fn with_contract(mut self, setting: ContractSetting) -> Self {
        self.contract = Some(setting);
        self
    }

    /// Whether `name` is present in this table as a complete column.
    pub fn has_complete_column(&self, name: &str) -> bool {
        self.columns.get(name).is_some_and(ColumnSchema::is_complete)
    }
}

/// A named collection of tables plus a schema-wide contract override.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub name: String,
    pub tables: BTreeMap<String, Table>,
    pub default_contract: Option<ContractSetting>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Schema {
            name: name.into(),
            tables: BTreeMap::new(),
            default_contract: None,
        }
    }

    /// Merges `table` into the schema, following the same upsert-by-name semantics as the
    /// system this crate is modeled on: an existing table's columns are extended rather than
    /// replaced wholesale.
    pub fn update_table(&mut self, table: Table) {
        match self.tables.get_mut(&table.name) {
            Some(existing) => {
                existing.parent = table.parent.or_else(|| existing.parent.clone());
                existing.contract = table.contract.or_else(|| existing.contract.clone());
                existing.columns.extend(table.columns);
            }
            None => {
                self.tables.insert(table.name.clone(), table);
            }
        }
    }

    /// Starts from the process-wide default (`evolve`/`evolve`/`evolve`), then overlays the
    /// schema's own override, the parent table's override (if `parent_table` names an existing
    /// table), and finally `table`'s own override, each only replacing the slots it specifies.
    pub fn resolve_contract_settings_for_table(
        &self,
        parent_table: Option<&str>,
        table: &str,
    ) -> ContractTriple {
        let mut triple = ContractTriple::default();

        if let Some(setting) = &self.default_contract {
            triple.overlay(setting);
        }
        if let Some(parent_name) = parent_table {
            if let Some(parent) = self.tables.get(parent_name) {
                if let Some(setting) = &parent.contract {
                    triple.overlay(setting);
                }
            }
        }
        if let Some(t) = self.tables.get(table) {
            if let Some(setting) = &t.contract {
                triple.overlay(setting);
            }
        }
        triple
    }
}
