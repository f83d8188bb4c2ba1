use std::collections::BTreeMap;

use serde_json::Value;

use crate::errors::SchemaFrozen;
use crate::model::{ChangeKind, ContractMode, ContractSlot, ContractTriple, Table};

/// Outcome of evaluating one contract slot against one change. Ordered by strictness: a
/// `discard_row` anywhere in a delta supersedes a `discard_value` found elsewhere, and a
/// `freeze` supersedes both, matching the "strictest outcome wins" rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Outcome {
    PassThrough,
    DiscardValue,
    DiscardRow,
    Freeze,
}

fn outcome_for(mode: ContractMode) -> Outcome {
    match mode {
        ContractMode::Evolve => Outcome::PassThrough,
        ContractMode::DiscardValue => Outcome::DiscardValue,
        ContractMode::DiscardRow => Outcome::DiscardRow,
        ContractMode::Freeze => Outcome::Freeze,
    }
}

/// Applies `mode` to an incoming `(data, table_delta)` pair for `table_name`, given the table's
/// current shape (`None` if the table does not exist yet).
///
/// Returns `Ok(None)` when the whole row is discarded, `Ok(Some((data, delta)))` when the row
/// (possibly trimmed of some new columns) passes, and `Err(SchemaFrozen)` when a frozen slot
/// blocks the change.
pub fn apply_schema_contract(
    mode: &ContractTriple,
    table_name: &str,
    mut data: serde_json::Map<String, Value>,
    mut table_delta: Table,
    existing_table: Option<&Table>,
) -> Result<Option<(serde_json::Map<String, Value>, Table)>, SchemaFrozen> {
    let Some(existing_table) = existing_table else {
        return match outcome_for(mode.tables) {
            Outcome::PassThrough => Ok(Some((data, table_delta))),
            Outcome::DiscardRow | Outcome::DiscardValue => Ok(None),
            Outcome::Freeze => Err(SchemaFrozen {
                table_name: table_name.to_string(),
                column_name: None,
                slot: ContractSlot::Tables,
                change: ChangeKind::NewTable,
            }),
        };
    };

    // Evaluate every new (or newly-complete) column in the delta. Column order is deterministic
    // because `columns` is a `BTreeMap`.
    let mut to_strip: Vec<String> = Vec::new();
    for (name, column) in &table_delta.columns {
        if existing_table.has_complete_column(name) && !column.is_variant {
            continue;
        }

        let columns_outcome = outcome_for(mode.columns);

        if column.is_variant {
            let data_type_outcome = outcome_for(mode.data_type);
            if data_type_outcome == Outcome::Freeze {
                return Err(SchemaFrozen {
                    table_name: table_name.to_string(),
                    column_name: Some(name.clone()),
                    slot: ContractSlot::DataType,
                    change: ChangeKind::NewVariant,
                });
            }
            if columns_outcome == Outcome::Freeze {
                return Err(SchemaFrozen {
                    table_name: table_name.to_string(),
                    column_name: Some(name.clone()),
                    slot: ContractSlot::Columns,
                    change: ChangeKind::NewVariant,
                });
            }
            let combined = data_type_outcome.max(columns_outcome);
            match combined {
                Outcome::PassThrough => {}
                Outcome::DiscardRow => return Ok(None),
                Outcome::DiscardValue => to_strip.push(name.clone()),
                Outcome::Freeze => unreachable!("handled above"),
            }
        } else {
            match columns_outcome {
                Outcome::PassThrough => {}
                Outcome::DiscardRow => return Ok(None),
                Outcome::DiscardValue => to_strip.push(name.clone()),
                Outcome::Freeze => {
                    return Err(SchemaFrozen {
                        table_name: table_name.to_string(),
                        column_name: Some(name.clone()),
                        slot: ContractSlot::Columns,
                        change: ChangeKind::NewColumn,
                    })
                }
            }
        }
    }

    for name in &to_strip {
        data.remove(name);
        table_delta.columns.remove(name);
    }

    Ok(Some((data, table_delta)))
}
