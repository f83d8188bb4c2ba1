//! Mirrors the resolution and application scenarios the contract engine is tested against
//! upstream: a schema with a freestanding table, a child table, an incomplete-columns table, and
//! a table mixing complete and incomplete columns.

use schema::{
    ChangeKind, ColumnSchema, ContractMode, ContractSetting, ContractSlot, ContractTriple, Schema,
    Table,
};

fn column(name: &str, data_type: Option<&str>, is_variant: bool) -> ColumnSchema {
    ColumnSchema {
        name: name.to_string(),
        data_type: data_type.map(str::to_string),
        is_variant,
    }
}

fn sample_schema() -> Schema {
    let mut s = Schema::new("event");

    let shared_columns = [column("column_1", Some("string"), false), column("column_2", Some("number"), true)];
    let incomplete_columns = [column("incomplete_column_1", None, false), column("incomplete_column_2", None, false)];

    let mut tables = Table::new("tables");
    for c in &shared_columns {
        tables = tables.with_column(c.clone());
    }
    s.update_table(tables);

    let mut child = Table::new("child_table").with_parent("tables");
    for c in &shared_columns {
        child = child.with_column(c.clone());
    }
    s.update_table(child);

    let mut incomplete = Table::new("incomplete_table");
    for c in &incomplete_columns {
        incomplete = incomplete.with_column(c.clone());
    }
    s.update_table(incomplete);

    let mut mixed = Table::new("mixed_table");
    for c in incomplete_columns.iter().chain(shared_columns.iter()) {
        mixed = mixed.with_column(c.clone());
    }
    s.update_table(mixed);

    s
}

#[test]
fn defaults_resolve_to_all_evolve() {
    let schema = sample_schema();
    assert_eq!(
        schema.resolve_contract_settings_for_table(None, "tables"),
        ContractTriple::default()
    );
    assert_eq!(
        schema.resolve_contract_settings_for_table(Some("tables"), "child_table"),
        ContractTriple::default()
    );
}

#[test]
fn table_specific_full_setting_wins() {
    let mut schema = sample_schema();
    schema
        .tables
        .get_mut("tables")
        .unwrap()
        .contract = Some(ContractSetting::Atom(ContractMode::Freeze));

    let expected = ContractTriple {
        tables: ContractMode::Freeze,
        columns: ContractMode::Freeze,
        data_type: ContractMode::Freeze,
    };
    assert_eq!(schema.resolve_contract_settings_for_table(None, "tables"), expected);
    assert_eq!(
        schema.resolve_contract_settings_for_table(Some("tables"), "child_table"),
        expected
    );
}

#[test]
fn table_specific_partial_setting_leaves_data_type_at_default() {
    let mut schema = sample_schema();
    schema.tables.get_mut("tables").unwrap().contract = Some(ContractSetting::Partial {
        tables: Some(ContractMode::Freeze),
        columns: Some(ContractMode::DiscardValue),
        data_type: None,
    });

    let expected = ContractTriple {
        tables: ContractMode::Freeze,
        columns: ContractMode::DiscardValue,
        data_type: ContractMode::Evolve,
    };
    assert_eq!(schema.resolve_contract_settings_for_table(None, "tables"), expected);
}

#[test]
fn schema_wide_setting_applies_to_every_table() {
    let mut schema = sample_schema();
    schema.default_contract = Some(ContractSetting::Atom(ContractMode::Freeze));

    let expected = ContractTriple {
        tables: ContractMode::Freeze,
        columns: ContractMode::Freeze,
        data_type: ContractMode::Freeze,
    };
    assert_eq!(schema.resolve_contract_settings_for_table(None, "tables"), expected);
}

#[test]
fn table_override_wins_over_schema_wide_override() {
    let mut schema = sample_schema();
    schema.default_contract = Some(ContractSetting::Atom(ContractMode::Freeze));
    schema.tables.get_mut("tables").unwrap().contract = Some(ContractSetting::Partial {
        tables: Some(ContractMode::Evolve),
        columns: Some(ContractMode::DiscardValue),
        data_type: None,
    });

    // data_type was never named by the table's partial override, so it keeps whatever the
    // schema-wide overlay left it at (freeze), not the process default.
    let expected = ContractTriple {
        tables: ContractMode::Evolve,
        columns: ContractMode::DiscardValue,
        data_type: ContractMode::Freeze,
    };
    assert_eq!(schema.resolve_contract_settings_for_table(None, "tables"), expected);
    assert_eq!(
        schema.resolve_contract_settings_for_table(Some("tables"), "child_table"),
        expected
    );
}

#[test]
fn variant_freeze_interacts_with_the_columns_slot() {
    let schema = sample_schema();
    let existing = schema.tables.get("tables").unwrap();

    let delta = Table::new("tables").with_column(column("column_2_variant", Some("number"), true));
    let data: serde_json::Map<String, serde_json::Value> =
        [("column_2_variant".to_string(), serde_json::json!(345345))]
            .into_iter()
            .collect();

    // data_type evolves but columns freezes: variants are also new columns, so this still
    // raises, reported against the columns slot.
    let mode = ContractTriple {
        data_type: ContractMode::Evolve,
        columns: ContractMode::Freeze,
        ..Default::default()
    };
    let err = schema::apply_schema_contract(&mode, "tables", data, delta, Some(existing)).unwrap_err();
    assert_eq!(err.slot, ContractSlot::Columns);
    assert_eq!(err.change, ChangeKind::NewVariant);
}
