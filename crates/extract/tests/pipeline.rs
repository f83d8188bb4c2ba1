//! Exercises the extraction pipeline end to end: static and dynamic table routing, table-schema
//! hint merging, atomic commit, and the uncommitted-on-failure guarantee.

use serde_json::{json, Value};

use extract::{extract, Resource, ResourceItem, Source};
use storage::ExtractorStorage;

#[test]
fn commits_static_name_items_with_no_dynamic_tables() {
    let dir = tempfile::tempdir().unwrap();
    let storage = ExtractorStorage::new(dir.path()).unwrap();

    let resource = Resource::from_values(
        "orders",
        "event",
        vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})],
    );
    let source = Source::new().with_resource(resource);

    let update = extract(source, &storage).unwrap();
    assert!(update.is_empty());

    let committed: Vec<_> = std::fs::read_dir(storage.normalize_path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(committed, vec!["event.orders.0".to_string()]);

    let staging_dirs: Vec<_> = std::fs::read_dir(dir.path().join("extract")).unwrap().collect();
    assert!(staging_dirs.is_empty(), "the staging directory is removed once committed");
}

#[test]
fn dynamic_table_name_hint_routes_items_into_separate_files() {
    let dir = tempfile::tempdir().unwrap();
    let storage = ExtractorStorage::new(dir.path()).unwrap();

    let resource = Resource::new(
        "orders",
        "event",
        vec![
            Ok(ResourceItem::Scalar(json!({"id": 1, "region": "US"}))),
            Ok(ResourceItem::Scalar(json!({"id": 2, "region": "EU"}))),
            Ok(ResourceItem::Scalar(json!({"id": 3, "region": "US"}))),
            Ok(ResourceItem::Scalar(json!({"id": 4, "region": "EU"}))),
        ]
        .into_iter(),
    )
    .with_table_name_hint(|item: &Value| {
        let region = item.get("region").and_then(Value::as_str).unwrap_or("US");
        format!("orders_{region}")
    });
    let source = Source::new().with_resource(resource);

    let update = extract(source, &storage).unwrap();
    assert!(update.contains_key("orders_us"));
    assert!(update.contains_key("orders_eu"));

    let mut committed: Vec<_> = std::fs::read_dir(storage.normalize_path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    committed.sort();
    assert_eq!(
        committed,
        vec!["event.orders_eu.0".to_string(), "event.orders_us.0".to_string()]
    );

    let us_contents =
        std::fs::read_to_string(storage.normalize_path().join("event.orders_us.0")).unwrap();
    let us_lines: Vec<&str> = us_contents.lines().collect();
    assert_eq!(us_lines.len(), 2, "emission order within the resource is preserved per table");
    assert_eq!(us_lines[0], r#"{"id":1,"region":"US"}"#);
    assert_eq!(us_lines[1], r#"{"id":3,"region":"US"}"#);
}

#[test]
fn table_schema_hint_merges_column_deltas_across_items() {
    let dir = tempfile::tempdir().unwrap();
    let storage = ExtractorStorage::new(dir.path()).unwrap();

    let resource = Resource::new(
        "orders",
        "event",
        vec![
            Ok(ResourceItem::Scalar(json!({"id": 1}))),
            Ok(ResourceItem::Scalar(json!({"id": 2, "total": 9.5}))),
        ]
        .into_iter(),
    )
    .with_table_schema_hint(|item: &Value| {
        let mut table = schema::Table::new("orders");
        for (key, v) in item.as_object().unwrap() {
            let data_type = match v {
                Value::Number(n) if n.is_f64() => "double",
                Value::Number(_) => "bigint",
                _ => "text",
            };
            table = table.with_column(schema::ColumnSchema {
                name: key.clone(),
                data_type: Some(data_type.to_string()),
                is_variant: false,
            });
        }
        table
    });
    let source = Source::new().with_resource(resource);

    let update = extract(source, &storage).unwrap();
    let orders = update.get("orders").unwrap();
    assert!(orders.columns.contains_key("id"));
    assert!(orders.columns.contains_key("total"), "the second item's column is merged in");
}

#[test]
fn a_resource_without_dynamic_hints_contributes_no_columns() {
    let dir = tempfile::tempdir().unwrap();
    let storage = ExtractorStorage::new(dir.path()).unwrap();

    let resource = Resource::from_values("orders", "event", vec![json!({"id": 1})])
        .with_table_name_hint(|_item: &Value| "orders".to_string());
    let source = Source::new().with_resource(resource);

    let update = extract(source, &storage).unwrap();
    let orders = update.get("orders").unwrap();
    assert!(orders.columns.is_empty(), "no table-schema hint means a bare table entry");
}

#[test]
fn a_resource_failure_leaves_the_staging_directory_uncommitted() {
    let dir = tempfile::tempdir().unwrap();
    let storage = ExtractorStorage::new(dir.path()).unwrap();

    let resource = Resource::new(
        "orders",
        "event",
        vec![
            Ok(ResourceItem::Scalar(json!({"id": 1}))),
            Err("upstream timeout".to_string()),
        ]
        .into_iter(),
    );
    let source = Source::new().with_resource(resource);

    let err = extract(source, &storage).unwrap_err();
    assert!(matches!(err, extract::ExtractError::ResourceFailed { .. }));
    assert!(std::fs::read_dir(storage.normalize_path()).unwrap().next().is_none());

    let staging: Vec<_> = std::fs::read_dir(dir.path().join("extract")).unwrap().collect();
    assert_eq!(staging.len(), 1, "the staging subdirectory survives for post-mortem");
}

#[test]
fn multiple_resources_interleave_but_each_keeps_its_own_emission_order() {
    let dir = tempfile::tempdir().unwrap();
    let storage = ExtractorStorage::new(dir.path()).unwrap();

    let orders = Resource::from_values("orders", "event", vec![json!({"id": 1}), json!({"id": 2})]);
    let customers = Resource::from_values("customers", "event", vec![json!({"id": "a"})]);
    let source = Source::new().with_resource(orders).with_resource(customers);

    extract(source, &storage).unwrap();

    let orders_contents =
        std::fs::read_to_string(storage.normalize_path().join("event.orders.0")).unwrap();
    assert_eq!(orders_contents.lines().collect::<Vec<_>>(), vec![r#"{"id":1}"#, r#"{"id":2}"#]);

    let customers_contents =
        std::fs::read_to_string(storage.normalize_path().join("event.customers.0")).unwrap();
    assert_eq!(customers_contents.lines().collect::<Vec<_>>(), vec![r#"{"id":"a"}"#]);
}
