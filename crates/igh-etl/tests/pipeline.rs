//! End-to-end pipeline tests over in-memory DuckDB stores.

use igh_core::{CoreError, SchemaMap, Value};
use igh_db::{Database, DuckDbBackend};
use igh_etl::{builtin_lookups, EtlError, Pipeline};

const MAP_YAML: &str = r#"
tables:
  - name: dim_product
    source_table: vin_products
    primary_key: product_key
    natural_key: [productid]
    columns:
      - { name: productid, expr: vin_productid }
      - { name: product_name, expr: vin_name }

  - name: dim_date
    primary_key: date_key
    natural_key: [full_date]
    special: { kind: generate, start_year: 2015, end_year: 2016 }
    columns:
      - { name: full_date, expr: GENERATED }
      - { name: year, expr: GENERATED }
      - { name: quarter, expr: GENERATED }
      - { name: month, expr: GENERATED }
      - { name: day, expr: GENERATED }
      - { name: day_of_week, expr: GENERATED }

  - name: dim_developer
    source_table: vin_candidates
    primary_key: developer_key
    natural_key: [developer_name]
    special: { kind: delimited, source_column: vin_developers, delimiter: ";" }
    columns:
      - { name: developer_name, expr: DELIMITED_VALUE }
      - { name: source_system, expr: "LITERAL:dataverse" }

  - name: fact_snapshot
    source_table: vin_candidates
    primary_key: snapshot_key
    columns:
      - { name: candidate_id, expr: vin_candidateid }
      - { name: product_key, expr: "FK:dim_product.productid|_vin_product_value" }
      - { name: status, expr: "OPTIONSET:vin_status" }
      - { name: date_key, expr: "FK:dim_date.full_date|EXTRACT_DATE:modifiedon" }
      - { name: enrollment_count, expr: "COALESCE(vin_enrollment, 0)" }

  - name: bridge_candidate_developer
    source_table: vin_candidates
    special: { kind: delimited_bridge, source_column: vin_developers, delimiter: ";" }
    columns:
      - { name: candidate_id, expr: vin_candidateid }
      - { name: developer_key, expr: "FK:dim_developer.developer_name|DELIMITED_VALUE" }

  - name: bridge_candidate_product
    source_table: UNION
    special: { kind: union, union_sources: [vin_candidate_product_a, vin_candidate_product_b] }
    columns:
      - { name: candidate_id, expr: vin_candidateid }
      - { name: product_key, expr: "FK:dim_product.productid|vin_productid" }
"#;

fn load_order() -> Vec<String> {
    [
        "dim_product",
        "dim_date",
        "dim_developer",
        "fact_snapshot",
        "bridge_candidate_developer",
        "bridge_candidate_product",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

async fn seed_source() -> DuckDbBackend {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE vin_products (vin_productid TEXT, vin_name TEXT); \
         INSERT INTO vin_products VALUES ('p-1', 'Vaccine A'), ('p-2', 'Vaccine B'); \
         CREATE TABLE vin_candidates ( \
             vin_candidateid TEXT, _vin_product_value TEXT, vin_status BIGINT, \
             modifiedon TEXT, vin_enrollment BIGINT, vin_developers TEXT); \
         INSERT INTO vin_candidates VALUES \
             ('c-1', 'p-1', 1, '2016-02-29T12:00:00Z', NULL, 'CEPI; Gates'), \
             ('c-2', 'p-9', 2, NULL, 100, 'CEPI'), \
             ('c-3', NULL, NULL, '2015-01-01T00:00:00Z', 50, NULL); \
         CREATE TABLE _optionset_vin_status (code BIGINT, label TEXT); \
         INSERT INTO _optionset_vin_status VALUES (1, 'Active'), (2, 'Paused'); \
         CREATE TABLE vin_candidate_product_a (vin_candidateid TEXT, vin_productid TEXT); \
         INSERT INTO vin_candidate_product_a VALUES ('c-1', 'p-1'); \
         CREATE TABLE vin_candidate_product_b (vin_candidateid TEXT, vin_productid TEXT); \
         INSERT INTO vin_candidate_product_b VALUES ('c-2', 'p-2'), ('c-2', 'p-9');",
    )
    .await
    .unwrap();
    db
}

#[tokio::test]
async fn test_full_run() {
    let source = seed_source().await;
    let target = DuckDbBackend::in_memory().unwrap();
    let map = SchemaMap::from_yaml(MAP_YAML).unwrap();

    let report = Pipeline::new(&source, &target)
        .run(&map, &load_order(), &builtin_lookups())
        .await
        .unwrap();

    let by_name = |n: &str| report.tables.iter().find(|t| t.name == n).unwrap();
    assert_eq!(by_name("dim_product").rows_inserted, 2);
    // 2015 + leap 2016.
    assert_eq!(by_name("dim_date").rows_inserted, 731);
    assert_eq!(by_name("dim_developer").rows_inserted, 2);
    assert_eq!(by_name("fact_snapshot").rows_inserted, 3);
    assert_eq!(by_name("bridge_candidate_developer").rows_inserted, 3);
    assert_eq!(by_name("bridge_candidate_developer").rows_dropped, 0);
    // Union bridge: two resolvable pairs, one dropped for the unknown product.
    assert_eq!(by_name("bridge_candidate_product").rows_inserted, 2);
    assert_eq!(by_name("bridge_candidate_product").rows_dropped, 1);

    // The one unknown product reference is nulled and reported.
    assert!(!report.is_clean());
    assert_eq!(report.referential_warnings.len(), 1);
    let warning = &report.referential_warnings[0];
    assert_eq!(warning.table, "fact_snapshot");
    assert_eq!(warning.column, "product_key");
    assert_eq!(warning.dimension, "dim_product");
    assert_eq!(warning.orphan_rows, 1);

    let facts = target
        .query_rows("SELECT * FROM fact_snapshot ORDER BY snapshot_key")
        .await
        .unwrap();
    assert_eq!(facts[0]["product_key"], Value::Int(1));
    assert_eq!(facts[0]["status"], Value::Text("Active".into()));
    // 2016-02-29 is day 425 of a 2015-2016 spine.
    assert_eq!(facts[0]["date_key"], Value::Int(425));
    assert_eq!(facts[0]["enrollment_count"], Value::Int(0));
    assert_eq!(facts[1]["product_key"], Value::Null);
    assert_eq!(facts[1]["date_key"], Value::Null);
    assert_eq!(facts[2]["status"], Value::Null);
    assert_eq!(facts[2]["date_key"], Value::Int(1));

    // Developer dimension is sorted; the bridge resolves against it.
    let developers = target
        .query_rows("SELECT * FROM dim_developer ORDER BY developer_key")
        .await
        .unwrap();
    assert_eq!(developers[0]["developer_name"], Value::Text("CEPI".into()));
    assert_eq!(developers[1]["developer_name"], Value::Text("Gates".into()));
    let pairs = target
        .query_count(
            "SELECT * FROM bridge_candidate_developer b \
             JOIN dim_developer d ON d.developer_key = b.developer_key",
        )
        .await
        .unwrap();
    assert_eq!(pairs, 3);
}

#[tokio::test]
async fn test_rerun_is_deterministic() {
    let source = seed_source().await;
    let target = DuckDbBackend::in_memory().unwrap();
    let map = SchemaMap::from_yaml(MAP_YAML).unwrap();
    let pipeline = Pipeline::new(&source, &target);

    let first = pipeline
        .run(&map, &load_order(), &builtin_lookups())
        .await
        .unwrap();
    let second = pipeline
        .run(&map, &load_order(), &builtin_lookups())
        .await
        .unwrap();

    assert_eq!(first.total_rows(), second.total_rows());
    let keys = target
        .query_rows("SELECT product_key FROM dim_product ORDER BY product_key")
        .await
        .unwrap();
    assert_eq!(keys[0]["product_key"], Value::Int(1));
    assert_eq!(keys[1]["product_key"], Value::Int(2));
}

#[tokio::test]
async fn test_load_order_violation_fails_before_extraction() {
    let source = seed_source().await;
    let target = DuckDbBackend::in_memory().unwrap();
    let map = SchemaMap::from_yaml(MAP_YAML).unwrap();

    let mut order = load_order();
    order.swap(0, 3); // fact before its product dimension

    let err = Pipeline::new(&source, &target)
        .run(&map, &order, &builtin_lookups())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EtlError::Core(CoreError::LoadOrderViolation { .. })
    ));
    // Nothing was created in the target.
    assert!(!target.relation_exists("dim_product").await.unwrap());
}

#[tokio::test]
async fn test_ambiguous_optionset_is_fatal() {
    let source = seed_source().await;
    source
        .execute("INSERT INTO _optionset_vin_status VALUES (1, 'Different')")
        .await
        .unwrap();
    let target = DuckDbBackend::in_memory().unwrap();
    let map = SchemaMap::from_yaml(MAP_YAML).unwrap();

    let err = Pipeline::new(&source, &target)
        .run(&map, &load_order(), &builtin_lookups())
        .await
        .unwrap_err();
    assert!(matches!(err, EtlError::AmbiguousOptionset { code: 1, .. }));
}

#[tokio::test]
async fn test_unknown_option_code_is_fatal() {
    let source = seed_source().await;
    source
        .execute("UPDATE vin_candidates SET vin_status = 9 WHERE vin_candidateid = 'c-2'")
        .await
        .unwrap();
    let target = DuckDbBackend::in_memory().unwrap();
    let map = SchemaMap::from_yaml(MAP_YAML).unwrap();

    let err = Pipeline::new(&source, &target)
        .run(&map, &load_order(), &builtin_lookups())
        .await
        .unwrap_err();
    assert!(matches!(err, EtlError::UnknownOptionCode { code: 9, .. }));
}
