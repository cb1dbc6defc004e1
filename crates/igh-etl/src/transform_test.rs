use super::*;
use crate::dimkeys::DimKeyCache;
use crate::optionset::OptionsetCatalog;
use igh_core::{ColumnSpec, CompiledMap, LookupRegistry, SchemaMap, TableSpec};
use std::collections::HashMap;

fn spec(
    name: &str,
    source: Option<&str>,
    primary_key: Option<&str>,
    natural_key: &[&str],
    special: Option<Special>,
    columns: &[(&str, &str)],
) -> TableSpec {
    TableSpec {
        name: name.to_string(),
        source_table: source.map(str::to_string),
        primary_key: primary_key.map(str::to_string),
        natural_key: natural_key.iter().map(|s| s.to_string()).collect(),
        special,
        columns: columns
            .iter()
            .map(|(n, e)| ColumnSpec {
                name: n.to_string(),
                expr: e.to_string(),
            })
            .collect(),
    }
}

fn compiled_map() -> CompiledMap {
    let map = SchemaMap {
        tables: vec![
            spec(
                "dim_product",
                Some("vin_products"),
                Some("product_key"),
                &["productid"],
                None,
                &[("productid", "productid"), ("name", "vin_name")],
            ),
            spec(
                "dim_date",
                None,
                Some("date_key"),
                &["full_date"],
                Some(Special::Generate {
                    start_year: 2016,
                    end_year: 2016,
                }),
                &[
                    ("full_date", "GENERATED"),
                    ("year", "GENERATED"),
                    ("quarter", "GENERATED"),
                    ("month", "GENERATED"),
                    ("day", "GENERATED"),
                    ("day_of_week", "GENERATED"),
                ],
            ),
            spec(
                "dim_tech",
                Some("vin_candidates"),
                Some("tech_key"),
                &[],
                Some(Special::Distinct {
                    distinct_cols: vec!["new_platform".to_string(), "vin_ttype".to_string()],
                }),
                &[("platform", "new_platform"), ("ttype", "vin_ttype")],
            ),
            spec(
                "dim_developer",
                Some("vin_candidates"),
                Some("developer_key"),
                &["developer_name"],
                Some(Special::Delimited {
                    source_column: "vin_developers".to_string(),
                    delimiter: ";".to_string(),
                }),
                &[
                    ("developer_name", "DELIMITED_VALUE"),
                    ("source_system", "LITERAL:crm"),
                ],
            ),
            spec(
                "fact_sales",
                Some("vin_sales"),
                Some("sales_key"),
                &[],
                None,
                &[
                    ("product_key", "FK:dim_product.productid|_vin_product_value"),
                    ("tech_key", "FK:dim_tech.COMPOSITE|new_platform,vin_ttype"),
                    ("amount", "vin_amount"),
                ],
            ),
            spec(
                "bridge_link",
                Some("vin_links"),
                None,
                &[],
                None,
                &[
                    ("candidate_id", "vin_candidateid"),
                    ("product_key", "FK:dim_product.productid|_vin_product_value"),
                ],
            ),
            spec(
                "bridge_dev",
                Some("vin_candidates"),
                None,
                &[],
                Some(Special::DelimitedBridge {
                    source_column: "vin_developers".to_string(),
                    delimiter: ";".to_string(),
                }),
                &[
                    ("candidate_id", "vin_candidateid"),
                    (
                        "developer_key",
                        "FK:dim_developer.developer_name|DELIMITED_VALUE",
                    ),
                ],
            ),
        ],
    };
    CompiledMap::compile(&map, &LookupRegistry::new()).unwrap()
}

struct Fixture {
    map: CompiledMap,
    optionsets: OptionsetCatalog,
    dim_keys: DimKeyCache,
    lookups: LookupRegistry,
}

impl Fixture {
    fn new() -> Self {
        let mut dim_keys = DimKeyCache::new();
        dim_keys.register(
            "dim_product",
            vec![KeyPart::Text("p-42".to_string())],
            7,
        );
        dim_keys.register(
            "dim_tech",
            vec![KeyPart::Text("mRNA".to_string()), KeyPart::Int(3)],
            11,
        );
        dim_keys.register(
            "dim_developer",
            vec![KeyPart::Text("CEPI".to_string())],
            1,
        );
        dim_keys.register(
            "dim_developer",
            vec![KeyPart::Text("Gates".to_string())],
            2,
        );
        Self {
            map: compiled_map(),
            optionsets: OptionsetCatalog::from_entries(HashMap::new()),
            dim_keys,
            lookups: LookupRegistry::new(),
        }
    }
}

fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn test_date_spine_leap_year() {
    let fx = Fixture::new();
    let ctx = EvalContext::new(&fx.optionsets, &fx.dim_keys, &fx.lookups);
    let tx = Transformer::new(&ctx);
    let out = tx
        .transform(fx.map.get("dim_date").unwrap(), &[])
        .unwrap();

    assert_eq!(out.len(), 366);
    // 2016-01-01 was a Friday.
    assert_eq!(
        out.rows[0],
        vec![
            Value::Text("2016-01-01".into()),
            Value::Int(2016),
            Value::Int(1),
            Value::Int(1),
            Value::Int(1),
            Value::Int(5),
        ]
    );
    assert_eq!(
        out.natural_keys[0],
        vec![KeyPart::Text("2016-01-01".into())]
    );
    // Q4 starts in October.
    let oct_first = out
        .rows
        .iter()
        .find(|r| r[0] == Value::Text("2016-10-01".into()))
        .unwrap();
    assert_eq!(oct_first[2], Value::Int(4));
}

#[test]
fn test_distinct_dedup_first_seen() {
    let fx = Fixture::new();
    let ctx = EvalContext::new(&fx.optionsets, &fx.dim_keys, &fx.lookups);
    let tx = Transformer::new(&ctx);

    let rows = vec![
        row(&[
            ("new_platform", Value::Text("mRNA".into())),
            ("vin_ttype", Value::Int(3)),
        ]),
        row(&[
            ("new_platform", Value::Text("mRNA".into())),
            ("vin_ttype", Value::Int(3)),
        ]),
        row(&[
            ("new_platform", Value::Text("DNA".into())),
            ("vin_ttype", Value::Int(1)),
        ]),
        // Fully-null tuples are skipped.
        row(&[("new_platform", Value::Null), ("vin_ttype", Value::Null)]),
        // Partially-null tuples are kept.
        row(&[("new_platform", Value::Null), ("vin_ttype", Value::Int(9))]),
    ];
    let out = tx
        .transform(fx.map.get("dim_tech").unwrap(), &rows)
        .unwrap();

    assert_eq!(out.len(), 3);
    assert_eq!(
        out.natural_keys[0],
        vec![KeyPart::Text("mRNA".into()), KeyPart::Int(3)]
    );
    assert_eq!(
        out.natural_keys[2],
        vec![KeyPart::Null, KeyPart::Int(9)]
    );
}

#[test]
fn test_fact_nulls_and_counts_fk_gaps() {
    let fx = Fixture::new();
    let ctx = EvalContext::new(&fx.optionsets, &fx.dim_keys, &fx.lookups);
    let tx = Transformer::new(&ctx);

    let rows = vec![
        row(&[
            ("_vin_product_value", Value::Text("p-42".into())),
            ("new_platform", Value::Text("mRNA".into())),
            ("vin_ttype", Value::Int(3)),
            ("vin_amount", Value::Int(10)),
        ]),
        // Unknown product: nulled and counted.
        row(&[
            ("_vin_product_value", Value::Text("p-99".into())),
            ("new_platform", Value::Text("mRNA".into())),
            ("vin_ttype", Value::Int(3)),
            ("vin_amount", Value::Int(20)),
        ]),
        // Null product: nulled, not counted.
        row(&[
            ("_vin_product_value", Value::Null),
            ("new_platform", Value::Null),
            ("vin_ttype", Value::Int(3)),
            ("vin_amount", Value::Int(30)),
        ]),
    ];
    let out = tx
        .transform(fx.map.get("fact_sales").unwrap(), &rows)
        .unwrap();

    assert_eq!(out.len(), 3);
    assert_eq!(out.rows_dropped, 0);
    assert_eq!(out.rows[0][0], Value::Int(7));
    assert_eq!(out.rows[0][1], Value::Int(11));
    assert_eq!(out.rows[1][0], Value::Null);
    assert_eq!(out.rows[2][0], Value::Null);
    assert_eq!(out.rows[2][1], Value::Null);
    assert_eq!(
        out.gaps,
        vec![FkGap {
            column: "product_key".to_string(),
            dimension: "dim_product".to_string(),
            count: 1,
        }]
    );
}

#[test]
fn test_bridge_drops_unresolved_rows() {
    let fx = Fixture::new();
    let ctx = EvalContext::new(&fx.optionsets, &fx.dim_keys, &fx.lookups);
    let tx = Transformer::new(&ctx);

    let rows = vec![
        row(&[
            ("vin_candidateid", Value::Text("c-1".into())),
            ("_vin_product_value", Value::Text("p-42".into())),
        ]),
        row(&[
            ("vin_candidateid", Value::Text("c-2".into())),
            ("_vin_product_value", Value::Text("p-99".into())),
        ]),
    ];
    let out = tx
        .transform(fx.map.get("bridge_link").unwrap(), &rows)
        .unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out.rows_dropped, 1);
    assert!(out.gaps.is_empty());
    assert_eq!(out.rows[0][1], Value::Int(7));
}

#[test]
fn test_delimited_dimension_sorted_distinct() {
    let fx = Fixture::new();
    let ctx = EvalContext::new(&fx.optionsets, &fx.dim_keys, &fx.lookups);
    let tx = Transformer::new(&ctx);

    let rows = vec![
        row(&[("vin_developers", Value::Text("Gates; CEPI".into()))]),
        row(&[("vin_developers", Value::Text("CEPI;  ;Wellcome".into()))]),
        row(&[("vin_developers", Value::Null)]),
    ];
    let out = tx
        .transform(fx.map.get("dim_developer").unwrap(), &rows)
        .unwrap();

    let names: Vec<&Value> = out.rows.iter().map(|r| &r[0]).collect();
    assert_eq!(
        names,
        vec![
            &Value::Text("CEPI".into()),
            &Value::Text("Gates".into()),
            &Value::Text("Wellcome".into()),
        ]
    );
    assert_eq!(out.rows[0][1], Value::Text("crm".into()));
    assert_eq!(out.natural_keys[1], vec![KeyPart::Text("Gates".into())]);
}

#[test]
fn test_delimited_bridge_pairs_and_drops() {
    let fx = Fixture::new();
    let ctx = EvalContext::new(&fx.optionsets, &fx.dim_keys, &fx.lookups);
    let tx = Transformer::new(&ctx);

    let rows = vec![row(&[
        ("vin_candidateid", Value::Text("c-1".into())),
        ("vin_developers", Value::Text("Gates; CEPI; Unknown Org".into())),
    ])];
    let out = tx
        .transform(fx.map.get("bridge_dev").unwrap(), &rows)
        .unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out.rows_dropped, 1);
    assert_eq!(out.rows[0][1], Value::Int(2));
    assert_eq!(out.rows[1][1], Value::Int(1));
}
