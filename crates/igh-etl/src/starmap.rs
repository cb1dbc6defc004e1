//! Built-in schema map for the Dataverse-sourced candidate pipeline
//! warehouse. Used when no schema-map file is supplied on the command
//! line; a YAML map with the same shape can replace any of it.

use igh_core::{ColumnSpec, LookupRegistry, LookupTable, SchemaMap, Special, TableSpec};

fn table(
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

/// The default target star schema.
pub fn builtin_schema_map() -> SchemaMap {
    SchemaMap {
        tables: vec![
            table(
                "dim_product",
                Some("vin_products"),
                Some("product_key"),
                &["productid"],
                None,
                &[
                    ("productid", "vin_productid"),
                    ("product_name", "vin_name"),
                    ("product_type", "OPTIONSET:vin_producttype"),
                ],
            ),
            table(
                "dim_disease",
                Some("vin_diseases"),
                Some("disease_key"),
                &["diseaseid"],
                None,
                &[
                    ("diseaseid", "vin_diseaseid"),
                    ("disease_name", "vin_name"),
                    ("disease_group", "COALESCE(new_diseasegroup, 'Unknown')"),
                ],
            ),
            table(
                "dim_phase",
                Some("vin_rdstages"),
                Some("phase_key"),
                &["vin_rdstageid"],
                None,
                &[
                    ("vin_rdstageid", "vin_rdstageid"),
                    ("phase_name", "vin_name"),
                    ("sort_order", "LOOKUP:PHASE_SORT_ORDER"),
                ],
            ),
            table(
                "dim_geography",
                Some("vin_countries"),
                Some("geography_key"),
                &["countryid"],
                None,
                &[
                    ("countryid", "vin_countryid"),
                    ("country_name", "vin_name"),
                    ("who_region", "COALESCE(vin_whoregion, 'Unassigned')"),
                ],
            ),
            table(
                "dim_organization",
                Some("accounts"),
                Some("organization_key"),
                &["accountid"],
                None,
                &[
                    ("accountid", "accountid"),
                    ("organization_name", "name"),
                    ("organization_type", "OPTIONSET:vin_organisationtype"),
                ],
            ),
            table(
                "dim_priority",
                Some("vin_prioritypathogens"),
                Some("priority_key"),
                &["prioritypathogenid"],
                None,
                &[
                    ("prioritypathogenid", "vin_prioritypathogenid"),
                    ("priority_name", "vin_name"),
                ],
            ),
            table(
                "dim_date",
                None,
                Some("date_key"),
                &["full_date"],
                Some(Special::Generate {
                    start_year: 2015,
                    end_year: 2030,
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
            table(
                "dim_candidate_core",
                Some("vin_candidates"),
                Some("candidate_key"),
                &["candidateid"],
                None,
                &[
                    ("candidateid", "vin_candidateid"),
                    ("candidate_name", "vin_name"),
                    ("is_active_flag", "CASE WHEN statecode = 0 THEN 1 ELSE 0 END"),
                ],
            ),
            table(
                "dim_candidate_tech",
                Some("vin_candidates"),
                Some("tech_key"),
                &[],
                Some(Special::Distinct {
                    distinct_cols: vec![
                        "new_platform".to_string(),
                        "vin_technologytype".to_string(),
                        "vin_iggformatanimalderived".to_string(),
                        "vin_routeofadministrationaggregated".to_string(),
                    ],
                }),
                &[
                    ("platform", "new_platform"),
                    ("technology_type", "OPTIONSET:vin_technologytype"),
                    ("igg_format", "vin_iggformatanimalderived"),
                    (
                        "route_of_administration",
                        "vin_routeofadministrationaggregated",
                    ),
                ],
            ),
            table(
                "dim_candidate_regulatory",
                Some("vin_candidates"),
                Some("regulatory_key"),
                &[],
                Some(Special::Distinct {
                    distinct_cols: vec![
                        "vin_approvalstatus".to_string(),
                        "vin_stringentregulatoryauthoritysraapproval".to_string(),
                        "vin_usfdaapprovaldate".to_string(),
                        "vin_whoprequalificationdate".to_string(),
                    ],
                }),
                &[
                    ("approval_status", "OPTIONSET:vin_approvalstatus"),
                    (
                        "sra_approval",
                        "vin_stringentregulatoryauthoritysraapproval",
                    ),
                    ("fda_approval_date", "vin_usfdaapprovaldate"),
                    ("who_prequalification_date", "vin_whoprequalificationdate"),
                ],
            ),
            table(
                "dim_developer",
                Some("vin_candidates"),
                Some("developer_key"),
                &["developer_name"],
                Some(Special::Delimited {
                    source_column: "vin_developersaggregated".to_string(),
                    delimiter: ";".to_string(),
                }),
                &[
                    ("developer_name", "DELIMITED_VALUE"),
                    ("source_system", "LITERAL:dataverse"),
                ],
            ),
            table(
                "fact_pipeline_snapshot",
                Some("vin_candidates"),
                Some("snapshot_key"),
                &[],
                None,
                &[
                    (
                        "candidate_key",
                        "FK:dim_candidate_core.candidateid|vin_candidateid",
                    ),
                    (
                        "product_key",
                        "FK:dim_product.productid|_vin_mainproduct_value",
                    ),
                    (
                        "disease_key",
                        "FK:dim_disease.diseaseid|_vin_primarydisease_value",
                    ),
                    (
                        "phase_key",
                        "FK:dim_phase.vin_rdstageid|_vin_rdstage_value",
                    ),
                    (
                        "tech_key",
                        "FK:dim_candidate_tech.COMPOSITE|new_platform,vin_technologytype,vin_iggformatanimalderived,vin_routeofadministrationaggregated",
                    ),
                    (
                        "regulatory_key",
                        "FK:dim_candidate_regulatory.COMPOSITE|vin_approvalstatus,vin_stringentregulatoryauthoritysraapproval,vin_usfdaapprovaldate,vin_whoprequalificationdate",
                    ),
                    (
                        "snapshot_date_key",
                        "FK:dim_date.full_date|EXTRACT_DATE:modifiedon",
                    ),
                    ("is_active_flag", "CASE WHEN statecode = 0 THEN 1 ELSE 0 END"),
                    ("source_system", "LITERAL:dataverse"),
                ],
            ),
            table(
                "fact_clinical_trial_event",
                Some("vin_clinicaltrials"),
                Some("trial_event_key"),
                &["trial_id"],
                None,
                &[
                    ("trial_id", "vin_clinicaltrialid"),
                    (
                        "candidate_key",
                        "FK:dim_candidate_core.candidateid|_vin_candidate_value",
                    ),
                    (
                        "phase_key",
                        "FK:dim_phase.vin_rdstageid|_vin_trialphase_value",
                    ),
                    (
                        "start_date_key",
                        "FK:dim_date.full_date|EXTRACT_DATE:vin_startdate",
                    ),
                    (
                        "end_date_key",
                        "FK:dim_date.full_date|EXTRACT_DATE:vin_enddate",
                    ),
                    ("enrollment_count", "COALESCE(vin_enrollment, 0)"),
                    ("trial_status", "OPTIONSET:vin_ctstatus"),
                ],
            ),
            table(
                "bridge_candidate_geography",
                Some("UNION"),
                None,
                &[],
                Some(Special::Union {
                    union_sources: vec![
                        "vin_candidate_vin_country".to_string(),
                        "vin_candidate_vin_targetcountry".to_string(),
                    ],
                }),
                &[
                    (
                        "candidate_key",
                        "FK:dim_candidate_core.candidateid|vin_candidateid",
                    ),
                    (
                        "geography_key",
                        "FK:dim_geography.countryid|vin_countryid",
                    ),
                ],
            ),
            table(
                "bridge_candidate_developer",
                Some("vin_candidates"),
                None,
                &[],
                Some(Special::DelimitedBridge {
                    source_column: "vin_developersaggregated".to_string(),
                    delimiter: ";".to_string(),
                }),
                &[
                    (
                        "candidate_key",
                        "FK:dim_candidate_core.candidateid|vin_candidateid",
                    ),
                    (
                        "developer_key",
                        "FK:dim_developer.developer_name|DELIMITED_VALUE",
                    ),
                ],
            ),
            table(
                "bridge_candidate_priority",
                Some("vin_candidate_vin_prioritypathogen"),
                None,
                &[],
                None,
                &[
                    (
                        "candidate_key",
                        "FK:dim_candidate_core.candidateid|vin_candidateid",
                    ),
                    (
                        "priority_key",
                        "FK:dim_priority.prioritypathogenid|vin_prioritypathogenid",
                    ),
                ],
            ),
        ],
    }
}

/// Load order for the built-in map: every dimension before anything
/// that references it.
pub fn builtin_load_order() -> Vec<String> {
    [
        "dim_product",
        "dim_disease",
        "dim_phase",
        "dim_geography",
        "dim_organization",
        "dim_priority",
        "dim_date",
        "dim_candidate_core",
        "dim_candidate_tech",
        "dim_candidate_regulatory",
        "dim_developer",
        "fact_pipeline_snapshot",
        "fact_clinical_trial_event",
        "bridge_candidate_geography",
        "bridge_candidate_developer",
        "bridge_candidate_priority",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Static lookup tables for the built-in map.
pub fn builtin_lookups() -> LookupRegistry {
    let mut registry = LookupRegistry::new();
    registry.register(
        "PHASE_SORT_ORDER",
        LookupTable::new("vin_name", 500).with_entries([
            ("Discovery", 10),
            ("Pre-clinical", 20),
            ("Preclinical", 20),
            ("Phase I", 40),
            ("Phase I/II", 45),
            ("Phase II", 50),
            ("Phase II/III", 55),
            ("Phase III", 60),
            ("Phase IV", 65),
            ("Registration", 70),
            ("Approved", 80),
            ("Marketed", 90),
            ("Discontinued", 900),
        ]),
    );
    registry
}
