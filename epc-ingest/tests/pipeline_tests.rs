//! End-to-end pipeline tests against an on-disk catalog

mod helpers;

use epc_ingest::db::attributes::load_program_attributes;
use epc_ingest::db::categories::load_program_categories;
use epc_ingest::db::organizations::load_organization_by_slug;
use epc_ingest::db::programs::{find_program_id, list_program_slugs};
use epc_ingest::db::runs::{entity_counts, latest_run};
use epc_ingest::models::AttributeValue;
use epc_ingest::IngestError;
use epc_ingest::workflow::{MigrationReport, Orchestrator, Severity};
use epc_common::db::init::init_memory_database;
use epc_common::db::models::{OrganizationType, ProgramType, SelectivityTier};
use helpers::{count_rows, create_test_db, reject_inserts, run_records, test_config};
use serde_json::{json, Value};
use sqlx::{Row, SqlitePool};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn catalog() -> Vec<Value> {
    vec![
        json!({
            "program_name": "MIT MITES Summer",
            "organization": "MIT MITES",
            "grade_level": "11",
            "application_deadline": "February 1, 2026",
            "website": "https://mitadmissions.org/mites",
            "financial_aid": "Free with travel stipend",
            "selectivity_percent": "8%",
            "duration_weeks": "6 weeks",
            "subject_area": "Engineering, Computer Science",
            "location_city": "Cambridge",
            "location_state": "MA"
        }),
        json!({
            "program_name": "MIT Beaver Works Summer Institute",
            "organization": "MIT",
            "grade_level": "High School",
            "subject_area": "Engineering"
        }),
        json!({
            "title": "Research Science Institute",
            "org": "CEE",
            "grades": "11-12",
            "acceptance_rate": 3,
            "deadline": "TBD"
        }),
    ]
}

async fn program_id(pool: &SqlitePool, org_slug: &str, program_slug: &str) -> Uuid {
    let org = load_organization_by_slug(pool, org_slug).await.unwrap().unwrap();
    find_program_id(pool, org.guid, program_slug).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_organization_variants_resolve_to_one_organization() {
    let (dir, pool) = create_test_db().await;
    let report = run_records(&pool, &test_config(&dir), &catalog()[..2]).await;

    assert_eq!(report.counters().created, 2);
    assert_eq!(count_rows(&pool, "organizations").await, 1);

    let mit = load_organization_by_slug(&pool, "mit").await.unwrap().unwrap();
    assert_eq!(mit.name, "MIT");
    assert_eq!(mit.org_type, OrganizationType::Organization);
    assert_eq!(mit.website.as_deref(), Some("https://mitadmissions.org"));
    assert_eq!(mit.city.as_deref(), Some("Cambridge"));
    assert_eq!(mit.country.as_deref(), Some("USA"));
    assert_eq!(
        list_program_slugs(&pool, mit.guid).await.unwrap(),
        vec!["mit-beaver-works-summer-institute", "mit-mites-summer"]
    );
}

#[tokio::test]
async fn test_program_fields_normalized() {
    let (dir, pool) = create_test_db().await;
    run_records(&pool, &test_config(&dir), &catalog()).await;

    let id = program_id(&pool, "mit", "mit-mites-summer").await;
    let row = sqlx::query(
        "SELECT program_type, selectivity_tier, estimated_acceptance_rate, duration_value, target_audience \
         FROM programs WHERE guid = ?",
    )
    .bind(id.to_string())
    .fetch_one(&pool)
    .await
    .unwrap();

    let program_type: String = row.get("program_type");
    let tier: String = row.get("selectivity_tier");
    assert_eq!(program_type, ProgramType::SummerProgram.to_db_string());
    assert_eq!(tier, SelectivityTier::Elite.to_db_string());
    assert_eq!(row.get::<Option<f64>, _>("estimated_acceptance_rate"), Some(8.0));
    assert_eq!(row.get::<Option<i64>, _>("duration_value"), Some(6));
    assert_eq!(row.get::<Option<String>, _>("target_audience").as_deref(), Some("Grades 10-12"));

    let attributes = load_program_attributes(&pool, id).await.unwrap();
    assert_eq!(attributes["grade_level_min"], AttributeValue::Integer(10));
    assert_eq!(attributes["grade_level_max"], AttributeValue::Integer(12));
    assert_eq!(
        attributes["cost_category"],
        AttributeValue::String("FREE_PLUS_STIPEND".to_string())
    );
    assert!(matches!(attributes["application_deadline"], AttributeValue::Date(_)));
    assert!(matches!(attributes["source_record"], AttributeValue::Json(_)));
}

#[tokio::test]
async fn test_categories_linked_with_single_primary() {
    let (dir, pool) = create_test_db().await;
    run_records(&pool, &test_config(&dir), &catalog()).await;

    let id = program_id(&pool, "mit", "mit-mites-summer").await;
    let links = load_program_categories(&pool, id).await.unwrap();
    assert_eq!(
        links,
        vec![
            ("computer-science".to_string(), true),
            ("engineering".to_string(), false),
            ("stem".to_string(), false),
        ]
    );

    let rsi = program_id(&pool, "cee", "research-science-institute").await;
    let links = load_program_categories(&pool, rsi).await.unwrap();
    assert_eq!(links, vec![("research".to_string(), true)]);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let (dir, pool) = create_test_db().await;
    let config = test_config(&dir);

    let first = run_records(&pool, &config, &catalog()).await;
    let counts_after_first = entity_counts(&pool).await.unwrap();

    let second = run_records(&pool, &config, &catalog()).await;
    let counts_after_second = entity_counts(&pool).await.unwrap();

    assert_eq!(counts_after_first, counts_after_second);
    assert_eq!(first.counters().created, 3);
    assert_eq!(second.counters().created, 0);
    assert_eq!(second.counters().updated, 3);
    assert_eq!(count_rows(&pool, "import_runs").await, 2);
}

#[tokio::test]
async fn test_attribute_rewrite_replaces_value() {
    let (dir, pool) = create_test_db().await;
    let config = test_config(&dir);

    let record = |grades: &str| json!({"program_name": "Math Circle", "organization": "AMS", "grade_level": grades});
    run_records(&pool, &config, &[record("9-12")]).await;
    run_records(&pool, &config, &[record("10-12")]).await;

    let id = program_id(&pool, "ams", "math-circle").await;
    let rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM program_attributes a \
         JOIN attribute_definitions d ON d.guid = a.attribute_definition_id \
         WHERE a.program_id = ? AND d.name = 'grade_level_min'",
    )
    .bind(id.to_string())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(rows, 1);

    let attributes = load_program_attributes(&pool, id).await.unwrap();
    assert_eq!(attributes["grade_level_min"], AttributeValue::Integer(10));
}

#[tokio::test]
async fn test_unparseable_records_skipped_without_partial_writes() {
    let (dir, pool) = create_test_db().await;
    let records = vec![
        json!(42),
        json!({"organization": "Orphan Foundation"}),
        json!({"program_name": ["not", "text"]}),
        json!({"program_name": "Valid Program", "organization": "Valid Org"}),
    ];

    let report = run_records(&pool, &test_config(&dir), &records).await;
    let counters = report.counters();

    assert_eq!(counters.total, 4);
    assert_eq!(counters.skipped, 3);
    assert_eq!(counters.created, 1);
    assert_eq!(counters.errors, 0);
    assert!(report.is_success());
    assert_eq!(count_rows(&pool, "organizations").await, 1);
    assert!(load_organization_by_slug(&pool, "orphan-foundation").await.unwrap().is_none());

    let warnings: Vec<_> = report.issues_at_least(Severity::Warning).collect();
    assert_eq!(warnings.len(), 3);
    assert_eq!(warnings[0].record_identifier, "record #1");
    assert_eq!(warnings[1].field, "program_name");
}

#[tokio::test]
async fn test_organization_insert_failure_uses_placeholder() {
    let (dir, pool) = create_test_db().await;
    reject_inserts(&pool, "reject_broken_org", "organizations", "NEW.slug = 'broken'").await;

    let records = vec![
        json!({"program_name": "BROKEN Robotics Camp"}),
        json!({"program_name": "Good Program", "organization": "Good Org"}),
        json!({"program_name": "BROKEN Math Camp"}),
    ];
    let report = run_records(&pool, &test_config(&dir), &records).await;
    let counters = report.counters();

    assert_eq!(counters.errors, 2);
    assert_eq!(counters.created, 1);
    assert!(!report.is_success());
    assert_eq!(count_rows(&pool, "programs").await, 1);

    let errors: Vec<_> = report.issues_at_least(Severity::Error).collect();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|issue| issue.field == "organization"));
    assert!(errors[0].issue.contains("manual follow-up"));
}

#[tokio::test]
async fn test_program_failure_counts_error_and_continues() {
    let (dir, pool) = create_test_db().await;
    reject_inserts(&pool, "reject_program", "programs", "NEW.slug = 'doomed-program'").await;

    let records = vec![
        json!({"program_name": "Doomed Program", "organization": "Some Org"}),
        json!({"program_name": "Fine Program", "organization": "Some Org"}),
    ];
    let report = run_records(&pool, &test_config(&dir), &records).await;

    assert_eq!(report.counters().errors, 1);
    assert_eq!(report.counters().created, 1);
    let issue = report.issues_at_least(Severity::Error).next().unwrap();
    assert_eq!(issue.record_identifier, "Doomed Program");
    assert_eq!(issue.field, "program");
}

#[tokio::test]
async fn test_attribute_failures_are_low_severity() {
    let (dir, pool) = create_test_db().await;
    // A definition whose type no longer matches the values the pipeline produces
    sqlx::query("UPDATE attribute_definitions SET data_type = 'integer' WHERE name = 'subject_area'")
        .execute(&pool)
        .await
        .unwrap();
    reject_inserts(
        &pool,
        "reject_website_attr",
        "program_attributes",
        "NEW.attribute_definition_id = (SELECT guid FROM attribute_definitions WHERE name = 'website')",
    )
    .await;

    let records = vec![json!({
        "program_name": "Coding Bootcamp",
        "organization": "Tech Club",
        "subject_area": "Computer Science",
        "website": "techclub.org"
    })];
    let report = run_records(&pool, &test_config(&dir), &records).await;

    assert_eq!(report.counters().created, 1);
    assert_eq!(report.counters().errors, 0);

    let low: Vec<&str> = report
        .issues()
        .iter()
        .filter(|issue| issue.severity == Severity::Low)
        .map(|issue| issue.field.as_str())
        .collect();
    assert_eq!(low, vec!["subject_area", "website"]);

    let id = program_id(&pool, "tech-club", "coding-bootcamp").await;
    let attributes = load_program_attributes(&pool, id).await.unwrap();
    assert!(!attributes.contains_key("subject_area"));
    assert!(!attributes.contains_key("website"));
    assert!(attributes.contains_key("source_record"));
}

#[tokio::test]
async fn test_report_tallies_inferred_and_missing() {
    let (dir, pool) = create_test_db().await;
    let report = run_records(&pool, &test_config(&dir), &catalog()).await;

    // RSI: deadline placeholder; Beaver Works: no deadline at all
    assert_eq!(report.missing()["application_deadline"], 2);
    // Organization given for all three; cost inferred from aid text once, defaulted twice
    assert!(!report.inferred().contains_key("organization"));
    assert_eq!(report.inferred()["cost_category"], 3);

    let infos = report
        .issues()
        .iter()
        .filter(|issue| issue.severity == Severity::Info && issue.field == "application_deadline")
        .count();
    assert_eq!(infos, 1);
}

#[tokio::test]
async fn test_small_batches_process_everything() {
    let (dir, pool) = create_test_db().await;
    let mut config = test_config(&dir);
    config.batch_size = 2;
    config.batch_delay = std::time::Duration::from_millis(1);

    let records: Vec<Value> = (1..=5)
        .map(|n| json!({"program_name": format!("Program {}", n), "organization": "Batch Org"}))
        .collect();
    let report = run_records(&pool, &config, &records).await;

    assert_eq!(report.counters().total, 5);
    assert_eq!(report.counters().created, 5);
    assert_eq!(count_rows(&pool, "organizations").await, 1);
}

#[tokio::test]
async fn test_cancelled_run_still_reports() {
    let (dir, pool) = create_test_db().await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = Orchestrator::new(pool.clone(), test_config(&dir))
        .await
        .unwrap()
        .run("test-input.json", &catalog(), &cancel)
        .await
        .unwrap();

    assert!(report.cancelled());
    assert_eq!(report.counters().total, 0);
    assert_eq!(count_rows(&pool, "programs").await, 0);

    let latest = latest_run(&pool).await.unwrap().unwrap();
    assert!(latest.cancelled);
}

#[tokio::test]
async fn test_closed_store_aborts_run() {
    let (dir, pool) = create_test_db().await;
    let orchestrator = Orchestrator::new(pool.clone(), test_config(&dir)).await.unwrap();
    pool.close().await;

    let err = orchestrator
        .run("test-input.json", &catalog(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_read_only_store_aborts_run() {
    let dir = tempfile::TempDir::new().unwrap();
    // Single connection, so the pragma applies to every statement of the run
    let pool = init_memory_database().await.unwrap();
    let orchestrator = Orchestrator::new(pool.clone(), test_config(&dir)).await.unwrap();
    sqlx::query("PRAGMA query_only = ON").execute(&pool).await.unwrap();

    let err = orchestrator
        .run("test-input.json", &catalog(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_fatal(), "expected fatal error, got {:?}", err);
    assert!(matches!(err, IngestError::StoreUnavailable(_)));
}

#[tokio::test]
async fn test_report_written_as_json_artifact() {
    let (dir, pool) = create_test_db().await;
    let config = test_config(&dir);
    let report = run_records(&pool, &config, &catalog()).await;

    let path = report.write_to_dir(&config.report_dir).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_string_lossy(),
        format!("migration-report-{}.json", report.run_id())
    );

    let parsed: MigrationReport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed, report);

    let json: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["counters"]["total"], 3);
    assert!(json["issues"].as_array().unwrap().iter().all(|issue| issue["severity"].is_string()));
}
