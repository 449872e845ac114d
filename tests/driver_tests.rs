mod common;

use client_report::{
    Destination, Pipeline, Record, RecordStore, ReportBuilder, ReportDriver, ReportError, SqliteRecordStore,
    default_template_report_file_name, sample_records,
};
use common::fixtures::*;
use common::{GeneratedPdf, TestResult};
use rust_decimal_macros::dec;

fn seeded_driver(dir: &std::path::Path) -> Result<ReportDriver<SqliteRecordStore>, Box<dyn std::error::Error>> {
    let config = config_in(dir);
    let mut store = SqliteRecordStore::open(&config.database_path)?;
    store.seed_sample_data()?;
    Ok(ReportDriver::new(store, config).with_timestamp(fixed_timestamp()))
}

#[test]
fn test_client_report_uses_default_prefix() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir()?;
    let driver = seeded_driver(dir.path())?;

    let records = driver.store().load_all()?;
    let path = driver.generate_client_report(&records)?;
    assert_eq!(path, dir.path().join("reports").join("ClientReport.pdf"));

    let pdf = GeneratedPdf::from_file(&path)?;
    assert_pdf_contains_text!(pdf, "Carlos Reyes");
    assert_pdf_contains_text!(pdf, "Thomas Lee");
    assert_pdf_contains_text!(pdf, "$107,580.99");
    Ok(())
}

#[test]
fn test_single_client_report_is_named_after_the_client() -> TestResult {
    let dir = tempfile::tempdir()?;
    let driver = seeded_driver(dir.path())?;
    let jane = sample_records()
        .into_iter()
        .find(|r| r.name == "Jane Smith")
        .expect("sample client");

    let path = driver.generate_single_client_report(&jane)?;
    assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("Jane Smith.pdf"));

    let pdf = GeneratedPdf::from_file(&path)?;
    assert_pdf_page_count!(pdf, 1);
    assert_pdf_contains_text!(pdf, "Client Report - Jane Smith");
    assert_pdf_contains_text!(pdf, "$10,250.50");
    Ok(())
}

#[test]
fn test_explicit_destination_is_used_verbatim() -> TestResult {
    let dir = tempfile::tempdir()?;
    let driver = seeded_driver(dir.path())?;
    let target = dir.path().join("custom-name.pdf");

    let path = driver.generate_tabular_report(&[record("A", dec!(1))], Destination::Path(target.clone()))?;
    assert_eq!(path, target);
    assert!(target.exists());
    Ok(())
}

#[test]
fn test_existing_report_is_replaced() -> TestResult {
    let dir = tempfile::tempdir()?;
    let driver = seeded_driver(dir.path())?;

    let first = driver.generate_tabular_report(&[record("First", dec!(1))], "Daily")?;
    let second = driver.generate_tabular_report(&[record("Second", dec!(2))], "Daily")?;
    assert_eq!(first, second);

    let pdf = GeneratedPdf::from_file(&second)?;
    assert_pdf_contains_text!(pdf, "Second");
    assert_pdf_not_contains_text!(pdf, "First");
    Ok(())
}

#[test]
fn test_template_report_loads_records_from_the_store() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir()?;
    let driver = seeded_driver(dir.path())?;
    let date = fixed_timestamp().date();
    let target = dir.path().join(default_template_report_file_name(date));

    driver.generate_template_report(&target)?;
    assert!(target.ends_with("ClientReport_HTML_20241210.pdf"));

    let pdf = GeneratedPdf::from_file(&target)?;
    assert_pdf_contains_text!(pdf, "Total Clients: 14");
    assert_pdf_contains_text!(pdf, "Total Balance: $107,580.99");

    let texts = pdf.texts();
    let carlos = texts.iter().position(|t| t == "Carlos Reyes").expect("first client");
    let thomas = texts.iter().position(|t| t == "Thomas Lee").expect("last client");
    assert!(carlos < thomas);
    Ok(())
}

#[test]
fn test_template_errors_reach_the_caller() -> TestResult {
    let dir = tempfile::tempdir()?;
    let mut config = config_in(dir.path());
    config.template_path = dir.path().join("nope.xhtml");
    let driver = ReportDriver::new(sample_records(), config);
    let target = dir.path().join("out.pdf");

    let err = driver.generate_template_report(&target).unwrap_err();
    assert!(matches!(err, ReportError::TemplateNotFound { .. }));
    assert!(!target.exists());
    Ok(())
}

#[test]
fn test_both_pipelines_behind_one_builder() -> TestResult {
    let dir = tempfile::tempdir()?;
    let driver = ReportDriver::new(Vec::<Record>::new(), config_in(dir.path())).with_timestamp(fixed_timestamp());
    let records = vec![record("A", dec!(1.5))];

    for pipeline in [Pipeline::Direct, Pipeline::Template] {
        let pdf = GeneratedPdf::from_bytes(driver.builder(pipeline).render(&records)?)?;
        assert_pdf_contains_text!(pdf, "$1.50");
    }
    Ok(())
}
