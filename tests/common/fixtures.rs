use client_report::{Record, ReportConfig};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// A fixed point in time so timestamps in reports are predictable
pub fn fixed_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 12, 10)
        .and_then(|d| d.and_hms_opt(14, 5, 9))
        .expect("valid timestamp")
}

pub fn record(name: &str, balance: Decimal) -> Record {
    let slug = name.to_lowercase().replace(' ', ".");
    Record::new(
        name,
        "123 Maple St, Springfield",
        format!("ACCT-{}", name.len()),
        balance,
        format!("{}@email.com", slug),
        "555-0101",
        "2024-12-09",
    )
}

/// `count` records with distinct, sortable names
pub fn many_records(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| record(&format!("Client {:03}", i), Decimal::new(i as i64 * 1000 + 99, 2)))
        .collect()
}

/// Writes a small PNG logo and returns its path
pub fn write_png_logo(dir: &Path) -> PathBuf {
    let path = dir.join("logo.png");
    image::RgbImage::from_pixel(40, 20, image::Rgb([41, 128, 185]))
        .save(&path)
        .expect("write png logo");
    path
}

/// Writes a small JPEG logo and returns its path
pub fn write_jpeg_logo(dir: &Path) -> PathBuf {
    let path = dir.join("logo.jpg");
    let mut bytes = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(40, 20, image::Rgb([200, 30, 30])))
        .write_to(&mut bytes, image::ImageFormat::Jpeg)
        .expect("encode jpeg logo");
    std::fs::write(&path, bytes.into_inner()).expect("write jpeg logo");
    path
}

/// The template shipped with the crate
pub fn shipped_template() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/ReportTemplate.xhtml")
}

/// Config writing into `dir` with a logo and the shipped template
pub fn config_in(dir: &Path) -> ReportConfig {
    ReportConfig {
        output_dir: dir.join("reports"),
        logo_path: write_png_logo(dir),
        template_path: shipped_template(),
        database_path: dir.join("clients.db"),
        ..ReportConfig::default()
    }
}
