//! Integration tests for rendering and file export.

use mara_output::{
    ExportFormat, RenderOptions, Section, TableExport, export_to_dir, render_sections,
};
use polars::prelude::*;

fn quarterly() -> DataFrame {
    df!(
        "ts_code" => ["000001.SZ", "600000.SH"],
        "name" => ["平安银行", "浦发银行"],
        "end_date" => ["20231231", "20231231"],
        "roe" => [Some(10.5), None]
    )
    .unwrap()
}

fn latest() -> DataFrame {
    df!(
        "ts_code" => ["600000.SH"],
        "total_assets" => [9.1e12]
    )
    .unwrap()
}

#[test]
fn test_render_two_sections_tab_separated() {
    let quarterly = quarterly();
    let latest = latest();
    let mut out = Vec::new();

    render_sections(
        &mut out,
        &[
            Section {
                label: "quarterly",
                data: &quarterly,
            },
            Section {
                label: "latest",
                data: &latest,
            },
        ],
        RenderOptions {
            delimiter: b'\t',
            header: true,
        },
    )
    .unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "# frequency: quarterly");
    assert_eq!(lines[1], "ts_code\tname\tend_date\troe");
    assert_eq!(lines[3], "600000.SH\t浦发银行\t20231231\t");
    assert_eq!(lines[4], "");
    assert_eq!(lines[5], "# frequency: latest");
    assert_eq!(lines[7], "600000.SH\t9100000000000");
}

#[test]
fn test_export_one_json_file_per_table() {
    let dir = std::env::temp_dir().join(format!("mara-output-it-{}", std::process::id()));
    let tables = [
        TableExport::new("roe", quarterly()),
        TableExport::new("total_assets", latest()),
    ];

    let written = export_to_dir(&dir, &tables, ExportFormat::Json).unwrap();

    assert_eq!(written, vec![dir.join("roe.json"), dir.join("total_assets.json")]);
    let roe: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&written[0]).unwrap()).unwrap();
    assert_eq!(roe[0]["name"], "平安银行");
    assert_eq!(roe[0]["roe"], 10.5);
    assert!(roe[1]["roe"].is_null());

    std::fs::remove_dir_all(dir).ok();
}
