// ==========================================
// 表格编解码器集成测试
// ==========================================
// 测试目标: 导出 → 导入往返、显示文本读取、合并区域偏移
// ==========================================


use data_version_manager::domain::{DataRow, MergeRegion, OverviewRow};
use data_version_manager::engine::KeyGenerator;
use data_version_manager::spreadsheet::{
    ImportError, SpreadsheetCodec, SpreadsheetFormat, TabularRecord, DATASET_COLUMNS,
    OVERVIEW_COLUMNS,
};
use std::io::Cursor;
use std::sync::Arc;
use test_helpers::{data_row, overview_row};

fn codec() -> SpreadsheetCodec {
    SpreadsheetCodec::new(Arc::new(KeyGenerator::new()))
}

/// 构造数据表工作簿: 表头 + 一行，token 列写入数值单元格
fn workbook_with_numeric_cells(cells: &[(&str, f64, Option<&str>)]) -> Vec<u8> {
    let mut book = umya_spreadsheet::new_file();
    {
        let sheet = book.get_sheet_mut(&0).unwrap();
        for (c, column) in DATASET_COLUMNS.iter().enumerate() {
            sheet
                .get_cell_mut(((c + 1) as u32, 1))
                .set_value_string(column.title);
        }
        sheet.get_cell_mut("A2").set_value_string("hdfs://a");
        for (coordinate, value, format_code) in cells {
            sheet.get_cell_mut(*coordinate).set_value_number(*value);
            if let Some(code) = format_code {
                sheet
                    .get_style_mut(*coordinate)
                    .get_number_format_mut()
                    .set_format_code(*code);
            }
        }
    }
    let mut cursor = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut cursor).unwrap();
    cursor.into_inner()
}

// ==========================================
// 往返
// ==========================================

#[test]
fn test_dataset_round_trip_preserves_text() {
    let codec = codec();
    let mut rows = vec![
        data_row(1, "123456789012345678901234567890", "0.000000000123"),
        data_row(2, "8.125%", ""),
        data_row(3, "abc", "1.50E+10"),
    ];
    rows[2].actual_usage = "是".to_string();

    let bytes = codec.export(&rows, "Data").unwrap();
    let imported = codec
        .import::<DataRow>(&bytes, SpreadsheetFormat::Xlsx)
        .unwrap();

    assert_eq!(imported.rows.len(), rows.len());
    for (original, read) in rows.iter().zip(imported.rows.iter()) {
        assert_ne!(read.key, original.key);
        let rekeyed = DataRow {
            key: original.key,
            ..read.clone()
        };
        assert_eq!(rekeyed, *original);
    }
    assert!(imported.merges.is_empty());
}

#[test]
fn test_overview_round_trip_with_merges() {
    let codec = codec();
    let rows = vec![
        overview_row(1, "Code", "Python", "100"),
        overview_row(2, "", "Rust", "200"),
        overview_row(3, "Math", "Proof", "300"),
    ];
    let merges = vec![MergeRegion::new(0, 1, 0, 0).unwrap()];

    let bytes = codec.export_with_merges(&rows, &merges, "Data").unwrap();
    let imported = codec
        .import::<OverviewRow>(&bytes, SpreadsheetFormat::Xlsx)
        .unwrap();

    assert_eq!(imported.merges, merges);
    let categories: Vec<_> = imported.rows.iter().map(|r| r.category.as_str()).collect();
    assert_eq!(categories, vec!["Code", "", "Math"]);
    assert_eq!(imported.rows[2].total_tokens, "300");
}

#[test]
fn test_csv_round_trip_without_merges() {
    let codec = codec();
    let rows = vec![data_row(1, "10", "5"), data_row(2, "1,000", "\"quoted\"")];
    let bytes = codec
        .export_as(SpreadsheetFormat::Csv, &rows, &[], "ignored")
        .unwrap();
    let imported = codec
        .import::<DataRow>(&bytes, SpreadsheetFormat::Csv)
        .unwrap();
    assert_eq!(imported.rows[1].token_count, "1,000");
    assert_eq!(imported.rows[1].actual_token, "\"quoted\"");
}

// ==========================================
// 显示文本读取
// ==========================================

#[test]
fn test_percent_cell_imports_as_display_text() {
    let bytes = workbook_with_numeric_cells(&[("D2", 0.08125, Some("0.000%"))]);
    let imported = codec()
        .import::<DataRow>(&bytes, SpreadsheetFormat::Xlsx)
        .unwrap();
    assert_eq!(imported.rows[0].token_count, "8.125%");
}

#[test]
fn test_numeric_cells_avoid_scientific_notation() {
    let bytes = workbook_with_numeric_cells(&[
        ("D2", 0.000015, None),
        ("F2", 123456789012.0, None),
    ]);
    let imported = codec()
        .import::<DataRow>(&bytes, SpreadsheetFormat::Xlsx)
        .unwrap();
    assert_eq!(imported.rows[0].token_count, "0.000015");
    assert_eq!(imported.rows[0].actual_token, "123456789012");
}

// ==========================================
// 边界
// ==========================================

#[test]
fn test_template_has_headers_only() {
    let codec = codec();
    let bytes = codec.export_template::<OverviewRow>("Template").unwrap();
    let result = codec.import::<OverviewRow>(&bytes, SpreadsheetFormat::Xlsx);
    assert!(matches!(result, Err(ImportError::NoDataRows)));
    assert_eq!(OverviewRow::columns().len(), OVERVIEW_COLUMNS.len());
}

#[test]
fn test_blank_rows_are_dropped_and_keys_unique() {
    let codec = codec();
    let rows = vec![data_row(1, "1", "1"), DataRow::empty(2), data_row(3, "3", "3")];
    let bytes = codec.export(&rows, "Data").unwrap();
    let imported = codec
        .import::<DataRow>(&bytes, SpreadsheetFormat::Xlsx)
        .unwrap();
    assert_eq!(imported.rows.len(), 2);
    assert_ne!(imported.rows[0].key, imported.rows[1].key);
}

#[test]
fn test_unreadable_bytes_fail() {
    let result = codec().import::<DataRow>(&[0u8, 1, 2, 3], SpreadsheetFormat::Xlsx);
    assert!(matches!(result, Err(ImportError::WorkbookRead(_))));
}

#[test]
fn test_file_round_trip() {
    let codec = codec();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rows.xlsx");
    let rows = vec![data_row(1, "42", "7")];
    codec.export_file(&path, &rows, &[], "Data").unwrap();

    let imported = codec.import_file::<DataRow, _>(&path).unwrap();
    assert_eq!(imported.rows[0].token_count, "42");

    let missing = codec.import_file::<DataRow, _>(dir.path().join("missing.xlsx"));
    assert!(matches!(missing, Err(ImportError::FileNotFound(_))));
}
