// ==========================================
// 数据版本管理系统 - CSV 读写
// ==========================================
// 工具: csv
// 限制: CSV 无合并单元格
// ==========================================

use crate::spreadsheet::error::{ExportError, ExportResult, ImportResult};
use crate::spreadsheet::grid::SheetGrid;
use csv::{ReaderBuilder, WriterBuilder};

pub fn read_grid(bytes: &[u8]) -> ImportResult<SheetGrid> {
    // 去除 UTF-8 BOM
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // 允许行长度不一致
        .from_reader(bytes);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(SheetGrid {
        rows,
        merges: Vec::new(),
    })
}

pub fn write_grid(grid: &SheetGrid) -> ExportResult<Vec<u8>> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
    for row in &grid.rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::FileWriteError(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_round_trip_with_quotes() {
        let grid = SheetGrid {
            rows: vec![
                vec!["路径".to_string(), "备注".to_string()],
                vec!["/a,b".to_string(), "say \"hi\"".to_string()],
            ],
            merges: Vec::new(),
        };
        let bytes = write_grid(&grid).unwrap();
        assert_eq!(read_grid(&bytes).unwrap(), grid);
    }

    #[test]
    fn test_csv_strips_bom() {
        let grid = read_grid(b"\xEF\xBB\xBFa,b\n1,2\n").unwrap();
        assert_eq!(grid.cell(0, 0), "a");
        assert_eq!(grid.cell(1, 1), "2");
    }
}
