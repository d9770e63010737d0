// ==========================================
// 数据版本管理系统 - xlsx 读写
// ==========================================
// 工具: umya-spreadsheet（保留显示格式与合并单元格）
// 说明: 仅处理第一个工作表
// ==========================================

use crate::domain::types::MergeRegion;
use crate::spreadsheet::cell_text::display_text;
use crate::spreadsheet::error::{ExportError, ExportResult, ImportError, ImportResult};
use crate::spreadsheet::grid::{range_reference, SheetGrid};
use std::io::Cursor;
use umya_spreadsheet::helper::coordinate::index_from_coordinate;

/// 读取第一个工作表为网格（单元格取显示文本）
pub fn read_grid(bytes: &[u8]) -> ImportResult<SheetGrid> {
    let book = umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(bytes), true)
        .map_err(|e| ImportError::WorkbookRead(e.to_string()))?;
    let sheet = book.get_sheet(&0).ok_or(ImportError::NoWorksheet)?;

    let max_row = sheet.get_highest_row();
    let max_col = sheet.get_highest_column();

    let rows = (1..=max_row)
        .map(|row| {
            (1..=max_col)
                .map(|col| sheet.get_cell((col, row)).map(display_text).unwrap_or_default())
                .collect()
        })
        .collect();

    let merges = sheet
        .get_merge_cells()
        .iter()
        .filter_map(|range| parse_range(&range.get_range()))
        .collect();

    Ok(SheetGrid { rows, merges })
}

/// 网格写为 xlsx 字节（全部以文本写入）
pub fn write_grid(grid: &SheetGrid, sheet_name: &str) -> ExportResult<Vec<u8>> {
    let mut book = umya_spreadsheet::new_file();
    {
        let sheet = book
            .get_sheet_mut(&0)
            .ok_or_else(|| ExportError::WorkbookWrite("默认工作表缺失".to_string()))?;
        sheet.set_name(sheet_name);

        for (r, row) in grid.rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                sheet
                    .get_cell_mut(((c + 1) as u32, (r + 1) as u32))
                    .set_value_string(value.clone());
            }
        }

        for region in &grid.merges {
            sheet.add_merge_cells(range_reference(region));
        }
    }

    let mut cursor = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut cursor)
        .map_err(|e| ExportError::WorkbookWrite(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// 解析 "A2:B3" / "C5" 为零基区域
fn parse_range(reference: &str) -> Option<MergeRegion> {
    let mut parts = reference.split(':');
    let start = parts.next()?;
    let end = parts.next().unwrap_or(start);

    let (start_col, start_row, _, _) = index_from_coordinate(start);
    let (end_col, end_row, _, _) = index_from_coordinate(end);

    MergeRegion::new(
        start_row?.checked_sub(1)? as usize,
        end_row?.checked_sub(1)? as usize,
        start_col?.checked_sub(1)? as usize,
        end_col?.checked_sub(1)? as usize,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("A2:B3"), MergeRegion::new(1, 2, 0, 1));
        assert_eq!(parse_range("C5"), MergeRegion::new(4, 4, 2, 2));
    }

    #[test]
    fn test_write_then_read_grid_keeps_text_and_merges() {
        let grid = SheetGrid {
            rows: vec![
                vec!["标题A".to_string(), "标题B".to_string()],
                vec!["0001".to_string(), "1.50E+10".to_string()],
                vec!["x".to_string(), String::new()],
            ],
            merges: vec![MergeRegion::new(1, 2, 0, 0).unwrap()],
        };
        let bytes = write_grid(&grid, "Data").unwrap();
        let read = read_grid(&bytes).unwrap();
        assert_eq!(read.cell(1, 0), "0001");
        assert_eq!(read.cell(1, 1), "1.50E+10");
        assert_eq!(read.cell(2, 1), "");
        assert_eq!(read.merges, grid.merges);
    }
}
