// ==========================================
// 数据版本管理系统 - 旧版 .xls 读取
// ==========================================
// 工具: calamine
// 限制: 仅读取单元格值，不含合并单元格信息
// 限制: 读不到数字格式，百分比单元格按原始小数导入（8.125% 读作 0.08125）
//       与 .xlsx 的显示文本规则不同；需要百分比文本时请另存为 .xlsx
// ==========================================

use crate::spreadsheet::error::{ImportError, ImportResult};
use crate::spreadsheet::grid::SheetGrid;
use calamine::{Data, Reader, Xls};
use std::io::Cursor;

pub fn read_grid(bytes: &[u8]) -> ImportResult<SheetGrid> {
    let mut workbook = Xls::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImportError::WorkbookRead(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::NoWorksheet)?
        .map_err(|e| ImportError::WorkbookRead(e.to_string()))?;

    // Range 起点不一定是 A1，补齐前导空行/空列
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<String>> = vec![Vec::new(); row_offset];
    for data_row in range.rows() {
        let mut cells = vec![String::new(); col_offset];
        cells.extend(data_row.iter().map(cell_text));
        rows.push(cells);
    }

    Ok(SheetGrid {
        rows,
        merges: Vec::new(),
    })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(v) => format!("{}", v),
        other => other.to_string(),
    }
}
