// ==========================================
// 数据版本管理系统 - 工作表网格
// ==========================================
// 各文件格式读写的公共中间表示
// rows 含表头行；merges 为工作表绝对坐标（零基，含表头行）
// ==========================================

use crate::domain::types::MergeRegion;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetGrid {
    pub rows: Vec<Vec<String>>,
    pub merges: Vec<MergeRegion>,
}

impl SheetGrid {
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// 列号（零基）转 Excel 列字母: 0 → A, 26 → AA
pub fn column_letters(col: usize) -> String {
    let mut n = col + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// 零基坐标转 A1 引用
pub fn a1_reference(row: usize, col: usize) -> String {
    format!("{}{}", column_letters(col), row + 1)
}

/// 区域转 A1:B2 引用
pub fn range_reference(region: &MergeRegion) -> String {
    format!(
        "{}:{}",
        a1_reference(region.start_row, region.start_col),
        a1_reference(region.end_row, region.end_col)
    )
}
