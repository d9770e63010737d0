// ==========================================
// 数据版本管理系统 - 表格列定义
// ==========================================
// 列顺序固定，导入按位置映射，导出首行为列标题
// ==========================================

use crate::domain::category::DataRow;
use crate::domain::plan::OverviewRow;
use crate::domain::types::RowKey;

/// 列定义（字段名 + 标题）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub key: &'static str,
    pub title: &'static str,
}

const fn col(key: &'static str, title: &'static str) -> ColumnSpec {
    ColumnSpec { key, title }
}

/// 阶段概览表（13 列）
pub const OVERVIEW_COLUMNS: [ColumnSpec; 13] = [
    col("category", "类别"),
    col("subcategory", "子类别"),
    col("total_tokens", "总token数"),
    col("sample_ratio", "本次采样比例"),
    col("cumulative_ratio", "累计比例"),
    col("sample_tokens", "本次采样token数"),
    col("category_ratio", "本次采样后类别占比"),
    col("part1", "交付part1"),
    col("part2", "交付part2"),
    col("part3", "交付part3"),
    col("part4", "交付part4"),
    col("part5", "交付part5"),
    col("note", "备注"),
];

/// 子类别数据表（6 列）
pub const DATASET_COLUMNS: [ColumnSpec; 6] = [
    col("hdfs_path", "v3词表hdfs路径"),
    col("obs_fuzzy_path", "obs模糊路径"),
    col("obs_full_path", "obs补全路径"),
    col("token_count", "数据集总token"),
    col("actual_usage", "实际使用"),
    col("actual_token", "实际使用token"),
];

/// 列标题
pub fn titles(columns: &[ColumnSpec]) -> Vec<String> {
    columns.iter().map(|c| c.title.to_string()).collect()
}

// ==========================================
// TabularRecord - 可按列读写的表格行
// ==========================================
pub trait TabularRecord: Sized {
    /// 固定列顺序
    fn columns() -> &'static [ColumnSpec];

    /// 以指定行键创建空行
    fn with_key(key: RowKey) -> Self;

    fn key(&self) -> RowKey;

    fn get(&self, field: &str) -> Option<&str>;

    /// 写入字段，未知字段返回 false
    fn set(&mut self, field: &str, value: String) -> bool;

    /// 按列顺序输出单元格文本（缺失值为空串）
    fn to_cells(&self) -> Vec<String> {
        Self::columns()
            .iter()
            .map(|c| self.get(c.key).unwrap_or_default().to_string())
            .collect()
    }
}

impl TabularRecord for OverviewRow {
    fn columns() -> &'static [ColumnSpec] {
        &OVERVIEW_COLUMNS
    }

    fn with_key(key: RowKey) -> Self {
        OverviewRow::empty(key)
    }

    fn key(&self) -> RowKey {
        self.key
    }

    fn get(&self, field: &str) -> Option<&str> {
        self.field(field)
    }

    fn set(&mut self, field: &str, value: String) -> bool {
        match self.field_mut(field) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl TabularRecord for DataRow {
    fn columns() -> &'static [ColumnSpec] {
        &DATASET_COLUMNS
    }

    fn with_key(key: RowKey) -> Self {
        DataRow::empty(key)
    }

    fn key(&self) -> RowKey {
        self.key
    }

    fn get(&self, field: &str) -> Option<&str> {
        self.field(field)
    }

    fn set(&mut self, field: &str, value: String) -> bool {
        match self.field_mut(field) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_cover_model_fields() {
        let overview_keys: Vec<_> = OVERVIEW_COLUMNS.iter().map(|c| c.key).collect();
        assert_eq!(overview_keys, OverviewRow::FIELDS.to_vec());
        let dataset_keys: Vec<_> = DATASET_COLUMNS.iter().map(|c| c.key).collect();
        assert_eq!(dataset_keys, DataRow::FIELDS.to_vec());
    }

    #[test]
    fn test_to_cells_in_column_order() {
        let mut row = DataRow::empty(1);
        row.set("token_count", "100".to_string());
        row.set("hdfs_path", "/a".to_string());
        assert_eq!(row.to_cells(), vec!["/a", "", "", "100", "", ""]);
    }
}
