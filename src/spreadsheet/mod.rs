// ==========================================
// 数据版本管理系统 - 表格编解码层
// ==========================================
// 职责: 阶段概览表 / 子类别数据表 与 xlsx/xls/csv 文件互转
// 红线: 单元格一律按文本读写，不做数值再解析
// ==========================================

pub mod cell_text;
pub mod codec;
pub mod columns;
pub mod csv_codec;
pub mod error;
pub mod grid;
pub mod legacy_xls;
pub mod xlsx_codec;

pub use codec::{ImportedTable, SpreadsheetCodec, SpreadsheetFormat};
pub use columns::{ColumnSpec, TabularRecord, DATASET_COLUMNS, OVERVIEW_COLUMNS};
pub use error::{ExportError, ExportResult, ImportError, ImportResult};

/// 导出文件（文件名 + 内容）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// 阶段概览表导出文件名
pub fn overview_file_name(plan: &str, stage: &str, format: SpreadsheetFormat) -> String {
    format!("{}_{}_概览表.{}", plan, stage, format.extension())
}

/// 子类别数据表导出文件名
pub fn dataset_file_name(
    plan: &str,
    stage: &str,
    category: &str,
    subcategory: &str,
    format: SpreadsheetFormat,
) -> String {
    format!(
        "{}_{}_{}_{}_数据表.{}",
        plan,
        stage,
        category,
        subcategory,
        format.extension()
    )
}

/// 模板下载文件名
pub fn template_file_name(table: &str) -> String {
    format!("{}_template.xlsx", table)
}
