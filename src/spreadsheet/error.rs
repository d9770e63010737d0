// ==========================================
// 数据版本管理系统 - 表格编解码错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 导入错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(#[from] std::io::Error),

    // ===== 解析错误 =====
    #[error("工作簿解析失败: {0}")]
    WorkbookRead(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(#[from] csv::Error),

    #[error("工作簿无工作表")]
    NoWorksheet,

    #[error("工作表无数据行")]
    NoDataRows,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// 导出错误类型
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("工作簿生成失败: {0}")]
    WorkbookWrite(String),

    #[error("CSV 写入失败: {0}")]
    CsvWriteError(#[from] csv::Error),

    #[error("文件写入失败: {0}")]
    FileWriteError(#[from] std::io::Error),

    #[error("导出格式不支持: {0}")]
    UnsupportedFormat(String),
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
pub type ExportResult<T> = Result<T, ExportError>;
