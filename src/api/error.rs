// ==========================================
// 数据版本管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，将引擎/编解码/存储错误转换为用户可读的错误消息
// ==========================================

use crate::engine::error::HierarchyError;
use crate::repository::error::RepositoryError;
use crate::spreadsheet::error::{ExportError, ImportError};
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 会话与权限
    // ==========================================
    #[error("权限不足: {0}")]
    PermissionDenied(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("名称重复: {0}")]
    DuplicateName(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 表格文件错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("文件导出失败: {0}")]
    ExportError(String),

    // ==========================================
    // 持久化错误
    // ==========================================
    #[error("数据保存失败: {0}")]
    PersistenceError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 HierarchyError 转换
// ==========================================
impl From<HierarchyError> for ApiError {
    fn from(err: HierarchyError) -> Self {
        match err {
            HierarchyError::DuplicateName { .. } => ApiError::DuplicateName(err.to_string()),
            HierarchyError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            HierarchyError::InvalidName { .. }
            | HierarchyError::InvalidSelection(_)
            | HierarchyError::UnknownField(_)
            | HierarchyError::InvalidKey(_) => ApiError::InvalidInput(err.to_string()),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DuplicateName(msg) => ApiError::DuplicateName(msg),
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),
            RepositoryError::LockError(msg) => {
                ApiError::PersistenceError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
            other => ApiError::PersistenceError(other.to_string()),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        ApiError::ImportError(err.to_string())
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        ApiError::ExportError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchy_error_mapping() {
        let err: ApiError = HierarchyError::duplicate("一级类别", "Code").into();
        assert!(matches!(err, ApiError::DuplicateName(_)));

        let err: ApiError = HierarchyError::InvalidSelection("x".to_string()).into();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn test_repository_error_mapping() {
        let err: ApiError = RepositoryError::not_found("Plan", "V1").into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = RepositoryError::DuplicateName("dup".to_string()).into();
        assert!(matches!(err, ApiError::DuplicateName(_)));

        // 行键冲突不是命名冲突
        let err: ApiError = RepositoryError::UniqueConstraintViolation(
            "UNIQUE constraint failed: data_row.subcategory_id, data_row.row_key".to_string(),
        )
        .into();
        assert!(matches!(err, ApiError::PersistenceError(_)));

        let err: ApiError = RepositoryError::DatabaseQueryError("boom".to_string()).into();
        assert!(matches!(err, ApiError::PersistenceError(_)));
    }

    #[test]
    fn test_import_error_mapping() {
        let err: ApiError = ImportError::NoDataRows.into();
        assert!(matches!(err, ApiError::ImportError(_)));
    }
}
