// ==========================================
// 数据版本管理系统 - 层级编辑错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 层级编辑错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    // ===== 名称校验 =====
    #[error("名称重复: {level} \"{name}\" 已存在")]
    DuplicateName { level: String, name: String },

    #[error("名称无效 ({level}): 名称不能为空")]
    InvalidName { level: String },

    // ===== 定位错误 =====
    #[error("节点未找到: {level} {id}")]
    NotFound { level: String, id: String },

    // ===== 表格操作 =====
    #[error("选择无效: {0}")]
    InvalidSelection(String),

    #[error("字段不存在: {0}")]
    UnknownField(String),

    #[error("行键超出范围: {0}")]
    InvalidKey(i64),
}

impl HierarchyError {
    pub fn duplicate(level: &str, name: &str) -> Self {
        HierarchyError::DuplicateName {
            level: level.to_string(),
            name: name.to_string(),
        }
    }

    pub fn not_found(level: &str, id: impl ToString) -> Self {
        HierarchyError::NotFound {
            level: level.to_string(),
            id: id.to_string(),
        }
    }
}

/// Result 类型别名
pub type HierarchyResult<T> = Result<T, HierarchyError>;
