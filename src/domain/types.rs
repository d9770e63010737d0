// ==========================================
// 数据版本管理系统 - 领域基础类型
// ==========================================
// 职责: 行键、节点ID、合并区域、单元格坐标
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 行键（表格行在会话内的唯一标识）
pub type RowKey = i64;

/// 类别/子类别节点ID
pub type NodeId = i64;

// ==========================================
// 单元格坐标
// ==========================================
/// 单元格坐标（零基，行号为数据行索引，不含表头）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    pub row: usize,
    pub col: usize,
}

impl CellCoord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

// ==========================================
// MergeRegion - 合并单元格区域
// ==========================================
// 约束: end_row >= start_row, end_col >= start_col
// 约束: 行号始终对应当前行顺序，不得越过 [0, rowCount)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRegion {
    pub start_row: usize,
    pub end_row: usize,
    pub start_col: usize,
    pub end_col: usize,
}

impl MergeRegion {
    /// 创建合并区域，坐标倒置时返回 None
    pub fn new(start_row: usize, end_row: usize, start_col: usize, end_col: usize) -> Option<Self> {
        if end_row < start_row || end_col < start_col {
            return None;
        }
        Some(Self {
            start_row,
            end_row,
            start_col,
            end_col,
        })
    }

    /// 区域是否包含指定单元格
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.start_row && row <= self.end_row && col >= self.start_col && col <= self.end_col
    }

    pub fn row_span(&self) -> usize {
        self.end_row - self.start_row + 1
    }

    pub fn col_span(&self) -> usize {
        self.end_col - self.start_col + 1
    }
}

impl fmt::Display for MergeRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows[{}..={}] cols[{}..={}]",
            self.start_row, self.end_row, self.start_col, self.end_col
        )
    }
}

// ==========================================
// CellSpan - 渲染用跨度
// ==========================================
/// 单元格渲染跨度
///
/// - 区域左上角: row_span/col_span 为区域大小
/// - 区域内其余单元格: 均为 0（被遮盖，不渲染）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellSpan {
    pub row_span: usize,
    pub col_span: usize,
}

impl CellSpan {
    pub fn is_hidden(&self) -> bool {
        self.row_span == 0 || self.col_span == 0
    }
}
