// ==========================================
// 数据版本管理系统 - 合并单元格区域运算
// ==========================================
// 职责: 删除行后的区域重建索引 / 合并 / 取消合并 / 渲染跨度查询
// 约束: 区域行号始终对应当前行顺序，且落在 [0, rowCount) 内
// ==========================================

use crate::domain::types::{CellCoord, CellSpan, MergeRegion};
use crate::engine::error::{HierarchyError, HierarchyResult};
use std::collections::BTreeSet;

// ==========================================
// 删除行后的区域修复
// ==========================================

/// 按原始行号一次性修复合并区域
///
/// 对每个被删除的原始行号 d（相对区域原始 start/end 判断）:
/// - d < start: start 与 end 均减 1
/// - start <= d <= end: 仅 end 减 1
///
/// end < start 的区域被丢弃；结果再按剩余行数裁剪
///
/// # 参数
/// - `merges`: 删除前的区域
/// - `deleted`: 被删除的原始行号（可重复、可无序）
/// - `remaining_rows`: 删除后的行数
pub fn repair_merges(
    merges: &[MergeRegion],
    deleted: &[usize],
    remaining_rows: usize,
) -> Vec<MergeRegion> {
    let deleted: BTreeSet<usize> = deleted.iter().copied().collect();

    merges
        .iter()
        .filter_map(|region| {
            let mut start = region.start_row as i64;
            let mut end = region.end_row as i64;

            for &d in &deleted {
                if d < region.start_row {
                    start -= 1;
                    end -= 1;
                } else if d <= region.end_row {
                    end -= 1;
                }
            }

            if end < start || start < 0 {
                return None;
            }
            clamp_region(
                MergeRegion {
                    start_row: start as usize,
                    end_row: end as usize,
                    start_col: region.start_col,
                    end_col: region.end_col,
                },
                remaining_rows,
            )
        })
        .collect()
}

/// 将区域裁剪到 [0, row_count)，完全越界时返回 None
pub fn clamp_region(region: MergeRegion, row_count: usize) -> Option<MergeRegion> {
    if row_count == 0 || region.start_row >= row_count {
        return None;
    }
    Some(MergeRegion {
        end_row: region.end_row.min(row_count - 1),
        ..region
    })
}

/// 按行数与列数裁剪一组区域（导入与保存时使用）
///
/// 坐标倒置的区域直接丢弃
pub fn clamp_regions(merges: &[MergeRegion], row_count: usize, col_count: usize) -> Vec<MergeRegion> {
    merges
        .iter()
        .filter(|r| r.end_row >= r.start_row && r.end_col >= r.start_col)
        .filter(|r| col_count > 0 && r.start_col < col_count)
        .filter_map(|r| {
            clamp_region(
                MergeRegion {
                    end_col: r.end_col.min(col_count - 1),
                    ..*r
                },
                row_count,
            )
        })
        .collect()
}

// ==========================================
// 合并 / 取消合并
// ==========================================

/// 由选中单元格生成外接矩形区域
///
/// # 返回
/// - `Ok(region)`: 覆盖 [min(row), max(row)] × [min(col), max(col)]
/// - `Err(InvalidSelection)`: 选中不足 2 个单元格或越界
pub fn bounding_region(
    selection: &[CellCoord],
    row_count: usize,
    col_count: usize,
) -> HierarchyResult<MergeRegion> {
    let distinct: BTreeSet<(usize, usize)> = selection.iter().map(|c| (c.row, c.col)).collect();
    if distinct.len() < 2 {
        return Err(HierarchyError::InvalidSelection(
            "合并至少需要选中 2 个单元格".to_string(),
        ));
    }
    if let Some(out) = selection
        .iter()
        .find(|c| c.row >= row_count || c.col >= col_count)
    {
        return Err(HierarchyError::InvalidSelection(format!(
            "单元格越界: row={}, col={}",
            out.row, out.col
        )));
    }

    let start_row = selection.iter().map(|c| c.row).min().unwrap_or(0);
    let end_row = selection.iter().map(|c| c.row).max().unwrap_or(0);
    let start_col = selection.iter().map(|c| c.col).min().unwrap_or(0);
    let end_col = selection.iter().map(|c| c.col).max().unwrap_or(0);

    MergeRegion::new(start_row, end_row, start_col, end_col)
        .ok_or_else(|| HierarchyError::InvalidSelection("区域坐标倒置".to_string()))
}

/// 移除所有包含任一选中单元格的区域，返回移除数量
pub fn remove_regions_touching(merges: &mut Vec<MergeRegion>, selection: &[CellCoord]) -> usize {
    let before = merges.len();
    merges.retain(|region| !selection.iter().any(|c| region.contains(c.row, c.col)));
    before - merges.len()
}

// ==========================================
// 渲染跨度
// ==========================================

/// 查询单元格渲染跨度（第一个命中的区域生效）
///
/// - 区域左上角: 区域大小
/// - 区域内其他单元格: 0 × 0
/// - 不在任何区域内: 1 × 1
pub fn cell_span(merges: &[MergeRegion], row: usize, col: usize) -> CellSpan {
    match merges.iter().find(|r| r.contains(row, col)) {
        Some(region) if region.start_row == row && region.start_col == col => CellSpan {
            row_span: region.row_span(),
            col_span: region.col_span(),
        },
        Some(_) => CellSpan {
            row_span: 0,
            col_span: 0,
        },
        None => CellSpan {
            row_span: 1,
            col_span: 1,
        },
    }
}
