// ==========================================
// 数据版本管理系统 - 表格编解码器
// ==========================================
// 职责: 行模型（+ 合并区域） <-> 表格文件
// 支持: xlsx（含合并单元格） / xls（只读） / csv（无合并）
// ==========================================
// 导出: 首行为列标题，其后每行按列顺序输出文本，合并区域行号 +1
// 导入: 读取第一个工作表，丢弃表头，丢弃全空行，为每行生成新行键，
//       合并区域行号 -1
// ==========================================

use crate::domain::types::MergeRegion;
use crate::engine::keygen::KeyGenerator;
use crate::engine::merge;
use crate::spreadsheet::columns::{titles, TabularRecord};
use crate::spreadsheet::error::{ExportError, ExportResult, ImportError, ImportResult};
use crate::spreadsheet::grid::SheetGrid;
use crate::spreadsheet::{csv_codec, legacy_xls, xlsx_codec};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// SpreadsheetFormat - 文件格式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    Xlsx,
    Xls,
    Csv,
}

impl SpreadsheetFormat {
    /// 根据扩展名识别格式（不区分大小写）
    pub fn from_path<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        Self::from_extension(&ext).ok_or(ImportError::UnsupportedFormat(ext))
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
            Self::Csv => "csv",
        }
    }

    /// 是否保留合并单元格
    pub fn supports_merges(&self) -> bool {
        matches!(self, Self::Xlsx)
    }
}

/// 导入结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedTable<T> {
    pub rows: Vec<T>,
    pub merges: Vec<MergeRegion>, // 数据行坐标（不含表头）
}

// ==========================================
// SpreadsheetCodec - 编解码器
// ==========================================
pub struct SpreadsheetCodec {
    keys: Arc<KeyGenerator>,
}

impl SpreadsheetCodec {
    pub fn new(keys: Arc<KeyGenerator>) -> Self {
        Self { keys }
    }

    // ==========================================
    // 导出
    // ==========================================

    /// 导出 xlsx（无合并区域）
    pub fn export<T: TabularRecord>(&self, rows: &[T], sheet_name: &str) -> ExportResult<Vec<u8>> {
        self.export_as(SpreadsheetFormat::Xlsx, rows, &[], sheet_name)
    }

    /// 导出 xlsx（含合并区域，行号偏移 +1 跳过表头）
    pub fn export_with_merges<T: TabularRecord>(
        &self,
        rows: &[T],
        merges: &[MergeRegion],
        sheet_name: &str,
    ) -> ExportResult<Vec<u8>> {
        self.export_as(SpreadsheetFormat::Xlsx, rows, merges, sheet_name)
    }

    /// 导出空模板（仅表头）
    pub fn export_template<T: TabularRecord>(&self, sheet_name: &str) -> ExportResult<Vec<u8>> {
        self.export_as::<T>(SpreadsheetFormat::Xlsx, &[], &[], sheet_name)
    }

    /// 按指定格式导出
    ///
    /// # 参数
    /// - `format`: 目标格式（xls 不支持写出）
    /// - `rows`: 数据行
    /// - `merges`: 数据行坐标的合并区域（csv 忽略）
    /// - `sheet_name`: 工作表名
    #[instrument(skip(self, rows, merges), fields(rows = rows.len(), merges = merges.len()))]
    pub fn export_as<T: TabularRecord>(
        &self,
        format: SpreadsheetFormat,
        rows: &[T],
        merges: &[MergeRegion],
        sheet_name: &str,
    ) -> ExportResult<Vec<u8>> {
        let mut grid = SheetGrid::default();
        grid.rows.push(titles(T::columns()));
        grid.rows.extend(rows.iter().map(TabularRecord::to_cells));

        if format.supports_merges() {
            grid.merges = merges
                .iter()
                .map(|m| MergeRegion {
                    start_row: m.start_row + 1,
                    end_row: m.end_row + 1,
                    ..*m
                })
                .collect();
        }

        match format {
            SpreadsheetFormat::Xlsx => xlsx_codec::write_grid(&grid, sheet_name),
            SpreadsheetFormat::Csv => csv_codec::write_grid(&grid),
            SpreadsheetFormat::Xls => Err(ExportError::UnsupportedFormat(
                format.extension().to_string(),
            )),
        }
    }

    /// 导出到文件（格式由扩展名决定）
    pub fn export_file<T: TabularRecord, P: AsRef<Path>>(
        &self,
        path: P,
        rows: &[T],
        merges: &[MergeRegion],
        sheet_name: &str,
    ) -> ExportResult<()> {
        let path = path.as_ref();
        let format = SpreadsheetFormat::from_path(path)
            .map_err(|_| ExportError::UnsupportedFormat(path.display().to_string()))?;
        let bytes = self.export_as(format, rows, merges, sheet_name)?;
        fs::write(path, bytes)?;
        Ok(())
    }

    // ==========================================
    // 导入
    // ==========================================

    /// 导入表格字节
    ///
    /// # 返回
    /// - `Ok(ImportedTable)`: 数据行（新行键）+ 合并区域（数据行坐标）
    /// - `Err(ImportError)`: 无法读取 / 无工作表 / 无数据行
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub fn import<T: TabularRecord>(
        &self,
        bytes: &[u8],
        format: SpreadsheetFormat,
    ) -> ImportResult<ImportedTable<T>> {
        let grid = match format {
            SpreadsheetFormat::Xlsx => xlsx_codec::read_grid(bytes)?,
            SpreadsheetFormat::Xls => legacy_xls::read_grid(bytes)?,
            SpreadsheetFormat::Csv => csv_codec::read_grid(bytes)?,
        };
        self.rows_from_grid(grid)
    }

    /// 导入文件（格式由扩展名决定）
    pub fn import_file<T: TabularRecord, P: AsRef<Path>>(
        &self,
        path: P,
    ) -> ImportResult<ImportedTable<T>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let format = SpreadsheetFormat::from_path(path)?;
        let bytes = fs::read(path)?;
        tracing::info!("导入表格文件: {}", path.display());
        self.import(&bytes, format)
    }

    fn rows_from_grid<T: TabularRecord>(&self, grid: SheetGrid) -> ImportResult<ImportedTable<T>> {
        let columns = T::columns();
        let data_rows = grid.rows.len().saturating_sub(1);

        let mut rows = Vec::new();
        let mut blank = Vec::new();
        for index in 0..data_rows {
            let sheet_row = index + 1;
            let is_blank = (0..columns.len()).all(|c| grid.cell(sheet_row, c).trim().is_empty());
            if is_blank {
                blank.push(index);
                continue;
            }

            let mut record = T::with_key(self.keys.next_key());
            for (c, column) in columns.iter().enumerate() {
                record.set(column.key, grid.cell(sheet_row, c).to_string());
            }
            rows.push(record);
        }

        if rows.is_empty() {
            return Err(ImportError::NoDataRows);
        }

        // 表头行内的区域丢弃，其余行号 -1
        let shifted: Vec<MergeRegion> = grid
            .merges
            .iter()
            .filter(|m| m.start_row >= 1)
            .map(|m| MergeRegion {
                start_row: m.start_row - 1,
                end_row: m.end_row - 1,
                ..*m
            })
            .collect();
        let repaired = merge::repair_merges(&shifted, &blank, rows.len());
        let merges = merge::clamp_regions(&repaired, rows.len(), columns.len());

        tracing::debug!(
            "表格导入完成: rows={}, skipped_blank={}, merges={}",
            rows.len(),
            blank.len(),
            merges.len()
        );

        Ok(ImportedTable { rows, merges })
    }
}
