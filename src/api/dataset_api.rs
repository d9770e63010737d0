// ==========================================
// 数据版本管理系统 - 子类别数据表 API
// ==========================================
// 职责: 数据行分页查询、单行更新/删除、整表导入导出
// 约束: 每次行变更返回子类别及其祖先（一级类别、阶段）的最新合计
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::mutation::{apply_and_persist, require_admin};
use crate::config::{config_defaults, ConfigManager};
use crate::domain::category::{DataRow, SubcategoryPage, TokenTotals, TotalsRefresh};
use crate::domain::session::SessionContext;
use crate::domain::types::RowKey;
use crate::engine::aggregation::AggregationEngine;
use crate::engine::hierarchy::HierarchyEditor;
use crate::engine::keygen::KeyGenerator;
use crate::repository::{InventoryStore, SubcategoryLocator};
use crate::spreadsheet::{
    dataset_file_name, template_file_name, ExportedFile, SpreadsheetCodec, SpreadsheetFormat,
};

pub struct DatasetApi {
    store: Arc<dyn InventoryStore>,
    config_manager: Arc<ConfigManager>,
    editor: HierarchyEditor,
    codec: SpreadsheetCodec,
    engine: AggregationEngine,
}

impl DatasetApi {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        config_manager: Arc<ConfigManager>,
        keys: Arc<KeyGenerator>,
    ) -> Self {
        Self {
            store,
            config_manager,
            editor: HierarchyEditor::new(keys.clone()),
            codec: SpreadsheetCodec::new(keys),
            engine: AggregationEngine::new(),
        }
    }

    /// 默认分页大小（配置读取失败时使用默认值）
    pub fn page_size(&self) -> usize {
        self.config_manager.get_page_size().unwrap_or_else(|e| {
            tracing::warn!("读取分页配置失败，使用默认值: {}", e);
            config_defaults::PAGE_SIZE
        })
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 分页读取数据行
    ///
    /// # 参数
    /// - page: 页码（从 1 开始）
    /// - page_size: 每页行数（None 时使用配置值）
    pub fn get_subcategory_data(
        &self,
        locator: &SubcategoryLocator,
        page: usize,
        page_size: Option<usize>,
    ) -> ApiResult<SubcategoryPage> {
        let page_size = page_size.unwrap_or_else(|| self.page_size());
        Ok(self.store.get_subcategory_data(locator, page, page_size)?)
    }

    /// 子类别全部数据行
    fn load_all_rows(&self, locator: &SubcategoryLocator) -> ApiResult<Vec<DataRow>> {
        let tree = self.store.get_categories(&locator.plan_key, &locator.stage_key)?;
        tree.category_by_name(&locator.category)
            .and_then(|c| c.subcategory_by_name(&locator.subcategory))
            .map(|s| s.rows.clone())
            .ok_or_else(|| ApiError::NotFound(format!("子类别不存在: {}", locator)))
    }

    /// 子类别合计 + 祖先合计
    fn refresh_totals(
        &self,
        locator: &SubcategoryLocator,
        subcategory: TokenTotals,
    ) -> ApiResult<TotalsRefresh> {
        let mut tree = self.store.get_categories(&locator.plan_key, &locator.stage_key)?;
        let stage = self.engine.refresh_tree(&mut tree);
        let category = tree
            .category_by_name(&locator.category)
            .map(|c| c.totals.clone())
            .unwrap_or_default();
        Ok(TotalsRefresh {
            subcategory,
            category,
            stage,
        })
    }

    // ==========================================
    // 行变更
    // ==========================================

    /// 末尾插入空数据行
    ///
    /// # 返回
    /// - Ok((RowKey, TotalsRefresh)): 新行键，以及子类别、一级类别、阶段的最新合计
    pub fn insert_row(
        &self,
        session: &SessionContext,
        locator: &SubcategoryLocator,
        page: &mut SubcategoryPage,
    ) -> ApiResult<(RowKey, TotalsRefresh)> {
        require_admin(session, "insert_row")?;
        let key = apply_and_persist(
            page,
            |p| {
                let key = self.editor.insert_data_row(&mut p.rows);
                p.total += 1;
                Ok(key)
            },
            |p, key| {
                p.totals = self.store.patch_row(locator, &DataRow::empty(*key))?;
                Ok(())
            },
        )?;
        let refresh = self.refresh_totals(locator, page.totals.clone())?;
        Ok((key, refresh))
    }

    /// 按行键更新或追加单行
    ///
    /// # 返回
    /// - Ok(TotalsRefresh): 子类别、一级类别、阶段的最新合计
    pub fn patch_row(
        &self,
        session: &SessionContext,
        locator: &SubcategoryLocator,
        page: &mut SubcategoryPage,
        row: DataRow,
    ) -> ApiResult<TotalsRefresh> {
        require_admin(session, "patch_row")?;
        apply_and_persist(
            page,
            |p| {
                if self.editor.upsert_data_row(&mut p.rows, row.clone())? {
                    p.total += 1;
                }
                Ok(())
            },
            |p, _| {
                p.totals = self.store.patch_row(locator, &row)?;
                Ok(())
            },
        )?;
        self.refresh_totals(locator, page.totals.clone())
    }

    /// 按行键删除数据行
    pub fn delete_rows(
        &self,
        session: &SessionContext,
        locator: &SubcategoryLocator,
        page: &mut SubcategoryPage,
        keys: &[RowKey],
    ) -> ApiResult<TotalsRefresh> {
        require_admin(session, "delete_rows")?;
        apply_and_persist(
            page,
            |p| Ok(self.editor.delete_data_rows(&mut p.rows, keys)),
            |p, _| {
                let deletion = self.store.delete_rows(locator, keys)?;
                p.total = deletion.total;
                p.totals = deletion.totals;
                Ok(())
            },
        )?;
        tracing::info!("数据行已删除: {}, keys={}, 剩余={}", locator, keys.len(), page.total);
        self.refresh_totals(locator, page.totals.clone())
    }

    /// 更新子类别说明
    pub fn update_description(
        &self,
        session: &SessionContext,
        locator: &SubcategoryLocator,
        page: &mut SubcategoryPage,
        description: &str,
    ) -> ApiResult<()> {
        require_admin(session, "update_subcategory_description")?;
        apply_and_persist(
            page,
            |p| {
                p.description = description.to_string();
                Ok(())
            },
            |p, _| {
                self.store
                    .update_subcategory_description(locator, &p.description)?;
                Ok(())
            },
        )
    }

    // ==========================================
    // 导入导出
    // ==========================================

    /// 导入数据表（整体替换子类别全部数据行）
    ///
    /// 本地页重置为第 1 页
    pub fn import_rows(
        &self,
        session: &SessionContext,
        locator: &SubcategoryLocator,
        page: &mut SubcategoryPage,
        bytes: &[u8],
        format: SpreadsheetFormat,
    ) -> ApiResult<TotalsRefresh> {
        require_admin(session, "import_rows")?;
        let table = self.codec.import::<DataRow>(bytes, format)?;

        apply_and_persist(
            page,
            |p| {
                p.page = 1;
                p.total = table.rows.len();
                p.rows = table.rows.iter().take(p.page_size.max(1)).cloned().collect();
                Ok(())
            },
            |p, _| {
                p.totals = self.store.save_subcategory_rows(locator, &table.rows)?;
                Ok(())
            },
        )?;
        tracing::info!("数据表已导入: {}, rows={}", locator, table.rows.len());
        self.refresh_totals(locator, page.totals.clone())
    }

    /// 导出子类别全部数据行
    pub fn export_rows(
        &self,
        locator: &SubcategoryLocator,
        format: SpreadsheetFormat,
    ) -> ApiResult<ExportedFile> {
        let rows = self.load_all_rows(locator)?;
        let sheet_name = self.config_manager.get_overview_sheet_name()?;
        let bytes = self.codec.export_as(format, &rows, &[], &sheet_name)?;
        tracing::info!("数据表已导出: {}, rows={}", locator, rows.len());
        Ok(ExportedFile {
            file_name: dataset_file_name(
                &locator.plan_key,
                &locator.stage_key,
                &locator.category,
                &locator.subcategory,
                format,
            ),
            bytes,
        })
    }

    /// 数据表空模板
    pub fn dataset_template(&self) -> ApiResult<ExportedFile> {
        let sheet_name = self.config_manager.get_template_sheet_name()?;
        Ok(ExportedFile {
            file_name: template_file_name("dataset"),
            bytes: self.codec.export_template::<DataRow>(&sheet_name)?,
        })
    }
}
