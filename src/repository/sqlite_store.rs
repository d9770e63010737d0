// ==========================================
// 数据版本管理系统 - SQLite 清单存储
// ==========================================
// 职责: InventoryStore 的 rusqlite 实现
// 约束: 所有写入在单个事务内完成，失败即回滚
// 红线: 所有查询使用参数化,防止 SQL 注入
// ==========================================

mod category_ops;
mod core;
mod dataset_ops;
mod plan_ops;
mod stage_ops;

#[cfg(test)]
mod tests;

pub use core::SqliteInventoryStore;

use crate::domain::category::{DataRow, RowDeletion, StageCategories, SubcategoryPage, TokenTotals};
use crate::domain::plan::{PlanDocument, PlanSummary, StageOverview, StageSummary};
use crate::domain::types::RowKey;
use crate::repository::error::RepositoryResult;
use crate::repository::inventory_store::{InventoryStore, SubcategoryLocator};
use tracing::instrument;

impl InventoryStore for SqliteInventoryStore {
    // ==========================================
    // 计划
    // ==========================================

    fn list_plans(&self) -> RepositoryResult<Vec<PlanSummary>> {
        let conn = self.get_conn()?;
        Self::list_plans_tx(&conn)
    }

    #[instrument(skip(self, description))]
    fn create_plan(&self, name: &str, description: &str) -> RepositoryResult<PlanSummary> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let summary = Self::create_plan_tx(&tx, name, description)?;
        tx.commit()?;
        tracing::info!("计划已创建: {}", summary.key);
        Ok(summary)
    }

    fn update_plan_description(&self, plan_key: &str, description: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::update_plan_description_tx(&conn, plan_key, description)
    }

    #[instrument(skip(self))]
    fn delete_plan(&self, plan_key: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        Self::delete_plan_tx(&tx, plan_key)?;
        tx.commit()?;
        tracing::info!("计划已删除: {}", plan_key);
        Ok(())
    }

    fn load_plan(&self, plan_key: &str) -> RepositoryResult<PlanDocument> {
        let conn = self.get_conn()?;
        Self::load_plan_tx(&conn, plan_key)
    }

    #[instrument(skip(self, doc), fields(plan = %doc.plan_key, stages = doc.stages.len()))]
    fn save_plan(&self, doc: &PlanDocument) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        Self::save_plan_tx(&tx, doc)?;
        tx.commit()?;
        tracing::debug!("计划文档已保存");
        Ok(())
    }

    // ==========================================
    // 阶段
    // ==========================================

    fn list_stages(&self, plan_key: &str) -> RepositoryResult<Vec<StageSummary>> {
        let conn = self.get_conn()?;
        Self::list_stages_tx(&conn, plan_key)
    }

    #[instrument(skip(self))]
    fn create_stage(&self, plan_key: &str, stage_key: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        Self::create_stage_tx(&tx, plan_key, stage_key)?;
        tx.commit()?;
        tracing::info!("阶段已创建: {}/{}", plan_key, stage_key);
        Ok(())
    }

    #[instrument(skip(self))]
    fn rename_stage(&self, plan_key: &str, old_key: &str, new_key: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        Self::rename_stage_tx(&tx, plan_key, old_key, new_key)?;
        tx.commit()?;
        tracing::info!("阶段已重命名: {}/{} -> {}", plan_key, old_key, new_key);
        Ok(())
    }

    #[instrument(skip(self))]
    fn delete_stage(&self, plan_key: &str, stage_key: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        Self::delete_stage_tx(&tx, plan_key, stage_key)?;
        tx.commit()?;
        tracing::info!("阶段已删除: {}/{}", plan_key, stage_key);
        Ok(())
    }

    fn get_stage(&self, plan_key: &str, stage_key: &str) -> RepositoryResult<StageOverview> {
        let conn = self.get_conn()?;
        Self::get_stage_tx(&conn, plan_key, stage_key)
    }

    #[instrument(skip(self, overview), fields(rows = overview.data.rows.len()))]
    fn save_stage(
        &self,
        plan_key: &str,
        stage_key: &str,
        overview: &StageOverview,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        Self::save_stage_tx(&tx, plan_key, stage_key, overview)?;
        tx.commit()?;
        Ok(())
    }

    // ==========================================
    // 类别树
    // ==========================================

    fn get_categories(&self, plan_key: &str, stage_key: &str) -> RepositoryResult<StageCategories> {
        let conn = self.get_conn()?;
        Self::get_categories_tx(&conn, plan_key, stage_key)
    }

    #[instrument(skip(self, tree), fields(categories = tree.categories.len()))]
    fn save_categories(
        &self,
        plan_key: &str,
        stage_key: &str,
        tree: &StageCategories,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        Self::save_categories_tx(&tx, plan_key, stage_key, tree)?;
        tx.commit()?;
        tracing::debug!("类别树已保存: {}/{}", plan_key, stage_key);
        Ok(())
    }

    // ==========================================
    // 子类别数据
    // ==========================================

    fn get_subcategory_data(
        &self,
        locator: &SubcategoryLocator,
        page: usize,
        page_size: usize,
    ) -> RepositoryResult<SubcategoryPage> {
        let conn = self.get_conn()?;
        Self::get_subcategory_data_tx(&conn, locator, page, page_size)
    }

    #[instrument(skip(self, row), fields(locator = %locator, key = row.key))]
    fn patch_row(&self, locator: &SubcategoryLocator, row: &DataRow) -> RepositoryResult<TokenTotals> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let totals = Self::patch_row_tx(&tx, locator, row)?;
        tx.commit()?;
        Ok(totals)
    }

    #[instrument(skip(self, keys), fields(locator = %locator, count = keys.len()))]
    fn delete_rows(
        &self,
        locator: &SubcategoryLocator,
        keys: &[RowKey],
    ) -> RepositoryResult<RowDeletion> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let deletion = Self::delete_rows_tx(&tx, locator, keys)?;
        tx.commit()?;
        tracing::info!("数据行已删除: {}, 剩余 {}", locator, deletion.total);
        Ok(deletion)
    }

    #[instrument(skip(self, rows), fields(locator = %locator, rows = rows.len()))]
    fn save_subcategory_rows(
        &self,
        locator: &SubcategoryLocator,
        rows: &[DataRow],
    ) -> RepositoryResult<TokenTotals> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let totals = Self::save_subcategory_rows_tx(&tx, locator, rows)?;
        tx.commit()?;
        Ok(totals)
    }

    fn update_subcategory_description(
        &self,
        locator: &SubcategoryLocator,
        description: &str,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::update_subcategory_description_tx(&conn, locator, description)
    }
}
