// ==========================================
// 数据版本管理系统 - 清单存储接口
// ==========================================
// 用途: 计划/阶段/类别/数据行的持久化与查询边界
// 实现者: SqliteInventoryStore（使用 rusqlite）
// 红线: 存储层只做数据映射；合计计算委托聚合引擎
// ==========================================

use crate::domain::category::{DataRow, RowDeletion, StageCategories, SubcategoryPage, TokenTotals};
use crate::domain::plan::{PlanDocument, PlanSummary, StageOverview, StageSummary};
use crate::domain::types::RowKey;
use crate::domain::visualization::PlanVisualization;
use crate::engine::aggregation::{AggregationEngine, StageTree};
use crate::repository::error::RepositoryResult;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// SubcategoryLocator - 子类别定位
// ==========================================
/// 计划键 / 阶段键 / 一级类别名 / 二级类别名
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubcategoryLocator {
    pub plan_key: String,
    pub stage_key: String,
    pub category: String,
    pub subcategory: String,
}

impl SubcategoryLocator {
    pub fn new(
        plan_key: impl Into<String>,
        stage_key: impl Into<String>,
        category: impl Into<String>,
        subcategory: impl Into<String>,
    ) -> Self {
        Self {
            plan_key: plan_key.into(),
            stage_key: stage_key.into(),
            category: category.into(),
            subcategory: subcategory.into(),
        }
    }
}

impl fmt::Display for SubcategoryLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.plan_key, self.stage_key, self.category, self.subcategory
        )
    }
}

// ==========================================
// InventoryStore Trait
// ==========================================
pub trait InventoryStore: Send + Sync {
    // ===== 计划 =====

    /// 计划列表（按创建顺序）
    fn list_plans(&self) -> RepositoryResult<Vec<PlanSummary>>;

    /// 创建计划
    ///
    /// # 返回
    /// - Ok(PlanSummary): 新计划（stage_count = 0）
    /// - Err(DuplicateName): 同名计划已存在
    fn create_plan(&self, name: &str, description: &str) -> RepositoryResult<PlanSummary>;

    fn update_plan_description(&self, plan_key: &str, description: &str) -> RepositoryResult<()>;

    /// 删除计划（级联删除全部阶段）
    fn delete_plan(&self, plan_key: &str) -> RepositoryResult<()>;

    /// 读取计划概览文档（全部阶段的概览表与合并区域）
    fn load_plan(&self, plan_key: &str) -> RepositoryResult<PlanDocument>;

    /// 保存计划概览文档
    ///
    /// 替换所列阶段的概览行与合并区域，删除文档中不再存在的阶段
    fn save_plan(&self, doc: &PlanDocument) -> RepositoryResult<()>;

    // ===== 阶段 =====

    /// 阶段列表（显示顺序，含概览行数）
    fn list_stages(&self, plan_key: &str) -> RepositoryResult<Vec<StageSummary>>;

    /// 新建阶段（追加到显示顺序末尾）
    fn create_stage(&self, plan_key: &str, stage_key: &str) -> RepositoryResult<()>;

    /// 重命名阶段（数据随阶段迁移）
    fn rename_stage(&self, plan_key: &str, old_key: &str, new_key: &str) -> RepositoryResult<()>;

    fn delete_stage(&self, plan_key: &str, stage_key: &str) -> RepositoryResult<()>;

    fn get_stage(&self, plan_key: &str, stage_key: &str) -> RepositoryResult<StageOverview>;

    fn save_stage(
        &self,
        plan_key: &str,
        stage_key: &str,
        overview: &StageOverview,
    ) -> RepositoryResult<()>;

    // ===== 类别树 =====

    /// 读取阶段类别树（含数据行与已存储合计）
    fn get_categories(&self, plan_key: &str, stage_key: &str) -> RepositoryResult<StageCategories>;

    /// 保存类别树结构
    ///
    /// 按 ID 比对: 保留节点的数据行与说明，删除缺失节点（级联），新增节点合计为零
    fn save_categories(
        &self,
        plan_key: &str,
        stage_key: &str,
        tree: &StageCategories,
    ) -> RepositoryResult<()>;

    // ===== 子类别数据 =====

    /// 分页读取数据行（page 从 1 开始）
    fn get_subcategory_data(
        &self,
        locator: &SubcategoryLocator,
        page: usize,
        page_size: usize,
    ) -> RepositoryResult<SubcategoryPage>;

    /// 按行键更新或追加单行，返回重算后的子类别合计
    fn patch_row(&self, locator: &SubcategoryLocator, row: &DataRow) -> RepositoryResult<TokenTotals>;

    /// 按行键删除，返回剩余行数与重算后的合计
    fn delete_rows(
        &self,
        locator: &SubcategoryLocator,
        keys: &[RowKey],
    ) -> RepositoryResult<RowDeletion>;

    /// 整体替换数据行（导入后使用），返回重算后的合计
    fn save_subcategory_rows(
        &self,
        locator: &SubcategoryLocator,
        rows: &[DataRow],
    ) -> RepositoryResult<TokenTotals>;

    fn update_subcategory_description(
        &self,
        locator: &SubcategoryLocator,
        description: &str,
    ) -> RepositoryResult<()>;

    // ===== 可视化 =====

    /// 计划可视化数据（由聚合引擎基于存储的类别树计算）
    fn get_visualization(&self, plan_key: &str) -> RepositoryResult<PlanVisualization> {
        let engine = AggregationEngine::new();
        let mut trees = Vec::new();
        for stage in self.list_stages(plan_key)? {
            let mut tree = self.get_categories(plan_key, &stage.name)?;
            engine.refresh_tree(&mut tree);
            trees.push(StageTree::new(stage.name, tree.categories));
        }
        Ok(engine.build_visualization(&trees))
    }
}
