// ==========================================
// 数据版本管理系统 - 可视化 API
// ==========================================
// 职责: 基于已存储的类别树生成计划图表数据（只读）
// ==========================================

use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::domain::visualization::{PlanVisualization, SubcategoryStat};
use crate::repository::InventoryStore;

pub struct VisualizationApi {
    store: Arc<dyn InventoryStore>,
}

impl VisualizationApi {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// 计划可视化数据
    ///
    /// # 返回
    /// - 总览、阶段/类别/子类别统计、类别分布（饼图）、累计趋势
    pub fn get_visualization(&self, plan_key: &str) -> ApiResult<PlanVisualization> {
        let visualization = self.store.get_visualization(plan_key)?;
        tracing::debug!(
            "可视化数据: plan={}, stages={}, categories={}",
            plan_key,
            visualization.overview.total_stages,
            visualization.overview.total_categories
        );
        Ok(visualization)
    }

    /// token 数最多的前 n 个子类别
    pub fn top_subcategories(&self, plan_key: &str, n: usize) -> ApiResult<Vec<SubcategoryStat>> {
        let visualization = self.get_visualization(plan_key)?;
        Ok(visualization.top_subcategories(n).to_vec())
    }
}
