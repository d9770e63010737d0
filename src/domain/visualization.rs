// ==========================================
// 数据版本管理系统 - 可视化统计模型
// ==========================================
// 由聚合引擎生成，字段名为 camelCase（前端图表直接消费）
// 数值均已四舍五入到 2 位小数
// ==========================================

use serde::{Deserialize, Serialize};

/// 计划总览
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanOverview {
    pub total_stages: usize,
    pub total_categories: usize, // (阶段, 类别) 组合数
    pub total_token_count: f64,
    pub total_actual_token: f64,
}

/// 阶段统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageStat {
    pub stage: String, // 阶段显示名（大写）
    pub token_count: f64,
    pub actual_token: f64,
    pub dataset_count: usize, // 阶段内数据行总数
}

/// 类别统计（按阶段区分）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub category: String,
    pub stage: String,
    pub subcategory_count: usize,
    pub dataset_count: usize,
    pub token_count: f64,
    pub actual_token: f64,
    pub usage_rate: f64, // actual / token * 100，token 为 0 时取 0
}

/// 子类别统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryStat {
    pub name: String, // "类别/子类别 (阶段)"
    pub stage: String,
    pub category: String,
    pub subcategory: String,
    pub token_count: f64,
    pub actual_token: f64,
    pub dataset_count: usize,
    pub usage_rate: f64,
}

/// 饼图分片
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSlice {
    pub name: String,
    pub value: f64,
}

/// 累计趋势点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTrend {
    pub stage: String,
    pub cumulative_token_count: f64,
    pub cumulative_actual_token: f64,
}

// ==========================================
// PlanVisualization - 可视化数据全集
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanVisualization {
    pub overview: PlanOverview,
    pub stage_stats: Vec<StageStat>,
    pub category_stats: Vec<CategoryStat>,
    pub subcategory_stats: Vec<SubcategoryStat>, // 按 token_count 降序
    pub category_distribution: Vec<DistributionSlice>,
    pub token_trends: Vec<TokenTrend>,
}

impl PlanVisualization {
    /// 前 N 个子类别（已按 token 降序）
    pub fn top_subcategories(&self, n: usize) -> &[SubcategoryStat] {
        &self.subcategory_stats[..n.min(self.subcategory_stats.len())]
    }
}
