// ==========================================
// 数据版本管理系统 - 聚合引擎
// ==========================================
// 职责: 自底向上计算 token 合计 (DST 数据集总token / AUT 实际使用token)
// 层级: DataRow → Subcategory → Category → Stage → Plan
// 红线: 非叶子节点合计恒等于子节点合计之和
// ==========================================
// 输出: TokenTotals (定点字符串) / PlanVisualization (图表数据)
// ==========================================

use crate::domain::category::{Category, DataRow, StageCategories, Subcategory, TokenTotals};
use crate::domain::visualization::{
    CategoryStat, DistributionSlice, PlanOverview, PlanVisualization, StageStat, SubcategoryStat,
    TokenTrend,
};
use crate::engine::numeric::{format_total, parse_token_value, parse_total, round2};
use tracing::instrument;

/// 可视化输入: 阶段键 + 该阶段类别树（按阶段显示顺序排列）
#[derive(Debug, Clone)]
pub struct StageTree {
    pub stage_key: String,
    pub categories: Vec<Category>,
}

impl StageTree {
    pub fn new(stage_key: impl Into<String>, categories: Vec<Category>) -> Self {
        Self {
            stage_key: stage_key.into(),
            categories,
        }
    }
}

// ==========================================
// AggregationEngine - 聚合引擎（无状态）
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregationEngine;

impl AggregationEngine {
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 合计计算
    // ==========================================

    /// 汇总数据行
    ///
    /// token_count / actual_token 按数值解析，非数值或空值按 0 计
    pub fn rollup_rows(&self, rows: &[DataRow]) -> TokenTotals {
        let (token, actual) = rows.iter().fold((0.0_f64, 0.0_f64), |(t, a), row| {
            (
                t + parse_token_value(&row.token_count),
                a + parse_token_value(&row.actual_token),
            )
        });
        TokenTotals::new(format_total(token), format_total(actual))
    }

    /// 重算子类别合计并写回
    pub fn rollup_subcategory(&self, subcategory: &mut Subcategory) -> TokenTotals {
        let totals = self.rollup_rows(&subcategory.rows);
        subcategory.totals = totals.clone();
        totals
    }

    /// 汇总若干合计（父节点 = 子节点之和）
    pub fn sum_totals<'a, I>(&self, children: I) -> TokenTotals
    where
        I: IntoIterator<Item = &'a TokenTotals>,
    {
        let (token, actual) = children.into_iter().fold((0.0_f64, 0.0_f64), |(t, a), c| {
            (
                t + parse_total(&c.token_count_total),
                a + parse_total(&c.actual_token_total),
            )
        });
        TokenTotals::new(format_total(token), format_total(actual))
    }

    /// 重算类别合计（先重算各子类别，再求和）
    pub fn rollup_category(&self, category: &mut Category) -> TokenTotals {
        for subcategory in category.subcategories.iter_mut() {
            self.rollup_subcategory(subcategory);
        }
        let totals = self.sum_totals(category.subcategories.iter().map(|s| &s.totals));
        category.totals = totals.clone();
        totals
    }

    /// 重算整个阶段类别树，返回阶段合计
    #[instrument(skip(self, tree), fields(categories = tree.categories.len()))]
    pub fn refresh_tree(&self, tree: &mut StageCategories) -> TokenTotals {
        for category in tree.categories.iter_mut() {
            self.rollup_category(category);
        }
        self.stage_totals(&tree.categories)
    }

    /// 阶段合计（使用各类别当前合计，不重算）
    pub fn stage_totals(&self, categories: &[Category]) -> TokenTotals {
        self.sum_totals(categories.iter().map(|c| &c.totals))
    }

    /// 使用率 = actual / token * 100，token 为 0 时为 0
    pub fn usage_rate(&self, token_count: f64, actual_token: f64) -> f64 {
        if token_count > 0.0 {
            round2(actual_token / token_count * 100.0)
        } else {
            0.0
        }
    }

    // ==========================================
    // 可视化
    // ==========================================

    /// 生成计划可视化数据
    ///
    /// # 参数
    /// - `stages`: 按显示顺序排列的阶段类别树（合计应已刷新）
    ///
    /// # 返回
    /// - 总览、阶段/类别/子类别统计、类别分布、累计趋势
    #[instrument(skip(self, stages), fields(stages = stages.len()))]
    pub fn build_visualization(&self, stages: &[StageTree]) -> PlanVisualization {
        let mut result = PlanVisualization::default();
        let mut total_token = 0.0_f64;
        let mut total_actual = 0.0_f64;

        for stage in stages {
            let stage_label = stage.stage_key.to_uppercase();
            let mut stage_token = 0.0_f64;
            let mut stage_actual = 0.0_f64;
            let mut stage_datasets = 0usize;

            for category in &stage.categories {
                let mut cat_token = 0.0_f64;
                let mut cat_actual = 0.0_f64;
                let mut cat_datasets = 0usize;

                for subcategory in &category.subcategories {
                    let token = parse_total(&subcategory.totals.token_count_total);
                    let actual = parse_total(&subcategory.totals.actual_token_total);
                    let datasets = subcategory.rows.len();

                    cat_token += token;
                    cat_actual += actual;
                    cat_datasets += datasets;

                    result.subcategory_stats.push(SubcategoryStat {
                        name: format!("{}/{} ({})", category.name, subcategory.name, stage_label),
                        stage: stage.stage_key.clone(),
                        category: category.name.clone(),
                        subcategory: subcategory.name.clone(),
                        token_count: round2(token),
                        actual_token: round2(actual),
                        dataset_count: datasets,
                        usage_rate: self.usage_rate(token, actual),
                    });
                }

                result.category_stats.push(CategoryStat {
                    category: category.name.clone(),
                    stage: stage_label.clone(),
                    subcategory_count: category.subcategories.len(),
                    dataset_count: cat_datasets,
                    token_count: round2(cat_token),
                    actual_token: round2(cat_actual),
                    usage_rate: self.usage_rate(cat_token, cat_actual),
                });
                result.category_distribution.push(DistributionSlice {
                    name: format!("{} ({})", category.name, stage_label),
                    value: round2(cat_token),
                });

                stage_token += cat_token;
                stage_actual += cat_actual;
                stage_datasets += cat_datasets;
            }

            result.stage_stats.push(StageStat {
                stage: stage_label.clone(),
                token_count: round2(stage_token),
                actual_token: round2(stage_actual),
                dataset_count: stage_datasets,
            });

            total_token += stage_token;
            total_actual += stage_actual;
            result.token_trends.push(TokenTrend {
                stage: stage_label,
                cumulative_token_count: round2(total_token),
                cumulative_actual_token: round2(total_actual),
            });
        }

        // 稳定排序: token 相同时保持原顺序
        result
            .subcategory_stats
            .sort_by(|a, b| b.token_count.total_cmp(&a.token_count));

        result.overview = PlanOverview {
            total_stages: stages.len(),
            total_categories: result.category_stats.len(),
            total_token_count: round2(total_token),
            total_actual_token: round2(total_actual),
        };

        tracing::debug!(
            "可视化生成完成: stages={}, categories={}, subcategories={}",
            result.overview.total_stages,
            result.overview.total_categories,
            result.subcategory_stats.len()
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: i64, token: &str, actual: &str) -> DataRow {
        DataRow {
            key,
            token_count: token.to_string(),
            actual_token: actual.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_rollup_rows_treats_invalid_as_zero() {
        let engine = AggregationEngine::new();
        let rows = vec![row(1, "100", "50"), row(2, "abc", ""), row(3, " 20.5 ", "x")];
        let totals = engine.rollup_rows(&rows);
        assert_eq!(totals.token_count_total, "120.50");
        assert_eq!(totals.actual_token_total, "50.00");
    }

    #[test]
    fn test_rollup_empty_is_zero() {
        let engine = AggregationEngine::new();
        assert_eq!(engine.rollup_rows(&[]), TokenTotals::default());
    }

    #[test]
    fn test_rollup_category_sums_children() {
        let engine = AggregationEngine::new();
        let mut category = Category::new(1, "C1");
        let mut s1 = Subcategory::new(2, "S1");
        s1.rows = vec![row(1, "10", "5")];
        let mut s2 = Subcategory::new(3, "S2");
        s2.rows = vec![row(2, "30", "15"), row(3, "5", "")];
        category.subcategories = vec![s1, s2];

        let totals = engine.rollup_category(&mut category);
        assert_eq!(totals, TokenTotals::new("45.00", "20.00"));
        assert_eq!(category.subcategories[1].totals.token_count_total, "35.00");
    }

    #[test]
    fn test_usage_rate_zero_token() {
        let engine = AggregationEngine::new();
        assert_eq!(engine.usage_rate(0.0, 100.0), 0.0);
        assert_eq!(engine.usage_rate(200.0, 50.0), 25.0);
    }
}
