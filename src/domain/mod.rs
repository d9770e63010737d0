// ==========================================
// 数据版本管理系统 - 领域模型层
// ==========================================
// 层级: Plan → Stage → Category → Subcategory → DataRow
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod category;
pub mod plan;
pub mod session;
pub mod types;
pub mod visualization;

// 重导出核心类型
pub use category::{
    Category, DataRow, RowDeletion, StageCategories, Subcategory, SubcategoryPage, TokenTotals,
    TotalsRefresh, ZERO_TOTAL,
};
pub use plan::{
    normalize_plan_name, normalize_stage_key, plan_display_name, plan_key, OverviewRow,
    PlanDocument, PlanSummary, Stage, StageData, StageOverview, StageSummary, PLAN_NAME_SUFFIX,
};
pub use session::SessionContext;
pub use types::{CellCoord, CellSpan, MergeRegion, NodeId, RowKey};
pub use visualization::{
    CategoryStat, DistributionSlice, PlanOverview, PlanVisualization, StageStat, SubcategoryStat,
    TokenTrend,
};
