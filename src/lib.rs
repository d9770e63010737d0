// ==========================================
// 数据版本管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 训练数据清单管理（计划 → 阶段 → 类别 → 数据集）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 聚合与层级编辑
pub mod engine;

// 表格层 - xlsx/xls/csv 编解码
pub mod spreadsheet;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CellCoord, CellSpan, MergeRegion, NodeId, RowKey};

// 领域实体
pub use domain::{
    Category, DataRow, OverviewRow, PlanDocument, PlanSummary, PlanVisualization,
    SessionContext, Stage, StageCategories, StageOverview, Subcategory, TokenTotals,
    TotalsRefresh,
};

// 引擎
pub use engine::{AggregationEngine, HierarchyEditor, KeyGenerator};

// 表格
pub use spreadsheet::{SpreadsheetCodec, SpreadsheetFormat};

// 存储
pub use repository::{InventoryStore, SqliteInventoryStore, SubcategoryLocator};

// API
pub use api::{ApiError, ApiResult, CategoryApi, DatasetApi, PlanApi, VisualizationApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "数据版本管理系统";
