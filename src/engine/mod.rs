// ==========================================
// 数据版本管理系统 - 引擎层
// ==========================================
// 职责: 聚合计算 + 层级结构编辑 + 合并区域运算
// 红线: Engine 不拼 SQL, 不做持久化
// ==========================================

pub mod aggregation;
pub mod error;
pub mod hierarchy;
pub mod keygen;
pub mod merge;
pub mod numeric;

// 重导出核心引擎
pub use aggregation::{AggregationEngine, StageTree};
pub use error::{HierarchyError, HierarchyResult};
pub use hierarchy::{HierarchyEditor, StageCreation};
pub use keygen::KeyGenerator;
pub use merge::cell_span;
