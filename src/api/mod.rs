// ==========================================
// 数据版本管理系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供外壳（界面/服务）调用
// ==========================================

pub mod category_api;
pub mod dataset_api;
pub mod error;
pub mod events;
pub mod mutation;
pub mod plan_api;
pub mod visualization_api;

// 重导出核心类型
pub use category_api::CategoryApi;
pub use dataset_api::DatasetApi;
pub use error::{ApiError, ApiResult};
pub use events::{NoOpPlanListObserver, PlanListChange, PlanListObserver, PlanListObservers};
pub use plan_api::PlanApi;
pub use visualization_api::VisualizationApi;
