// ==========================================
// 数据版本管理系统 - 应用层
// ==========================================
// 职责: 组装存储、配置与 API，供外壳持有
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
