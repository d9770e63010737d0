// ==========================================
// 数据版本管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod inventory_store;
pub mod sqlite_store;

pub use error::{RepositoryError, RepositoryResult};
pub use inventory_store::{InventoryStore, SubcategoryLocator};
pub use sqlite_store::SqliteInventoryStore;
