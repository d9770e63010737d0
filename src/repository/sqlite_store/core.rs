use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::plan::normalize_plan_name;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::inventory_store::SubcategoryLocator;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// SqliteInventoryStore - SQLite 清单存储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct SqliteInventoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteInventoryStore {
    /// 从共享连接创建（调用方负责建表）
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 打开数据库文件并建表
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 定位辅助
    // ==========================================

    /// 计划键 → 存储名（大写）
    pub(super) fn plan_name(plan_key: &str) -> String {
        normalize_plan_name(plan_key)
    }

    /// 确认计划存在
    pub(super) fn require_plan(conn: &Connection, plan_name: &str) -> RepositoryResult<()> {
        let exists = conn
            .query_row(
                "SELECT 1 FROM plan WHERE plan_name = ?1",
                params![plan_name],
                |_| Ok(()),
            )
            .optional()?;
        exists.ok_or_else(|| RepositoryError::not_found("Plan", plan_name))
    }

    /// 查询阶段ID
    pub(super) fn stage_id(conn: &Connection, plan_name: &str, stage_key: &str) -> RepositoryResult<i64> {
        conn.query_row(
            "SELECT stage_id FROM stage WHERE plan_name = ?1 AND stage_key = ?2",
            params![plan_name, stage_key],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| RepositoryError::not_found("Stage", format!("{}/{}", plan_name, stage_key)))
    }

    /// 按名称路径查询子类别ID
    pub(super) fn subcategory_id(conn: &Connection, locator: &SubcategoryLocator) -> RepositoryResult<i64> {
        conn.query_row(
            r#"
            SELECT sc.subcategory_id
            FROM subcategory sc
            JOIN category c ON c.category_id = sc.category_id
            JOIN stage s ON s.stage_id = c.stage_id
            WHERE s.plan_name = ?1 AND s.stage_key = ?2 AND c.name = ?3 AND sc.name = ?4
            "#,
            params![
                Self::plan_name(&locator.plan_key),
                locator.stage_key,
                locator.category,
                locator.subcategory
            ],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| RepositoryError::not_found("Subcategory", locator))
    }
}
