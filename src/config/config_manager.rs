// ==========================================
// 数据版本管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope，当前仅 global)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!("配置已更新: {} = {}", key, value);
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(serde_json::to_string(&json!(config_map))?)
    }

    // ===== 数据表 =====

    /// 子类别数据分页大小（无效值回退默认）
    pub fn get_page_size(&self) -> RepositoryResult<usize> {
        let raw = self.get_config_or_default(config_keys::DATASET_PAGE_SIZE, "20")?;
        Ok(match raw.trim().parse::<usize>() {
            Ok(v) if v > 0 => v,
            _ => {
                tracing::warn!("配置值无效: {}={}，使用默认值 20", config_keys::DATASET_PAGE_SIZE, raw);
                config_defaults::PAGE_SIZE
            }
        })
    }

    // ===== 阶段 =====

    /// 新建阶段时是否复制上一阶段类别骨架
    pub fn get_copy_template_on_create(&self) -> RepositoryResult<bool> {
        let raw = self.get_config_or_default(config_keys::STAGE_COPY_TEMPLATE, "true")?;
        Ok(!matches!(
            raw.trim().to_lowercase().as_str(),
            "false" | "0" | "no" | "off"
        ))
    }

    // ===== 导出 =====

    pub fn get_overview_sheet_name(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::EXPORT_OVERVIEW_SHEET, config_defaults::OVERVIEW_SHEET)
    }

    pub fn get_template_sheet_name(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::EXPORT_TEMPLATE_SHEET, config_defaults::TEMPLATE_SHEET)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const DATASET_PAGE_SIZE: &str = "dataset.page_size";
    pub const STAGE_COPY_TEMPLATE: &str = "stage.copy_template_on_create";
    pub const EXPORT_OVERVIEW_SHEET: &str = "export.overview_sheet_name";
    pub const EXPORT_TEMPLATE_SHEET: &str = "export.template_sheet_name";
}

/// 默认值
pub mod config_defaults {
    pub const PAGE_SIZE: usize = 20;
    pub const OVERVIEW_SHEET: &str = "Data";
    pub const TEMPLATE_SHEET: &str = "Template";
}
