// ==========================================
// 数据版本管理系统 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键级联依赖 foreign_keys=ON）
// - 统一 busy_timeout
// - 首次打开时建表并写入 schema_version
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前 schema 版本
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 建表语句
///
/// 层级: plan → stage → (overview_row, category → subcategory → data_row)
/// 删除父记录时级联删除子记录
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id    TEXT NOT NULL DEFAULT 'global',
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS plan (
    plan_name   TEXT PRIMARY KEY,
    description TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS stage (
    stage_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    plan_name   TEXT NOT NULL REFERENCES plan(plan_name) ON DELETE CASCADE ON UPDATE CASCADE,
    stage_key   TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    stage_order INTEGER NOT NULL,
    merges_json TEXT NOT NULL DEFAULT '[]',
    UNIQUE (plan_name, stage_key)
);

CREATE TABLE IF NOT EXISTS overview_row (
    stage_id    INTEGER NOT NULL REFERENCES stage(stage_id) ON DELETE CASCADE,
    position    INTEGER NOT NULL,
    row_json    TEXT NOT NULL,
    PRIMARY KEY (stage_id, position)
);

CREATE TABLE IF NOT EXISTS category (
    category_id INTEGER PRIMARY KEY,
    stage_id    INTEGER NOT NULL REFERENCES stage(stage_id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    position    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS subcategory (
    subcategory_id     INTEGER PRIMARY KEY,
    category_id        INTEGER NOT NULL REFERENCES category(category_id) ON DELETE CASCADE,
    name               TEXT NOT NULL,
    description        TEXT NOT NULL DEFAULT '',
    position           INTEGER NOT NULL,
    token_count_total  TEXT NOT NULL DEFAULT '0.00',
    actual_token_total TEXT NOT NULL DEFAULT '0.00'
);

CREATE TABLE IF NOT EXISTS data_row (
    subcategory_id INTEGER NOT NULL REFERENCES subcategory(subcategory_id) ON DELETE CASCADE,
    row_key        INTEGER NOT NULL,
    position       INTEGER NOT NULL,
    hdfs_path      TEXT NOT NULL DEFAULT '',
    obs_fuzzy_path TEXT NOT NULL DEFAULT '',
    obs_full_path  TEXT NOT NULL DEFAULT '',
    token_count    TEXT NOT NULL DEFAULT '',
    actual_usage   TEXT NOT NULL DEFAULT '',
    actual_token   TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (subcategory_id, row_key)
);

CREATE INDEX IF NOT EXISTS idx_stage_plan ON stage(plan_name, stage_order);
CREATE INDEX IF NOT EXISTS idx_category_stage ON category(stage_id, position);
CREATE INDEX IF NOT EXISTS idx_subcategory_category ON subcategory(category_id, position);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）并记录 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }
}
