use super::core::SqliteInventoryStore;
use crate::domain::plan::{OverviewRow, StageData, StageOverview, StageSummary};
use crate::engine::merge;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};

impl SqliteInventoryStore {
    // ==========================================
    // 阶段查询
    // ==========================================

    pub(super) fn list_stages_tx(conn: &Connection, plan_key: &str) -> RepositoryResult<Vec<StageSummary>> {
        let plan_name = Self::plan_name(plan_key);
        Self::require_plan(conn, &plan_name)?;

        let mut stmt = conn.prepare(
            r#"
            SELECT s.stage_id, s.stage_key,
                   (SELECT COUNT(*) FROM overview_row r WHERE r.stage_id = s.stage_id)
            FROM stage s
            WHERE s.plan_name = ?1
            ORDER BY s.stage_order, s.stage_id
            "#,
        )?;
        let rows = stmt.query_map(params![plan_name], |row| {
            Ok(StageSummary {
                id: row.get(0)?,
                name: row.get(1)?,
                row_count: row.get::<_, i64>(2)? as usize,
            })
        })?;

        let mut stages = Vec::new();
        for row in rows {
            stages.push(row?);
        }
        Ok(stages)
    }

    pub(super) fn get_stage_tx(
        conn: &Connection,
        plan_key: &str,
        stage_key: &str,
    ) -> RepositoryResult<StageOverview> {
        let stage_id = Self::stage_id(conn, &Self::plan_name(plan_key), stage_key)?;
        let (description, merges_json): (String, String) = conn.query_row(
            "SELECT description, merges_json FROM stage WHERE stage_id = ?1",
            params![stage_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let mut overview = StageOverview {
            description,
            ..Default::default()
        };
        overview.data.rows = Self::load_overview_rows(conn, stage_id)?;
        overview.data.merges = serde_json::from_str(&merges_json)?;
        Ok(overview)
    }

    /// 概览行（按位置）
    pub(super) fn load_overview_rows(conn: &Connection, stage_id: i64) -> RepositoryResult<Vec<OverviewRow>> {
        let mut stmt =
            conn.prepare("SELECT row_json FROM overview_row WHERE stage_id = ?1 ORDER BY position")?;
        let rows = stmt.query_map(params![stage_id], |row| row.get::<_, String>(0))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(serde_json::from_str(&row?)?);
        }
        Ok(result)
    }

    // ==========================================
    // 阶段写入
    // ==========================================

    pub(super) fn create_stage_tx(conn: &Connection, plan_key: &str, stage_key: &str) -> RepositoryResult<()> {
        let plan_name = Self::plan_name(plan_key);
        Self::require_plan(conn, &plan_name)?;
        if stage_key.trim().is_empty() {
            return Err(RepositoryError::ValidationError("阶段键不能为空".to_string()));
        }
        Self::ensure_stage_key_free(conn, &plan_name, stage_key)?;

        conn.execute(
            r#"
            INSERT INTO stage (plan_name, stage_key, stage_order)
            VALUES (?1, ?2, (SELECT COALESCE(MAX(stage_order) + 1, 0) FROM stage WHERE plan_name = ?1))
            "#,
            params![plan_name, stage_key],
        )?;
        Ok(())
    }

    pub(super) fn rename_stage_tx(
        conn: &Connection,
        plan_key: &str,
        old_key: &str,
        new_key: &str,
    ) -> RepositoryResult<()> {
        let plan_name = Self::plan_name(plan_key);
        if new_key != old_key {
            Self::ensure_stage_key_free(conn, &plan_name, new_key)?;
        }
        let affected = conn.execute(
            "UPDATE stage SET stage_key = ?1 WHERE plan_name = ?2 AND stage_key = ?3",
            params![new_key, plan_name, old_key],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Stage", format!("{}/{}", plan_name, old_key)));
        }
        Ok(())
    }

    /// 同一计划内阶段键唯一
    fn ensure_stage_key_free(conn: &Connection, plan_name: &str, stage_key: &str) -> RepositoryResult<()> {
        if Self::stage_id(conn, plan_name, stage_key).is_ok() {
            return Err(RepositoryError::DuplicateName(format!(
                "阶段已存在: {}/{}",
                plan_name, stage_key
            )));
        }
        Ok(())
    }

    pub(super) fn delete_stage_tx(conn: &Connection, plan_key: &str, stage_key: &str) -> RepositoryResult<()> {
        let plan_name = Self::plan_name(plan_key);
        let affected = conn.execute(
            "DELETE FROM stage WHERE plan_name = ?1 AND stage_key = ?2",
            params![plan_name, stage_key],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Stage", format!("{}/{}", plan_name, stage_key)));
        }
        Ok(())
    }

    pub(super) fn save_stage_tx(
        conn: &Connection,
        plan_key: &str,
        stage_key: &str,
        overview: &StageOverview,
    ) -> RepositoryResult<()> {
        let stage_id = Self::stage_id(conn, &Self::plan_name(plan_key), stage_key)?;
        conn.execute(
            "UPDATE stage SET description = ?1, merges_json = ?2 WHERE stage_id = ?3",
            params![
                overview.description,
                Self::merges_json(&overview.data)?,
                stage_id
            ],
        )?;
        Self::replace_overview_rows(conn, stage_id, &overview.data.rows)
    }

    /// 合并区域序列化（先按概览行数与列数裁剪，越界或倒置的区域不落库）
    pub(super) fn merges_json(data: &StageData) -> RepositoryResult<String> {
        let merges = merge::clamp_regions(&data.merges, data.rows.len(), OverviewRow::FIELDS.len());
        if merges != data.merges {
            tracing::warn!(
                "合并区域已裁剪: rows={}, 提交={}, 保存={}",
                data.rows.len(),
                data.merges.len(),
                merges.len()
            );
        }
        Ok(serde_json::to_string(&merges)?)
    }

    /// 整体替换概览行
    pub(super) fn replace_overview_rows(
        conn: &Connection,
        stage_id: i64,
        rows: &[OverviewRow],
    ) -> RepositoryResult<()> {
        conn.execute("DELETE FROM overview_row WHERE stage_id = ?1", params![stage_id])?;

        let mut stmt =
            conn.prepare("INSERT INTO overview_row (stage_id, position, row_json) VALUES (?1, ?2, ?3)")?;
        for (position, row) in rows.iter().enumerate() {
            stmt.execute(params![stage_id, position as i64, serde_json::to_string(row)?])?;
        }
        Ok(())
    }
}
