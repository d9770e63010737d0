use super::core::SqliteInventoryStore;
use crate::domain::plan::{plan_display_name, plan_key, PlanDocument, PlanSummary, Stage, StageData};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::collections::HashSet;

impl SqliteInventoryStore {
    // ==========================================
    // 计划查询
    // ==========================================

    pub(super) fn list_plans_tx(conn: &Connection) -> RepositoryResult<Vec<PlanSummary>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT p.plan_name, p.description, COUNT(s.stage_id)
            FROM plan p
            LEFT JOIN stage s ON s.plan_name = p.plan_name
            GROUP BY p.plan_name, p.description, p.created_at
            ORDER BY p.created_at, p.plan_name
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let name: String = row.get(0)?;
            let description: String = row.get(1)?;
            let stage_count: i64 = row.get(2)?;
            Ok(PlanSummary {
                key: plan_key(&name),
                name: plan_display_name(&name),
                description,
                stage_count: stage_count as usize,
            })
        })?;

        let mut plans = Vec::new();
        for row in rows {
            plans.push(row?);
        }
        Ok(plans)
    }

    pub(super) fn load_plan_tx(conn: &Connection, key: &str) -> RepositoryResult<PlanDocument> {
        let plan_name = Self::plan_name(key);
        let description: String = conn
            .query_row(
                "SELECT description FROM plan WHERE plan_name = ?1",
                params![plan_name],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => RepositoryError::not_found("Plan", &plan_name),
                other => other.into(),
            })?;

        let mut stmt = conn.prepare(
            "SELECT stage_id, stage_key, merges_json FROM stage WHERE plan_name = ?1 ORDER BY stage_order, stage_id",
        )?;
        let stage_rows = stmt.query_map(params![plan_name], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut stages = Vec::new();
        for stage_row in stage_rows {
            let (stage_id, stage_key, merges_json) = stage_row?;
            stages.push(Stage {
                key: stage_key,
                data: StageData {
                    rows: Self::load_overview_rows(conn, stage_id)?,
                    merges: serde_json::from_str(&merges_json)?,
                },
            });
        }

        Ok(PlanDocument {
            plan_key: plan_key(&plan_name),
            description,
            stages,
        })
    }

    // ==========================================
    // 计划写入
    // ==========================================

    pub(super) fn create_plan_tx(
        conn: &Connection,
        name: &str,
        description: &str,
    ) -> RepositoryResult<PlanSummary> {
        let plan_name = Self::plan_name(name);
        if plan_name.is_empty() {
            return Err(RepositoryError::ValidationError("计划名称不能为空".to_string()));
        }
        if Self::require_plan(conn, &plan_name).is_ok() {
            return Err(RepositoryError::DuplicateName(format!(
                "计划已存在: {}",
                plan_name
            )));
        }

        conn.execute(
            "INSERT INTO plan (plan_name, description, created_at) VALUES (?1, ?2, ?3)",
            params![
                plan_name,
                description,
                Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
            ],
        )?;

        Ok(PlanSummary {
            key: plan_key(&plan_name),
            name: plan_display_name(&plan_name),
            description: description.to_string(),
            stage_count: 0,
        })
    }

    pub(super) fn update_plan_description_tx(
        conn: &Connection,
        key: &str,
        description: &str,
    ) -> RepositoryResult<()> {
        let plan_name = Self::plan_name(key);
        let affected = conn.execute(
            "UPDATE plan SET description = ?1 WHERE plan_name = ?2",
            params![description, plan_name],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Plan", plan_name));
        }
        Ok(())
    }

    pub(super) fn delete_plan_tx(conn: &Connection, key: &str) -> RepositoryResult<()> {
        let plan_name = Self::plan_name(key);
        let affected = conn.execute("DELETE FROM plan WHERE plan_name = ?1", params![plan_name])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Plan", plan_name));
        }
        Ok(())
    }

    /// 保存计划文档: 阶段顺序以文档为准，缺失阶段删除
    pub(super) fn save_plan_tx(conn: &Connection, doc: &PlanDocument) -> RepositoryResult<()> {
        let plan_name = Self::plan_name(&doc.plan_key);
        Self::update_plan_description_tx(conn, &doc.plan_key, &doc.description)?;

        let incoming: HashSet<&str> = doc.stages.iter().map(|s| s.key.as_str()).collect();
        if incoming.len() != doc.stages.len() {
            return Err(RepositoryError::ValidationError("阶段键重复".to_string()));
        }

        let existing: Vec<String> = {
            let mut stmt = conn.prepare("SELECT stage_key FROM stage WHERE plan_name = ?1")?;
            let rows = stmt.query_map(params![plan_name], |row| row.get::<_, String>(0))?;
            let keys = rows.collect::<Result<Vec<String>, _>>()?;
            keys
        };
        for stale in existing.iter().filter(|k| !incoming.contains(k.as_str())) {
            conn.execute(
                "DELETE FROM stage WHERE plan_name = ?1 AND stage_key = ?2",
                params![plan_name, stale],
            )?;
        }

        for (order, stage) in doc.stages.iter().enumerate() {
            conn.execute(
                r#"
                INSERT INTO stage (plan_name, stage_key, stage_order, merges_json)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(plan_name, stage_key)
                DO UPDATE SET stage_order = excluded.stage_order, merges_json = excluded.merges_json
                "#,
                params![
                    plan_name,
                    stage.key,
                    order as i64,
                    Self::merges_json(&stage.data)?
                ],
            )?;
            let stage_id = Self::stage_id(conn, &plan_name, &stage.key)?;
            Self::replace_overview_rows(conn, stage_id, &stage.data.rows)?;
        }

        Ok(())
    }
}
