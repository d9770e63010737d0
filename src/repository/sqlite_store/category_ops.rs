use super::core::SqliteInventoryStore;
use crate::domain::category::{Category, DataRow, StageCategories, Subcategory, TokenTotals};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;

impl SqliteInventoryStore {
    // ==========================================
    // 类别树查询
    // ==========================================

    pub(super) fn get_categories_tx(
        conn: &Connection,
        plan_key: &str,
        stage_key: &str,
    ) -> RepositoryResult<StageCategories> {
        let stage_id = Self::stage_id(conn, &Self::plan_name(plan_key), stage_key)?;
        let description: String = conn.query_row(
            "SELECT description FROM stage WHERE stage_id = ?1",
            params![stage_id],
            |row| row.get(0),
        )?;

        let mut categories: Vec<Category> = {
            let mut stmt = conn.prepare(
                "SELECT category_id, name FROM category WHERE stage_id = ?1 ORDER BY position, category_id",
            )?;
            let rows = stmt.query_map(params![stage_id], |row| {
                Ok(Category::new(row.get(0)?, row.get::<_, String>(1)?))
            })?;
            let categories = rows.collect::<Result<Vec<_>, _>>()?;
            categories
        };

        let mut sub_stmt = conn.prepare(
            r#"
            SELECT subcategory_id, name, description, token_count_total, actual_token_total
            FROM subcategory
            WHERE category_id = ?1
            ORDER BY position, subcategory_id
            "#,
        )?;
        for category in categories.iter_mut() {
            let rows = sub_stmt.query_map(params![category.id], |row| {
                Ok(Subcategory {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    rows: Vec::new(),
                    totals: TokenTotals::new(row.get::<_, String>(3)?, row.get::<_, String>(4)?),
                })
            })?;
            for sub in rows {
                let mut sub = sub?;
                sub.rows = Self::load_data_rows(conn, sub.id)?;
                category.subcategories.push(sub);
            }
        }

        Ok(StageCategories {
            description,
            categories,
        })
    }

    /// 子类别全部数据行（按位置）
    pub(super) fn load_data_rows(conn: &Connection, subcategory_id: i64) -> RepositoryResult<Vec<DataRow>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT row_key, hdfs_path, obs_fuzzy_path, obs_full_path,
                   token_count, actual_usage, actual_token
            FROM data_row
            WHERE subcategory_id = ?1
            ORDER BY position, row_key
            "#,
        )?;
        let rows = stmt.query_map(params![subcategory_id], map_data_row)?;
        let rows = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ==========================================
    // 类别树写入
    // ==========================================

    /// 保存类别树结构（按 ID 比对）
    ///
    /// - 仅写入结构（名称/顺序/归属），保留已有数据行、说明与合计
    /// - 同级名称重复时整体拒绝
    pub(super) fn save_categories_tx(
        conn: &Connection,
        plan_key: &str,
        stage_key: &str,
        tree: &StageCategories,
    ) -> RepositoryResult<()> {
        validate_tree(tree)?;
        let stage_id = Self::stage_id(conn, &Self::plan_name(plan_key), stage_key)?;

        conn.execute(
            "UPDATE stage SET description = ?1 WHERE stage_id = ?2",
            params![tree.description, stage_id],
        )?;

        // 其他阶段的节点ID不可复用
        for category in &tree.categories {
            let owner: Option<i64> = conn
                .query_row(
                    "SELECT stage_id FROM category WHERE category_id = ?1",
                    params![category.id],
                    |row| row.get(0),
                )
                .optional()?;
            if matches!(owner, Some(id) if id != stage_id) {
                return Err(RepositoryError::ValidationError(format!(
                    "一级类别ID已被其他阶段使用: {}",
                    category.id
                )));
            }
        }

        let category_ids: HashSet<i64> = tree.categories.iter().map(|c| c.id).collect();
        let subcategory_ids: HashSet<i64> = tree
            .categories
            .iter()
            .flat_map(|c| c.subcategories.iter().map(|s| s.id))
            .collect();

        let existing_subs: Vec<i64> = {
            let mut stmt = conn.prepare(
                r#"
                SELECT sc.subcategory_id FROM subcategory sc
                JOIN category c ON c.category_id = sc.category_id
                WHERE c.stage_id = ?1
                "#,
            )?;
            let rows = stmt.query_map(params![stage_id], |row| row.get::<_, i64>(0))?;
            let ids = rows.collect::<Result<Vec<_>, _>>()?;
            ids
        };
        for id in existing_subs.iter().filter(|id| !subcategory_ids.contains(id)) {
            conn.execute("DELETE FROM subcategory WHERE subcategory_id = ?1", params![id])?;
        }

        for (position, category) in tree.categories.iter().enumerate() {
            conn.execute(
                r#"
                INSERT INTO category (category_id, stage_id, name, position)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(category_id) DO UPDATE SET name = excluded.name, position = excluded.position
                "#,
                params![category.id, stage_id, category.name, position as i64],
            )?;

            for (sub_position, sub) in category.subcategories.iter().enumerate() {
                Self::upsert_subcategory(conn, stage_id, category.id, sub, sub_position)?;
            }
        }

        let existing_categories: Vec<i64> = {
            let mut stmt = conn.prepare("SELECT category_id FROM category WHERE stage_id = ?1")?;
            let rows = stmt.query_map(params![stage_id], |row| row.get::<_, i64>(0))?;
            let ids = rows.collect::<Result<Vec<_>, _>>()?;
            ids
        };
        for id in existing_categories.iter().filter(|id| !category_ids.contains(id)) {
            conn.execute("DELETE FROM category WHERE category_id = ?1", params![id])?;
        }

        Ok(())
    }

    fn upsert_subcategory(
        conn: &Connection,
        stage_id: i64,
        category_id: i64,
        sub: &Subcategory,
        position: usize,
    ) -> RepositoryResult<()> {
        let owner_stage: Option<i64> = conn
            .query_row(
                r#"
                SELECT c.stage_id FROM subcategory sc
                JOIN category c ON c.category_id = sc.category_id
                WHERE sc.subcategory_id = ?1
                "#,
                params![sub.id],
                |row| row.get(0),
            )
            .optional()?;
        if matches!(owner_stage, Some(id) if id != stage_id) {
            return Err(RepositoryError::ValidationError(format!(
                "二级类别ID已被其他阶段使用: {}",
                sub.id
            )));
        }

        conn.execute(
            r#"
            INSERT INTO subcategory (subcategory_id, category_id, name, position)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(subcategory_id) DO UPDATE SET
                category_id = excluded.category_id,
                name = excluded.name,
                position = excluded.position
            "#,
            params![sub.id, category_id, sub.name, position as i64],
        )?;
        Ok(())
    }
}

/// 同级名称唯一、名称非空
fn validate_tree(tree: &StageCategories) -> RepositoryResult<()> {
    let mut category_names = HashSet::new();
    for category in &tree.categories {
        if category.name.trim().is_empty() {
            return Err(RepositoryError::ValidationError("一级类别名称不能为空".to_string()));
        }
        if !category_names.insert(category.name.as_str()) {
            return Err(RepositoryError::DuplicateName(format!(
                "一级类别名称重复: {}",
                category.name
            )));
        }

        let mut sub_names = HashSet::new();
        for sub in &category.subcategories {
            if sub.name.trim().is_empty() {
                return Err(RepositoryError::ValidationError("二级类别名称不能为空".to_string()));
            }
            if !sub_names.insert(sub.name.as_str()) {
                return Err(RepositoryError::DuplicateName(format!(
                    "二级类别名称重复: {}/{}",
                    category.name, sub.name
                )));
            }
        }
    }
    Ok(())
}

pub(super) fn map_data_row(row: &Row<'_>) -> rusqlite::Result<DataRow> {
    Ok(DataRow {
        key: row.get(0)?,
        hdfs_path: row.get(1)?,
        obs_fuzzy_path: row.get(2)?,
        obs_full_path: row.get(3)?,
        token_count: row.get(4)?,
        actual_usage: row.get(5)?,
        actual_token: row.get(6)?,
    })
}
