use super::category_ops::map_data_row;
use super::core::SqliteInventoryStore;
use crate::domain::category::{DataRow, RowDeletion, SubcategoryPage, TokenTotals};
use crate::domain::types::RowKey;
use crate::engine::aggregation::AggregationEngine;
use crate::repository::error::RepositoryResult;
use crate::repository::inventory_store::SubcategoryLocator;
use rusqlite::{params, Connection, OptionalExtension};

impl SqliteInventoryStore {
    // ==========================================
    // 数据行查询
    // ==========================================

    /// 分页读取（page 从 1 开始，0 视为 1）
    pub(super) fn get_subcategory_data_tx(
        conn: &Connection,
        locator: &SubcategoryLocator,
        page: usize,
        page_size: usize,
    ) -> RepositoryResult<SubcategoryPage> {
        let subcategory_id = Self::subcategory_id(conn, locator)?;
        let page = page.max(1);
        let page_size = page_size.max(1);

        let (description, token_total, actual_total): (String, String, String) = conn.query_row(
            "SELECT description, token_count_total, actual_token_total FROM subcategory WHERE subcategory_id = ?1",
            params![subcategory_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM data_row WHERE subcategory_id = ?1",
            params![subcategory_id],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            r#"
            SELECT row_key, hdfs_path, obs_fuzzy_path, obs_full_path,
                   token_count, actual_usage, actual_token
            FROM data_row
            WHERE subcategory_id = ?1
            ORDER BY position, row_key
            LIMIT ?2 OFFSET ?3
            "#,
        )?;
        let rows = stmt.query_map(
            params![
                subcategory_id,
                page_size as i64,
                ((page - 1) * page_size) as i64
            ],
            map_data_row,
        )?;
        let rows = rows.collect::<Result<Vec<_>, _>>()?;

        Ok(SubcategoryPage {
            description,
            rows,
            total: total as usize,
            page,
            page_size,
            totals: TokenTotals::new(token_total, actual_total),
        })
    }

    // ==========================================
    // 数据行写入（写入后重算并存储子类别合计）
    // ==========================================

    pub(super) fn patch_row_tx(
        conn: &Connection,
        locator: &SubcategoryLocator,
        row: &DataRow,
    ) -> RepositoryResult<TokenTotals> {
        let subcategory_id = Self::subcategory_id(conn, locator)?;

        let updated = conn.execute(
            r#"
            UPDATE data_row SET
                hdfs_path = ?3, obs_fuzzy_path = ?4, obs_full_path = ?5,
                token_count = ?6, actual_usage = ?7, actual_token = ?8
            WHERE subcategory_id = ?1 AND row_key = ?2
            "#,
            params![
                subcategory_id,
                row.key,
                row.hdfs_path,
                row.obs_fuzzy_path,
                row.obs_full_path,
                row.token_count,
                row.actual_usage,
                row.actual_token
            ],
        )?;
        if updated == 0 {
            let next_position: i64 = conn
                .query_row(
                    "SELECT MAX(position) + 1 FROM data_row WHERE subcategory_id = ?1",
                    params![subcategory_id],
                    |r| r.get::<_, Option<i64>>(0),
                )
                .optional()?
                .flatten()
                .unwrap_or(0);
            Self::insert_data_row(conn, subcategory_id, next_position, row)?;
        }

        Self::recompute_totals(conn, subcategory_id)
    }

    pub(super) fn delete_rows_tx(
        conn: &Connection,
        locator: &SubcategoryLocator,
        keys: &[RowKey],
    ) -> RepositoryResult<RowDeletion> {
        let subcategory_id = Self::subcategory_id(conn, locator)?;

        let mut stmt =
            conn.prepare("DELETE FROM data_row WHERE subcategory_id = ?1 AND row_key = ?2")?;
        for key in keys {
            stmt.execute(params![subcategory_id, key])?;
        }

        let totals = Self::recompute_totals(conn, subcategory_id)?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM data_row WHERE subcategory_id = ?1",
            params![subcategory_id],
            |row| row.get(0),
        )?;
        Ok(RowDeletion {
            total: total as usize,
            totals,
        })
    }

    pub(super) fn save_subcategory_rows_tx(
        conn: &Connection,
        locator: &SubcategoryLocator,
        rows: &[DataRow],
    ) -> RepositoryResult<TokenTotals> {
        let subcategory_id = Self::subcategory_id(conn, locator)?;
        conn.execute(
            "DELETE FROM data_row WHERE subcategory_id = ?1",
            params![subcategory_id],
        )?;
        for (position, row) in rows.iter().enumerate() {
            Self::insert_data_row(conn, subcategory_id, position as i64, row)?;
        }
        Self::recompute_totals(conn, subcategory_id)
    }

    pub(super) fn update_subcategory_description_tx(
        conn: &Connection,
        locator: &SubcategoryLocator,
        description: &str,
    ) -> RepositoryResult<()> {
        let subcategory_id = Self::subcategory_id(conn, locator)?;
        conn.execute(
            "UPDATE subcategory SET description = ?1 WHERE subcategory_id = ?2",
            params![description, subcategory_id],
        )?;
        Ok(())
    }

    fn insert_data_row(
        conn: &Connection,
        subcategory_id: i64,
        position: i64,
        row: &DataRow,
    ) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO data_row (
                subcategory_id, row_key, position, hdfs_path, obs_fuzzy_path,
                obs_full_path, token_count, actual_usage, actual_token
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                subcategory_id,
                row.key,
                position,
                row.hdfs_path,
                row.obs_fuzzy_path,
                row.obs_full_path,
                row.token_count,
                row.actual_usage,
                row.actual_token
            ],
        )?;
        Ok(())
    }

    /// 重算并写回子类别合计
    fn recompute_totals(conn: &Connection, subcategory_id: i64) -> RepositoryResult<TokenTotals> {
        let rows = Self::load_data_rows(conn, subcategory_id)?;
        let totals = AggregationEngine::new().rollup_rows(&rows);
        conn.execute(
            r#"
            UPDATE subcategory SET token_count_total = ?1, actual_token_total = ?2
            WHERE subcategory_id = ?3
            "#,
            params![totals.token_count_total, totals.actual_token_total, subcategory_id],
        )?;
        Ok(totals)
    }
}
