// ==========================================
// 数据版本管理系统 - 层级编辑器
// ==========================================
// 职责: Plan/Stage/Category/Subcategory 树的内存结构编辑
// 红线: 同级名称唯一（区分大小写、精确匹配）
// 红线: 校验失败时不修改任何状态
// 说明: 本层不做持久化，由 API 层负责提交/回滚
// ==========================================

use crate::domain::category::{Category, DataRow, StageCategories, Subcategory};
use crate::domain::plan::{normalize_stage_key, OverviewRow, PlanDocument, Stage, StageData};
use crate::domain::types::{CellCoord, MergeRegion, NodeId, RowKey};
use crate::engine::error::{HierarchyError, HierarchyResult};
use crate::engine::keygen::KeyGenerator;
use crate::engine::merge;
use std::sync::Arc;
use tracing::instrument;

const LEVEL_STAGE: &str = "阶段";
const LEVEL_CATEGORY: &str = "一级类别";
const LEVEL_SUBCATEGORY: &str = "二级类别";
const LEVEL_ROW: &str = "数据行";

/// 新建阶段结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCreation {
    pub key: String,
    /// 显示顺序中的上一个阶段（类别骨架复制来源）
    pub template_source: Option<String>,
}

// ==========================================
// HierarchyEditor - 层级编辑器
// ==========================================
pub struct HierarchyEditor {
    keys: Arc<KeyGenerator>,
}

impl HierarchyEditor {
    pub fn new(keys: Arc<KeyGenerator>) -> Self {
        Self { keys }
    }

    pub fn key_generator(&self) -> &Arc<KeyGenerator> {
        &self.keys
    }

    /// 生成新的行键/节点ID
    pub fn next_key(&self) -> RowKey {
        self.keys.next_key()
    }

    // ==========================================
    // 阶段
    // ==========================================

    /// 新增阶段（追加到显示顺序末尾）
    ///
    /// # 参数
    /// - `name`: 阶段名称，转为小写作为阶段键
    ///
    /// # 返回
    /// - `StageCreation`: 新阶段键 + 模板来源阶段（若存在）
    pub fn add_stage(&self, doc: &mut PlanDocument, name: &str) -> HierarchyResult<StageCreation> {
        let key = normalize_stage_key(name);
        if key.is_empty() {
            return Err(HierarchyError::InvalidName {
                level: LEVEL_STAGE.to_string(),
            });
        }
        if doc.contains_stage(&key) {
            return Err(HierarchyError::duplicate(LEVEL_STAGE, &key));
        }

        let template_source = doc.last_stage_key().map(str::to_string);
        doc.stages.push(Stage::new(key.clone()));
        tracing::debug!("新增阶段: plan={}, stage={}", doc.plan_key, key);

        Ok(StageCreation {
            key,
            template_source,
        })
    }

    /// 重命名阶段（数据随键迁移，顺序不变）
    pub fn rename_stage(
        &self,
        doc: &mut PlanDocument,
        old_key: &str,
        new_name: &str,
    ) -> HierarchyResult<String> {
        let new_key = normalize_stage_key(new_name);
        if new_key.is_empty() {
            return Err(HierarchyError::InvalidName {
                level: LEVEL_STAGE.to_string(),
            });
        }
        if new_key != old_key && doc.contains_stage(&new_key) {
            return Err(HierarchyError::duplicate(LEVEL_STAGE, &new_key));
        }
        let stage = doc
            .stage_mut(old_key)
            .ok_or_else(|| HierarchyError::not_found(LEVEL_STAGE, old_key))?;
        stage.key = new_key.clone();
        Ok(new_key)
    }

    /// 删除阶段
    pub fn delete_stage(&self, doc: &mut PlanDocument, key: &str) -> HierarchyResult<Stage> {
        let index = doc
            .stages
            .iter()
            .position(|s| s.key == key)
            .ok_or_else(|| HierarchyError::not_found(LEVEL_STAGE, key))?;
        Ok(doc.stages.remove(index))
    }

    // ==========================================
    // 一级类别
    // ==========================================

    /// 新增一级类别（追加到末尾），返回新ID
    pub fn add_category(&self, tree: &mut StageCategories, name: &str) -> HierarchyResult<NodeId> {
        let name = validate_name(LEVEL_CATEGORY, name)?;
        if tree.categories.iter().any(|c| c.name == name) {
            return Err(HierarchyError::duplicate(LEVEL_CATEGORY, &name));
        }
        let id = self.keys.next_key();
        tree.categories.push(Category::new(id, name));
        Ok(id)
    }

    /// 重命名一级类别（同名检查排除自身）
    pub fn rename_category(
        &self,
        tree: &mut StageCategories,
        id: NodeId,
        new_name: &str,
    ) -> HierarchyResult<()> {
        let new_name = validate_name(LEVEL_CATEGORY, new_name)?;
        if tree.categories.iter().any(|c| c.id != id && c.name == new_name) {
            return Err(HierarchyError::duplicate(LEVEL_CATEGORY, &new_name));
        }
        let category = tree
            .category_mut(id)
            .ok_or_else(|| HierarchyError::not_found(LEVEL_CATEGORY, id))?;
        category.name = new_name;
        Ok(())
    }

    /// 删除一级类别（级联删除二级类别及数据行）
    pub fn delete_category(&self, tree: &mut StageCategories, id: NodeId) -> HierarchyResult<Category> {
        let index = tree
            .categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| HierarchyError::not_found(LEVEL_CATEGORY, id))?;
        Ok(tree.categories.remove(index))
    }

    /// 调整一级类别顺序
    pub fn move_category(
        &self,
        tree: &mut StageCategories,
        id: NodeId,
        to_index: usize,
    ) -> HierarchyResult<()> {
        let from = tree
            .categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| HierarchyError::not_found(LEVEL_CATEGORY, id))?;
        let to = to_index.min(tree.categories.len() - 1);
        let category = tree.categories.remove(from);
        tree.categories.insert(to, category);
        Ok(())
    }

    // ==========================================
    // 二级类别
    // ==========================================

    pub fn add_subcategory(
        &self,
        tree: &mut StageCategories,
        category_id: NodeId,
        name: &str,
    ) -> HierarchyResult<NodeId> {
        let name = validate_name(LEVEL_SUBCATEGORY, name)?;
        let category = tree
            .category_mut(category_id)
            .ok_or_else(|| HierarchyError::not_found(LEVEL_CATEGORY, category_id))?;
        if category.subcategories.iter().any(|s| s.name == name) {
            return Err(HierarchyError::duplicate(LEVEL_SUBCATEGORY, &name));
        }
        let id = self.keys.next_key();
        category.subcategories.push(Subcategory::new(id, name));
        Ok(id)
    }

    pub fn rename_subcategory(
        &self,
        tree: &mut StageCategories,
        category_id: NodeId,
        subcategory_id: NodeId,
        new_name: &str,
    ) -> HierarchyResult<()> {
        let new_name = validate_name(LEVEL_SUBCATEGORY, new_name)?;
        let category = tree
            .category_mut(category_id)
            .ok_or_else(|| HierarchyError::not_found(LEVEL_CATEGORY, category_id))?;
        if category
            .subcategories
            .iter()
            .any(|s| s.id != subcategory_id && s.name == new_name)
        {
            return Err(HierarchyError::duplicate(LEVEL_SUBCATEGORY, &new_name));
        }
        let subcategory = category
            .subcategory_mut(subcategory_id)
            .ok_or_else(|| HierarchyError::not_found(LEVEL_SUBCATEGORY, subcategory_id))?;
        subcategory.name = new_name;
        Ok(())
    }

    pub fn delete_subcategory(
        &self,
        tree: &mut StageCategories,
        category_id: NodeId,
        subcategory_id: NodeId,
    ) -> HierarchyResult<Subcategory> {
        let category = tree
            .category_mut(category_id)
            .ok_or_else(|| HierarchyError::not_found(LEVEL_CATEGORY, category_id))?;
        let index = category
            .subcategories
            .iter()
            .position(|s| s.id == subcategory_id)
            .ok_or_else(|| HierarchyError::not_found(LEVEL_SUBCATEGORY, subcategory_id))?;
        Ok(category.subcategories.remove(index))
    }

    /// 复制类别骨架（仅名称）
    ///
    /// 一级/二级类别均生成新ID；数据行、说明与合计不复制
    #[instrument(skip(self, source), fields(categories = source.len()))]
    pub fn copy_skeleton(&self, source: &[Category]) -> Vec<Category> {
        source
            .iter()
            .map(|category| {
                let mut copy = Category::new(self.keys.next_key(), category.name.clone());
                copy.subcategories = category
                    .subcategories
                    .iter()
                    .map(|s| Subcategory::new(self.keys.next_key(), s.name.clone()))
                    .collect();
                copy
            })
            .collect()
    }

    // ==========================================
    // 阶段概览表
    // ==========================================

    /// 末尾插入空行，返回新行键
    pub fn insert_overview_row(&self, data: &mut StageData) -> RowKey {
        let key = self.keys.next_key();
        data.rows.push(OverviewRow::empty(key));
        key
    }

    /// 修改单元格
    pub fn edit_overview_cell(
        &self,
        data: &mut StageData,
        key: RowKey,
        field: &str,
        value: &str,
    ) -> HierarchyResult<()> {
        let row = data
            .rows
            .iter_mut()
            .find(|r| r.key == key)
            .ok_or_else(|| HierarchyError::not_found(LEVEL_ROW, key))?;
        let cell = row
            .field_mut(field)
            .ok_or_else(|| HierarchyError::UnknownField(field.to_string()))?;
        *cell = value.to_string();
        Ok(())
    }

    /// 删除概览行并修复合并区域，返回删除行数
    ///
    /// 未知行键被忽略
    #[instrument(skip(self, data, keys), fields(rows = data.rows.len(), keys = keys.len()))]
    pub fn delete_overview_rows(&self, data: &mut StageData, keys: &[RowKey]) -> usize {
        let deleted: Vec<usize> = data
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| keys.contains(&r.key))
            .map(|(i, _)| i)
            .collect();
        if deleted.is_empty() {
            return 0;
        }

        data.rows.retain(|r| !keys.contains(&r.key));
        data.merges = merge::repair_merges(&data.merges, &deleted, data.rows.len());
        deleted.len()
    }

    /// 合并选中单元格（至少 2 个），返回新区域
    pub fn merge_cells(
        &self,
        data: &mut StageData,
        selection: &[CellCoord],
    ) -> HierarchyResult<MergeRegion> {
        let region = merge::bounding_region(selection, data.rows.len(), OverviewRow::FIELDS.len())?;
        data.merges.push(region);
        Ok(region)
    }

    /// 取消合并: 移除包含任一选中单元格的区域
    pub fn unmerge_cells(&self, data: &mut StageData, selection: &[CellCoord]) -> usize {
        merge::remove_regions_touching(&mut data.merges, selection)
    }

    // ==========================================
    // 子类别数据行
    // ==========================================

    /// 末尾插入空数据行
    pub fn insert_data_row(&self, rows: &mut Vec<DataRow>) -> RowKey {
        let key = self.keys.next_key();
        rows.push(DataRow::empty(key));
        key
    }

    /// 按行键更新或追加数据行，返回是否为新增
    ///
    /// # 错误
    /// - InvalidKey: 行键超过 keygen::MAX_ROW_KEY
    pub fn upsert_data_row(&self, rows: &mut Vec<DataRow>, row: DataRow) -> HierarchyResult<bool> {
        if !self.keys.observe(row.key) {
            return Err(HierarchyError::InvalidKey(row.key));
        }
        match rows.iter_mut().find(|r| r.key == row.key) {
            Some(existing) => {
                *existing = row;
                Ok(false)
            }
            None => {
                rows.push(row);
                Ok(true)
            }
        }
    }

    /// 按行键删除数据行，返回删除数量
    pub fn delete_data_rows(&self, rows: &mut Vec<DataRow>, keys: &[RowKey]) -> usize {
        let before = rows.len();
        rows.retain(|r| !keys.contains(&r.key));
        before - rows.len()
    }
}

/// 名称校验: 去除首尾空白后不能为空
fn validate_name(level: &str, name: &str) -> HierarchyResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(HierarchyError::InvalidName {
            level: level.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> HierarchyEditor {
        HierarchyEditor::new(Arc::new(KeyGenerator::new()))
    }

    #[test]
    fn test_add_category_rejects_duplicate() {
        let editor = editor();
        let mut tree = StageCategories::default();
        editor.add_category(&mut tree, "C1").unwrap();
        let before = tree.clone();

        let err = editor.add_category(&mut tree, "C1").unwrap_err();
        assert!(matches!(err, HierarchyError::DuplicateName { .. }));
        assert_eq!(tree, before);

        // 区分大小写
        editor.add_category(&mut tree, "c1").unwrap();
        assert_eq!(tree.categories.len(), 2);
    }

    #[test]
    fn test_rename_ignores_self() {
        let editor = editor();
        let mut tree = StageCategories::default();
        let a = editor.add_category(&mut tree, "A").unwrap();
        let b = editor.add_category(&mut tree, "B").unwrap();

        editor.rename_category(&mut tree, a, "A").unwrap();
        assert!(editor.rename_category(&mut tree, a, "B").is_err());
        editor.rename_category(&mut tree, b, "Z").unwrap();
        let names: Vec<_> = tree.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "Z"]);
    }

    #[test]
    fn test_add_subcategory_duplicate_leaves_list_unchanged() {
        let editor = editor();
        let mut tree = StageCategories::default();
        let c = editor.add_category(&mut tree, "C").unwrap();
        editor.add_subcategory(&mut tree, c, "X").unwrap();

        let err = editor.add_subcategory(&mut tree, c, "X").unwrap_err();
        assert_eq!(err, HierarchyError::duplicate(LEVEL_SUBCATEGORY, "X"));
        assert_eq!(tree.category(c).unwrap().subcategories.len(), 1);
    }

    #[test]
    fn test_move_category() {
        let editor = editor();
        let mut tree = StageCategories::default();
        let a = editor.add_category(&mut tree, "A").unwrap();
        editor.add_category(&mut tree, "B").unwrap();
        editor.add_category(&mut tree, "C").unwrap();

        editor.move_category(&mut tree, a, 99).unwrap();
        let names: Vec<_> = tree.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_stage_lifecycle() {
        let editor = editor();
        let mut doc = PlanDocument::new("72b");
        let first = editor.add_stage(&mut doc, "Stage1").unwrap();
        assert_eq!(first.key, "stage1");
        assert_eq!(first.template_source, None);

        let second = editor.add_stage(&mut doc, "stage2").unwrap();
        assert_eq!(second.template_source.as_deref(), Some("stage1"));
        assert!(editor.add_stage(&mut doc, "STAGE1").is_err());

        editor.rename_stage(&mut doc, "stage1", "warmup").unwrap();
        assert_eq!(doc.stage_keys(), vec!["warmup", "stage2"]);
        assert!(editor.rename_stage(&mut doc, "warmup", "stage2").is_err());

        editor.delete_stage(&mut doc, "warmup").unwrap();
        assert_eq!(doc.stage_keys(), vec!["stage2"]);
    }

    #[test]
    fn test_delete_overview_rows_repairs_merges() {
        let editor = editor();
        let mut data = StageData::default();
        let keys: Vec<_> = (0..4).map(|_| editor.insert_overview_row(&mut data)).collect();
        data.merges.push(MergeRegion::new(1, 2, 0, 0).unwrap());

        let deleted = editor.delete_overview_rows(&mut data, &[keys[0]]);
        assert_eq!(deleted, 1);
        assert_eq!(data.merges, vec![MergeRegion::new(0, 1, 0, 0).unwrap()]);
    }

    #[test]
    fn test_upsert_data_row() {
        let editor = editor();
        let mut sub = Subcategory::new(1, "S");
        let key = editor.insert_data_row(&mut sub.rows);

        let mut row = DataRow::empty(key);
        row.token_count = "10".to_string();
        assert!(!editor.upsert_data_row(&mut sub.rows, row).unwrap());
        assert_eq!(sub.rows[0].token_count, "10");

        assert!(editor
            .upsert_data_row(&mut sub.rows, DataRow::empty(key + 1_000_000))
            .unwrap());
        assert_eq!(sub.rows.len(), 2);
        assert!(editor.next_key() > key + 1_000_000);
    }

    #[test]
    fn test_upsert_rejects_key_at_limit() {
        let editor = editor();
        let mut rows = Vec::new();
        let err = editor
            .upsert_data_row(&mut rows, DataRow::empty(i64::MAX))
            .unwrap_err();
        assert_eq!(err, HierarchyError::InvalidKey(i64::MAX));
        assert!(rows.is_empty());

        let key = editor.insert_data_row(&mut rows);
        assert!(key < i64::MAX);
    }
}
