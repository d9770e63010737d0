// ==========================================
// 数据版本管理系统 - 类别树 API
// ==========================================
// 职责: 阶段类别树读取（含合计）与一级/二级类别编辑
// 约束: 修改后整体保存类别树结构；持久化失败时回滚本地树
// ==========================================

use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::mutation::{apply_and_persist, require_admin};
use crate::domain::category::{StageCategories, TokenTotals};
use crate::domain::session::SessionContext;
use crate::domain::types::NodeId;
use crate::engine::aggregation::AggregationEngine;
use crate::engine::hierarchy::HierarchyEditor;
use crate::engine::keygen::KeyGenerator;
use crate::repository::InventoryStore;

pub struct CategoryApi {
    store: Arc<dyn InventoryStore>,
    editor: HierarchyEditor,
    engine: AggregationEngine,
}

impl CategoryApi {
    pub fn new(store: Arc<dyn InventoryStore>, keys: Arc<KeyGenerator>) -> Self {
        Self {
            store,
            editor: HierarchyEditor::new(keys),
            engine: AggregationEngine::new(),
        }
    }

    /// 读取阶段类别树（重新计算各级合计）
    pub fn get_categories(&self, plan_key: &str, stage_key: &str) -> ApiResult<StageCategories> {
        let mut tree = self.store.get_categories(plan_key, stage_key)?;
        self.engine.refresh_tree(&mut tree);
        Ok(tree)
    }

    /// 阶段合计（基于当前树）
    pub fn stage_totals(&self, tree: &StageCategories) -> TokenTotals {
        self.engine.stage_totals(&tree.categories)
    }

    /// 类别树两阶段修改
    ///
    /// 本地修改后重算合计，再保存树结构
    fn mutate_tree<T, F>(
        &self,
        session: &SessionContext,
        action: &str,
        plan_key: &str,
        stage_key: &str,
        tree: &mut StageCategories,
        apply: F,
    ) -> ApiResult<T>
    where
        F: FnOnce(&HierarchyEditor, &mut StageCategories) -> ApiResult<T>,
    {
        require_admin(session, action)?;
        apply_and_persist(
            tree,
            |t| {
                let outcome = apply(&self.editor, t)?;
                self.engine.refresh_tree(t);
                Ok(outcome)
            },
            |t, _| {
                self.store.save_categories(plan_key, stage_key, t)?;
                Ok(())
            },
        )
    }

    // ==========================================
    // 一级类别
    // ==========================================

    /// 新增一级类别，返回新ID
    pub fn add_category(
        &self,
        session: &SessionContext,
        plan_key: &str,
        stage_key: &str,
        tree: &mut StageCategories,
        name: &str,
    ) -> ApiResult<NodeId> {
        let id = self.mutate_tree(session, "add_category", plan_key, stage_key, tree, |e, t| {
            Ok(e.add_category(t, name)?)
        })?;
        tracing::info!("一级类别已新增: {}/{}/{}", plan_key, stage_key, name.trim());
        Ok(id)
    }

    pub fn rename_category(
        &self,
        session: &SessionContext,
        plan_key: &str,
        stage_key: &str,
        tree: &mut StageCategories,
        category_id: NodeId,
        new_name: &str,
    ) -> ApiResult<()> {
        self.mutate_tree(session, "rename_category", plan_key, stage_key, tree, |e, t| {
            Ok(e.rename_category(t, category_id, new_name)?)
        })
    }

    /// 删除一级类别（级联删除二级类别及数据行）
    pub fn delete_category(
        &self,
        session: &SessionContext,
        plan_key: &str,
        stage_key: &str,
        tree: &mut StageCategories,
        category_id: NodeId,
    ) -> ApiResult<()> {
        let removed = self.mutate_tree(session, "delete_category", plan_key, stage_key, tree, |e, t| {
            Ok(e.delete_category(t, category_id)?)
        })?;
        tracing::info!(
            "一级类别已删除: {}/{}/{}, subcategories={}",
            plan_key,
            stage_key,
            removed.name,
            removed.subcategories.len()
        );
        Ok(())
    }

    pub fn move_category(
        &self,
        session: &SessionContext,
        plan_key: &str,
        stage_key: &str,
        tree: &mut StageCategories,
        category_id: NodeId,
        to_index: usize,
    ) -> ApiResult<()> {
        self.mutate_tree(session, "move_category", plan_key, stage_key, tree, |e, t| {
            Ok(e.move_category(t, category_id, to_index)?)
        })
    }

    // ==========================================
    // 二级类别
    // ==========================================

    pub fn add_subcategory(
        &self,
        session: &SessionContext,
        plan_key: &str,
        stage_key: &str,
        tree: &mut StageCategories,
        category_id: NodeId,
        name: &str,
    ) -> ApiResult<NodeId> {
        self.mutate_tree(session, "add_subcategory", plan_key, stage_key, tree, |e, t| {
            Ok(e.add_subcategory(t, category_id, name)?)
        })
    }

    pub fn rename_subcategory(
        &self,
        session: &SessionContext,
        plan_key: &str,
        stage_key: &str,
        tree: &mut StageCategories,
        category_id: NodeId,
        subcategory_id: NodeId,
        new_name: &str,
    ) -> ApiResult<()> {
        self.mutate_tree(session, "rename_subcategory", plan_key, stage_key, tree, |e, t| {
            Ok(e.rename_subcategory(t, category_id, subcategory_id, new_name)?)
        })
    }

    /// 删除二级类别（连同其数据行）
    pub fn delete_subcategory(
        &self,
        session: &SessionContext,
        plan_key: &str,
        stage_key: &str,
        tree: &mut StageCategories,
        category_id: NodeId,
        subcategory_id: NodeId,
    ) -> ApiResult<()> {
        self.mutate_tree(session, "delete_subcategory", plan_key, stage_key, tree, |e, t| {
            e.delete_subcategory(t, category_id, subcategory_id)?;
            Ok(())
        })
    }

    /// 更新阶段说明（与概览表共用）
    pub fn update_stage_description(
        &self,
        session: &SessionContext,
        plan_key: &str,
        stage_key: &str,
        tree: &mut StageCategories,
        description: &str,
    ) -> ApiResult<()> {
        self.mutate_tree(session, "update_stage_description", plan_key, stage_key, tree, |_, t| {
            t.description = description.to_string();
            Ok(())
        })
    }
}
