// ==========================================
// 数据版本管理系统 - 训练计划 API
// ==========================================
// 职责: 计划管理、阶段管理、阶段概览表编辑与导入导出
// 约束: 所有修改需管理员会话；本地修改持久化失败时回滚
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::events::{PlanListChange, PlanListObserver, PlanListObservers};
use crate::api::mutation::{apply_and_persist, require_admin};
use crate::config::ConfigManager;
use crate::domain::category::StageCategories;
use crate::domain::plan::{OverviewRow, PlanDocument, PlanSummary, StageData, StageOverview, StageSummary};
use crate::domain::session::SessionContext;
use crate::domain::types::{CellCoord, CellSpan, MergeRegion, RowKey};
use crate::engine::hierarchy::{HierarchyEditor, StageCreation};
use crate::engine::keygen::KeyGenerator;
use crate::engine::merge;
use crate::repository::InventoryStore;
use crate::spreadsheet::{
    overview_file_name, template_file_name, ExportedFile, SpreadsheetCodec, SpreadsheetFormat,
};

// ==========================================
// PlanApi - 训练计划 API
// ==========================================

/// 训练计划API
///
/// 职责：
/// 1. 计划管理（创建、查询、更新说明、删除），变更后通知计划列表观察者
/// 2. 阶段管理（新增并复制类别模板、重命名、删除）
/// 3. 阶段概览表编辑（插入行、编辑单元格、删除行、合并/取消合并）
/// 4. 概览表导入、导出与模板下载
pub struct PlanApi {
    store: Arc<dyn InventoryStore>,
    config_manager: Arc<ConfigManager>,
    editor: HierarchyEditor,
    codec: SpreadsheetCodec,
    observers: PlanListObservers,
}

impl PlanApi {
    /// 创建新的PlanApi实例
    pub fn new(
        store: Arc<dyn InventoryStore>,
        config_manager: Arc<ConfigManager>,
        keys: Arc<KeyGenerator>,
    ) -> Self {
        Self {
            store,
            config_manager,
            editor: HierarchyEditor::new(keys.clone()),
            codec: SpreadsheetCodec::new(keys),
            observers: PlanListObservers::new(),
        }
    }

    /// 注册计划列表观察者
    pub fn register_observer(&self, observer: Arc<dyn PlanListObserver>) {
        self.observers.register(observer);
    }

    fn notify(&self, change: PlanListChange) {
        match self.store.list_plans() {
            Ok(plans) => self.observers.notify(&change, &plans),
            Err(e) => tracing::warn!("计划列表读取失败，跳过通知: {}", e),
        }
    }

    // ==========================================
    // 计划管理
    // ==========================================

    pub fn list_plans(&self) -> ApiResult<Vec<PlanSummary>> {
        Ok(self.store.list_plans()?)
    }

    /// 创建训练计划
    ///
    /// # 参数
    /// - name: 计划名称（存储为大写，计划键为小写）
    /// - description: 计划说明
    ///
    /// # 返回
    /// - Ok(PlanSummary): 新计划
    /// - Err(ApiError::DuplicateName): 同名计划已存在
    pub fn create_plan(
        &self,
        session: &SessionContext,
        name: &str,
        description: &str,
    ) -> ApiResult<PlanSummary> {
        require_admin(session, "create_plan")?;
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput("计划名称不能为空".to_string()));
        }

        let summary = self.store.create_plan(name, description)?;
        tracing::info!("用户 {} 创建计划: {}", session.username, summary.key);
        self.notify(PlanListChange::Created(summary.key.clone()));
        Ok(summary)
    }

    /// 更新计划说明
    pub fn update_plan_description(
        &self,
        session: &SessionContext,
        doc: &mut PlanDocument,
        description: &str,
    ) -> ApiResult<()> {
        require_admin(session, "update_plan_description")?;
        apply_and_persist(
            doc,
            |d| {
                d.description = description.to_string();
                Ok(())
            },
            |d, _| {
                self.store
                    .update_plan_description(&d.plan_key, &d.description)?;
                Ok(())
            },
        )?;
        self.notify(PlanListChange::Updated(doc.plan_key.clone()));
        Ok(())
    }

    /// 删除计划（级联删除全部阶段及数据）
    pub fn delete_plan(&self, session: &SessionContext, plan_key: &str) -> ApiResult<()> {
        require_admin(session, "delete_plan")?;
        self.store.delete_plan(plan_key)?;
        tracing::info!("用户 {} 删除计划: {}", session.username, plan_key);
        self.notify(PlanListChange::Deleted(plan_key.to_string()));
        Ok(())
    }

    pub fn load_plan(&self, plan_key: &str) -> ApiResult<PlanDocument> {
        Ok(self.store.load_plan(plan_key)?)
    }

    /// 保存计划文档（外壳自动保存入口，后写覆盖先写）
    pub fn save_plan(&self, session: &SessionContext, doc: &PlanDocument) -> ApiResult<()> {
        require_admin(session, "save_plan")?;
        self.store.save_plan(doc)?;
        Ok(())
    }

    // ==========================================
    // 阶段管理
    // ==========================================

    pub fn list_stages(&self, plan_key: &str) -> ApiResult<Vec<StageSummary>> {
        Ok(self.store.list_stages(plan_key)?)
    }

    /// 新增阶段
    ///
    /// 阶段创建成功后，若配置允许且存在上一阶段，复制其类别骨架；
    /// 复制失败只记录警告，不影响阶段创建结果
    pub fn add_stage(
        &self,
        session: &SessionContext,
        doc: &mut PlanDocument,
        name: &str,
    ) -> ApiResult<StageCreation> {
        require_admin(session, "add_stage")?;
        let creation = apply_and_persist(
            doc,
            |d| Ok(self.editor.add_stage(d, name)?),
            |d, created| {
                self.store.create_stage(&d.plan_key, &created.key)?;
                Ok(())
            },
        )?;
        tracing::info!("阶段已新增: plan={}, stage={}", doc.plan_key, creation.key);

        if let Some(source) = creation.template_source.as_deref() {
            if self.copy_template_enabled() {
                if let Err(e) = self.copy_category_template(&doc.plan_key, source, &creation.key) {
                    tracing::warn!(
                        "类别模板复制失败（阶段已创建）: plan={}, from={}, to={}, error={}",
                        doc.plan_key,
                        source,
                        creation.key,
                        e
                    );
                }
            }
        }

        Ok(creation)
    }

    fn copy_template_enabled(&self) -> bool {
        self.config_manager
            .get_copy_template_on_create()
            .unwrap_or_else(|e| {
                tracing::warn!("读取模板复制配置失败，按启用处理: {}", e);
                true
            })
    }

    /// 复制类别骨架到新阶段，返回复制的一级类别数
    fn copy_category_template(&self, plan_key: &str, source: &str, target: &str) -> ApiResult<usize> {
        let source_tree = self.store.get_categories(plan_key, source)?;
        let skeleton = StageCategories {
            description: String::new(),
            categories: self.editor.copy_skeleton(&source_tree.categories),
        };
        self.store.save_categories(plan_key, target, &skeleton)?;
        tracing::debug!(
            "类别模板已复制: {} -> {}, categories={}",
            source,
            target,
            skeleton.categories.len()
        );
        Ok(skeleton.categories.len())
    }

    /// 重命名阶段，返回新阶段键
    pub fn rename_stage(
        &self,
        session: &SessionContext,
        doc: &mut PlanDocument,
        old_key: &str,
        new_name: &str,
    ) -> ApiResult<String> {
        require_admin(session, "rename_stage")?;
        apply_and_persist(
            doc,
            |d| Ok(self.editor.rename_stage(d, old_key, new_name)?),
            |d, new_key| {
                if new_key != old_key {
                    self.store.rename_stage(&d.plan_key, old_key, new_key)?;
                }
                Ok(())
            },
        )
    }

    pub fn delete_stage(
        &self,
        session: &SessionContext,
        doc: &mut PlanDocument,
        stage_key: &str,
    ) -> ApiResult<()> {
        require_admin(session, "delete_stage")?;
        apply_and_persist(
            doc,
            |d| {
                self.editor.delete_stage(d, stage_key)?;
                Ok(())
            },
            |d, _| {
                self.store.delete_stage(&d.plan_key, stage_key)?;
                Ok(())
            },
        )?;
        tracing::info!("阶段已删除: plan={}, stage={}", doc.plan_key, stage_key);
        Ok(())
    }

    // ==========================================
    // 阶段概览表
    // ==========================================

    pub fn get_stage(&self, plan_key: &str, stage_key: &str) -> ApiResult<StageOverview> {
        Ok(self.store.get_stage(plan_key, stage_key)?)
    }

    pub fn save_stage(
        &self,
        session: &SessionContext,
        plan_key: &str,
        stage_key: &str,
        overview: &StageOverview,
    ) -> ApiResult<()> {
        require_admin(session, "save_stage")?;
        self.store.save_stage(plan_key, stage_key, overview)?;
        Ok(())
    }

    /// 概览表两阶段修改（修改后整体保存阶段）
    fn mutate_overview<T, F>(
        &self,
        session: &SessionContext,
        action: &str,
        plan_key: &str,
        stage_key: &str,
        overview: &mut StageOverview,
        apply: F,
    ) -> ApiResult<T>
    where
        F: FnOnce(&mut StageOverview) -> ApiResult<T>,
    {
        require_admin(session, action)?;
        apply_and_persist(overview, apply, |o, _| {
            self.store.save_stage(plan_key, stage_key, o)?;
            Ok(())
        })
    }

    /// 末尾插入空行，返回新行键
    pub fn insert_overview_row(
        &self,
        session: &SessionContext,
        plan_key: &str,
        stage_key: &str,
        overview: &mut StageOverview,
    ) -> ApiResult<RowKey> {
        self.mutate_overview(session, "insert_overview_row", plan_key, stage_key, overview, |o| {
            Ok(self.editor.insert_overview_row(&mut o.data))
        })
    }

    pub fn edit_overview_cell(
        &self,
        session: &SessionContext,
        plan_key: &str,
        stage_key: &str,
        overview: &mut StageOverview,
        key: RowKey,
        field: &str,
        value: &str,
    ) -> ApiResult<()> {
        self.mutate_overview(session, "edit_overview_cell", plan_key, stage_key, overview, |o| {
            Ok(self.editor.edit_overview_cell(&mut o.data, key, field, value)?)
        })
    }

    /// 删除概览行并修复合并区域，返回删除行数
    pub fn delete_overview_rows(
        &self,
        session: &SessionContext,
        plan_key: &str,
        stage_key: &str,
        overview: &mut StageOverview,
        keys: &[RowKey],
    ) -> ApiResult<usize> {
        self.mutate_overview(session, "delete_overview_rows", plan_key, stage_key, overview, |o| {
            Ok(self.editor.delete_overview_rows(&mut o.data, keys))
        })
    }

    pub fn merge_cells(
        &self,
        session: &SessionContext,
        plan_key: &str,
        stage_key: &str,
        overview: &mut StageOverview,
        selection: &[CellCoord],
    ) -> ApiResult<MergeRegion> {
        self.mutate_overview(session, "merge_cells", plan_key, stage_key, overview, |o| {
            Ok(self.editor.merge_cells(&mut o.data, selection)?)
        })
    }

    pub fn unmerge_cells(
        &self,
        session: &SessionContext,
        plan_key: &str,
        stage_key: &str,
        overview: &mut StageOverview,
        selection: &[CellCoord],
    ) -> ApiResult<usize> {
        self.mutate_overview(session, "unmerge_cells", plan_key, stage_key, overview, |o| {
            Ok(self.editor.unmerge_cells(&mut o.data, selection))
        })
    }

    pub fn update_stage_description(
        &self,
        session: &SessionContext,
        plan_key: &str,
        stage_key: &str,
        overview: &mut StageOverview,
        description: &str,
    ) -> ApiResult<()> {
        self.mutate_overview(session, "update_stage_description", plan_key, stage_key, overview, |o| {
            o.description = description.to_string();
            Ok(())
        })
    }

    /// 渲染跨度查询（第一个命中的区域生效）
    pub fn get_cell_span(&self, data: &StageData, row: usize, col: usize) -> CellSpan {
        merge::cell_span(&data.merges, row, col)
    }

    // ==========================================
    // 导入导出
    // ==========================================

    /// 导出阶段概览表（含合并区域，csv 不含）
    pub fn export_overview(
        &self,
        plan_key: &str,
        stage_key: &str,
        format: SpreadsheetFormat,
    ) -> ApiResult<ExportedFile> {
        let overview = self.store.get_stage(plan_key, stage_key)?;
        let sheet_name = self.config_manager.get_overview_sheet_name()?;
        let bytes = self
            .codec
            .export_as(format, &overview.data.rows, &overview.data.merges, &sheet_name)?;
        tracing::info!(
            "概览表已导出: plan={}, stage={}, rows={}",
            plan_key,
            stage_key,
            overview.data.rows.len()
        );
        Ok(ExportedFile {
            file_name: overview_file_name(plan_key, stage_key, format),
            bytes,
        })
    }

    /// 导入阶段概览表（整体替换行与合并区域），返回导入行数
    pub fn import_overview(
        &self,
        session: &SessionContext,
        plan_key: &str,
        stage_key: &str,
        overview: &mut StageOverview,
        bytes: &[u8],
        format: SpreadsheetFormat,
    ) -> ApiResult<usize> {
        require_admin(session, "import_overview")?;
        let table = self.codec.import::<OverviewRow>(bytes, format)?;
        let count = table.rows.len();

        self.mutate_overview(session, "import_overview", plan_key, stage_key, overview, |o| {
            o.data.rows = table.rows;
            o.data.merges = table.merges;
            Ok(count)
        })?;
        tracing::info!(
            "概览表已导入: plan={}, stage={}, rows={}",
            plan_key,
            stage_key,
            count
        );
        Ok(count)
    }

    /// 概览表空模板
    pub fn overview_template(&self) -> ApiResult<ExportedFile> {
        let sheet_name = self.config_manager.get_template_sheet_name()?;
        Ok(ExportedFile {
            file_name: template_file_name("overview"),
            bytes: self.codec.export_template::<OverviewRow>(&sheet_name)?,
        })
    }
}
