// ==========================================
// 层级编辑器集成测试
// ==========================================
// 测试目标: 阶段/类别/子类别编辑、骨架复制、概览表合并区域维护
// ==========================================


use data_version_manager::domain::{CellCoord, MergeRegion, PlanDocument, StageData, TokenTotals};
use data_version_manager::engine::{HierarchyEditor, HierarchyError, KeyGenerator};
use std::sync::Arc;
use test_helpers::{category_tree, data_row, overview_row};

fn editor() -> HierarchyEditor {
    HierarchyEditor::new(Arc::new(KeyGenerator::with_seed(1_000)))
}

fn stage_data(rows: usize) -> StageData {
    StageData {
        rows: (0..rows as i64)
            .map(|k| overview_row(k + 1, "C", "S", "1"))
            .collect(),
        merges: Vec::new(),
    }
}

// ==========================================
// 阶段
// ==========================================

#[test]
fn test_add_stage_lowercases_and_reports_template_source() {
    let editor = editor();
    let mut doc = PlanDocument::new("v1");

    let first = editor.add_stage(&mut doc, " PT ").unwrap();
    assert_eq!(first.key, "pt");
    assert_eq!(first.template_source, None);

    let second = editor.add_stage(&mut doc, "SFT").unwrap();
    assert_eq!(second.template_source.as_deref(), Some("pt"));
    assert_eq!(doc.stage_keys(), vec!["pt", "sft"]);

    let duplicate = editor.add_stage(&mut doc, "Pt");
    assert!(matches!(duplicate, Err(HierarchyError::DuplicateName { .. })));
    assert_eq!(doc.stages.len(), 2);
}

#[test]
fn test_rename_stage_keeps_position_and_data() {
    let editor = editor();
    let mut doc = PlanDocument::new("v1");
    editor.add_stage(&mut doc, "pt").unwrap();
    editor.add_stage(&mut doc, "sft").unwrap();
    doc.stages[0].data = stage_data(2);

    let key = editor.rename_stage(&mut doc, "pt", "Pretrain").unwrap();
    assert_eq!(key, "pretrain");
    assert_eq!(doc.stage_keys(), vec!["pretrain", "sft"]);
    assert_eq!(doc.stages[0].data.rows.len(), 2);

    assert!(editor.rename_stage(&mut doc, "pretrain", "SFT").is_err());
    assert!(matches!(
        editor.rename_stage(&mut doc, "missing", "x"),
        Err(HierarchyError::NotFound { .. })
    ));
}

// ==========================================
// 类别树
// ==========================================

#[test]
fn test_duplicate_subcategory_leaves_list_unchanged() {
    let editor = editor();
    let mut tree = category_tree(1, &[("C1", &["X", "Y"])]);
    let before = tree.clone();

    let result = editor.add_subcategory(&mut tree, 1, "X");

    assert!(matches!(result, Err(HierarchyError::DuplicateName { .. })));
    assert_eq!(tree, before);
}

#[test]
fn test_same_subcategory_name_allowed_under_other_category() {
    let editor = editor();
    let mut tree = category_tree(1, &[("C1", &["X"]), ("C2", &[])]);
    let id = editor.add_subcategory(&mut tree, 3, "X").unwrap();
    assert_eq!(tree.categories[1].subcategories[0].id, id);
}

#[test]
fn test_rename_category_allows_own_name() {
    let editor = editor();
    let mut tree = category_tree(1, &[("C1", &[]), ("C2", &[])]);
    editor.rename_category(&mut tree, 1, "C1").unwrap();
    assert!(editor.rename_category(&mut tree, 1, "C2").is_err());
    assert!(matches!(
        editor.rename_category(&mut tree, 1, "   "),
        Err(HierarchyError::InvalidName { .. })
    ));
}

#[test]
fn test_delete_category_cascades() {
    let editor = editor();
    let mut tree = category_tree(1, &[("C1", &["S1", "S2"]), ("C2", &["S3"])]);
    tree.categories[0].subcategories[0].rows = vec![data_row(50, "1", "1")];

    let removed = editor.delete_category(&mut tree, 1).unwrap();
    assert_eq!(removed.subcategories.len(), 2);
    assert_eq!(tree.categories.len(), 1);
    assert_eq!(tree.categories[0].name, "C2");
}

#[test]
fn test_move_category_clamps_target() {
    let editor = editor();
    let mut tree = category_tree(1, &[("A", &[]), ("B", &[]), ("C", &[])]);
    editor.move_category(&mut tree, 1, 99).unwrap();
    let names: Vec<_> = tree.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["B", "C", "A"]);
}

#[test]
fn test_copy_skeleton_uses_fresh_ids_and_drops_rows() {
    let editor = editor();
    let mut source = category_tree(1, &[("C1", &["S1"])]);
    source.categories[0].subcategories[0].rows = vec![data_row(7, "10", "5")];
    source.categories[0].subcategories[0].totals = TokenTotals::new("10.00", "5.00");
    source.categories[0].subcategories[0].description = "说明".to_string();

    let copy = editor.copy_skeleton(&source.categories);

    assert_eq!(copy.len(), 1);
    assert_eq!(copy[0].name, "C1");
    assert_ne!(copy[0].id, source.categories[0].id);
    let sub = &copy[0].subcategories[0];
    assert_eq!(sub.name, "S1");
    assert_ne!(sub.id, source.categories[0].subcategories[0].id);
    assert!(sub.rows.is_empty());
    assert!(sub.description.is_empty());
    assert_eq!(sub.totals, TokenTotals::default());
}

// ==========================================
// 概览表
// ==========================================

#[test]
fn test_delete_rows_repairs_merges() {
    let editor = editor();
    let mut data = stage_data(5);
    data.merges = vec![
        MergeRegion::new(1, 3, 0, 0).unwrap(),
        MergeRegion::new(4, 4, 0, 1).unwrap(),
    ];

    // 删除原始第 0 行与第 2 行
    let deleted = editor.delete_overview_rows(&mut data, &[1, 3]);

    assert_eq!(deleted, 2);
    assert_eq!(data.rows.len(), 3);
    assert_eq!(
        data.merges,
        vec![
            MergeRegion::new(0, 1, 0, 0).unwrap(),
            MergeRegion::new(2, 2, 0, 1).unwrap(),
        ]
    );
}

#[test]
fn test_delete_all_rows_in_region_drops_it() {
    let editor = editor();
    let mut data = stage_data(3);
    data.merges = vec![MergeRegion::new(1, 2, 0, 0).unwrap()];
    editor.delete_overview_rows(&mut data, &[2, 3]);
    assert!(data.merges.is_empty());
}

#[test]
fn test_unknown_row_keys_are_ignored() {
    let editor = editor();
    let mut data = stage_data(2);
    assert_eq!(editor.delete_overview_rows(&mut data, &[42]), 0);
    assert_eq!(data.rows.len(), 2);
}

#[test]
fn test_merge_then_unmerge() {
    let editor = editor();
    let mut data = stage_data(4);

    let region = editor
        .merge_cells(&mut data, &[CellCoord::new(0, 0), CellCoord::new(2, 1)])
        .unwrap();
    assert_eq!(region, MergeRegion::new(0, 2, 0, 1).unwrap());

    assert!(editor
        .merge_cells(&mut data, &[CellCoord::new(3, 3)])
        .is_err());
    assert!(editor
        .merge_cells(&mut data, &[CellCoord::new(3, 0), CellCoord::new(9, 0)])
        .is_err());

    assert_eq!(editor.unmerge_cells(&mut data, &[CellCoord::new(1, 1)]), 1);
    assert!(data.merges.is_empty());
}

#[test]
fn test_insert_and_edit_overview_row() {
    let editor = editor();
    let mut data = StageData::default();
    let key = editor.insert_overview_row(&mut data);
    editor
        .edit_overview_cell(&mut data, key, "total_tokens", "500")
        .unwrap();
    assert_eq!(data.rows[0].total_tokens, "500");
    assert!(matches!(
        editor.edit_overview_cell(&mut data, key, "no_such_field", "x"),
        Err(HierarchyError::UnknownField(_))
    ));
}

// ==========================================
// 数据行
// ==========================================

#[test]
fn test_data_row_keys_are_unique() {
    let editor = editor();
    let mut rows = vec![data_row(5_000, "1", "1")];
    editor
        .upsert_data_row(&mut rows, data_row(5_000, "2", "2"))
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].token_count, "2");

    // 已观察到的行键之后继续生成
    let key = editor.insert_data_row(&mut rows);
    assert!(key > 5_000);
    assert_eq!(editor.delete_data_rows(&mut rows, &[5_000, key]), 2);
    assert!(rows.is_empty());
}
