use super::SqliteInventoryStore;
use crate::domain::category::{Category, DataRow, StageCategories, Subcategory, TokenTotals};
use crate::domain::plan::{OverviewRow, PlanDocument, Stage, StageOverview};
use crate::domain::types::MergeRegion;
use crate::repository::error::RepositoryError;
use crate::repository::inventory_store::{InventoryStore, SubcategoryLocator};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

fn setup_store() -> SqliteInventoryStore {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::init_schema(&conn).unwrap();
    SqliteInventoryStore::new(Arc::new(Mutex::new(conn)))
}

fn data_row(key: i64, token: &str, actual: &str) -> DataRow {
    DataRow {
        key,
        hdfs_path: format!("/hdfs/{}", key),
        token_count: token.to_string(),
        actual_token: actual.to_string(),
        ..Default::default()
    }
}

/// 计划 v1 / 阶段 sft / 类别 Code(10) / 子类别 Python(20)
fn seed_tree(store: &SqliteInventoryStore) -> SubcategoryLocator {
    store.create_plan("v1", "").unwrap();
    store.create_stage("v1", "sft").unwrap();

    let mut category = Category::new(10, "Code");
    category.subcategories.push(Subcategory::new(20, "Python"));
    let tree = StageCategories {
        description: String::new(),
        categories: vec![category],
    };
    store.save_categories("v1", "sft", &tree).unwrap();
    SubcategoryLocator::new("v1", "sft", "Code", "Python")
}

#[test]
fn test_create_and_list_plans() {
    let store = setup_store();
    let summary = store.create_plan(" v1 ", "first").unwrap();
    assert_eq!(summary.key, "v1");
    assert_eq!(summary.name, "V1 训练计划");
    assert_eq!(summary.stage_count, 0);

    store.create_stage("v1", "pretrain").unwrap();
    let plans = store.list_plans().unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].stage_count, 1);
}

#[test]
fn test_duplicate_plan_rejected() {
    let store = setup_store();
    store.create_plan("v1", "").unwrap();
    let result = store.create_plan("V1", "");
    assert!(matches!(result, Err(RepositoryError::DuplicateName(_))));
}

#[test]
fn test_missing_plan_is_not_found() {
    let store = setup_store();
    assert!(matches!(
        store.load_plan("nope"),
        Err(RepositoryError::NotFound { .. })
    ));
    assert!(matches!(
        store.list_stages("nope"),
        Err(RepositoryError::NotFound { .. })
    ));
}

#[test]
fn test_duplicate_stage_key_is_name_conflict() {
    let store = setup_store();
    store.create_plan("v1", "").unwrap();
    store.create_stage("v1", "a").unwrap();
    store.create_stage("v1", "b").unwrap();

    let created = store.create_stage("v1", "a");
    assert!(matches!(created, Err(RepositoryError::DuplicateName(_))));
    let renamed = store.rename_stage("v1", "b", "a");
    assert!(matches!(renamed, Err(RepositoryError::DuplicateName(_))));
    store.rename_stage("v1", "b", "b").unwrap();
}

#[test]
fn test_stage_order_and_rename() {
    let store = setup_store();
    store.create_plan("v1", "").unwrap();
    store.create_stage("v1", "pretrain").unwrap();
    store.create_stage("v1", "sft").unwrap();
    store.rename_stage("v1", "pretrain", "base").unwrap();

    let names: Vec<_> = store
        .list_stages("v1")
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["base", "sft"]);
}

#[test]
fn test_save_stage_round_trip() {
    let store = setup_store();
    store.create_plan("v1", "").unwrap();
    store.create_stage("v1", "sft").unwrap();

    let mut overview = StageOverview {
        description: "说明".to_string(),
        ..Default::default()
    };
    let mut row = OverviewRow::empty(1);
    row.category = "Code".to_string();
    overview.data.rows = vec![row, OverviewRow::empty(2)];
    overview.data.merges = vec![MergeRegion::new(0, 1, 0, 0).unwrap()];
    store.save_stage("v1", "sft", &overview).unwrap();

    let loaded = store.get_stage("v1", "sft").unwrap();
    assert_eq!(loaded, overview);
    assert_eq!(store.list_stages("v1").unwrap()[0].row_count, 2);
}

#[test]
fn test_save_stage_clamps_merges_to_rows() {
    let store = setup_store();
    store.create_plan("v1", "").unwrap();
    store.create_stage("v1", "sft").unwrap();

    let mut overview = StageOverview::default();
    overview.data.rows = vec![OverviewRow::empty(1), OverviewRow::empty(2)];
    overview.data.merges = vec![
        MergeRegion::new(5, 9, 0, 0).unwrap(),
        MergeRegion::new(0, 5, 1, 40).unwrap(),
        MergeRegion {
            start_row: 1,
            end_row: 0,
            start_col: 2,
            end_col: 2,
        },
    ];
    store.save_stage("v1", "sft", &overview).unwrap();

    let loaded = store.get_stage("v1", "sft").unwrap();
    let last_col = OverviewRow::FIELDS.len() - 1;
    assert_eq!(loaded.data.merges, vec![MergeRegion::new(0, 1, 1, last_col).unwrap()]);
}

#[test]
fn test_save_plan_drops_missing_stages() {
    let store = setup_store();
    store.create_plan("v1", "").unwrap();
    store.create_stage("v1", "a").unwrap();
    store.create_stage("v1", "b").unwrap();

    let mut doc = PlanDocument::new("v1");
    doc.description = "updated".to_string();
    let mut stage = Stage::new("b");
    stage.data.rows.push(OverviewRow::empty(7));
    doc.stages.push(stage);
    doc.stages.push(Stage::new("c"));
    store.save_plan(&doc).unwrap();

    let loaded = store.load_plan("v1").unwrap();
    assert_eq!(loaded.description, "updated");
    assert_eq!(loaded.stage_keys(), vec!["b", "c"]);
    assert_eq!(loaded.stages[0].data.rows.len(), 1);
}

#[test]
fn test_patch_row_updates_totals() {
    let store = setup_store();
    let locator = seed_tree(&store);

    let totals = store.patch_row(&locator, &data_row(1, "100", "40")).unwrap();
    assert_eq!(totals, TokenTotals::new("100.00", "40.00"));

    store.patch_row(&locator, &data_row(2, "50.5", "")).unwrap();
    let totals = store.patch_row(&locator, &data_row(1, "10", "5")).unwrap();
    assert_eq!(totals, TokenTotals::new("60.50", "5.00"));

    let page = store.get_subcategory_data(&locator, 1, 20).unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.rows[0].key, 1);
    assert_eq!(page.totals, totals);
}

#[test]
fn test_pagination() {
    let store = setup_store();
    let locator = seed_tree(&store);
    let rows: Vec<DataRow> = (1..=5).map(|k| data_row(k, "1", "1")).collect();
    store.save_subcategory_rows(&locator, &rows).unwrap();

    let page = store.get_subcategory_data(&locator, 2, 2).unwrap();
    assert_eq!(page.total, 5);
    let keys: Vec<_> = page.rows.iter().map(|r| r.key).collect();
    assert_eq!(keys, vec![3, 4]);

    let first = store.get_subcategory_data(&locator, 0, 2).unwrap();
    assert_eq!(first.page, 1);
    assert_eq!(first.rows[0].key, 1);
}

#[test]
fn test_delete_rows_returns_remaining() {
    let store = setup_store();
    let locator = seed_tree(&store);
    let rows = vec![data_row(1, "10", "1"), data_row(2, "20", "2"), data_row(3, "30", "3")];
    store.save_subcategory_rows(&locator, &rows).unwrap();

    let deletion = store.delete_rows(&locator, &[1, 3, 99]).unwrap();
    assert_eq!(deletion.total, 1);
    assert_eq!(deletion.totals, TokenTotals::new("20.00", "2.00"));
}

#[test]
fn test_save_categories_preserves_rows_and_cascades() {
    let store = setup_store();
    let locator = seed_tree(&store);
    store.patch_row(&locator, &data_row(1, "100", "0")).unwrap();
    store
        .update_subcategory_description(&locator, "python data")
        .unwrap();

    // 重命名子类别 + 新增类别
    let mut tree = store.get_categories("v1", "sft").unwrap();
    tree.categories[0].subcategories[0].name = "Py".to_string();
    tree.categories.push(Category::new(30, "Math"));
    store.save_categories("v1", "sft", &tree).unwrap();

    let loaded = store.get_categories("v1", "sft").unwrap();
    let py = &loaded.categories[0].subcategories[0];
    assert_eq!(py.name, "Py");
    assert_eq!(py.description, "python data");
    assert_eq!(py.rows.len(), 1);
    assert_eq!(py.totals.token_count_total, "100.00");

    // 删除类别级联删除其数据
    let tree = StageCategories {
        description: String::new(),
        categories: vec![Category::new(30, "Math")],
    };
    store.save_categories("v1", "sft", &tree).unwrap();
    let renamed = SubcategoryLocator::new("v1", "sft", "Code", "Py");
    assert!(matches!(
        store.get_subcategory_data(&renamed, 1, 20),
        Err(RepositoryError::NotFound { .. })
    ));
}

#[test]
fn test_duplicate_row_keys_are_not_name_conflicts() {
    let store = setup_store();
    let locator = seed_tree(&store);
    store
        .save_subcategory_rows(&locator, &[data_row(1, "5", "5")])
        .unwrap();

    let rows = vec![data_row(7, "1", "1"), data_row(7, "2", "2")];
    let result = store.save_subcategory_rows(&locator, &rows);
    assert!(matches!(result, Err(RepositoryError::UniqueConstraintViolation(_))));

    // 事务回滚，原有行保留
    let page = store.get_subcategory_data(&locator, 1, 20).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.rows[0].key, 1);
}

#[test]
fn test_save_categories_rejects_duplicate_names() {
    let store = setup_store();
    seed_tree(&store);
    let tree = StageCategories {
        description: String::new(),
        categories: vec![Category::new(1, "Dup"), Category::new(2, "Dup")],
    };
    let result = store.save_categories("v1", "sft", &tree);
    assert!(matches!(result, Err(RepositoryError::DuplicateName(_))));

    // 失败的保存不改变原有数据
    let loaded = store.get_categories("v1", "sft").unwrap();
    assert_eq!(loaded.categories.len(), 1);
    assert_eq!(loaded.categories[0].name, "Code");
}

#[test]
fn test_delete_stage_cascades() {
    let store = setup_store();
    let locator = seed_tree(&store);
    store.patch_row(&locator, &data_row(1, "1", "1")).unwrap();
    store.delete_stage("v1", "sft").unwrap();

    assert!(store.list_stages("v1").unwrap().is_empty());
    assert!(matches!(
        store.get_categories("v1", "sft"),
        Err(RepositoryError::NotFound { .. })
    ));
}

#[test]
fn test_visualization_from_stored_tree() {
    let store = setup_store();
    let locator = seed_tree(&store);
    store.patch_row(&locator, &data_row(1, "200", "50")).unwrap();

    let viz = store.get_visualization("v1").unwrap();
    assert_eq!(viz.overview.total_stages, 1);
    assert_eq!(viz.overview.total_categories, 1);
    assert_eq!(viz.overview.total_token_count, 200.0);
    assert_eq!(viz.category_stats[0].usage_rate, 25.0);
    assert_eq!(viz.stage_stats[0].stage, "SFT");
}
