// ==========================================
// 数据版本管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{CategoryApi, DatasetApi, PlanApi, VisualizationApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::keygen::KeyGenerator;
use crate::repository::{InventoryStore, SqliteInventoryStore};

/// 应用状态
///
/// 包含所有API实例和共享资源，由外壳持有
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 行键/节点ID生成器（全部 API 共享）
    pub key_generator: Arc<KeyGenerator>,

    /// 清单存储
    pub store: Arc<dyn InventoryStore>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 训练计划API
    pub plan_api: Arc<PlanApi>,

    /// 类别树API
    pub category_api: Arc<CategoryApi>,

    /// 子类别数据表API
    pub dataset_api: Arc<DatasetApi>,

    /// 可视化API
    pub visualization_api: Arc<VisualizationApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享连接并建表
    /// 2. 初始化存储与配置管理器
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化存储与配置
        // ==========================================
        let store: Arc<dyn InventoryStore> = Arc::new(SqliteInventoryStore::new(conn.clone()));
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let state = Self::with_store(db_path, store, config_manager);
        tracing::info!("AppState初始化完成");
        Ok(state)
    }

    /// 由已有存储组装（测试或替换存储实现时使用）
    pub fn with_store(
        db_path: String,
        store: Arc<dyn InventoryStore>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        let key_generator = Arc::new(KeyGenerator::new());

        // ==========================================
        // 初始化API层
        // ==========================================
        let plan_api = Arc::new(PlanApi::new(
            store.clone(),
            config_manager.clone(),
            key_generator.clone(),
        ));
        let category_api = Arc::new(CategoryApi::new(store.clone(), key_generator.clone()));
        let dataset_api = Arc::new(DatasetApi::new(
            store.clone(),
            config_manager.clone(),
            key_generator.clone(),
        ));
        let visualization_api = Arc::new(VisualizationApi::new(store.clone()));

        Self {
            db_path,
            key_generator,
            store,
            config_manager,
            plan_api,
            category_api,
            dataset_api,
            visualization_api,
        }
    }
}

/// 获取默认数据库路径
///
/// 优先使用环境变量 DATA_VERSION_MANAGER_DB_PATH，其次为用户数据目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("DATA_VERSION_MANAGER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./data_version_manager.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染正式数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("data-version-manager-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("data-version-manager");
        }

        // 确保目录存在
        std::fs::create_dir_all(&path).ok();
        path = path.join("data_version_manager.db");
    }

    path.to_string_lossy().to_string()
}
