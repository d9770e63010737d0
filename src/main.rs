// ==========================================
// 数据版本管理系统 - 主入口
// ==========================================
// 职责: 初始化日志与应用状态，输出当前计划清单
// 说明: 界面外壳以库方式持有 AppState
// ==========================================

use data_version_manager::app::{get_default_db_path, AppState};
use data_version_manager::logging;

fn main() {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", data_version_manager::APP_NAME);
    tracing::info!("系统版本: {}", data_version_manager::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let app_state = match AppState::new(db_path) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("无法初始化AppState: {}", e);
            std::process::exit(1);
        }
    };

    match app_state.plan_api.list_plans() {
        Ok(plans) => {
            tracing::info!("已有训练计划: {}", plans.len());
            for plan in plans {
                tracing::info!(
                    "  {} ({}) - 阶段数: {}",
                    plan.name,
                    plan.key,
                    plan.stage_count
                );
            }
        }
        Err(e) => tracing::error!("读取计划列表失败: {}", e),
    }
}
