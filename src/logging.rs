// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 级别: RUST_LOG（默认本库 info，依赖库 warn）
// 格式: DATA_VERSION_MANAGER_LOG_FORMAT=json 时输出 JSON 行
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 默认过滤器
const DEFAULT_FILTER: &str = "warn,data_version_manager=info";

/// 日志格式环境变量
pub const LOG_FORMAT_ENV: &str = "DATA_VERSION_MANAGER_LOG_FORMAT";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// 是否选择 JSON 格式（不区分大小写）
fn wants_json(format: Option<&str>) -> bool {
    format.map_or(false, |f| f.trim().eq_ignore_ascii_case("json"))
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器
///   例如: RUST_LOG=debug 或 RUST_LOG=data_version_manager::repository=trace
/// - DATA_VERSION_MANAGER_LOG_FORMAT: `json` 输出结构化日志，其他值为文本
///
/// # 示例
/// ```no_run
/// use data_version_manager::logging;
/// logging::init();
/// ```
pub fn init() {
    let format = std::env::var(LOG_FORMAT_ENV).ok();
    if wants_json(format.as_deref()) {
        init_json();
        return;
    }
    let _ = fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .try_init();
}

/// 初始化 JSON 格式日志（含当前 span 字段，如 plan / stage）
pub fn init_json() {
    let _ = fmt()
        .json()
        .with_env_filter(env_filter())
        .with_current_span(true)
        .try_init();
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_selection() {
        assert!(wants_json(Some("JSON")));
        assert!(wants_json(Some(" json ")));
        assert!(!wants_json(Some("text")));
        assert!(!wants_json(None));
    }
}
