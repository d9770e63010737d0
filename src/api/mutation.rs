// ==========================================
// 数据版本管理系统 - 两阶段变更
// ==========================================
// 流程: 权限校验 → 快照 → 本地应用 → 持久化 → 失败时恢复快照
// 约束: 校验失败或持久化失败后，调用方持有的状态与调用前一致
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::session::SessionContext;

/// 校验会话具备编辑权限
pub fn require_admin(session: &SessionContext, action: &str) -> ApiResult<()> {
    if session.can_edit() {
        return Ok(());
    }
    tracing::warn!(
        "拒绝非管理员操作: user={}, session={}, action={}",
        session.username,
        session.session_id,
        action
    );
    Err(ApiError::PermissionDenied(format!(
        "用户 {} 无权执行: {}",
        session.username, action
    )))
}

/// 两阶段变更
///
/// # 参数
/// - `state`: 调用方持有的本地状态
/// - `apply`: 本地修改（返回值作为结果）
/// - `persist`: 持久化（可读取本地修改结果，可回写存储返回的派生值，如合计）
///
/// # 返回
/// - `Ok(T)`: 修改已应用且已持久化
/// - `Err(ApiError)`: `state` 已恢复为调用前快照
pub fn apply_and_persist<S, T, A, P>(state: &mut S, apply: A, persist: P) -> ApiResult<T>
where
    S: Clone,
    A: FnOnce(&mut S) -> ApiResult<T>,
    P: FnOnce(&mut S, &T) -> ApiResult<()>,
{
    let snapshot = state.clone();

    let outcome = match apply(state) {
        Ok(outcome) => outcome,
        Err(e) => {
            *state = snapshot;
            return Err(e);
        }
    };

    if let Err(e) = persist(state, &outcome) {
        tracing::warn!("持久化失败，已回滚本地修改: {}", e);
        *state = snapshot;
        return Err(e);
    }

    Ok(outcome)
}
