// ==========================================
// 数据版本管理系统 - 会话上下文
// ==========================================
// 会话身份与权限以显式参数传入 API 层，不依赖全局状态
// ==========================================

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: Uuid,
    pub username: String,
    pub is_admin: bool,
}

impl SessionContext {
    pub fn new(username: impl Into<String>, is_admin: bool) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            username: username.into(),
            is_admin,
        }
    }

    /// 管理员会话（可编辑）
    pub fn admin(username: impl Into<String>) -> Self {
        Self::new(username, true)
    }

    /// 只读会话
    pub fn viewer(username: impl Into<String>) -> Self {
        Self::new(username, false)
    }

    pub fn can_edit(&self) -> bool {
        self.is_admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_roles() {
        let admin = SessionContext::admin("alice");
        let viewer = SessionContext::viewer("bob");
        assert!(admin.can_edit());
        assert!(!viewer.can_edit());
        assert_ne!(admin.session_id, viewer.session_id);
    }
}
