// ==========================================
// 数据版本管理系统 - 计划列表变更通知
// ==========================================
// 职责: 定义计划列表观察者 trait，由外壳（界面/服务）注册实现
// 说明: API 层在计划创建/更新/删除成功后通知全部已注册观察者
// ==========================================

use crate::domain::plan::PlanSummary;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

// ==========================================
// 变更类型
// ==========================================

/// 计划列表变更（携带计划键）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "planKey")]
pub enum PlanListChange {
    Created(String),
    Updated(String),
    Deleted(String),
}

impl PlanListChange {
    pub fn as_str(&self) -> &str {
        match self {
            PlanListChange::Created(_) => "Created",
            PlanListChange::Updated(_) => "Updated",
            PlanListChange::Deleted(_) => "Deleted",
        }
    }

    pub fn plan_key(&self) -> &str {
        match self {
            PlanListChange::Created(key)
            | PlanListChange::Updated(key)
            | PlanListChange::Deleted(key) => key,
        }
    }
}

// ==========================================
// 观察者 Trait
// ==========================================

/// 计划列表观察者
///
/// # 参数
/// - `change`: 本次变更
/// - `plans`: 变更后的完整计划列表
pub trait PlanListObserver: Send + Sync {
    fn on_plan_list_changed(&self, change: &PlanListChange, plans: &[PlanSummary]);
}

/// 空操作观察者（单元测试等不需要通知的场景）
#[derive(Debug, Clone, Default)]
pub struct NoOpPlanListObserver;

impl PlanListObserver for NoOpPlanListObserver {
    fn on_plan_list_changed(&self, change: &PlanListChange, plans: &[PlanSummary]) {
        tracing::debug!(
            "NoOpPlanListObserver: 跳过通知 - change={}, plan={}, plans={}",
            change.as_str(),
            change.plan_key(),
            plans.len()
        );
    }
}

// ==========================================
// 观察者注册表
// ==========================================
#[derive(Default)]
pub struct PlanListObservers {
    inner: RwLock<Vec<Arc<dyn PlanListObserver>>>,
}

impl PlanListObservers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, observer: Arc<dyn PlanListObserver>) {
        match self.inner.write() {
            Ok(mut observers) => observers.push(observer),
            Err(e) => tracing::warn!("观察者注册失败: {}", e),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 通知全部观察者
    pub fn notify(&self, change: &PlanListChange, plans: &[PlanSummary]) {
        let observers = match self.inner.read() {
            Ok(observers) => observers.clone(),
            Err(e) => {
                tracing::warn!("观察者列表不可用，跳过通知: {}", e);
                return;
            }
        };
        tracing::debug!(
            "计划列表变更通知: change={}, plan={}, observers={}",
            change.as_str(),
            change.plan_key(),
            observers.len()
        );
        for observer in observers {
            observer.on_plan_list_changed(change, plans);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        changes: Mutex<Vec<PlanListChange>>,
    }

    impl PlanListObserver for Recorder {
        fn on_plan_list_changed(&self, change: &PlanListChange, _plans: &[PlanSummary]) {
            self.changes.lock().unwrap().push(change.clone());
        }
    }

    #[test]
    fn test_notify_reaches_every_observer() {
        let observers = PlanListObservers::new();
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        observers.register(first.clone());
        observers.register(second.clone());
        observers.register(Arc::new(NoOpPlanListObserver));
        assert_eq!(observers.len(), 3);

        observers.notify(&PlanListChange::Created("v1".to_string()), &[]);
        assert_eq!(
            *first.changes.lock().unwrap(),
            vec![PlanListChange::Created("v1".to_string())]
        );
        assert_eq!(second.changes.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_change_serialization() {
        let json = serde_json::to_string(&PlanListChange::Deleted("v2".to_string())).unwrap();
        assert_eq!(json, r#"{"kind":"Deleted","planKey":"v2"}"#);
    }
}
