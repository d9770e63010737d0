// ==========================================
// 数据版本管理系统 - 行键生成器
// ==========================================
// 以毫秒时间戳为种子的单调计数器
// 约束: 同一生成器产出的键严格递增，同一毫秒内连续调用也不重复
// 约束: 外部行键不得超过 MAX_ROW_KEY，保证计数器始终可以继续前进
// ==========================================

use crate::domain::types::RowKey;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// 可接受的最大外部行键（为后续生成保留 u32::MAX 个键的余量）
pub const MAX_ROW_KEY: RowKey = RowKey::MAX - u32::MAX as RowKey;

#[derive(Debug)]
pub struct KeyGenerator {
    last: AtomicI64,
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self::with_seed(Utc::now().timestamp_millis() - 1)
    }

    /// 指定种子（下一个键至少为 seed + 1）
    pub fn with_seed(seed: RowKey) -> Self {
        Self {
            last: AtomicI64::new(seed),
        }
    }

    /// 生成下一个行键: max(上一个 + 1, 当前毫秒)
    pub fn next_key(&self) -> RowKey {
        let now = Utc::now().timestamp_millis();
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = current.saturating_add(1).max(now);
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => current = actual,
            }
        }
    }

    /// 批量生成
    pub fn next_keys(&self, count: usize) -> Vec<RowKey> {
        (0..count).map(|_| self.next_key()).collect()
    }

    /// 确保后续生成的键大于已有键（加载持久化数据后调用）
    ///
    /// # 返回
    /// - false: key 超过 MAX_ROW_KEY，计数器保持不变
    pub fn observe(&self, key: RowKey) -> bool {
        if key > MAX_ROW_KEY {
            return false;
        }
        self.last.fetch_max(key, Ordering::SeqCst);
        true
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_unique_in_tight_loop() {
        let generator = KeyGenerator::new();
        let keys = generator.next_keys(10_000);
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_observe_moves_counter_forward() {
        let generator = KeyGenerator::with_seed(0);
        let far_future = Utc::now().timestamp_millis() + 1_000_000;
        assert!(generator.observe(far_future));
        assert_eq!(generator.next_key(), far_future + 1);
    }

    #[test]
    fn test_observe_rejects_keys_without_headroom() {
        let generator = KeyGenerator::with_seed(0);
        assert!(!generator.observe(RowKey::MAX));
        assert!(!generator.observe(MAX_ROW_KEY + 1));

        let first = generator.next_key();
        let second = generator.next_key();
        assert!(first < second);
        assert!(second < MAX_ROW_KEY);
    }

    #[test]
    fn test_keys_keep_increasing_at_ceiling() {
        let generator = KeyGenerator::with_seed(0);
        assert!(generator.observe(MAX_ROW_KEY));
        let keys = generator.next_keys(3);
        assert_eq!(keys, vec![MAX_ROW_KEY + 1, MAX_ROW_KEY + 2, MAX_ROW_KEY + 3]);
    }
}
