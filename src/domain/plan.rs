// ==========================================
// 数据版本管理系统 - 计划/阶段领域模型
// ==========================================
// 层级: Plan → Stage → (概览表 OverviewRow + 合并区域)
// 说明: 概览表所有字段均为自由文本，本层不做数值解析
// ==========================================

use crate::domain::types::{MergeRegion, RowKey};
use serde::{Deserialize, Serialize};

/// 计划显示名后缀
pub const PLAN_NAME_SUFFIX: &str = "训练计划";

// ==========================================
// PlanSummary - 计划列表项
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub key: String,         // 计划键（小写，创建后不可变）
    pub name: String,        // 显示名称
    pub description: String, // 计划说明
    pub stage_count: usize,  // 阶段数（派生）
}

/// 规范化计划名称（存储使用大写）
pub fn normalize_plan_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// 计划键（小写）
pub fn plan_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// 计划显示名称
pub fn plan_display_name(name: &str) -> String {
    format!("{} {}", normalize_plan_name(name), PLAN_NAME_SUFFIX)
}

/// 规范化阶段键（小写、去首尾空白）
pub fn normalize_stage_key(name: &str) -> String {
    name.trim().to_lowercase()
}

// ==========================================
// OverviewRow - 阶段概览表行（13 列）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewRow {
    pub key: RowKey,
    #[serde(default)]
    pub category: String, // 类别
    #[serde(default)]
    pub subcategory: String, // 子类别
    #[serde(default)]
    pub total_tokens: String, // 总token数
    #[serde(default)]
    pub sample_ratio: String, // 本次采样比例
    #[serde(default)]
    pub cumulative_ratio: String, // 累计比例
    #[serde(default)]
    pub sample_tokens: String, // 本次采样token数
    #[serde(default)]
    pub category_ratio: String, // 本次采样后类别占比
    #[serde(default)]
    pub part1: String,
    #[serde(default)]
    pub part2: String,
    #[serde(default)]
    pub part3: String,
    #[serde(default)]
    pub part4: String,
    #[serde(default)]
    pub part5: String,
    #[serde(default)]
    pub note: String, // 备注
}

impl OverviewRow {
    /// 字段名（列顺序）
    pub const FIELDS: [&'static str; 13] = [
        "category",
        "subcategory",
        "total_tokens",
        "sample_ratio",
        "cumulative_ratio",
        "sample_tokens",
        "category_ratio",
        "part1",
        "part2",
        "part3",
        "part4",
        "part5",
        "note",
    ];

    /// 创建空行
    pub fn empty(key: RowKey) -> Self {
        Self {
            key,
            ..Default::default()
        }
    }

    /// 按字段名读取
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "category" => &self.category,
            "subcategory" => &self.subcategory,
            "total_tokens" => &self.total_tokens,
            "sample_ratio" => &self.sample_ratio,
            "cumulative_ratio" => &self.cumulative_ratio,
            "sample_tokens" => &self.sample_tokens,
            "category_ratio" => &self.category_ratio,
            "part1" => &self.part1,
            "part2" => &self.part2,
            "part3" => &self.part3,
            "part4" => &self.part4,
            "part5" => &self.part5,
            "note" => &self.note,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// 按字段名获取可变引用
    pub fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        let value = match name {
            "category" => &mut self.category,
            "subcategory" => &mut self.subcategory,
            "total_tokens" => &mut self.total_tokens,
            "sample_ratio" => &mut self.sample_ratio,
            "cumulative_ratio" => &mut self.cumulative_ratio,
            "sample_tokens" => &mut self.sample_tokens,
            "category_ratio" => &mut self.category_ratio,
            "part1" => &mut self.part1,
            "part2" => &mut self.part2,
            "part3" => &mut self.part3,
            "part4" => &mut self.part4,
            "part5" => &mut self.part5,
            "note" => &mut self.note,
            _ => return None,
        };
        Some(value)
    }

    /// 所有字段是否均为空白
    pub fn is_blank(&self) -> bool {
        Self::FIELDS
            .iter()
            .all(|f| self.field(f).map_or(true, |v| v.trim().is_empty()))
    }
}

// ==========================================
// StageData - 阶段概览数据
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageData {
    #[serde(default)]
    pub rows: Vec<OverviewRow>,
    #[serde(default)]
    pub merges: Vec<MergeRegion>,
}

/// 阶段（键 + 概览数据）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub key: String,
    #[serde(flatten)]
    pub data: StageData,
}

impl Stage {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            data: StageData::default(),
        }
    }
}

// ==========================================
// PlanDocument - 计划概览文档
// ==========================================
// stages 顺序即显示顺序，键在计划内唯一
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDocument {
    pub plan_key: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stages: Vec<Stage>,
}

impl PlanDocument {
    pub fn new(plan_key: impl Into<String>) -> Self {
        Self {
            plan_key: plan_key.into(),
            ..Default::default()
        }
    }

    pub fn stage(&self, key: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.key == key)
    }

    pub fn stage_mut(&mut self, key: &str) -> Option<&mut Stage> {
        self.stages.iter_mut().find(|s| s.key == key)
    }

    pub fn contains_stage(&self, key: &str) -> bool {
        self.stages.iter().any(|s| s.key == key)
    }

    pub fn stage_keys(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.key.as_str()).collect()
    }

    /// 显示顺序中的最后一个阶段
    pub fn last_stage_key(&self) -> Option<&str> {
        self.stages.last().map(|s| s.key.as_str())
    }
}

// ==========================================
// StageOverview / StageSummary
// ==========================================
/// 单阶段概览（说明 + 概览表）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOverview {
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub data: StageData,
}

/// 阶段列表项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSummary {
    pub id: i64,
    pub name: String,
    pub row_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_name_normalization() {
        assert_eq!(normalize_plan_name(" 72b "), "72B");
        assert_eq!(plan_key("72B"), "72b");
        assert_eq!(plan_display_name("72b"), "72B 训练计划");
        assert_eq!(normalize_stage_key(" Stage1 "), "stage1");
    }

    #[test]
    fn test_overview_row_field_access() {
        let mut row = OverviewRow::empty(7);
        assert!(row.is_blank());
        *row.field_mut("part3").unwrap() = "done".to_string();
        assert_eq!(row.field("part3"), Some("done"));
        assert_eq!(row.field("unknown"), None);
        assert!(!row.is_blank());
    }

    #[test]
    fn test_plan_document_stage_lookup() {
        let mut doc = PlanDocument::new("72b");
        doc.stages.push(Stage::new("stage1"));
        doc.stages.push(Stage::new("stage2"));
        assert!(doc.contains_stage("stage1"));
        assert_eq!(doc.last_stage_key(), Some("stage2"));
        assert_eq!(doc.stage_keys(), vec!["stage1", "stage2"]);
    }
}
