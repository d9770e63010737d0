// ==========================================
// 数据版本管理系统 - 类别树领域模型
// ==========================================
// 层级: Stage → Category → Subcategory → DataRow
// 说明: token 合计为派生值，由聚合引擎计算
// ==========================================

use crate::domain::types::{NodeId, RowKey};
use serde::{Deserialize, Serialize};

/// 合计字符串零值
pub const ZERO_TOTAL: &str = "0.00";

// ==========================================
// TokenTotals - DST/AUT 合计
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenTotals {
    pub token_count_total: String,  // DST: 数据集总token
    pub actual_token_total: String, // AUT: 实际使用token
}

impl Default for TokenTotals {
    fn default() -> Self {
        Self {
            token_count_total: ZERO_TOTAL.to_string(),
            actual_token_total: ZERO_TOTAL.to_string(),
        }
    }
}

impl TokenTotals {
    pub fn new(token_count_total: impl Into<String>, actual_token_total: impl Into<String>) -> Self {
        Self {
            token_count_total: token_count_total.into(),
            actual_token_total: actual_token_total.into(),
        }
    }
}

// ==========================================
// DataRow - 子类别数据集行
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRow {
    pub key: RowKey,
    #[serde(default)]
    pub hdfs_path: String, // v3词表hdfs路径
    #[serde(default)]
    pub obs_fuzzy_path: String, // obs模糊路径
    #[serde(default)]
    pub obs_full_path: String, // obs补全路径
    #[serde(default)]
    pub token_count: String, // 数据集总token
    #[serde(default)]
    pub actual_usage: String, // 实际使用
    #[serde(default)]
    pub actual_token: String, // 实际使用token
}

impl DataRow {
    pub const FIELDS: [&'static str; 6] = [
        "hdfs_path",
        "obs_fuzzy_path",
        "obs_full_path",
        "token_count",
        "actual_usage",
        "actual_token",
    ];

    pub fn empty(key: RowKey) -> Self {
        Self {
            key,
            ..Default::default()
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "hdfs_path" => &self.hdfs_path,
            "obs_fuzzy_path" => &self.obs_fuzzy_path,
            "obs_full_path" => &self.obs_full_path,
            "token_count" => &self.token_count,
            "actual_usage" => &self.actual_usage,
            "actual_token" => &self.actual_token,
            _ => return None,
        };
        Some(value.as_str())
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        let value = match name {
            "hdfs_path" => &mut self.hdfs_path,
            "obs_fuzzy_path" => &mut self.obs_fuzzy_path,
            "obs_full_path" => &mut self.obs_full_path,
            "token_count" => &mut self.token_count,
            "actual_usage" => &mut self.actual_usage,
            "actual_token" => &mut self.actual_token,
            _ => return None,
        };
        Some(value)
    }
}

// ==========================================
// Subcategory - 二级类别
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: NodeId,
    pub name: String, // 在父类别内唯一
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rows: Vec<DataRow>,
    #[serde(flatten, default)]
    pub totals: TokenTotals,
}

impl Subcategory {
    /// 创建空子类别（无数据行，合计为零）
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            rows: Vec::new(),
            totals: TokenTotals::default(),
        }
    }

    pub fn row(&self, key: RowKey) -> Option<&DataRow> {
        self.rows.iter().find(|r| r.key == key)
    }
}

// ==========================================
// Category - 一级类别
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: NodeId,
    pub name: String, // 在阶段内唯一
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
    #[serde(flatten, default)]
    pub totals: TokenTotals,
}

impl Category {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            subcategories: Vec::new(),
            totals: TokenTotals::default(),
        }
    }

    pub fn subcategory(&self, id: NodeId) -> Option<&Subcategory> {
        self.subcategories.iter().find(|s| s.id == id)
    }

    pub fn subcategory_mut(&mut self, id: NodeId) -> Option<&mut Subcategory> {
        self.subcategories.iter_mut().find(|s| s.id == id)
    }

    pub fn subcategory_by_name(&self, name: &str) -> Option<&Subcategory> {
        self.subcategories.iter().find(|s| s.name == name)
    }

    pub fn subcategory_by_name_mut(&mut self, name: &str) -> Option<&mut Subcategory> {
        self.subcategories.iter_mut().find(|s| s.name == name)
    }
}

// ==========================================
// StageCategories - 阶段类别树
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCategories {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl StageCategories {
    pub fn category(&self, id: NodeId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn category_mut(&mut self, id: NodeId) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.id == id)
    }

    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn category_by_name_mut(&mut self, name: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.name == name)
    }
}

// ==========================================
// 数据页与删除结果
// ==========================================
/// 子类别数据分页结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcategoryPage {
    pub description: String,
    pub rows: Vec<DataRow>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    #[serde(flatten)]
    pub totals: TokenTotals,
}

/// 删除数据行结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowDeletion {
    pub total: usize,
    #[serde(flatten)]
    pub totals: TokenTotals,
}

/// 数据行变更后的合计刷新结果（子类别及其祖先）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsRefresh {
    pub subcategory: TokenTotals,
    pub category: TokenTotals,
    pub stage: TokenTotals,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subcategory_wire_format_flattens_totals() {
        let mut sub = Subcategory::new(11, "S1");
        sub.totals = TokenTotals::new("100.00", "50.00");
        let value = serde_json::to_value(&sub).unwrap();
        assert_eq!(value["tokenCountTotal"], "100.00");
        assert_eq!(value["actualTokenTotal"], "50.00");
        assert_eq!(value["name"], "S1");
    }

    #[test]
    fn test_category_deserialize_without_totals() {
        let json = r#"{"id": 1, "name": "C1", "subcategories": [{"id": 2, "name": "S1"}]}"#;
        let category: Category = serde_json::from_str(json).unwrap();
        assert_eq!(category.totals, TokenTotals::default());
        assert_eq!(category.subcategories[0].totals.token_count_total, ZERO_TOTAL);
        assert!(category.subcategories[0].rows.is_empty());
    }
}
