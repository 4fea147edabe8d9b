//! 记录状态枚举

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 单位和换算关系的启用状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// 启用
    #[default]
    Active,
    /// 停用
    Inactive,
}

impl RecordStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, RecordStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(format!("未知的状态: {}", other)),
        }
    }
}
