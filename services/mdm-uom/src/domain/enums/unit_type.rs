//! 单位类型枚举

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 单位类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    /// 基本单位
    #[default]
    Basic,
    /// 辅助单位
    Sub,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Sub => "sub",
        }
    }
}

impl FromStr for UnitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "sub" => Ok(Self::Sub),
            other => Err(format!("未知的单位类型: {}", other)),
        }
    }
}
