//! 换算方向枚举

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 换算方向
///
/// - `Both`: 存储一条，遍历时自动推导倒数反向边
/// - `Forward`: 仅 from → to
/// - `Reverse`: 仅 to → from，且存储的换算率已描述该方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConversionDirection {
    #[default]
    Both,
    Forward,
    Reverse,
}

impl ConversionDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Both => "both",
            Self::Forward => "forward",
            Self::Reverse => "reverse",
        }
    }
}

impl FromStr for ConversionDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "both" => Ok(Self::Both),
            "forward" => Ok(Self::Forward),
            "reverse" => Ok(Self::Reverse),
            other => Err(format!("未知的换算方向: {}", other)),
        }
    }
}
