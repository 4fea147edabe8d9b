//! 可见性枚举

use serde::{Deserialize, Serialize};

/// 换算关系对子账号以外用户的可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}
