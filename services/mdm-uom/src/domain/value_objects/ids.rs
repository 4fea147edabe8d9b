//! 强类型 ID 定义
//!
//! 与存储层的自增主键一一对应

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

macro_rules! int_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            Display, From,
        )]
        #[display("{_0}")]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

int_id!(
    /// 计量单位 ID
    UnitId
);

int_id!(
    /// 换算关系 ID
    ConversionId
);

int_id!(
    /// 物料 ID
    MaterialId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_order() {
        let a: UnitId = " 12 ".parse().unwrap();
        assert_eq!(a, UnitId(12));
        assert!(ConversionId(3) < ConversionId(10));
        assert!("abc".parse::<MaterialId>().is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&UnitId(5)).unwrap();
        assert_eq!(json, "5");
        let id: ConversionId = serde_json::from_str("77").unwrap();
        assert_eq!(id, ConversionId(77));
    }
}
