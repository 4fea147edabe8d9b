//! 数量值对象

use serde::{Deserialize, Serialize};

/// 小数位上限
pub const MAX_DECIMAL_PLACES: u8 = 10;

/// 数量值对象
///
/// `unit` 由各 bounded context 自行决定（单位 ID、单位编码等）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity<U> {
    pub value: f64,
    pub unit: U,
}

impl<U> Quantity<U> {
    pub fn new(value: f64, unit: U) -> Self {
        Self { value, unit }
    }

    /// 按换算因子换算到另一单位，并保留 `decimal_places` 位小数
    pub fn convert<V>(&self, factor: f64, unit: V, decimal_places: u8) -> Quantity<V> {
        Quantity::new(round_to(self.value * factor, decimal_places), unit)
    }
}

/// 四舍五入（远离零）到指定小数位
pub fn round_to(value: f64, decimal_places: u8) -> f64 {
    let places = decimal_places.min(MAX_DECIMAL_PLACES);
    let factor = 10f64.powi(i32::from(places));
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1.235, 0), 1.0);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(1.0 / 3.0, 4), 0.3333);
    }

    #[test]
    fn test_convert_keeps_precision() {
        let boxes = Quantity::new(3.0, "BOX");
        let pieces = boxes.convert(12.0, "PC", 0);
        assert_eq!(pieces, Quantity::new(36.0, "PC"));

        let back = pieces.convert(1.0 / 12.0, "BOX", 3);
        assert_eq!(back.value, 3.0);
    }
}
