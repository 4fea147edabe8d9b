//! 枚举模块

mod conversion_direction;
mod record_status;
mod unit_type;
mod visibility;

pub use conversion_direction::ConversionDirection;
pub use record_status::RecordStatus;
pub use unit_type::UnitType;
pub use visibility::Visibility;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_wire_names() {
        assert_eq!(
            serde_json::to_string(&ConversionDirection::Reverse).unwrap(),
            "\"reverse\""
        );
        assert_eq!(
            serde_json::from_str::<RecordStatus>("\"inactive\"").unwrap(),
            RecordStatus::Inactive
        );
        assert_eq!(
            serde_json::from_str::<Visibility>("\"public\"").unwrap(),
            Visibility::Public
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!(" Both ".parse::<ConversionDirection>(), Ok(ConversionDirection::Both));
        assert_eq!("SUB".parse::<UnitType>(), Ok(UnitType::Sub));
        assert!("sideways".parse::<ConversionDirection>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(ConversionDirection::default(), ConversionDirection::Both);
        assert!(RecordStatus::default().is_active());
        assert_eq!(Visibility::default(), Visibility::Private);
    }
}
