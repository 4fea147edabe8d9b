//! Conversion commands

use common::types::Principal;

use crate::domain::entities::NewUnitConversion;
use crate::domain::enums::{ConversionDirection, RecordStatus, Visibility};
use crate::domain::value_objects::{ConversionId, ConversionRate, MaterialId, Precision, UnitId};
use crate::error::{UomError, UomResult};

/// 创建换算关系命令
#[derive(Debug, Clone)]
pub struct CreateConversionCommand {
    pub principal: Principal,
    pub from_unit_id: UnitId,
    pub to_unit_id: UnitId,
    pub rate: ConversionRate,
    pub material_id: Option<MaterialId>,
    pub direction: ConversionDirection,
    /// 缺省时使用配置的默认精度
    pub precision: Option<Precision>,
    pub status: RecordStatus,
    pub visibility: Visibility,
}

impl CreateConversionCommand {
    pub fn into_draft(self, default_precision: Precision) -> UomResult<NewUnitConversion> {
        let draft = NewUnitConversion::new(
            self.principal.owner_id(),
            self.from_unit_id,
            self.to_unit_id,
            self.rate,
        )
        .map_err(|e| UomError::invalid_input(e.to_string()))?
        .with_material(self.material_id)
        .with_direction(self.direction)
        .with_precision(self.precision.unwrap_or(default_precision))
        .with_status(self.status)
        .with_visibility(self.visibility)
        .created_by(self.principal.user_id);
        Ok(draft)
    }
}

/// 更新换算关系命令
///
/// 单位对与物料范围不可修改，需删除后重建
#[derive(Debug, Clone)]
pub struct UpdateConversionCommand {
    pub principal: Principal,
    pub conversion_id: ConversionId,
    pub rate: Option<ConversionRate>,
    pub direction: Option<ConversionDirection>,
    pub precision: Option<Precision>,
    pub status: Option<RecordStatus>,
    pub visibility: Option<Visibility>,
}

impl UpdateConversionCommand {
    pub fn validate(&self) -> UomResult<()> {
        let nothing = self.rate.is_none()
            && self.direction.is_none()
            && self.precision.is_none()
            && self.status.is_none()
            && self.visibility.is_none();
        if nothing {
            return Err(UomError::invalid_input("没有需要更新的字段"));
        }
        Ok(())
    }

    /// 是否改动了参与构图的字段
    pub fn touches_graph(&self) -> bool {
        self.rate.is_some() || self.direction.is_some() || self.status.is_some()
    }
}

/// 删除换算关系命令
#[derive(Debug, Clone)]
pub struct DeleteConversionCommand {
    pub principal: Principal,
    pub conversion_id: ConversionId,
}

/// 批量删除换算关系命令
#[derive(Debug, Clone)]
pub struct BatchDeleteConversionsCommand {
    pub principal: Principal,
    pub conversion_ids: Vec<ConversionId>,
}

impl BatchDeleteConversionsCommand {
    pub fn validate(&self) -> UomResult<()> {
        if self.conversion_ids.is_empty() {
            return Err(UomError::invalid_input("请选择要删除的换算关系"));
        }
        Ok(())
    }

    /// 去重后的 ID 列表（保持原顺序）
    pub fn unique_ids(&self) -> Vec<ConversionId> {
        let mut seen = std::collections::HashSet::new();
        self.conversion_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::UserId;

    fn create(from: i64, to: i64) -> CreateConversionCommand {
        CreateConversionCommand {
            principal: Principal::child(UserId(12), UserId(3)),
            from_unit_id: UnitId(from),
            to_unit_id: UnitId(to),
            rate: ConversionRate::new(12.0).unwrap(),
            material_id: None,
            direction: ConversionDirection::Both,
            precision: None,
            status: RecordStatus::Active,
            visibility: Visibility::Private,
        }
    }

    #[test]
    fn test_draft_uses_master_owner_and_default_precision() {
        let draft = create(1, 2).into_draft(Precision::new(3).unwrap()).unwrap();
        assert_eq!(draft.owner_id.value(), 3);
        assert_eq!(draft.created_by, Some(UserId(12)));
        assert_eq!(draft.precision.places(), 3);
    }

    #[test]
    fn test_draft_rejects_same_unit() {
        assert!(matches!(
            create(4, 4).into_draft(Precision::DEFAULT),
            Err(UomError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_empty_update_rejected() {
        let cmd = UpdateConversionCommand {
            principal: Principal::master(UserId(1)),
            conversion_id: ConversionId(1),
            rate: None,
            direction: None,
            precision: None,
            status: None,
            visibility: None,
        };
        assert!(cmd.validate().is_err());
        assert!(!cmd.touches_graph());
    }

    #[test]
    fn test_batch_ids_deduplicated() {
        let cmd = BatchDeleteConversionsCommand {
            principal: Principal::master(UserId(1)),
            conversion_ids: vec![ConversionId(3), ConversionId(1), ConversionId(3)],
        };
        assert_eq!(cmd.unique_ids(), vec![ConversionId(3), ConversionId(1)]);
    }
}
