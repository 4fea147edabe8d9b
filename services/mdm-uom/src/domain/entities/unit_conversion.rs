//! 单位换算关系实体

use common::{AuditInfo, OwnerId, UserId};
use domain_core::{AggregateRoot, Entity, OwnedEntity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::enums::{ConversionDirection, RecordStatus, Visibility};
use crate::domain::value_objects::{ConversionId, ConversionRate, MaterialId, Precision, UnitId};

/// 换算关系错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitConversionError {
    #[error("源单位和目标单位不能相同")]
    SameUnit,
}

/// 无序单位对，`(较小 ID, 较大 ID)`
pub type UnitPair = (UnitId, UnitId);

fn pair_of(a: UnitId, b: UnitId) -> UnitPair {
    if a <= b { (a, b) } else { (b, a) }
}

/// 遍历弧
///
/// 由一条存储的换算关系推导，`1 from = weight × to`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionArc {
    pub from: UnitId,
    pub to: UnitId,
    pub weight: f64,
    pub conversion_id: ConversionId,
    pub precision: Precision,
}

impl ConversionArc {
    /// 按方向推导遍历弧
    ///
    /// `Reverse` 的换算率已描述 to → from 方向，不取倒数
    pub fn derive(
        conversion_id: ConversionId,
        from: UnitId,
        to: UnitId,
        rate: ConversionRate,
        direction: ConversionDirection,
        precision: Precision,
    ) -> Vec<ConversionArc> {
        let arc = |from, to, weight| ConversionArc {
            from,
            to,
            weight,
            conversion_id,
            precision,
        };
        match direction {
            ConversionDirection::Both => vec![
                arc(from, to, rate.value()),
                arc(to, from, rate.reciprocal().value()),
            ],
            ConversionDirection::Forward => vec![arc(from, to, rate.value())],
            ConversionDirection::Reverse => vec![arc(to, from, rate.value())],
        }
    }
}

/// 待创建的换算关系
#[derive(Debug, Clone)]
pub struct NewUnitConversion {
    pub owner_id: OwnerId,
    pub from_unit_id: UnitId,
    pub to_unit_id: UnitId,
    pub rate: ConversionRate,
    pub material_id: Option<MaterialId>,
    pub direction: ConversionDirection,
    pub precision: Precision,
    pub status: RecordStatus,
    pub visibility: Visibility,
    pub created_by: Option<UserId>,
}

impl NewUnitConversion {
    pub fn new(
        owner_id: OwnerId,
        from_unit_id: UnitId,
        to_unit_id: UnitId,
        rate: ConversionRate,
    ) -> Result<Self, UnitConversionError> {
        if from_unit_id == to_unit_id {
            return Err(UnitConversionError::SameUnit);
        }
        Ok(Self {
            owner_id,
            from_unit_id,
            to_unit_id,
            rate,
            material_id: None,
            direction: ConversionDirection::default(),
            precision: Precision::default(),
            status: RecordStatus::Active,
            visibility: Visibility::default(),
            created_by: None,
        })
    }

    pub fn with_material(mut self, material_id: Option<MaterialId>) -> Self {
        self.material_id = material_id;
        self
    }

    pub fn with_direction(mut self, direction: ConversionDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn created_by(mut self, user_id: UserId) -> Self {
        self.created_by = Some(user_id);
        self
    }

    pub fn pair_key(&self) -> UnitPair {
        pair_of(self.from_unit_id, self.to_unit_id)
    }
}

/// 单位换算关系
///
/// 每个所有者下，同一无序单位对 + 同一物料范围（含通用）至多一条
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitConversion {
    id: ConversionId,
    owner_id: OwnerId,
    from_unit_id: UnitId,
    to_unit_id: UnitId,
    #[serde(rename = "conversion_rate")]
    rate: ConversionRate,
    #[serde(default)]
    material_id: Option<MaterialId>,
    #[serde(default)]
    direction: ConversionDirection,
    #[serde(default)]
    precision: Precision,
    #[serde(default)]
    status: RecordStatus,
    #[serde(default)]
    visibility: Visibility,
    #[serde(default)]
    audit_info: AuditInfo,
}

impl UnitConversion {
    /// 由存储层分配 ID 后落成实体
    pub fn from_draft(id: ConversionId, draft: NewUnitConversion) -> Self {
        Self {
            id,
            owner_id: draft.owner_id,
            from_unit_id: draft.from_unit_id,
            to_unit_id: draft.to_unit_id,
            rate: draft.rate,
            material_id: draft.material_id,
            direction: draft.direction,
            precision: draft.precision,
            status: draft.status,
            visibility: draft.visibility,
            audit_info: AuditInfo::new(draft.created_by),
        }
    }

    // ========== Getters ==========

    pub fn from_unit_id(&self) -> UnitId {
        self.from_unit_id
    }

    pub fn to_unit_id(&self) -> UnitId {
        self.to_unit_id
    }

    pub fn rate(&self) -> ConversionRate {
        self.rate
    }

    pub fn material_id(&self) -> Option<MaterialId> {
        self.material_id
    }

    pub fn direction(&self) -> ConversionDirection {
        self.direction
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn status(&self) -> RecordStatus {
        self.status
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_material_specific(&self) -> bool {
        self.material_id.is_some()
    }

    pub fn pair_key(&self) -> UnitPair {
        pair_of(self.from_unit_id, self.to_unit_id)
    }

    /// 是否引用了指定单位
    pub fn involves(&self, unit_id: UnitId) -> bool {
        self.from_unit_id == unit_id || self.to_unit_id == unit_id
    }

    /// 是否可用于指定物料范围：通用换算总是可用，物料换算仅对该物料可用
    pub fn applies_to(&self, material_id: Option<MaterialId>) -> bool {
        match self.material_id {
            None => true,
            Some(own) => material_id == Some(own),
        }
    }

    /// 是否与另一条换算占用同一唯一键（无序单位对 + 物料范围）
    pub fn same_slot(&self, pair: UnitPair, material_id: Option<MaterialId>) -> bool {
        self.pair_key() == pair && self.material_id == material_id
    }

    /// 本换算关系推导出的遍历弧
    pub fn arcs(&self) -> Vec<ConversionArc> {
        ConversionArc::derive(
            self.id,
            self.from_unit_id,
            self.to_unit_id,
            self.rate,
            self.direction,
            self.precision,
        )
    }

    // ========== Mutations ==========

    pub fn update_rate(&mut self, rate: ConversionRate, user_id: Option<UserId>) {
        self.rate = rate;
        self.audit_info.update(user_id);
    }

    pub fn change_direction(&mut self, direction: ConversionDirection, user_id: Option<UserId>) {
        self.direction = direction;
        self.audit_info.update(user_id);
    }

    pub fn change_precision(&mut self, precision: Precision, user_id: Option<UserId>) {
        self.precision = precision;
        self.audit_info.update(user_id);
    }

    pub fn change_visibility(&mut self, visibility: Visibility, user_id: Option<UserId>) {
        self.visibility = visibility;
        self.audit_info.update(user_id);
    }

    pub fn activate(&mut self, user_id: Option<UserId>) {
        if !self.status.is_active() {
            self.status = RecordStatus::Active;
            self.audit_info.update(user_id);
        }
    }

    pub fn deactivate(&mut self, user_id: Option<UserId>) {
        if self.status.is_active() {
            self.status = RecordStatus::Inactive;
            self.audit_info.update(user_id);
        }
    }
}

impl Entity for UnitConversion {
    type Id = ConversionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for UnitConversion {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}

impl OwnedEntity for UnitConversion {
    fn owner_id(&self) -> OwnerId {
        self.owner_id
    }
}
