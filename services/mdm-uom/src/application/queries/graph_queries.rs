//! Conversion graph queries

use common::types::OwnerId;

use crate::domain::enums::ConversionDirection;
use crate::domain::value_objects::{ConversionId, MaterialId, UnitId};

/// 换算路径查询
#[derive(Debug, Clone)]
pub struct FindPathQuery {
    pub owner_id: OwnerId,
    pub from_unit_id: UnitId,
    pub to_unit_id: UnitId,
    pub material_id: Option<MaterialId>,
}

/// 环路检查
#[derive(Debug, Clone)]
pub struct CheckCircularQuery {
    pub owner_id: OwnerId,
    pub material_id: Option<MaterialId>,
}

/// 候选换算关系预校验
///
/// 换算率未经校验，非法值作为校验失败返回
#[derive(Debug, Clone)]
pub struct ValidateCandidateQuery {
    pub owner_id: OwnerId,
    pub from_unit_id: UnitId,
    pub to_unit_id: UnitId,
    pub rate: f64,
    pub material_id: Option<MaterialId>,
    pub direction: ConversionDirection,
    /// 更新已有换算关系时排除自身
    pub exclude: Option<ConversionId>,
}

/// 数量换算
#[derive(Debug, Clone)]
pub struct ConvertQuantityQuery {
    pub owner_id: OwnerId,
    pub from_unit_id: UnitId,
    pub to_unit_id: UnitId,
    pub quantity: f64,
    pub material_id: Option<MaterialId>,
}
