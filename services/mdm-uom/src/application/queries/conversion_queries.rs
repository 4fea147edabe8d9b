//! Conversion queries

use common::types::{OwnerId, Pagination};

use crate::domain::enums::RecordStatus;
use crate::domain::value_objects::{ConversionId, MaterialId, UnitId};

/// 获取换算关系查询
#[derive(Debug, Clone)]
pub struct GetConversionQuery {
    pub owner_id: OwnerId,
    pub conversion_id: ConversionId,
}

/// 换算关系过滤条件
#[derive(Debug, Clone, Default)]
pub struct ConversionFilter {
    /// 匹配两端单位的代码或名称
    pub keyword: Option<String>,
    /// 指定物料时同时返回通用换算
    pub material_id: Option<MaterialId>,
    /// 匹配任一端单位
    pub unit_id: Option<UnitId>,
    pub status: Option<RecordStatus>,
}

/// 列表换算关系查询
#[derive(Debug, Clone)]
pub struct ListConversionsQuery {
    pub owner_id: OwnerId,
    pub filter: ConversionFilter,
    pub pagination: Pagination,
}

/// 物料专用换算查询
#[derive(Debug, Clone)]
pub struct MaterialConversionsQuery {
    pub owner_id: OwnerId,
    pub material_id: MaterialId,
}
