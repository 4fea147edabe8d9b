//! Unit queries

use common::types::{OwnerId, Pagination};

use crate::domain::entities::Unit;
use crate::domain::enums::{RecordStatus, UnitType};
use crate::domain::value_objects::UnitId;

/// 获取单位查询
#[derive(Debug, Clone)]
pub struct GetUnitQuery {
    pub owner_id: OwnerId,
    pub unit_id: UnitId,
}

/// 单位过滤条件
#[derive(Debug, Clone, Default)]
pub struct UnitFilter {
    /// 匹配单位代码或名称
    pub keyword: Option<String>,
    pub unit_type: Option<UnitType>,
    pub status: Option<RecordStatus>,
}

impl UnitFilter {
    pub fn matches(&self, unit: &Unit) -> bool {
        if self.unit_type.is_some_and(|t| t != unit.unit_type()) {
            return false;
        }
        if self.status.is_some_and(|s| s != unit.status()) {
            return false;
        }
        match self.keyword.as_deref().map(str::trim) {
            Some(keyword) if !keyword.is_empty() => {
                let keyword = keyword.to_lowercase();
                unit.code().to_lowercase().contains(&keyword)
                    || unit.name().to_lowercase().contains(&keyword)
            }
            _ => true,
        }
    }
}

/// 列表单位查询
#[derive(Debug, Clone)]
pub struct ListUnitsQuery {
    pub owner_id: OwnerId,
    pub filter: UnitFilter,
    pub pagination: Pagination,
}
