//! Unit commands

use common::types::Principal;

use crate::domain::enums::{RecordStatus, UnitType};
use crate::domain::value_objects::UnitId;
use crate::error::{UomError, UomResult};

/// 创建单位命令
#[derive(Debug, Clone)]
pub struct CreateUnitCommand {
    pub principal: Principal,
    pub unit_code: String,
    pub unit_name: String,
    pub unit_type: UnitType,
    pub description: Option<String>,
}

/// 更新单位命令
#[derive(Debug, Clone)]
pub struct UpdateUnitCommand {
    pub principal: Principal,
    pub unit_id: UnitId,
    pub unit_code: Option<String>,
    pub unit_name: Option<String>,
    pub unit_type: Option<UnitType>,
    pub description: Option<String>,
    pub status: Option<RecordStatus>,
}

impl UpdateUnitCommand {
    pub fn validate(&self) -> UomResult<()> {
        let nothing = self.unit_code.is_none()
            && self.unit_name.is_none()
            && self.unit_type.is_none()
            && self.description.is_none()
            && self.status.is_none();
        if nothing {
            return Err(UomError::invalid_input("没有需要更新的字段"));
        }
        Ok(())
    }
}

/// 删除单位命令
#[derive(Debug, Clone)]
pub struct DeleteUnitCommand {
    pub principal: Principal,
    pub unit_id: UnitId,
}
