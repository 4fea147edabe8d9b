//! 请求 DTO
//!
//! 边界处完成反序列化与取值校验，之后只流转强类型命令

use common::types::{Pagination, Principal};
use serde::Deserialize;

use super::commands::*;
use crate::domain::enums::{ConversionDirection, RecordStatus, UnitType, Visibility};
use crate::domain::value_objects::{ConversionId, ConversionRate, MaterialId, Precision, UnitId};
use crate::error::{UomError, UomResult};

fn parse_rate(rate: f64) -> UomResult<ConversionRate> {
    ConversionRate::new(rate).map_err(|e| UomError::invalid_input(e.to_string()))
}

fn parse_precision(precision: Option<i64>) -> UomResult<Option<Precision>> {
    precision
        .map(Precision::new)
        .transpose()
        .map_err(|e| UomError::invalid_input(e.to_string()))
}

/// 解析分页参数，非法值回落到默认
pub fn parse_pagination(page: i64, page_size: i64) -> Pagination {
    let page = if page < 1 { 1 } else { page.min(i64::from(u32::MAX)) as u32 };
    let page_size = if page_size < 1 {
        20
    } else {
        page_size.min(200) as u32
    };
    Pagination::new(page, page_size)
}

/// 创建换算关系请求
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateConversionRequest {
    pub from_unit_id: i64,
    pub to_unit_id: i64,
    pub conversion_rate: f64,
    #[serde(default)]
    pub material_id: Option<i64>,
    #[serde(default)]
    pub direction: ConversionDirection,
    #[serde(default)]
    pub precision: Option<i64>,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default)]
    pub visibility: Visibility,
}

impl CreateConversionRequest {
    pub fn into_command(self, principal: Principal) -> UomResult<CreateConversionCommand> {
        if self.from_unit_id == self.to_unit_id {
            return Err(UomError::invalid_input("源单位和目标单位不能相同"));
        }
        Ok(CreateConversionCommand {
            principal,
            from_unit_id: UnitId(self.from_unit_id),
            to_unit_id: UnitId(self.to_unit_id),
            rate: parse_rate(self.conversion_rate)?,
            material_id: self.material_id.map(MaterialId),
            direction: self.direction,
            precision: parse_precision(self.precision)?,
            status: self.status,
            visibility: self.visibility,
        })
    }
}

/// 更新换算关系请求
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateConversionRequest {
    #[serde(default)]
    pub conversion_rate: Option<f64>,
    #[serde(default)]
    pub direction: Option<ConversionDirection>,
    #[serde(default)]
    pub precision: Option<i64>,
    #[serde(default)]
    pub status: Option<RecordStatus>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

impl UpdateConversionRequest {
    pub fn into_command(
        self,
        principal: Principal,
        conversion_id: ConversionId,
    ) -> UomResult<UpdateConversionCommand> {
        let cmd = UpdateConversionCommand {
            principal,
            conversion_id,
            rate: self.conversion_rate.map(parse_rate).transpose()?,
            direction: self.direction,
            precision: parse_precision(self.precision)?,
            status: self.status,
            visibility: self.visibility,
        };
        cmd.validate()?;
        Ok(cmd)
    }
}

/// 批量删除换算关系请求
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchDeleteRequest {
    pub conversion_ids: Vec<i64>,
}

impl BatchDeleteRequest {
    pub fn into_command(self, principal: Principal) -> UomResult<BatchDeleteConversionsCommand> {
        let cmd = BatchDeleteConversionsCommand {
            principal,
            conversion_ids: self.conversion_ids.into_iter().map(ConversionId).collect(),
        };
        cmd.validate()?;
        Ok(cmd)
    }
}

/// 创建单位请求
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUnitRequest {
    pub unit_code: String,
    pub unit_name: String,
    #[serde(default)]
    pub unit_type: UnitType,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateUnitRequest {
    pub fn into_command(self, principal: Principal) -> CreateUnitCommand {
        CreateUnitCommand {
            principal,
            unit_code: self.unit_code,
            unit_name: self.unit_name,
            unit_type: self.unit_type,
            description: self.description,
        }
    }
}

/// 更新单位请求
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUnitRequest {
    #[serde(default)]
    pub unit_code: Option<String>,
    #[serde(default)]
    pub unit_name: Option<String>,
    #[serde(default)]
    pub unit_type: Option<UnitType>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<RecordStatus>,
}

impl UpdateUnitRequest {
    pub fn into_command(self, principal: Principal, unit_id: UnitId) -> UomResult<UpdateUnitCommand> {
        let cmd = UpdateUnitCommand {
            principal,
            unit_id,
            unit_code: self.unit_code,
            unit_name: self.unit_name,
            unit_type: self.unit_type,
            description: self.description,
            status: self.status,
        };
        cmd.validate()?;
        Ok(cmd)
    }
}
