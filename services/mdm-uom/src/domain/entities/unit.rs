//! 计量单位实体

use common::{AuditInfo, OwnerId, UserId};
use domain_core::{AggregateRoot, Entity, OwnedEntity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::enums::{RecordStatus, UnitType};
use crate::domain::value_objects::UnitId;

const MAX_CODE_LEN: usize = 20;
const MAX_NAME_LEN: usize = 50;

/// 单位校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("单位代码不能为空")]
    EmptyCode,
    #[error("单位代码长度不能超过20个字符")]
    CodeTooLong,
    #[error("单位名称不能为空")]
    EmptyName,
    #[error("单位名称长度不能超过50个字符")]
    NameTooLong,
}

fn normalize_code(code: impl Into<String>) -> Result<String, UnitError> {
    let code = code.into().trim().to_uppercase();
    if code.is_empty() {
        return Err(UnitError::EmptyCode);
    }
    if code.chars().count() > MAX_CODE_LEN {
        return Err(UnitError::CodeTooLong);
    }
    Ok(code)
}

fn normalize_name(name: impl Into<String>) -> Result<String, UnitError> {
    let name = name.into().trim().to_string();
    if name.is_empty() {
        return Err(UnitError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(UnitError::NameTooLong);
    }
    Ok(name)
}

/// 待创建的单位
#[derive(Debug, Clone)]
pub struct NewUnit {
    pub owner_id: OwnerId,
    pub code: String,
    pub name: String,
    pub unit_type: UnitType,
    pub description: Option<String>,
    pub status: RecordStatus,
    pub created_by: Option<UserId>,
}

impl NewUnit {
    pub fn new(
        owner_id: OwnerId,
        code: impl Into<String>,
        name: impl Into<String>,
        unit_type: UnitType,
    ) -> Result<Self, UnitError> {
        Ok(Self {
            owner_id,
            code: normalize_code(code)?,
            name: normalize_name(name)?,
            unit_type,
            description: None,
            status: RecordStatus::Active,
            created_by: None,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = if description.trim().is_empty() {
            None
        } else {
            Some(description)
        };
        self
    }

    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = status;
        self
    }

    pub fn created_by(mut self, user_id: UserId) -> Self {
        self.created_by = Some(user_id);
        self
    }
}

/// 计量单位
///
/// 被换算关系引用后单位代码不可再修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    owner_id: OwnerId,
    #[serde(rename = "unit_code")]
    code: String,
    #[serde(rename = "unit_name")]
    name: String,
    #[serde(default)]
    unit_type: UnitType,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: RecordStatus,
    #[serde(default)]
    audit_info: AuditInfo,
}

impl Unit {
    /// 由存储层分配 ID 后落成实体
    pub fn from_draft(id: UnitId, draft: NewUnit) -> Self {
        Self {
            id,
            owner_id: draft.owner_id,
            code: draft.code,
            name: draft.name,
            unit_type: draft.unit_type,
            description: draft.description,
            status: draft.status,
            audit_info: AuditInfo::new(draft.created_by),
        }
    }

    // ========== Getters ==========

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_type(&self) -> UnitType {
        self.unit_type
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn status(&self) -> RecordStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// 显示标签，如 `箱 (BOX)`
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.code)
    }

    // ========== Mutations ==========

    pub fn rename(&mut self, name: impl Into<String>, user_id: Option<UserId>) -> Result<(), UnitError> {
        self.name = normalize_name(name)?;
        self.audit_info.update(user_id);
        Ok(())
    }

    /// 修改单位代码（调用方负责确认单位未被引用）
    pub fn change_code(&mut self, code: impl Into<String>, user_id: Option<UserId>) -> Result<(), UnitError> {
        self.code = normalize_code(code)?;
        self.audit_info.update(user_id);
        Ok(())
    }

    pub fn change_type(&mut self, unit_type: UnitType, user_id: Option<UserId>) {
        self.unit_type = unit_type;
        self.audit_info.update(user_id);
    }

    pub fn set_description(&mut self, description: Option<String>, user_id: Option<UserId>) {
        self.description = description.filter(|d| !d.trim().is_empty());
        self.audit_info.update(user_id);
    }

    pub fn set_status(&mut self, status: RecordStatus, user_id: Option<UserId>) {
        if self.status != status {
            self.status = status;
            self.audit_info.update(user_id);
        }
    }
}

impl Entity for Unit {
    type Id = UnitId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for Unit {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}

impl OwnedEntity for Unit {
    fn owner_id(&self) -> OwnerId {
        self.owner_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_normalized() {
        let draft = NewUnit::new(OwnerId(1), " box ", "箱", UnitType::Sub).unwrap();
        assert_eq!(draft.code, "BOX");
        let unit = Unit::from_draft(UnitId(3), draft);
        assert_eq!(unit.label(), "箱 (BOX)");
        assert!(unit.is_owned_by(OwnerId(1)));
        assert_eq!(*unit.id(), UnitId(3));
    }

    #[test]
    fn test_invalid_drafts() {
        assert_eq!(
            NewUnit::new(OwnerId(1), "  ", "箱", UnitType::Basic).unwrap_err(),
            UnitError::EmptyCode
        );
        assert_eq!(
            NewUnit::new(OwnerId(1), "X".repeat(21), "箱", UnitType::Basic).unwrap_err(),
            UnitError::CodeTooLong
        );
        assert_eq!(
            NewUnit::new(OwnerId(1), "BOX", "", UnitType::Basic).unwrap_err(),
            UnitError::EmptyName
        );
    }

    #[test]
    fn test_blank_description_dropped() {
        let draft = NewUnit::new(OwnerId(1), "PC", "个", UnitType::Basic)
            .unwrap()
            .with_description("   ");
        assert!(draft.description.is_none());
    }

    #[test]
    fn test_set_status() {
        let mut unit = Unit::from_draft(
            UnitId(1),
            NewUnit::new(OwnerId(1), "KG", "千克", UnitType::Basic).unwrap(),
        );
        unit.set_status(RecordStatus::Inactive, Some(UserId(2)));
        assert!(!unit.is_active());
        assert_eq!(unit.audit_info().updated_by, Some(UserId(2)));
    }
}
