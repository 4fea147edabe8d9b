//! JSON 快照加载
//!
//! 文档格式：`{ "units": [...], "conversions": [...] }`

use std::collections::BTreeSet;
use std::path::Path;

use common::OwnerId;
use domain_core::{Entity, OwnedEntity};
use errors::{AppError, AppResult};
use serde::Deserialize;
use tracing::info;

use super::memory::{InMemoryConversionRepository, InMemoryUnitRepository};
use crate::domain::entities::{Unit, UnitConversion};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub conversions: Vec<UnitConversion>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> AppResult<Self> {
        let snapshot: Self = serde_json::from_str(json)
            .map_err(|e| AppError::validation(format!("快照格式错误: {}", e)))?;
        if let Some(c) = snapshot
            .conversions
            .iter()
            .find(|c| c.from_unit_id() == c.to_unit_id())
        {
            return Err(AppError::validation(format!(
                "换算关系 {} 的源单位和目标单位相同",
                c.id()
            )));
        }
        Ok(snapshot)
    }

    pub async fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::storage(format!("读取快照 {} 失败: {}", path.display(), e)))?;
        let snapshot = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            units = snapshot.units.len(),
            conversions = snapshot.conversions.len(),
            "Snapshot loaded"
        );
        Ok(snapshot)
    }

    /// 快照中出现的全部所有者
    pub fn owners(&self) -> BTreeSet<OwnerId> {
        self.units
            .iter()
            .map(|u| u.owner_id())
            .chain(self.conversions.iter().map(|c| c.owner_id()))
            .collect()
    }

    pub fn into_repositories(self) -> AppResult<(InMemoryUnitRepository, InMemoryConversionRepository)> {
        Ok((
            InMemoryUnitRepository::with_units(self.units)?,
            InMemoryConversionRepository::with_conversions(self.conversions)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::NewUnit;
    use crate::domain::enums::UnitType;
    use crate::domain::repositories::{ConversionRepository, UnitRepository};
    use crate::domain::value_objects::UnitId;

    const DOC: &str = r#"{
        "units": [
            {"id": 1, "owner_id": 7, "unit_code": "PC", "unit_name": "个"},
            {"id": 2, "owner_id": 7, "unit_code": "BOX", "unit_name": "箱", "unit_type": "sub"},
            {"id": 3, "owner_id": 8, "unit_code": "KG", "unit_name": "千克"}
        ],
        "conversions": [
            {"id": 10, "owner_id": 7, "from_unit_id": 2, "to_unit_id": 1, "conversion_rate": 12}
        ]
    }"#;

    #[tokio::test]
    async fn test_snapshot_into_repositories() {
        let snapshot = Snapshot::from_json(DOC).unwrap();
        assert_eq!(snapshot.owners().into_iter().collect::<Vec<_>>(), vec![OwnerId(7), OwnerId(8)]);

        let (units, conversions) = snapshot.into_repositories().unwrap();
        assert_eq!(units.list_by_owner(OwnerId(7)).await.unwrap().len(), 2);
        assert!(conversions.references_unit(OwnerId(7), UnitId(1)).await.unwrap());

        // 新记录的 ID 接在快照之后
        let draft = NewUnit::new(OwnerId(7), "CTN", "纸箱", UnitType::Sub).unwrap();
        let unit = units.insert(draft).await.unwrap();
        assert_eq!(*unit.id(), UnitId(4));
    }

    #[test]
    fn test_duplicate_slot_rejected() {
        let doc = r#"{"conversions": [
            {"id": 1, "owner_id": 7, "from_unit_id": 1, "to_unit_id": 2, "conversion_rate": 2},
            {"id": 2, "owner_id": 7, "from_unit_id": 2, "to_unit_id": 1, "conversion_rate": 0.5}
        ]}"#;
        let snapshot = Snapshot::from_json(doc).unwrap();
        assert!(matches!(snapshot.into_repositories(), Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_malformed_snapshot() {
        assert!(matches!(
            Snapshot::from_json(r#"{"conversions": [{"id": 1}]}"#),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_self_conversion_rejected() {
        let doc = r#"{"conversions": [
            {"id": 1, "owner_id": 7, "from_unit_id": 3, "to_unit_id": 3, "conversion_rate": 1}
        ]}"#;
        assert!(matches!(Snapshot::from_json(doc), Err(AppError::Validation(_))));
    }
}
