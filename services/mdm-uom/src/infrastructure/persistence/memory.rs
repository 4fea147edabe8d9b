//! 内存存储实现
//!
//! 以 `RwLock` 保护的有序 Map 保存数据，读操作返回克隆快照

use std::collections::BTreeMap;

use async_trait::async_trait;
use common::OwnerId;
use domain_core::{Entity, OwnedEntity};
use errors::{AppError, AppResult};
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::entities::{NewUnit, NewUnitConversion, Unit, UnitConversion, UnitPair};
use crate::domain::repositories::{ConversionRepository, UnitRepository};
use crate::domain::value_objects::{ConversionId, MaterialId, UnitId};

fn same_code(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

// ========== 单位 ==========

#[derive(Debug, Default)]
struct UnitTable {
    last_id: i64,
    rows: BTreeMap<UnitId, Unit>,
}

impl UnitTable {
    fn code_taken(&self, owner_id: OwnerId, code: &str, exclude: Option<UnitId>) -> bool {
        self.rows.values().any(|unit| {
            unit.is_owned_by(owner_id) && same_code(unit.code(), code) && Some(*unit.id()) != exclude
        })
    }
}

/// 内存单位仓储
#[derive(Debug, Default)]
pub struct InMemoryUnitRepository {
    table: RwLock<UnitTable>,
}

impl InMemoryUnitRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用已有数据初始化（ID 与单位代码必须唯一）
    pub fn with_units(units: Vec<Unit>) -> AppResult<Self> {
        let mut table = UnitTable::default();
        for unit in units {
            let id = *unit.id();
            if table.rows.contains_key(&id) {
                return Err(AppError::conflict(format!("单位 ID {} 重复", id)));
            }
            if table.code_taken(unit.owner_id(), unit.code(), None) {
                return Err(AppError::conflict(format!("单位代码 {} 重复", unit.code())));
            }
            table.last_id = table.last_id.max(id.value());
            table.rows.insert(id, unit);
        }
        Ok(Self {
            table: RwLock::new(table),
        })
    }
}

#[async_trait]
impl UnitRepository for InMemoryUnitRepository {
    async fn find_by_id(&self, id: UnitId) -> AppResult<Option<Unit>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_code(&self, owner_id: OwnerId, code: &str) -> AppResult<Option<Unit>> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .find(|unit| unit.is_owned_by(owner_id) && same_code(unit.code(), code))
            .cloned())
    }

    async fn exists_by_code(
        &self,
        owner_id: OwnerId,
        code: &str,
        exclude: Option<UnitId>,
    ) -> AppResult<bool> {
        Ok(self.table.read().await.code_taken(owner_id, code, exclude))
    }

    async fn insert(&self, draft: NewUnit) -> AppResult<Unit> {
        let mut table = self.table.write().await;
        if table.code_taken(draft.owner_id, &draft.code, None) {
            return Err(AppError::conflict(format!("单位代码 {} 已存在", draft.code)));
        }
        table.last_id += 1;
        let unit = Unit::from_draft(UnitId(table.last_id), draft);
        table.rows.insert(*unit.id(), unit.clone());
        debug!(unit_id = %unit.id(), "Unit stored");
        Ok(unit)
    }

    async fn update(&self, unit: &Unit) -> AppResult<()> {
        let mut table = self.table.write().await;
        let id = *unit.id();
        if !table.rows.contains_key(&id) {
            return Err(AppError::not_found(format!("单位 {} 不存在", id)));
        }
        if table.code_taken(unit.owner_id(), unit.code(), Some(id)) {
            return Err(AppError::conflict(format!("单位代码 {} 已存在", unit.code())));
        }
        table.rows.insert(id, unit.clone());
        Ok(())
    }

    async fn delete(&self, id: UnitId) -> AppResult<bool> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }

    async fn list_by_owner(&self, owner_id: OwnerId) -> AppResult<Vec<Unit>> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|unit| unit.is_owned_by(owner_id))
            .cloned()
            .collect())
    }
}

// ========== 换算关系 ==========

#[derive(Debug, Default)]
struct ConversionTable {
    last_id: i64,
    rows: BTreeMap<ConversionId, UnitConversion>,
}

impl ConversionTable {
    /// 占用同一唯一键的启用换算关系
    fn active_in_slot(
        &self,
        owner_id: OwnerId,
        pair: UnitPair,
        material_id: Option<MaterialId>,
        exclude: Option<ConversionId>,
    ) -> Option<ConversionId> {
        self.rows
            .values()
            .find(|c| {
                c.is_owned_by(owner_id)
                    && c.is_active()
                    && c.same_slot(pair, material_id)
                    && Some(*c.id()) != exclude
            })
            .map(|c| *c.id())
    }

    fn check_slot(&self, conversion: &UnitConversion, exclude: Option<ConversionId>) -> AppResult<()> {
        if !conversion.is_active() {
            return Ok(());
        }
        match self.active_in_slot(
            conversion.owner_id(),
            conversion.pair_key(),
            conversion.material_id(),
            exclude,
        ) {
            Some(existing) => Err(AppError::conflict(format!(
                "单位 {} 与单位 {} 之间已存在换算关系 {}",
                conversion.from_unit_id(),
                conversion.to_unit_id(),
                existing
            ))),
            None => Ok(()),
        }
    }
}

/// 内存换算关系仓储
///
/// 同一所有者下，启用的换算关系按无序单位对 + 物料范围唯一
#[derive(Debug, Default)]
pub struct InMemoryConversionRepository {
    table: RwLock<ConversionTable>,
}

impl InMemoryConversionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用已有数据初始化（ID 与唯一键必须不冲突）
    pub fn with_conversions(conversions: Vec<UnitConversion>) -> AppResult<Self> {
        let mut table = ConversionTable::default();
        for conversion in conversions {
            let id = *conversion.id();
            if table.rows.contains_key(&id) {
                return Err(AppError::conflict(format!("换算关系 ID {} 重复", id)));
            }
            table.check_slot(&conversion, None)?;
            table.last_id = table.last_id.max(id.value());
            table.rows.insert(id, conversion);
        }
        Ok(Self {
            table: RwLock::new(table),
        })
    }
}

#[async_trait]
impl ConversionRepository for InMemoryConversionRepository {
    async fn find_by_id(&self, id: ConversionId) -> AppResult<Option<UnitConversion>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[ConversionId]) -> AppResult<Vec<UnitConversion>> {
        let table = self.table.read().await;
        Ok(ids.iter().filter_map(|id| table.rows.get(id).cloned()).collect())
    }

    async fn list_by_owner(&self, owner_id: OwnerId) -> AppResult<Vec<UnitConversion>> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|c| c.is_owned_by(owner_id))
            .cloned()
            .collect())
    }

    async fn insert(&self, draft: NewUnitConversion) -> AppResult<UnitConversion> {
        let mut table = self.table.write().await;
        let conversion = UnitConversion::from_draft(ConversionId(table.last_id + 1), draft);
        table.check_slot(&conversion, None)?;
        table.last_id += 1;
        table.rows.insert(*conversion.id(), conversion.clone());
        debug!(conversion_id = %conversion.id(), "Unit conversion stored");
        Ok(conversion)
    }

    async fn update(&self, conversion: &UnitConversion) -> AppResult<()> {
        let mut table = self.table.write().await;
        let id = *conversion.id();
        let stored = table
            .rows
            .get(&id)
            .ok_or_else(|| AppError::not_found(format!("换算关系 {} 不存在", id)))?;
        if stored.pair_key() != conversion.pair_key()
            || stored.material_id() != conversion.material_id()
            || stored.owner_id() != conversion.owner_id()
        {
            return Err(AppError::validation("换算关系的单位对与物料范围不可修改"));
        }
        table.check_slot(conversion, Some(id))?;
        table.rows.insert(id, conversion.clone());
        Ok(())
    }

    async fn delete(&self, id: ConversionId) -> AppResult<bool> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }

    async fn delete_many(&self, ids: &[ConversionId]) -> AppResult<u64> {
        let mut table = self.table.write().await;
        if let Some(missing) = ids.iter().find(|id| !table.rows.contains_key(id)) {
            return Err(AppError::not_found(format!("换算关系 {} 不存在", missing)));
        }
        let mut deleted = 0;
        for id in ids {
            if table.rows.remove(id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn references_unit(&self, owner_id: OwnerId, unit_id: UnitId) -> AppResult<bool> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .any(|c| c.is_owned_by(owner_id) && c.involves(unit_id)))
    }
}
