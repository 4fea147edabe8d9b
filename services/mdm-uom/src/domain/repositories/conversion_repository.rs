//! 单位换算关系仓储接口

use async_trait::async_trait;
use common::OwnerId;
use errors::AppResult;

use crate::domain::entities::{NewUnitConversion, UnitConversion};
use crate::domain::value_objects::{ConversionId, UnitId};

/// 单位换算关系仓储接口
///
/// 实现必须保证：同一所有者下，无序单位对 + 物料范围唯一；
/// 构图所用的读取必须来自同一时间点的一致快照。
#[async_trait]
pub trait ConversionRepository: Send + Sync {
    /// 根据 ID 查找换算关系
    async fn find_by_id(&self, id: ConversionId) -> AppResult<Option<UnitConversion>>;

    /// 批量查找换算关系（不存在的 ID 被忽略）
    async fn find_by_ids(&self, ids: &[ConversionId]) -> AppResult<Vec<UnitConversion>>;

    /// 所有者名下全部换算关系的快照
    async fn list_by_owner(&self, owner_id: OwnerId) -> AppResult<Vec<UnitConversion>>;

    /// 新建换算关系，由存储层分配 ID；唯一键冲突时返回 `Conflict`
    async fn insert(&self, draft: NewUnitConversion) -> AppResult<UnitConversion>;

    /// 更新换算关系（单位对与物料范围不可变）
    async fn update(&self, conversion: &UnitConversion) -> AppResult<()>;

    /// 删除换算关系，返回是否确有删除
    async fn delete(&self, id: ConversionId) -> AppResult<bool>;

    /// 在同一事务内批量删除，返回删除数量
    async fn delete_many(&self, ids: &[ConversionId]) -> AppResult<u64>;

    /// 单位是否仍被换算关系引用
    async fn references_unit(&self, owner_id: OwnerId, unit_id: UnitId) -> AppResult<bool>;
}
