//! 计量单位仓储接口

use async_trait::async_trait;
use common::OwnerId;
use errors::AppResult;

use crate::domain::entities::{NewUnit, Unit};
use crate::domain::value_objects::UnitId;

/// 计量单位仓储接口
#[async_trait]
pub trait UnitRepository: Send + Sync {
    /// 根据 ID 查找单位
    async fn find_by_id(&self, id: UnitId) -> AppResult<Option<Unit>>;

    /// 根据单位代码查找单位
    async fn find_by_code(&self, owner_id: OwnerId, code: &str) -> AppResult<Option<Unit>>;

    /// 检查单位代码是否存在（可排除自身）
    async fn exists_by_code(
        &self,
        owner_id: OwnerId,
        code: &str,
        exclude: Option<UnitId>,
    ) -> AppResult<bool>;

    /// 新建单位，由存储层分配 ID；单位代码重复时返回 `Conflict`
    async fn insert(&self, draft: NewUnit) -> AppResult<Unit>;

    /// 更新单位
    async fn update(&self, unit: &Unit) -> AppResult<()>;

    /// 删除单位，返回是否确有删除
    async fn delete(&self, id: UnitId) -> AppResult<bool>;

    /// 所有者名下全部单位
    async fn list_by_owner(&self, owner_id: OwnerId) -> AppResult<Vec<Unit>>;
}
