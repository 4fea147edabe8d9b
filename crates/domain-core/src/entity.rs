//! 实体基础 trait

use common::{AuditInfo, OwnerId};

/// 实体 trait
pub trait Entity {
    type Id;

    fn id(&self) -> &Self::Id;
}

/// 聚合根 trait
pub trait AggregateRoot: Entity {
    fn audit_info(&self) -> &AuditInfo;
    fn audit_info_mut(&mut self) -> &mut AuditInfo;
}

/// 按所有者分区的实体
pub trait OwnedEntity: Entity {
    fn owner_id(&self) -> OwnerId;

    fn is_owned_by(&self, owner_id: OwnerId) -> bool {
        self.owner_id() == owner_id
    }
}
