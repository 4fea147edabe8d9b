//! 构图测试用的换算关系构造工具

use common::OwnerId;
use domain_core::{Entity, OwnedEntity};

use super::{ConversionGraphFactory, GraphLimits};
use crate::domain::entities::{NewUnitConversion, UnitConversion};
use crate::domain::enums::{ConversionDirection, RecordStatus};
use crate::domain::value_objects::{ConversionId, ConversionRate, MaterialId, Precision, UnitId};

pub const OWNER: OwnerId = OwnerId(1);

pub fn factory() -> ConversionGraphFactory {
    ConversionGraphFactory::new(GraphLimits::default())
}

/// 所有者为 `OWNER` 的通用双向换算
pub fn edge(id: i64, from: i64, to: i64, rate: f64) -> UnitConversion {
    let draft = NewUnitConversion::new(
        OWNER,
        UnitId(from),
        UnitId(to),
        ConversionRate::new(rate).unwrap(),
    )
    .unwrap();
    UnitConversion::from_draft(ConversionId(id), draft)
}

fn redraft(conversion: &UnitConversion) -> NewUnitConversion {
    NewUnitConversion::new(
        conversion.owner_id(),
        conversion.from_unit_id(),
        conversion.to_unit_id(),
        conversion.rate(),
    )
    .unwrap()
    .with_material(conversion.material_id())
    .with_direction(conversion.direction())
    .with_precision(conversion.precision())
    .with_status(conversion.status())
    .with_visibility(conversion.visibility())
}

pub trait EdgeExt: Sized {
    fn owned_by(self, owner: i64) -> Self;
    fn inactive(self) -> Self;
    fn for_material(self, material: i64) -> Self;
    fn with_direction(self, direction: ConversionDirection) -> Self;
    fn with_precision(self, places: i64) -> Self;
}

impl EdgeExt for UnitConversion {
    fn owned_by(self, owner: i64) -> Self {
        let mut draft = redraft(&self);
        draft.owner_id = OwnerId(owner);
        UnitConversion::from_draft(*self.id(), draft)
    }

    fn inactive(self) -> Self {
        let draft = redraft(&self).with_status(RecordStatus::Inactive);
        UnitConversion::from_draft(*self.id(), draft)
    }

    fn for_material(self, material: i64) -> Self {
        let draft = redraft(&self).with_material(Some(MaterialId(material)));
        UnitConversion::from_draft(*self.id(), draft)
    }

    fn with_direction(self, direction: ConversionDirection) -> Self {
        let draft = redraft(&self).with_direction(direction);
        UnitConversion::from_draft(*self.id(), draft)
    }

    fn with_precision(self, places: i64) -> Self {
        let draft = redraft(&self).with_precision(Precision::new(places).unwrap());
        UnitConversion::from_draft(*self.id(), draft)
    }
}
