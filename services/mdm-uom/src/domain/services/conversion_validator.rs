//! 换算关系校验服务

use std::collections::BTreeSet;

use common::OwnerId;
use domain_core::{Entity, OwnedEntity};
use serde::Serialize;
use tracing::debug;

use crate::domain::entities::{ConversionArc, NewUnitConversion, Unit, UnitConversion, UnitPair};
use crate::domain::enums::ConversionDirection;
use crate::domain::graph::{ConversionGraphFactory, GraphScope, is_consistent_product};
use crate::domain::value_objects::{ConversionId, ConversionRate, MaterialId, Precision, UnitId};
use crate::error::{UomError, UomResult};

/// 环路处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePolicy {
    /// 换算率不一致的环路直接拒绝
    #[default]
    RejectInconsistent,
    /// 只记录警告
    Warn,
}

/// 待校验的换算关系
#[derive(Debug, Clone)]
pub struct ConversionCandidate {
    pub owner_id: OwnerId,
    pub from_unit_id: UnitId,
    pub to_unit_id: UnitId,
    pub rate: ConversionRate,
    pub material_id: Option<MaterialId>,
    pub direction: ConversionDirection,
}

impl ConversionCandidate {
    pub fn pair_key(&self) -> UnitPair {
        if self.from_unit_id <= self.to_unit_id {
            (self.from_unit_id, self.to_unit_id)
        } else {
            (self.to_unit_id, self.from_unit_id)
        }
    }

    pub fn scope(&self) -> GraphScope {
        GraphScope::new(self.owner_id, self.material_id)
    }

    /// 假设插入后产生的遍历弧（尚无 ID，用 0 占位）
    fn arcs(&self) -> Vec<ConversionArc> {
        ConversionArc::derive(
            ConversionId(0),
            self.from_unit_id,
            self.to_unit_id,
            self.rate,
            self.direction,
            Precision::DEFAULT,
        )
    }
}

impl From<&NewUnitConversion> for ConversionCandidate {
    fn from(draft: &NewUnitConversion) -> Self {
        Self {
            owner_id: draft.owner_id,
            from_unit_id: draft.from_unit_id,
            to_unit_id: draft.to_unit_id,
            rate: draft.rate,
            material_id: draft.material_id,
            direction: draft.direction,
        }
    }
}

impl From<&UnitConversion> for ConversionCandidate {
    fn from(conversion: &UnitConversion) -> Self {
        Self {
            owner_id: conversion.owner_id(),
            from_unit_id: conversion.from_unit_id(),
            to_unit_id: conversion.to_unit_id(),
            rate: conversion.rate(),
            material_id: conversion.material_id(),
            direction: conversion.direction(),
        }
    }
}

/// 校验通过但需要提示的情况
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationWarning {
    /// 与现有路径构成一致的冗余环路
    RedundantConversion { path: Vec<UnitId>, product: f64 },
    /// 与现有路径矛盾（仅在 `CyclePolicy::Warn` 下出现）
    InconsistentCycle { path: Vec<UnitId>, product: f64 },
    /// 同一单位对存在已停用的换算关系
    InactiveDuplicate { existing: ConversionId },
}

impl ValidationWarning {
    pub fn message(&self) -> String {
        match self {
            Self::RedundantConversion { path, .. } => {
                format!("换算关系与现有路径 {} 重复", join_path(path))
            }
            Self::InconsistentCycle { path, product } => {
                format!("换算关系与现有路径 {} 矛盾，环路换算率为 {}", join_path(path), product)
            }
            Self::InactiveDuplicate { existing } => {
                format!("已存在停用的换算关系 {}，可直接启用", existing)
            }
        }
    }
}

fn join_path(path: &[UnitId]) -> String {
    path.iter()
        .map(UnitId::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationOutcome {
    pub warnings: Vec<ValidationWarning>,
}

/// 换算关系校验
///
/// 依次检查：单位相同、单位引用、唯一键、假设插入后的环路
#[derive(Debug, Clone, Copy)]
pub struct ConversionValidator {
    factory: ConversionGraphFactory,
    policy: CyclePolicy,
    tolerance: f64,
}

impl ConversionValidator {
    pub fn new(factory: ConversionGraphFactory, policy: CyclePolicy, tolerance: f64) -> Self {
        Self {
            factory,
            policy,
            tolerance,
        }
    }

    pub fn policy(&self) -> CyclePolicy {
        self.policy
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// 校验候选换算关系
    ///
    /// `exclude` 用于更新时跳过自身
    pub fn validate(
        &self,
        candidate: &ConversionCandidate,
        units: &[Unit],
        existing: &[UnitConversion],
        exclude: Option<ConversionId>,
    ) -> UomResult<ValidationOutcome> {
        self.check_units(candidate, units)?;

        let others: Vec<UnitConversion> = existing
            .iter()
            .filter(|c| c.owner_id() == candidate.owner_id && Some(*c.id()) != exclude)
            .cloned()
            .collect();

        let mut outcome = ValidationOutcome::default();
        let pair = candidate.pair_key();
        for conversion in others.iter().filter(|c| c.same_slot(pair, candidate.material_id)) {
            if conversion.is_active() {
                return Err(UomError::DuplicateConversion {
                    from: candidate.from_unit_id,
                    to: candidate.to_unit_id,
                    material_id: candidate.material_id,
                    existing: Some(*conversion.id()),
                });
            }
            outcome.warnings.push(ValidationWarning::InactiveDuplicate {
                existing: *conversion.id(),
            });
        }

        outcome.warnings.extend(self.check_cycle(candidate, &others)?);

        Ok(outcome)
    }

    /// 两端单位必须不同，且都是所有者名下启用的单位
    pub fn check_units(&self, candidate: &ConversionCandidate, units: &[Unit]) -> UomResult<()> {
        if candidate.from_unit_id == candidate.to_unit_id {
            return Err(UomError::invalid_input("源单位和目标单位不能相同"));
        }

        for unit_id in [candidate.from_unit_id, candidate.to_unit_id] {
            let usable = units.iter().any(|unit| {
                *unit.id() == unit_id && unit.is_owned_by(candidate.owner_id) && unit.is_active()
            });
            if !usable {
                return Err(UomError::InvalidUnitReference { unit_id });
            }
        }
        Ok(())
    }

    /// 候选关系会进入的所有图范围
    ///
    /// 通用关系还会进入该所有者每个物料的图，除非该物料对同一单位对另有专用关系
    fn affected_scopes(
        &self,
        candidate: &ConversionCandidate,
        others: &[UnitConversion],
    ) -> Vec<GraphScope> {
        let mut scopes = vec![candidate.scope()];
        if candidate.material_id.is_some() {
            return scopes;
        }

        let pair = candidate.pair_key();
        let materials: BTreeSet<MaterialId> = others
            .iter()
            .filter(|c| c.is_active())
            .filter_map(UnitConversion::material_id)
            .collect();
        for material_id in materials {
            let overridden = others.iter().any(|c| {
                c.is_active() && c.material_id() == Some(material_id) && c.pair_key() == pair
            });
            if !overridden {
                scopes.push(GraphScope::material(candidate.owner_id, material_id));
            }
        }
        scopes
    }

    fn check_cycle(
        &self,
        candidate: &ConversionCandidate,
        others: &[UnitConversion],
    ) -> UomResult<Vec<ValidationWarning>> {
        let mut warnings = Vec::new();
        for scope in self.affected_scopes(candidate, others) {
            if let Some(warning) = self.check_scope_cycle(candidate, scope, others)? {
                if !warnings.contains(&warning) {
                    warnings.push(warning);
                }
            }
        }
        Ok(warnings)
    }

    fn check_scope_cycle(
        &self,
        candidate: &ConversionCandidate,
        scope: GraphScope,
        others: &[UnitConversion],
    ) -> UomResult<Option<ValidationWarning>> {
        let pair = candidate.pair_key();
        let graph = if candidate.material_id.is_some() {
            // 专用换算插入后会覆盖同一单位对的通用换算
            let kept: Vec<UnitConversion> = others
                .iter()
                .filter(|c| c.is_material_specific() || c.pair_key() != pair)
                .cloned()
                .collect();
            self.factory.build(scope, &kept)?
        } else {
            self.factory.build(scope, others)?
        };

        for arc in candidate.arcs() {
            let back = match graph.find_path(arc.to, arc.from) {
                Ok(back) => back,
                Err(UomError::NoPathFound { .. }) => continue,
                Err(err) => return Err(err),
            };

            let product = arc.weight * back.rate;
            let mut path = Vec::with_capacity(back.path.len() + 1);
            path.push(arc.from);
            path.extend(back.path.iter().copied());

            debug!(
                owner_id = %candidate.owner_id,
                material_id = ?scope.material_id,
                path = %join_path(&path),
                product,
                "Candidate conversion closes a cycle"
            );

            if is_consistent_product(product, self.tolerance) {
                return Ok(Some(ValidationWarning::RedundantConversion { path, product }));
            }
            return match self.policy {
                CyclePolicy::RejectInconsistent => Err(UomError::InconsistentCycle {
                    from: candidate.from_unit_id,
                    to: candidate.to_unit_id,
                    product,
                }),
                CyclePolicy::Warn => Ok(Some(ValidationWarning::InconsistentCycle { path, product })),
            };
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::NewUnit;
    use crate::domain::enums::{RecordStatus, UnitType};
    use crate::domain::graph::test_support::*;

    fn units(ids: &[i64]) -> Vec<Unit> {
        ids.iter()
            .map(|&id| {
                let draft =
                    NewUnit::new(OWNER, format!("U{id}"), format!("单位{id}"), UnitType::Basic)
                        .unwrap();
                Unit::from_draft(UnitId(id), draft)
            })
            .collect()
    }

    fn candidate(from: i64, to: i64, rate: f64) -> ConversionCandidate {
        ConversionCandidate {
            owner_id: OWNER,
            from_unit_id: UnitId(from),
            to_unit_id: UnitId(to),
            rate: ConversionRate::new(rate).unwrap(),
            material_id: None,
            direction: ConversionDirection::Both,
        }
    }

    fn validator(policy: CyclePolicy) -> ConversionValidator {
        ConversionValidator::new(factory(), policy, 1e-6)
    }

    #[test]
    fn test_same_unit_rejected() {
        let result = validator(CyclePolicy::default()).validate(
            &candidate(1, 1, 2.0),
            &units(&[1]),
            &[],
            None,
        );
        assert!(matches!(result, Err(UomError::InvalidInput(_))));
    }

    #[test]
    fn test_unknown_or_inactive_unit_rejected() {
        let v = validator(CyclePolicy::default());
        let result = v.validate(&candidate(1, 9, 2.0), &units(&[1, 2]), &[], None);
        assert!(matches!(
            result,
            Err(UomError::InvalidUnitReference { unit_id: UnitId(9) })
        ));

        let mut registry = units(&[1, 2]);
        registry[1].set_status(RecordStatus::Inactive, None);
        let result = v.validate(&candidate(1, 2, 2.0), &registry, &[], None);
        assert!(matches!(
            result,
            Err(UomError::InvalidUnitReference { unit_id: UnitId(2) })
        ));
    }

    #[test]
    fn test_other_owners_unit_rejected() {
        let mut c = candidate(1, 2, 2.0);
        c.owner_id = OwnerId(2);
        let result = validator(CyclePolicy::default()).validate(&c, &units(&[1, 2]), &[], None);
        assert!(matches!(result, Err(UomError::InvalidUnitReference { .. })));
    }

    #[test]
    fn test_duplicate_in_either_order() {
        let v = validator(CyclePolicy::default());
        let existing = vec![edge(5, 1, 2, 2.0)];

        for c in [candidate(1, 2, 3.0), candidate(2, 1, 0.5)] {
            let result = v.validate(&c, &units(&[1, 2]), &existing, None);
            assert!(matches!(
                result,
                Err(UomError::DuplicateConversion { existing: Some(ConversionId(5)), .. })
            ));
        }
    }

    #[test]
    fn test_material_scope_is_part_of_the_key() {
        let v = validator(CyclePolicy::default());
        let existing = vec![edge(5, 1, 2, 2.0)];
        let mut c = candidate(1, 2, 3.0);
        c.material_id = Some(MaterialId(7));

        let outcome = v.validate(&c, &units(&[1, 2]), &existing, None).unwrap();
        assert!(outcome.warnings.is_empty());

        let existing = vec![edge(5, 1, 2, 2.0), edge(6, 2, 1, 0.25).for_material(7)];
        assert!(matches!(
            v.validate(&c, &units(&[1, 2]), &existing, None),
            Err(UomError::DuplicateConversion { existing: Some(ConversionId(6)), .. })
        ));
    }

    #[test]
    fn test_exclude_skips_self() {
        let existing = vec![edge(5, 1, 2, 2.0)];
        let outcome = validator(CyclePolicy::default())
            .validate(&candidate(1, 2, 4.0), &units(&[1, 2]), &existing, Some(ConversionId(5)))
            .unwrap();
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_inactive_duplicate_is_a_warning() {
        let existing = vec![edge(5, 1, 2, 2.0).inactive()];
        let outcome = validator(CyclePolicy::default())
            .validate(&candidate(1, 2, 2.0), &units(&[1, 2]), &existing, None)
            .unwrap();
        assert_eq!(
            outcome.warnings,
            vec![ValidationWarning::InactiveDuplicate {
                existing: ConversionId(5)
            }]
        );
    }

    #[test]
    fn test_consistent_cycle_is_advisory() {
        let existing = vec![edge(1, 1, 2, 2.0), edge(2, 2, 3, 3.0)];
        let outcome = validator(CyclePolicy::default())
            .validate(&candidate(1, 3, 6.0), &units(&[1, 2, 3]), &existing, None)
            .unwrap();
        assert_eq!(outcome.warnings.len(), 1);
        match &outcome.warnings[0] {
            ValidationWarning::RedundantConversion { path, product } => {
                assert_eq!(path, &vec![UnitId(1), UnitId(3), UnitId(2), UnitId(1)]);
                assert!((product - 1.0).abs() < 1e-9);
            }
            other => panic!("unexpected warning: {other:?}"),
        }
    }

    #[test]
    fn test_inconsistent_cycle_rejected() {
        let existing = vec![edge(1, 1, 2, 2.0), edge(2, 2, 3, 3.0)];
        let result = validator(CyclePolicy::RejectInconsistent).validate(
            &candidate(1, 3, 7.0),
            &units(&[1, 2, 3]),
            &existing,
            None,
        );
        match result {
            Err(UomError::InconsistentCycle { from, to, product }) => {
                assert_eq!((from, to), (UnitId(1), UnitId(3)));
                assert!((product - 7.0 / 6.0).abs() < 1e-9);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_inconsistent_cycle_warns_under_warn_policy() {
        let existing = vec![edge(1, 1, 2, 2.0), edge(2, 2, 3, 3.0)];
        let outcome = validator(CyclePolicy::Warn)
            .validate(&candidate(1, 3, 7.0), &units(&[1, 2, 3]), &existing, None)
            .unwrap();
        assert!(matches!(
            outcome.warnings.as_slice(),
            [ValidationWarning::InconsistentCycle { .. }]
        ));
    }

    #[test]
    fn test_material_candidate_overrides_general_pair() {
        // 物料专用换算覆盖 1-2 的通用换算，不构成环路
        let existing = vec![edge(1, 1, 2, 2.0)];
        let mut c = candidate(1, 2, 3.0);
        c.material_id = Some(MaterialId(4));
        let outcome = validator(CyclePolicy::default())
            .validate(&c, &units(&[1, 2]), &existing, None)
            .unwrap();
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_material_candidate_checked_against_general_paths() {
        let existing = vec![edge(1, 1, 2, 2.0), edge(2, 2, 3, 3.0)];
        let mut c = candidate(1, 3, 5.0);
        c.material_id = Some(MaterialId(4));
        let result = validator(CyclePolicy::default()).validate(
            &c,
            &units(&[1, 2, 3]),
            &existing,
            None,
        );
        assert!(matches!(result, Err(UomError::InconsistentCycle { .. })));
    }

    #[test]
    fn test_general_candidate_checked_in_each_material_scope() {
        // 通用范围内 1 与 3 不连通，但物料 4 的图中 1 -> 2 -> 3 = 6
        let existing = vec![
            edge(1, 1, 2, 2.0).for_material(4),
            edge(2, 2, 3, 3.0).for_material(4),
        ];
        let result = validator(CyclePolicy::RejectInconsistent).validate(
            &candidate(1, 3, 7.0),
            &units(&[1, 2, 3]),
            &existing,
            None,
        );
        match result {
            Err(UomError::InconsistentCycle { from, to, product }) => {
                assert_eq!((from, to), (UnitId(1), UnitId(3)));
                assert!((product - 7.0 / 6.0).abs() < 1e-9);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let outcome = validator(CyclePolicy::Warn)
            .validate(&candidate(1, 3, 7.0), &units(&[1, 2, 3]), &existing, None)
            .unwrap();
        assert!(matches!(
            outcome.warnings.as_slice(),
            [ValidationWarning::InconsistentCycle { .. }]
        ));

        let outcome = validator(CyclePolicy::RejectInconsistent)
            .validate(&candidate(1, 3, 6.0), &units(&[1, 2, 3]), &existing, None)
            .unwrap();
        assert!(matches!(
            outcome.warnings.as_slice(),
            [ValidationWarning::RedundantConversion { .. }]
        ));
    }

    #[test]
    fn test_general_candidate_skips_material_scope_with_own_pair() {
        // 物料 4 已有 1-3 专用换算，通用 1-3 在该物料的图中被覆盖
        let existing = vec![
            edge(1, 1, 2, 2.0).for_material(4),
            edge(2, 2, 3, 3.0).for_material(4),
            edge(3, 1, 3, 6.0).for_material(4),
        ];
        let outcome = validator(CyclePolicy::RejectInconsistent)
            .validate(&candidate(1, 3, 7.0), &units(&[1, 2, 3]), &existing, None)
            .unwrap();
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_inactive_material_edges_open_no_scope() {
        let existing = vec![
            edge(1, 1, 2, 2.0).for_material(4).inactive(),
            edge(2, 2, 3, 3.0).for_material(4).inactive(),
        ];
        let outcome = validator(CyclePolicy::RejectInconsistent)
            .validate(&candidate(1, 3, 7.0), &units(&[1, 2, 3]), &existing, None)
            .unwrap();
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_one_way_candidate_without_return_path() {
        let existing = vec![edge(1, 1, 2, 2.0).with_direction(ConversionDirection::Forward)];
        let mut c = candidate(1, 3, 5.0);
        c.direction = ConversionDirection::Forward;
        let outcome = validator(CyclePolicy::default())
            .validate(&c, &units(&[1, 2, 3]), &existing, None)
            .unwrap();
        assert!(outcome.warnings.is_empty());
    }
}
