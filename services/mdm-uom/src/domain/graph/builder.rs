//! 换算图构建
//!
//! 每次查询从换算关系快照重新构建，构建结果不可变

use std::collections::{BTreeMap, BTreeSet};

use common::OwnerId;
use domain_core::{Entity, OwnedEntity};
use metrics::histogram;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::entities::{ConversionArc, UnitConversion, UnitPair};
use crate::domain::value_objects::{MaterialId, UnitId};
use crate::error::{UomError, UomResult};

/// 构图范围：所有者 + 可选物料
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphScope {
    pub owner_id: OwnerId,
    pub material_id: Option<MaterialId>,
}

impl GraphScope {
    /// 仅通用换算
    pub fn general(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            material_id: None,
        }
    }

    /// 通用换算 + 指定物料的专用换算
    pub fn material(owner_id: OwnerId, material_id: MaterialId) -> Self {
        Self {
            owner_id,
            material_id: Some(material_id),
        }
    }

    pub fn new(owner_id: OwnerId, material_id: Option<MaterialId>) -> Self {
        Self {
            owner_id,
            material_id,
        }
    }

    /// 换算关系是否参与本范围的构图
    ///
    /// 未指定物料时专用换算一律不参与
    pub fn admits(&self, conversion: &UnitConversion) -> bool {
        conversion.owner_id() == self.owner_id
            && conversion.is_active()
            && match (conversion.material_id(), self.material_id) {
                (None, _) => true,
                (Some(own), Some(queried)) => own == queried,
                (Some(_), None) => false,
            }
    }
}

/// 构图规模上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphLimits {
    pub max_nodes: usize,
    pub max_edges: usize,
}

impl Default for GraphLimits {
    fn default() -> Self {
        Self {
            max_nodes: 2000,
            max_edges: 10000,
        }
    }
}

/// 换算图
///
/// 节点为单位，弧由换算关系按方向推导；邻接表有序，遍历结果确定
#[derive(Debug, Clone)]
pub struct ConversionGraph {
    scope: GraphScope,
    adjacency: BTreeMap<UnitId, Vec<ConversionArc>>,
    edge_count: usize,
}

impl ConversionGraph {
    pub fn scope(&self) -> &GraphScope {
        &self.scope
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// 参与构图的换算关系数（不含推导出的反向弧）
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn arc_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    pub fn contains_unit(&self, unit_id: UnitId) -> bool {
        self.adjacency.contains_key(&unit_id)
    }

    pub fn units(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.adjacency.keys().copied()
    }

    /// 从某单位出发的弧，按 `(to, conversion_id)` 排序
    pub fn arcs_from(&self, unit_id: UnitId) -> &[ConversionArc] {
        self.adjacency
            .get(&unit_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// 换算图工厂
///
/// 以 `(owner_id, material_id)` 为键，从快照构建不可变的换算图
#[derive(Debug, Clone, Copy, Default)]
pub struct ConversionGraphFactory {
    limits: GraphLimits,
}

impl ConversionGraphFactory {
    pub fn new(limits: GraphLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> GraphLimits {
        self.limits
    }

    pub fn build(
        &self,
        scope: GraphScope,
        conversions: &[UnitConversion],
    ) -> UomResult<ConversionGraph> {
        let visible: Vec<&UnitConversion> =
            conversions.iter().filter(|c| scope.admits(c)).collect();

        if visible.len() > self.limits.max_edges {
            let nodes: BTreeSet<UnitId> = visible
                .iter()
                .flat_map(|c| [c.from_unit_id(), c.to_unit_id()])
                .collect();
            return Err(self.too_large(nodes.len(), visible.len()));
        }

        let mut by_pair: BTreeMap<UnitPair, Vec<&UnitConversion>> = BTreeMap::new();
        for conversion in visible {
            by_pair.entry(conversion.pair_key()).or_default().push(conversion);
        }

        let mut selected: Vec<&UnitConversion> = Vec::new();
        for (pair, candidates) in by_pair {
            let has_specific = candidates.iter().any(|c| c.is_material_specific());
            // 专用换算覆盖同一单位对的通用换算
            let mut kept: Vec<&UnitConversion> = candidates
                .into_iter()
                .filter(|c| c.is_material_specific() == has_specific)
                .collect();
            kept.sort_by_key(|c| *c.id());

            if kept.len() > 1 {
                warn!(
                    owner_id = %scope.owner_id,
                    from_unit = %pair.0,
                    to_unit = %pair.1,
                    conversions = ?kept.iter().map(|c| c.id().value()).collect::<Vec<_>>(),
                    "Multiple conversions share one unit pair, keeping all as parallel arcs"
                );
            }
            selected.extend(kept);
        }

        let nodes: BTreeSet<UnitId> = selected
            .iter()
            .flat_map(|c| [c.from_unit_id(), c.to_unit_id()])
            .collect();
        if nodes.len() > self.limits.max_nodes {
            return Err(self.too_large(nodes.len(), selected.len()));
        }

        let mut adjacency: BTreeMap<UnitId, Vec<ConversionArc>> =
            nodes.into_iter().map(|unit| (unit, Vec::new())).collect();
        for conversion in &selected {
            for arc in conversion.arcs() {
                adjacency.entry(arc.from).or_default().push(arc);
            }
        }
        for arcs in adjacency.values_mut() {
            arcs.sort_by_key(|arc| (arc.to, arc.conversion_id));
        }

        let graph = ConversionGraph {
            scope,
            adjacency,
            edge_count: selected.len(),
        };

        debug!(
            owner_id = %scope.owner_id,
            material_id = ?scope.material_id.map(|m| m.value()),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            arcs = graph.arc_count(),
            "Conversion graph built"
        );
        histogram!("uom_graph_edges").record(graph.edge_count() as f64);

        Ok(graph)
    }

    fn too_large(&self, nodes: usize, edges: usize) -> UomError {
        UomError::GraphTooLarge {
            nodes,
            edges,
            max_nodes: self.limits.max_nodes,
            max_edges: self.limits.max_edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enums::ConversionDirection;
    use crate::domain::graph::test_support::*;

    #[test]
    fn test_owner_and_status_filtering() {
        let conversions = vec![
            edge(1, 1, 2, 10.0),
            edge(2, 2, 3, 5.0).owned_by(99),
            edge(3, 3, 4, 2.0).inactive(),
        ];
        let graph = factory().build(GraphScope::general(OWNER), &conversions).unwrap();

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node_count(), 2);
        assert!(!graph.contains_unit(UnitId(3)));
    }

    #[test]
    fn test_material_edges_excluded_without_material() {
        let conversions = vec![edge(1, 1, 2, 2.0), edge(2, 2, 3, 4.0).for_material(7)];
        let graph = factory().build(GraphScope::general(OWNER), &conversions).unwrap();
        assert_eq!(graph.edge_count(), 1);

        let graph = factory()
            .build(GraphScope::material(OWNER, MaterialId(7)), &conversions)
            .unwrap();
        assert_eq!(graph.edge_count(), 2);

        let graph = factory()
            .build(GraphScope::material(OWNER, MaterialId(8)), &conversions)
            .unwrap();
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_material_edge_overrides_general_for_same_pair() {
        let conversions = vec![
            edge(1, 1, 2, 2.0),
            edge(2, 2, 1, 1.0 / 3.0).for_material(7),
        ];
        let graph = factory()
            .build(GraphScope::material(OWNER, MaterialId(7)), &conversions)
            .unwrap();

        assert_eq!(graph.edge_count(), 1);
        let arcs = graph.arcs_from(UnitId(1));
        assert_eq!(arcs.len(), 1);
        assert_eq!(arcs[0].conversion_id.value(), 2);
    }

    #[test]
    fn test_one_way_edge_keeps_both_nodes() {
        let conversions = vec![edge(1, 1, 2, 6.0).with_direction(ConversionDirection::Forward)];
        let graph = factory().build(GraphScope::general(OWNER), &conversions).unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.arcs_from(UnitId(1)).len(), 1);
        assert!(graph.arcs_from(UnitId(2)).is_empty());
    }

    #[test]
    fn test_limits_enforced() {
        let conversions = vec![edge(1, 1, 2, 2.0), edge(2, 2, 3, 2.0), edge(3, 3, 4, 2.0)];

        let tight_edges = ConversionGraphFactory::new(GraphLimits {
            max_nodes: 100,
            max_edges: 2,
        });
        assert!(matches!(
            tight_edges.build(GraphScope::general(OWNER), &conversions),
            Err(UomError::GraphTooLarge { edges: 3, .. })
        ));

        let tight_nodes = ConversionGraphFactory::new(GraphLimits {
            max_nodes: 3,
            max_edges: 100,
        });
        assert!(matches!(
            tight_nodes.build(GraphScope::general(OWNER), &conversions),
            Err(UomError::GraphTooLarge { nodes: 4, .. })
        ));
    }
}
