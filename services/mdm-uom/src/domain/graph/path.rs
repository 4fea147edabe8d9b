//! 换算路径查找
//!
//! 乘法累积的标签修正搜索：节点距离 = 前驱距离 × 弧权重。
//! 比较键为 `(累积换算率, 跳数, 首条换算关系 ID)`，保证结果确定。

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use serde::Serialize;

use super::builder::ConversionGraph;
use crate::domain::entities::ConversionArc;
use crate::domain::value_objects::{ConversionId, Precision, UnitId};
use crate::error::{UomError, UomResult};

/// 换算路径
///
/// `目标数量 = 源数量 × rate`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionPath {
    pub path: Vec<UnitId>,
    pub rate: f64,
    pub conversion_ids: Vec<ConversionId>,
    pub precision: Precision,
}

impl ConversionPath {
    pub fn identity(unit_id: UnitId) -> Self {
        Self {
            path: vec![unit_id],
            rate: 1.0,
            conversion_ids: Vec::new(),
            precision: Precision::DEFAULT,
        }
    }

    pub fn hops(&self) -> usize {
        self.conversion_ids.len()
    }

    pub fn is_identity(&self) -> bool {
        self.conversion_ids.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct Cost {
    rate: f64,
    hops: usize,
    first: Option<ConversionId>,
}

impl Cost {
    fn origin() -> Self {
        Self {
            rate: 1.0,
            hops: 0,
            first: None,
        }
    }

    fn extend(&self, arc: &ConversionArc) -> Self {
        Self {
            rate: self.rate * arc.weight,
            hops: self.hops + 1,
            first: self.first.or(Some(arc.conversion_id)),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.rate
            .total_cmp(&other.rate)
            .then(self.hops.cmp(&other.hops))
            .then(self.first.cmp(&other.first))
    }
}

/// 优先队列元素（BinaryHeap 为大顶堆，比较取反）
#[derive(Debug, Clone, Copy)]
struct Frontier {
    cost: Cost,
    unit: UnitId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .compare(&self.cost)
            .then_with(|| other.unit.cmp(&self.unit))
    }
}

/// 到达某单位的当前最优标签
#[derive(Debug, Clone)]
struct Label {
    cost: Cost,
    arcs: Vec<ConversionArc>,
}

impl Label {
    fn visits(&self, origin: UnitId, unit_id: UnitId) -> bool {
        origin == unit_id || self.arcs.iter().any(|arc| arc.to == unit_id)
    }
}

impl ConversionGraph {
    /// 查找 `from` 到 `to` 的换算路径
    ///
    /// 同一单位直接返回恒等路径，不要求单位出现在图中。
    /// 弧权重可小于 1，任一单位的键变优即重新松弛；
    /// 标签只沿简单路径扩展，跳数不超过节点数。
    pub fn find_path(&self, from: UnitId, to: UnitId) -> UomResult<ConversionPath> {
        if from == to {
            return Ok(ConversionPath::identity(from));
        }
        if !self.contains_unit(from) || !self.contains_unit(to) {
            return Err(UomError::NoPathFound { from, to });
        }

        let mut best: HashMap<UnitId, Label> = HashMap::new();
        let mut frontier = BinaryHeap::new();

        best.insert(
            from,
            Label {
                cost: Cost::origin(),
                arcs: Vec::new(),
            },
        );
        frontier.push(Frontier {
            cost: Cost::origin(),
            unit: from,
        });

        while let Some(Frontier { cost, unit }) = frontier.pop() {
            if unit == to {
                continue;
            }
            let label = match best.get(&unit) {
                Some(label) if label.cost.compare(&cost) == Ordering::Equal => label.clone(),
                // 过期条目
                _ => continue,
            };
            if label.cost.hops >= self.node_count() {
                continue;
            }

            for arc in self.arcs_from(unit) {
                if label.visits(from, arc.to) {
                    continue;
                }
                let candidate = label.cost.extend(arc);
                let improves = best
                    .get(&arc.to)
                    .is_none_or(|current| candidate.compare(&current.cost) == Ordering::Less);
                if improves {
                    let mut arcs = label.arcs.clone();
                    arcs.push(*arc);
                    best.insert(
                        arc.to,
                        Label {
                            cost: candidate,
                            arcs,
                        },
                    );
                    frontier.push(Frontier {
                        cost: candidate,
                        unit: arc.to,
                    });
                }
            }
        }

        let Label { cost, arcs } = best.remove(&to).ok_or(UomError::NoPathFound { from, to })?;

        let mut path = Vec::with_capacity(arcs.len() + 1);
        path.push(from);
        path.extend(arcs.iter().map(|arc| arc.to));

        let precision = arcs
            .iter()
            .map(|arc| arc.precision)
            .max()
            .unwrap_or_default();

        Ok(ConversionPath {
            path,
            rate: cost.rate,
            conversion_ids: arcs.iter().map(|arc| arc.conversion_id).collect(),
            precision,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enums::ConversionDirection;
    use crate::domain::graph::GraphScope;
    use crate::domain::graph::test_support::*;
    use crate::domain::value_objects::MaterialId;

    fn graph(conversions: &[crate::domain::entities::UnitConversion]) -> ConversionGraph {
        factory().build(GraphScope::general(OWNER), conversions).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1e-9 * expected.abs().max(1.0),
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_identity() {
        let g = graph(&[edge(1, 1, 2, 10.0)]);
        let path = g.find_path(UnitId(1), UnitId(1)).unwrap();
        assert_eq!(path.path, vec![UnitId(1)]);
        assert_eq!(path.rate, 1.0);
        assert!(path.is_identity());

        // 不在图中的单位也满足恒等
        let path = g.find_path(UnitId(42), UnitId(42)).unwrap();
        assert_eq!(path.path, vec![UnitId(42)]);
    }

    #[test]
    fn test_reciprocal() {
        let g = graph(&[edge(1, 1, 2, 8.0)]);
        let path = g.find_path(UnitId(2), UnitId(1)).unwrap();
        assert_eq!(path.path, vec![UnitId(2), UnitId(1)]);
        assert_close(path.rate, 1.0 / 8.0);
    }

    #[test]
    fn test_transitive() {
        let g = graph(&[edge(1, 1, 2, 2.0), edge(2, 2, 3, 5.0)]);
        let path = g.find_path(UnitId(1), UnitId(3)).unwrap();
        assert_eq!(path.path, vec![UnitId(1), UnitId(2), UnitId(3)]);
        assert_close(path.rate, 10.0);
        assert_eq!(path.conversion_ids, vec![ConversionId(1), ConversionId(2)]);
        assert_eq!(path.hops(), 2);
    }

    #[test]
    fn test_disconnected() {
        let g = graph(&[edge(1, 1, 2, 2.0), edge(2, 3, 4, 2.0)]);
        assert!(matches!(
            g.find_path(UnitId(1), UnitId(3)),
            Err(UomError::NoPathFound { from: UnitId(1), to: UnitId(3) })
        ));
        assert!(matches!(
            g.find_path(UnitId(1), UnitId(99)),
            Err(UomError::NoPathFound { .. })
        ));
    }

    #[test]
    fn test_one_way_edges() {
        let g = graph(&[
            edge(1, 1, 2, 12.0).with_direction(ConversionDirection::Forward),
            edge(2, 3, 2, 4.0).with_direction(ConversionDirection::Reverse),
        ]);
        assert_close(g.find_path(UnitId(1), UnitId(2)).unwrap().rate, 12.0);
        assert!(g.find_path(UnitId(2), UnitId(1)).is_err());

        // reverse: 存储为 3 -> 2，但仅允许 2 -> 3，换算率不取倒数
        assert_close(g.find_path(UnitId(2), UnitId(3)).unwrap().rate, 4.0);
        assert!(g.find_path(UnitId(3), UnitId(2)).is_err());

        let path = g.find_path(UnitId(1), UnitId(3)).unwrap();
        assert_eq!(path.path, vec![UnitId(1), UnitId(2), UnitId(3)]);
        assert_close(path.rate, 48.0);
    }

    #[test]
    fn test_material_override() {
        let conversions = vec![edge(1, 1, 2, 2.0), edge(2, 1, 2, 3.0).for_material(5)];

        let general = factory()
            .build(GraphScope::general(OWNER), &conversions)
            .unwrap();
        assert_close(general.find_path(UnitId(1), UnitId(2)).unwrap().rate, 2.0);

        let specific = factory()
            .build(GraphScope::material(OWNER, MaterialId(5)), &conversions)
            .unwrap();
        let path = specific.find_path(UnitId(1), UnitId(2)).unwrap();
        assert_close(path.rate, 3.0);
        assert_eq!(path.conversion_ids, vec![ConversionId(2)]);
    }

    #[test]
    fn test_prefers_fewer_hops_on_equal_rate() {
        // 1 -> 2 -> 3 = 10，直接 1 -> 3 = 10
        let g = graph(&[edge(1, 1, 2, 2.0), edge(2, 2, 3, 5.0), edge(3, 1, 3, 10.0)]);
        let path = g.find_path(UnitId(1), UnitId(3)).unwrap();
        assert_eq!(path.path, vec![UnitId(1), UnitId(3)]);
        assert_eq!(path.conversion_ids, vec![ConversionId(3)]);
    }

    #[test]
    fn test_fewer_hops_survive_sub_unit_reverse_arcs() {
        // 所有环乘积为 1；1 -> 2 -> 3 -> 4 与 1 -> 5 -> 4 均为 1.0
        let g = graph(&[
            edge(1, 1, 2, 0.5),
            edge(2, 2, 3, 0.5),
            edge(3, 3, 4, 4.0),
            edge(4, 1, 5, 2.0),
            edge(5, 5, 4, 0.5),
        ]);
        let path = g.find_path(UnitId(1), UnitId(4)).unwrap();
        assert_eq!(path.path, vec![UnitId(1), UnitId(5), UnitId(4)]);
        assert_eq!(path.hops(), 2);
        assert_close(path.rate, 1.0);
    }

    #[test]
    fn test_inconsistent_loop_terminates_on_simple_path() {
        // 1 -> 2 -> 3 -> 1 乘积为 8，反向绕行乘积为 1/8
        let g = graph(&[edge(1, 1, 2, 2.0), edge(2, 2, 3, 2.0), edge(3, 3, 1, 2.0)]);
        let path = g.find_path(UnitId(1), UnitId(3)).unwrap();
        assert_eq!(path.path, vec![UnitId(1), UnitId(3)]);
        assert_eq!(path.conversion_ids, vec![ConversionId(3)]);
        assert_close(path.rate, 0.5);
    }

    #[test]
    fn test_prefers_lower_first_conversion_id_on_full_tie() {
        let g = graph(&[
            edge(7, 1, 2, 2.0),
            edge(8, 2, 4, 3.0),
            edge(4, 1, 3, 3.0),
            edge(9, 3, 4, 2.0),
        ]);
        let path = g.find_path(UnitId(1), UnitId(4)).unwrap();
        assert_eq!(path.path, vec![UnitId(1), UnitId(3), UnitId(4)]);
        assert_eq!(path.conversion_ids[0], ConversionId(4));
        assert_close(path.rate, 6.0);
    }

    #[test]
    fn test_minimizes_accumulated_rate() {
        let g = graph(&[
            edge(1, 1, 2, 10.0),
            edge(2, 2, 4, 10.0),
            edge(3, 1, 3, 2.0),
            edge(4, 3, 4, 3.0),
        ]);
        let path = g.find_path(UnitId(1), UnitId(4)).unwrap();
        assert_eq!(path.path, vec![UnitId(1), UnitId(3), UnitId(4)]);
        assert_close(path.rate, 6.0);
    }

    #[test]
    fn test_path_precision_is_max_of_edges() {
        let g = graph(&[edge(1, 1, 2, 3.0).with_precision(4), edge(2, 2, 3, 1.0 / 7.0)]);
        let path = g.find_path(UnitId(1), UnitId(3)).unwrap();
        assert_eq!(path.precision.places(), 4);
        assert_close(path.rate, 3.0 / 7.0);

        let identity = g.find_path(UnitId(2), UnitId(2)).unwrap();
        assert_eq!(identity.precision, Precision::DEFAULT);
    }

    #[test]
    fn test_idempotent() {
        let conversions = vec![edge(1, 1, 2, 2.0), edge(2, 2, 3, 5.0), edge(3, 1, 3, 10.0)];
        let first = graph(&conversions).find_path(UnitId(3), UnitId(1)).unwrap();
        let second = graph(&conversions).find_path(UnitId(3), UnitId(1)).unwrap();
        assert_eq!(first, second);
    }
}
