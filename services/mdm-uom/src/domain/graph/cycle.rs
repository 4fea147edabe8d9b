//! 环路检测
//!
//! 带递归栈的迭代 DFS。沿同一条双向换算关系推导出的反向弧折返不算环路。

use std::collections::HashMap;
use std::ops::ControlFlow;

use serde::Serialize;

use super::builder::ConversionGraph;
use crate::domain::entities::ConversionArc;
use crate::domain::value_objects::{ConversionId, UnitId};

/// 环路换算率乘积是否在容差内等于 1
pub fn is_consistent_product(product: f64, tolerance: f64) -> bool {
    (product - 1.0).abs() <= tolerance * product.abs().max(1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleConsistency {
    /// 冗余但一致的换算
    Consistent,
    /// 换算率互相矛盾
    Inconsistent,
}

/// 一条检测到的环路
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionCycle {
    /// 闭合序列，首尾为同一单位
    pub units: Vec<UnitId>,
    pub conversion_ids: Vec<ConversionId>,
    pub product: f64,
    pub consistency: CycleConsistency,
}

impl ConversionCycle {
    fn from_arcs(arcs: &[ConversionArc], tolerance: f64) -> Self {
        let mut units = Vec::with_capacity(arcs.len() + 1);
        if let Some(first) = arcs.first() {
            units.push(first.from);
        }
        units.extend(arcs.iter().map(|arc| arc.to));

        let product = arcs.iter().map(|arc| arc.weight).product::<f64>();
        let consistency = if is_consistent_product(product, tolerance) {
            CycleConsistency::Consistent
        } else {
            CycleConsistency::Inconsistent
        };

        Self {
            units,
            conversion_ids: arcs.iter().map(|arc| arc.conversion_id).collect(),
            product,
            consistency,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.consistency == CycleConsistency::Consistent
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleReport {
    pub cycles: Vec<ConversionCycle>,
}

impl CycleReport {
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    pub fn has_inconsistent(&self) -> bool {
        self.cycles.iter().any(|c| !c.is_consistent())
    }

    pub fn inconsistent(&self) -> impl Iterator<Item = &ConversionCycle> {
        self.cycles.iter().filter(|c| !c.is_consistent())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnStack,
    Done,
}

struct Frame {
    unit: UnitId,
    via: Option<ConversionArc>,
    next: usize,
}

/// `arc` 是否为进入当前节点那条弧的推导反向弧
fn is_reciprocal_artifact(via: &ConversionArc, arc: &ConversionArc) -> bool {
    via.conversion_id == arc.conversion_id && via.from == arc.to
}

impl ConversionGraph {
    /// 是否存在任意环路（不区分一致与否），找到第一条回边即返回
    pub fn has_circular_conversion(&self) -> bool {
        let mut found = false;
        self.walk_back_edges(|_| {
            found = true;
            ControlFlow::Break(())
        });
        found
    }

    /// 找出每条回边闭合的环路并按换算率乘积分类
    pub fn detect_cycles(&self, tolerance: f64) -> CycleReport {
        let mut cycles = Vec::new();
        self.walk_back_edges(|arcs| {
            cycles.push(ConversionCycle::from_arcs(arcs, tolerance));
            ControlFlow::Continue(())
        });
        CycleReport { cycles }
    }

    fn walk_back_edges<F>(&self, mut on_cycle: F)
    where
        F: FnMut(&[ConversionArc]) -> ControlFlow<()>,
    {
        let mut marks: HashMap<UnitId, Mark> = HashMap::new();

        for root in self.units() {
            if marks.contains_key(&root) {
                continue;
            }
            marks.insert(root, Mark::OnStack);
            let mut stack = vec![Frame {
                unit: root,
                via: None,
                next: 0,
            }];

            while let Some(frame) = stack.last_mut() {
                let Some(arc) = self.arcs_from(frame.unit).get(frame.next).copied() else {
                    marks.insert(frame.unit, Mark::Done);
                    stack.pop();
                    continue;
                };
                frame.next += 1;

                if frame
                    .via
                    .is_some_and(|via| is_reciprocal_artifact(&via, &arc))
                {
                    continue;
                }

                match marks.get(&arc.to) {
                    None => {
                        marks.insert(arc.to, Mark::OnStack);
                        stack.push(Frame {
                            unit: arc.to,
                            via: Some(arc),
                            next: 0,
                        });
                    }
                    Some(Mark::OnStack) => {
                        let start = stack
                            .iter()
                            .position(|f| f.unit == arc.to)
                            .unwrap_or_default();
                        let mut loop_arcs: Vec<ConversionArc> =
                            stack[start + 1..].iter().filter_map(|f| f.via).collect();
                        loop_arcs.push(arc);
                        if on_cycle(&loop_arcs).is_break() {
                            return;
                        }
                    }
                    Some(Mark::Done) => {}
                }
            }
        }
    }
}
