//! 读模型与操作结果

use domain_core::{Entity, Quantity};
use serde::Serialize;

use crate::domain::entities::{Unit, UnitConversion};
use crate::domain::graph::{ConversionCycle, CycleReport};
use crate::domain::services::ValidationWarning;
use crate::domain::value_objects::{ConversionId, UnitId};

/// 附带单位标签的换算关系
#[derive(Debug, Clone, Serialize)]
pub struct ConversionView {
    #[serde(flatten)]
    pub conversion: UnitConversion,
    pub from_unit_label: Option<String>,
    pub to_unit_label: Option<String>,
}

impl ConversionView {
    pub fn new(conversion: UnitConversion, units: &[Unit]) -> Self {
        let label = |unit_id: UnitId| {
            units
                .iter()
                .find(|u| *u.id() == unit_id)
                .map(Unit::label)
        };
        Self {
            from_unit_label: label(conversion.from_unit_id()),
            to_unit_label: label(conversion.to_unit_id()),
            conversion,
        }
    }

    /// 关键字是否命中任一端单位标签
    pub fn label_contains(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        [&self.from_unit_label, &self.to_unit_label]
            .into_iter()
            .flatten()
            .any(|label| label.to_lowercase().contains(&keyword))
    }
}

/// 创建或更新换算关系的结果
#[derive(Debug, Clone, Serialize)]
pub struct ConversionSaved {
    pub conversion: UnitConversion,
    pub warnings: Vec<ValidationWarning>,
}

/// 环路检查结果
#[derive(Debug, Clone, Serialize)]
pub struct CircularCheckResult {
    pub has_circular: bool,
    pub has_inconsistent: bool,
    pub cycles: Vec<ConversionCycle>,
}

impl From<CycleReport> for CircularCheckResult {
    fn from(report: CycleReport) -> Self {
        Self {
            has_circular: report.has_cycles(),
            has_inconsistent: report.has_inconsistent(),
            cycles: report.cycles,
        }
    }
}

/// 候选换算关系预校验结果
#[derive(Debug, Clone, Serialize)]
pub struct CandidateValidation {
    pub valid: bool,
    pub reason: Option<String>,
    /// 失败原因的错误种类，如 `duplicate_conversion`
    pub kind: Option<&'static str>,
    pub warnings: Vec<ValidationWarning>,
}

/// 数量换算结果
#[derive(Debug, Clone, Serialize)]
pub struct ConvertedQuantity {
    pub source: Quantity<UnitId>,
    pub target: Quantity<UnitId>,
    pub rate: f64,
    pub path: Vec<UnitId>,
    pub conversion_ids: Vec<ConversionId>,
}
