//! Service error types

use errors::AppError;
use thiserror::Error;

use crate::domain::value_objects::{ConversionId, MaterialId, UnitId};

#[derive(Debug, Error)]
pub enum UomError {
    #[error("单位 {unit_id} 不存在或已停用")]
    InvalidUnitReference { unit_id: UnitId },

    #[error("找不到从单位 {from} 到单位 {to} 的换算路径")]
    NoPathFound { from: UnitId, to: UnitId },

    #[error("单位 {from} 与单位 {to} 之间的换算关系已存在")]
    DuplicateConversion {
        from: UnitId,
        to: UnitId,
        material_id: Option<MaterialId>,
        existing: Option<ConversionId>,
    },

    #[error("换算关系 {from} -> {to} 与现有换算矛盾，环路换算率为 {product}")]
    InconsistentCycle {
        from: UnitId,
        to: UnitId,
        product: f64,
    },

    #[error("换算图规模超限: {nodes} 个单位 / {edges} 条换算关系（上限 {max_nodes} / {max_edges}）")]
    GraphTooLarge {
        nodes: usize,
        edges: usize,
        max_nodes: usize,
        max_edges: usize,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    App(#[from] AppError),
}

impl UomError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// 错误种类（用于 metrics 标签和日志）
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUnitReference { .. } => "invalid_unit_reference",
            Self::NoPathFound { .. } => "no_path_found",
            Self::DuplicateConversion { .. } => "duplicate_conversion",
            Self::InconsistentCycle { .. } => "inconsistent_cycle",
            Self::GraphTooLarge { .. } => "graph_too_large",
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::Conflict(_) => "conflict",
            Self::App(_) => "app",
        }
    }
}

impl From<UomError> for AppError {
    fn from(err: UomError) -> Self {
        match err {
            UomError::App(inner) => inner,
            UomError::InvalidUnitReference { .. } | UomError::InvalidInput(_) => {
                AppError::Validation(err.to_string())
            }
            UomError::NoPathFound { .. } | UomError::NotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            UomError::DuplicateConversion { .. } | UomError::Conflict(_) => {
                AppError::Conflict(err.to_string())
            }
            UomError::InconsistentCycle { .. } => AppError::Unprocessable(err.to_string()),
            UomError::GraphTooLarge { .. } => AppError::ResourceExhausted(err.to_string()),
            UomError::Forbidden(_) => AppError::Forbidden(err.to_string()),
        }
    }
}

pub type UomResult<T> = Result<T, UomError>;
