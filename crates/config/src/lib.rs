//! cuba-config - 配置加载库

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_enabled: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// 环路处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicySetting {
    /// 拒绝换算率不一致的环路
    #[default]
    RejectInconsistent,
    /// 仅告警
    Warn,
}

/// 单位换算引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionConfig {
    /// 单个换算图允许的最大单位数
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    /// 单个换算图允许的最大换算关系数
    #[serde(default = "default_max_edges")]
    pub max_edges: usize,
    /// 环路换算率与 1 的相对容差
    #[serde(default = "default_cycle_tolerance")]
    pub cycle_tolerance: f64,
    #[serde(default)]
    pub cycle_policy: CyclePolicySetting,
    /// 新建换算关系的默认小数位
    #[serde(default = "default_precision")]
    pub default_precision: u8,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_nodes: default_max_nodes(),
            max_edges: default_max_edges(),
            cycle_tolerance: default_cycle_tolerance(),
            cycle_policy: CyclePolicySetting::default(),
            default_precision: default_precision(),
        }
    }
}

impl ConversionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_nodes == 0 || self.max_edges == 0 {
            return Err(ConfigError::Invalid(
                "conversion.max_nodes 和 conversion.max_edges 必须大于 0".to_string(),
            ));
        }
        if !self.cycle_tolerance.is_finite() || self.cycle_tolerance < 0.0 {
            return Err(ConfigError::Invalid(
                "conversion.cycle_tolerance 必须是非负数".to_string(),
            ));
        }
        if self.default_precision > 10 {
            return Err(ConfigError::Invalid(
                "conversion.default_precision 不能超过 10".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_max_nodes() -> usize {
    2000
}

fn default_max_edges() -> usize {
    10000
}

fn default_cycle_tolerance() -> f64 {
    1e-6
}

fn default_precision() -> u8 {
    2
}

/// 快照配置
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    pub path: String,
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
    pub snapshot: Option<SnapshotConfig>,
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序：`default.toml` → `{APP_ENV}.toml` → `UOM_` 前缀环境变量（`__` 分隔层级）
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());

        let config: Self = Self::figment(config_dir, &env).extract()?;
        config.conversion.validate()?;

        Ok(config)
    }

    fn figment(config_dir: &str, env: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("UOM_").split("__"))
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}
