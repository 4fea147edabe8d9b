//! 服务运行时

use cuba_config::AppConfig;
use cuba_telemetry::{init_metrics, init_tracing, init_tracing_json};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{info, warn};

/// 服务运行时配置
pub struct RuntimeConfig {
    pub config_dir: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            config_dir: "config".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// 配置目录可由 `UOM_CONFIG_DIR` 覆盖
    pub fn from_env() -> Self {
        match std::env::var("UOM_CONFIG_DIR") {
            Ok(dir) if !dir.trim().is_empty() => Self { config_dir: dir },
            _ => Self::default(),
        }
    }
}

/// 已初始化的运行时
pub struct Runtime {
    pub metrics: Option<PrometheusHandle>,
}

impl Runtime {
    /// Prometheus 文本格式的指标快照，未启用时为 `None`
    pub fn render_metrics(&self) -> Option<String> {
        self.metrics.as_ref().map(PrometheusHandle::render)
    }
}

/// 初始化服务运行时
pub fn init_runtime(config: &AppConfig) -> Runtime {
    // 初始化 tracing
    if config.is_production() {
        init_tracing_json(&config.telemetry.log_level);
    } else {
        init_tracing(&config.telemetry.log_level);
    }

    let metrics = if config.telemetry.metrics_enabled {
        match init_metrics() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "Failed to install Prometheus recorder, metrics disabled");
                None
            }
        }
    } else {
        None
    };

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        metrics_enabled = metrics.is_some(),
        "Runtime initialized"
    );

    Runtime { metrics }
}
