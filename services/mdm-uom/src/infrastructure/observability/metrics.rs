//! UOM Metrics
//!
//! 业务指标记录

use metrics::counter;

/// 路径查询结果：`found` / `identity` / `no_path` / 其他错误种类
pub fn record_path_query(outcome: &str, material_scoped: bool) {
    let labels = [
        ("outcome", outcome.to_string()),
        ("material_scoped", material_scoped.to_string()),
    ];

    counter!("uom_path_queries_total", &labels).increment(1);
}

/// 记录被拒绝的换算关系
pub fn record_validation_rejection(reason: &str) {
    let labels = [("reason", reason.to_string())];

    counter!("uom_validation_rejections_total", &labels).increment(1);
}

/// 记录环路检查
pub fn record_cycle_check(cycles: usize, inconsistent: bool) {
    let labels = [("inconsistent", inconsistent.to_string())];

    counter!("uom_cycle_checks_total", &labels).increment(1);
    if cycles > 0 {
        counter!("uom_cycles_detected_total", &labels).increment(cycles as u64);
    }
}
