//! mdm-uom 换算图审计
//!
//! 加载快照，逐个所有者（通用范围及每个物料范围）检查换算环路，输出 JSON 报告。
//! 启用指标时在标准错误输出 Prometheus 指标。
//! 存在换算率矛盾的环路时以非零状态退出。

use std::collections::BTreeSet;
use std::sync::Arc;

use cuba_bootstrap::{RuntimeConfig, init_runtime};
use cuba_config::AppConfig;
use cuba_telemetry::HealthStatus;
use serde::Serialize;
use tracing::{info, warn};

use common::OwnerId;
use domain_core::OwnedEntity;
use mdm_uom::application::{CheckCircularQuery, CircularCheckResult, ServiceHandler};
use mdm_uom::domain::value_objects::MaterialId;
use mdm_uom::infrastructure::persistence::Snapshot;

#[derive(Debug, Serialize)]
struct ScopeAudit {
    material_id: Option<MaterialId>,
    #[serde(flatten)]
    result: CircularCheckResult,
}

#[derive(Debug, Serialize)]
struct OwnerAudit {
    owner_id: OwnerId,
    scopes: Vec<ScopeAudit>,
}

#[derive(Debug, Serialize)]
struct AuditReport {
    has_inconsistent: bool,
    health: HealthStatus,
    owners: Vec<OwnerAudit>,
}

impl OwnerAudit {
    /// 每个所有者一项健康检查，列出存在矛盾环路的范围
    fn health_check(&self) -> (String, bool, Option<String>) {
        let failing: Vec<String> = self
            .scopes
            .iter()
            .filter(|scope| scope.result.has_inconsistent)
            .map(|scope| match scope.material_id {
                Some(material_id) => format!("物料 {material_id}"),
                None => "通用".to_string(),
            })
            .collect();
        let message = (!failing.is_empty())
            .then(|| format!("换算率矛盾的环路：{}", failing.join("、")));
        (format!("owner:{}", self.owner_id), failing.is_empty(), message)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let runtime_config = RuntimeConfig::from_env();
    let config = AppConfig::load(&runtime_config.config_dir)?;
    let runtime = init_runtime(&config);

    let path = std::env::args()
        .nth(1)
        .or_else(|| config.snapshot.as_ref().map(|s| s.path.clone()))
        .ok_or("未指定快照文件：请传入路径参数或配置 snapshot.path")?;

    let snapshot = Snapshot::load(&path).await?;
    let owners = snapshot.owners();
    let materials: Vec<(OwnerId, MaterialId)> = snapshot
        .conversions
        .iter()
        .filter_map(|c| c.material_id().map(|m| (c.owner_id(), m)))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let (unit_repo, conversion_repo) = snapshot.into_repositories()?;
    let handler = ServiceHandler::from_config(
        Arc::new(unit_repo),
        Arc::new(conversion_repo),
        &config.conversion,
    )?;

    let mut report = AuditReport {
        has_inconsistent: false,
        health: HealthStatus::new(),
        owners: Vec::with_capacity(owners.len()),
    };

    for owner_id in owners {
        let scopes = std::iter::once(None).chain(
            materials
                .iter()
                .filter(|(owner, _)| *owner == owner_id)
                .map(|(_, material)| Some(*material)),
        );

        let mut audit = OwnerAudit {
            owner_id,
            scopes: Vec::new(),
        };
        for material_id in scopes {
            let result = handler
                .check_circular_conversion(CheckCircularQuery {
                    owner_id,
                    material_id,
                })
                .await?;
            report.has_inconsistent |= result.has_inconsistent;
            audit.scopes.push(ScopeAudit { material_id, result });
        }
        let (name, healthy, message) = audit.health_check();
        report.health.add_check(name, healthy, message);
        report.owners.push(audit);
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    if let Some(rendered) = runtime.render_metrics() {
        eprintln!("{rendered}");
    }

    if report.has_inconsistent {
        warn!("Audit found inconsistent conversion cycles");
        std::process::exit(2);
    }
    info!(owners = report.owners.len(), "Audit finished");
    Ok(())
}
