//! Business logic handler

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use common::types::{OwnerId, PagedResult};
use cuba_config::{ConversionConfig, CyclePolicySetting};
use domain_core::{AggregateRoot, Entity, OwnedEntity, Quantity};
use errors::AppError;
use tracing::{debug, info, warn};

use crate::domain::entities::{NewUnit, Unit, UnitConversion};
use crate::domain::graph::{
    ConversionGraph, ConversionGraphFactory, ConversionPath, GraphLimits, GraphScope,
};
use crate::domain::repositories::{ConversionRepository, UnitRepository};
use crate::domain::services::{ConversionCandidate, ConversionValidator, CyclePolicy};
use crate::domain::value_objects::{ConversionId, ConversionRate, MaterialId, Precision, UnitId};
use crate::error::{UomError, UomResult};
use crate::infrastructure::observability::metrics;

use super::commands::*;
use super::queries::*;
use super::views::*;

pub struct ServiceHandler {
    unit_repo: Arc<dyn UnitRepository>,
    conversion_repo: Arc<dyn ConversionRepository>,
    factory: ConversionGraphFactory,
    validator: ConversionValidator,
    default_precision: Precision,
}

impl ServiceHandler {
    pub fn new(
        unit_repo: Arc<dyn UnitRepository>,
        conversion_repo: Arc<dyn ConversionRepository>,
    ) -> Self {
        let factory = ConversionGraphFactory::default();
        Self {
            unit_repo,
            conversion_repo,
            factory,
            validator: ConversionValidator::new(factory, CyclePolicy::default(), 1e-6),
            default_precision: Precision::DEFAULT,
        }
    }

    /// 按配置设定构图上限、环路策略和默认精度
    pub fn from_config(
        unit_repo: Arc<dyn UnitRepository>,
        conversion_repo: Arc<dyn ConversionRepository>,
        config: &ConversionConfig,
    ) -> UomResult<Self> {
        let factory = ConversionGraphFactory::new(GraphLimits {
            max_nodes: config.max_nodes,
            max_edges: config.max_edges,
        });
        let policy = match config.cycle_policy {
            CyclePolicySetting::RejectInconsistent => CyclePolicy::RejectInconsistent,
            CyclePolicySetting::Warn => CyclePolicy::Warn,
        };
        let default_precision = Precision::new(i64::from(config.default_precision))
            .map_err(|e| UomError::invalid_input(e.to_string()))?;

        Ok(Self {
            unit_repo,
            conversion_repo,
            factory,
            validator: ConversionValidator::new(factory, policy, config.cycle_tolerance),
            default_precision,
        })
    }

    // ========== 单位 CRUD ==========

    /// 创建单位
    pub async fn create_unit(&self, cmd: CreateUnitCommand) -> UomResult<Unit> {
        let owner_id = cmd.principal.owner_id();
        info!(owner_id = %owner_id, unit_code = %cmd.unit_code, "Creating unit");

        let mut draft = NewUnit::new(owner_id, cmd.unit_code, cmd.unit_name, cmd.unit_type)
            .map_err(|e| UomError::invalid_input(e.to_string()))?
            .created_by(cmd.principal.user_id);
        if let Some(description) = cmd.description {
            draft = draft.with_description(description);
        }

        if self
            .unit_repo
            .exists_by_code(owner_id, &draft.code, None)
            .await?
        {
            return Err(UomError::conflict(format!("单位代码 {} 已存在", draft.code)));
        }

        let unit = self.unit_repo.insert(draft).await?;
        info!(unit_id = %unit.id(), "Unit created");
        Ok(unit)
    }

    /// 更新单位
    pub async fn update_unit(&self, cmd: UpdateUnitCommand) -> UomResult<Unit> {
        cmd.validate()?;
        let owner_id = cmd.principal.owner_id();
        let user_id = Some(cmd.principal.user_id);
        let mut unit = self.owned_unit(owner_id, cmd.unit_id).await?;

        if let Some(code) = cmd.unit_code {
            let normalized = code.trim().to_uppercase();
            if normalized != unit.code() {
                if self
                    .conversion_repo
                    .references_unit(owner_id, cmd.unit_id)
                    .await?
                {
                    return Err(UomError::conflict("单位已被换算关系引用，不能修改单位代码"));
                }
                if self
                    .unit_repo
                    .exists_by_code(owner_id, &normalized, Some(cmd.unit_id))
                    .await?
                {
                    return Err(UomError::conflict(format!("单位代码 {} 已存在", normalized)));
                }
                unit.change_code(normalized, user_id)
                    .map_err(|e| UomError::invalid_input(e.to_string()))?;
            }
        }
        if let Some(name) = cmd.unit_name {
            unit.rename(name, user_id)
                .map_err(|e| UomError::invalid_input(e.to_string()))?;
        }
        if let Some(unit_type) = cmd.unit_type {
            unit.change_type(unit_type, user_id);
        }
        if let Some(description) = cmd.description {
            unit.set_description(Some(description), user_id);
        }
        if let Some(status) = cmd.status {
            unit.set_status(status, user_id);
        }

        self.unit_repo.update(&unit).await?;
        info!(unit_id = %unit.id(), "Unit updated");
        Ok(unit)
    }

    /// 删除单位（仍被换算关系引用时拒绝）
    pub async fn delete_unit(&self, cmd: DeleteUnitCommand) -> UomResult<()> {
        let owner_id = cmd.principal.owner_id();
        self.owned_unit(owner_id, cmd.unit_id).await?;

        if self
            .conversion_repo
            .references_unit(owner_id, cmd.unit_id)
            .await?
        {
            return Err(UomError::conflict("单位已被换算关系引用，不能删除"));
        }

        self.unit_repo.delete(cmd.unit_id).await?;
        info!(owner_id = %owner_id, unit_id = %cmd.unit_id, "Unit deleted");
        Ok(())
    }

    /// 获取单位
    pub async fn get_unit(&self, query: GetUnitQuery) -> UomResult<Unit> {
        self.owned_unit(query.owner_id, query.unit_id).await
    }

    /// 列表单位（按代码排序）
    pub async fn list_units(&self, query: ListUnitsQuery) -> UomResult<PagedResult<Unit>> {
        let mut units: Vec<Unit> = self
            .unit_repo
            .list_by_owner(query.owner_id)
            .await?
            .into_iter()
            .filter(|unit| query.filter.matches(unit))
            .collect();
        units.sort_by(|a, b| a.code().cmp(b.code()));
        Ok(query.pagination.paginate(units))
    }

    // ========== 换算关系 CRUD ==========

    /// 创建换算关系
    pub async fn create_conversion(&self, cmd: CreateConversionCommand) -> UomResult<ConversionSaved> {
        let draft = cmd.into_draft(self.default_precision)?;
        let owner_id = draft.owner_id;
        info!(
            owner_id = %owner_id,
            from_unit = %draft.from_unit_id,
            to_unit = %draft.to_unit_id,
            rate = draft.rate.value(),
            material_id = ?draft.material_id.map(|m| m.value()),
            "Creating unit conversion"
        );

        let units = self.unit_repo.list_by_owner(owner_id).await?;
        let existing = self.conversion_repo.list_by_owner(owner_id).await?;
        let candidate = ConversionCandidate::from(&draft);

        let warnings = if draft.status.is_active() {
            self.validator
                .validate(&candidate, &units, &existing, None)
                .inspect_err(|err| reject(owner_id, err))?
                .warnings
        } else {
            self.validator
                .check_units(&candidate, &units)
                .inspect_err(|err| reject(owner_id, err))?;
            Vec::new()
        };

        let conversion = self
            .conversion_repo
            .insert(draft)
            .await
            .map_err(|err| duplicate_on_conflict(err, &candidate))?;

        for warning in &warnings {
            info!(conversion_id = %conversion.id(), warning = %warning.message(), "Conversion saved with warning");
        }
        info!(conversion_id = %conversion.id(), warnings = warnings.len(), "Unit conversion created");
        Ok(ConversionSaved {
            conversion,
            warnings,
        })
    }

    /// 更新换算关系
    pub async fn update_conversion(&self, cmd: UpdateConversionCommand) -> UomResult<ConversionSaved> {
        cmd.validate()?;
        let owner_id = cmd.principal.owner_id();
        let user_id = Some(cmd.principal.user_id);
        let mut conversion = self.owned_conversion(owner_id, cmd.conversion_id).await?;

        if let Some(rate) = cmd.rate {
            conversion.update_rate(rate, user_id);
        }
        if let Some(direction) = cmd.direction {
            conversion.change_direction(direction, user_id);
        }
        if let Some(precision) = cmd.precision {
            conversion.change_precision(precision, user_id);
        }
        if let Some(visibility) = cmd.visibility {
            conversion.change_visibility(visibility, user_id);
        }
        if let Some(status) = cmd.status {
            if status.is_active() {
                conversion.activate(user_id);
            } else {
                conversion.deactivate(user_id);
            }
        }

        let candidate = ConversionCandidate::from(&conversion);
        let mut warnings = Vec::new();
        if cmd.touches_graph() && conversion.is_active() {
            let units = self.unit_repo.list_by_owner(owner_id).await?;
            let existing = self.conversion_repo.list_by_owner(owner_id).await?;
            warnings = self
                .validator
                .validate(&candidate, &units, &existing, Some(cmd.conversion_id))
                .inspect_err(|err| reject(owner_id, err))?
                .warnings;
        }

        self.conversion_repo
            .update(&conversion)
            .await
            .map_err(|err| duplicate_on_conflict(err, &candidate))?;

        for warning in &warnings {
            info!(conversion_id = %cmd.conversion_id, warning = %warning.message(), "Conversion saved with warning");
        }
        info!(
            conversion_id = %cmd.conversion_id,
            updated_by = ?conversion.audit_info().updated_by.map(|u| u.value()),
            "Unit conversion updated"
        );
        Ok(ConversionSaved {
            conversion,
            warnings,
        })
    }

    /// 删除换算关系
    pub async fn delete_conversion(&self, cmd: DeleteConversionCommand) -> UomResult<()> {
        let owner_id = cmd.principal.owner_id();
        self.owned_conversion(owner_id, cmd.conversion_id).await?;
        self.conversion_repo.delete(cmd.conversion_id).await?;
        info!(owner_id = %owner_id, conversion_id = %cmd.conversion_id, "Unit conversion deleted");
        Ok(())
    }

    /// 批量删除换算关系（全部属于当前所有者才删除）
    pub async fn batch_delete_conversions(&self, cmd: BatchDeleteConversionsCommand) -> UomResult<u64> {
        cmd.validate()?;
        let owner_id = cmd.principal.owner_id();
        let ids = cmd.unique_ids();

        let found = self.conversion_repo.find_by_ids(&ids).await?;
        let found_ids: BTreeSet<ConversionId> = found.iter().map(|c| *c.id()).collect();
        if let Some(missing) = ids.iter().find(|id| !found_ids.contains(id)) {
            return Err(UomError::not_found(format!("换算关系 {} 不存在", missing)));
        }
        if let Some(foreign) = found.iter().find(|c| !c.is_owned_by(owner_id)) {
            warn!(owner_id = %owner_id, conversion_id = %foreign.id(), "Batch delete touches another owner's conversion");
            return Err(UomError::forbidden(format!("无权删除换算关系 {}", foreign.id())));
        }

        let deleted = self.conversion_repo.delete_many(&ids).await?;
        info!(owner_id = %owner_id, deleted, "Unit conversions batch deleted");
        Ok(deleted)
    }

    /// 获取换算关系
    pub async fn get_conversion(&self, query: GetConversionQuery) -> UomResult<ConversionView> {
        let conversion = self
            .owned_conversion(query.owner_id, query.conversion_id)
            .await?;
        let units = self.unit_repo.list_by_owner(query.owner_id).await?;
        Ok(ConversionView::new(conversion, &units))
    }

    /// 列表换算关系（新建的在前）
    pub async fn list_conversions(
        &self,
        query: ListConversionsQuery,
    ) -> UomResult<PagedResult<ConversionView>> {
        let units = self.unit_repo.list_by_owner(query.owner_id).await?;
        let mut conversions = self.conversion_repo.list_by_owner(query.owner_id).await?;
        conversions.sort_by(|a, b| {
            b.audit_info()
                .created_at
                .cmp(&a.audit_info().created_at)
                .then_with(|| b.id().cmp(a.id()))
        });

        let filter = &query.filter;
        let keyword = filter
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty());
        let views: Vec<ConversionView> = conversions
            .into_iter()
            .filter(|c| filter.material_id.is_none() || c.applies_to(filter.material_id))
            .filter(|c| filter.unit_id.is_none_or(|unit_id| c.involves(unit_id)))
            .filter(|c| filter.status.is_none_or(|status| c.status() == status))
            .map(|c| ConversionView::new(c, &units))
            .filter(|view| keyword.is_none_or(|k| view.label_contains(k)))
            .collect();

        Ok(query.pagination.paginate(views))
    }

    /// 某物料的专用换算关系
    pub async fn material_conversions(
        &self,
        query: MaterialConversionsQuery,
    ) -> UomResult<Vec<ConversionView>> {
        let units = self.unit_repo.list_by_owner(query.owner_id).await?;
        let mut conversions: Vec<UnitConversion> = self
            .conversion_repo
            .list_by_owner(query.owner_id)
            .await?
            .into_iter()
            .filter(|c| c.material_id() == Some(query.material_id))
            .collect();
        conversions.sort_by_key(|c| *c.id());
        Ok(conversions
            .into_iter()
            .map(|c| ConversionView::new(c, &units))
            .collect())
    }

    // ========== 换算图 ==========

    /// 查找换算路径
    pub async fn find_conversion_path(&self, query: FindPathQuery) -> UomResult<ConversionPath> {
        let scoped = query.material_id.is_some();
        let result = self
            .resolve_path(
                query.owner_id,
                query.from_unit_id,
                query.to_unit_id,
                query.material_id,
            )
            .await;

        match &result {
            Ok(path) if path.is_identity() => metrics::record_path_query("identity", scoped),
            Ok(path) => {
                debug!(
                    owner_id = %query.owner_id,
                    hops = path.hops(),
                    rate = path.rate,
                    "Conversion path found"
                );
                metrics::record_path_query("found", scoped)
            }
            Err(UomError::NoPathFound { .. }) => metrics::record_path_query("no_path", scoped),
            Err(err) => metrics::record_path_query(err.kind(), scoped),
        }
        result
    }

    /// 检查换算环路
    pub async fn check_circular_conversion(
        &self,
        query: CheckCircularQuery,
    ) -> UomResult<CircularCheckResult> {
        let graph = self.graph(query.owner_id, query.material_id).await?;
        let report = graph.detect_cycles(self.validator.tolerance());
        metrics::record_cycle_check(report.cycles.len(), report.has_inconsistent());

        if report.has_inconsistent() {
            warn!(
                owner_id = %query.owner_id,
                material_id = ?query.material_id.map(|m| m.value()),
                inconsistent = report.inconsistent().count(),
                "Inconsistent conversion cycles detected"
            );
        }
        Ok(report.into())
    }

    /// 预校验候选换算关系
    ///
    /// 业务规则不满足时返回 `valid = false`，存储错误和构图超限仍作为错误返回
    pub async fn validate_conversion_candidate(
        &self,
        query: ValidateCandidateQuery,
    ) -> UomResult<CandidateValidation> {
        let rate = match ConversionRate::new(query.rate) {
            Ok(rate) => rate,
            Err(e) => return Ok(invalid(&UomError::invalid_input(e.to_string()))),
        };
        let candidate = ConversionCandidate {
            owner_id: query.owner_id,
            from_unit_id: query.from_unit_id,
            to_unit_id: query.to_unit_id,
            rate,
            material_id: query.material_id,
            direction: query.direction,
        };

        let units = self.unit_repo.list_by_owner(query.owner_id).await?;
        let existing = self.conversion_repo.list_by_owner(query.owner_id).await?;
        match self
            .validator
            .validate(&candidate, &units, &existing, query.exclude)
        {
            Ok(outcome) => Ok(CandidateValidation {
                valid: true,
                reason: None,
                kind: None,
                warnings: outcome.warnings,
            }),
            Err(err @ (UomError::App(_) | UomError::GraphTooLarge { .. })) => Err(err),
            Err(err) => Ok(invalid(&err)),
        }
    }

    /// 按换算路径换算数量，结果按路径精度四舍五入
    pub async fn convert_quantity(&self, query: ConvertQuantityQuery) -> UomResult<ConvertedQuantity> {
        if !query.quantity.is_finite() {
            return Err(UomError::invalid_input("数量必须是有限数值"));
        }
        let path = self
            .find_conversion_path(FindPathQuery {
                owner_id: query.owner_id,
                from_unit_id: query.from_unit_id,
                to_unit_id: query.to_unit_id,
                material_id: query.material_id,
            })
            .await?;

        let source = Quantity::new(query.quantity, query.from_unit_id);
        let target = source.convert(path.rate, query.to_unit_id, path.precision.places());
        Ok(ConvertedQuantity {
            source,
            target,
            rate: path.rate,
            path: path.path,
            conversion_ids: path.conversion_ids,
        })
    }

    // ========== 内部方法 ==========

    async fn resolve_path(
        &self,
        owner_id: OwnerId,
        from: UnitId,
        to: UnitId,
        material_id: Option<MaterialId>,
    ) -> UomResult<ConversionPath> {
        let units = self.unit_repo.list_by_owner(owner_id).await?;
        for unit_id in [from, to] {
            if !units.iter().any(|u| *u.id() == unit_id && u.is_active()) {
                return Err(UomError::InvalidUnitReference { unit_id });
            }
        }
        if from == to {
            return Ok(ConversionPath::identity(from));
        }

        // 停用单位不作为中间节点
        let active: HashSet<UnitId> = units
            .iter()
            .filter(|u| u.is_active())
            .map(|u| *u.id())
            .collect();
        let conversions: Vec<UnitConversion> = self
            .conversion_repo
            .list_by_owner(owner_id)
            .await?
            .into_iter()
            .filter(|c| active.contains(&c.from_unit_id()) && active.contains(&c.to_unit_id()))
            .collect();
        self.factory
            .build(GraphScope::new(owner_id, material_id), &conversions)?
            .find_path(from, to)
    }

    async fn graph(
        &self,
        owner_id: OwnerId,
        material_id: Option<MaterialId>,
    ) -> UomResult<ConversionGraph> {
        let conversions = self.conversion_repo.list_by_owner(owner_id).await?;
        self.factory
            .build(GraphScope::new(owner_id, material_id), &conversions)
    }

    async fn owned_unit(&self, owner_id: OwnerId, unit_id: UnitId) -> UomResult<Unit> {
        let unit = self
            .unit_repo
            .find_by_id(unit_id)
            .await?
            .ok_or_else(|| UomError::not_found(format!("单位 {} 不存在", unit_id)))?;
        if !unit.is_owned_by(owner_id) {
            return Err(UomError::forbidden(format!("无权访问单位 {}", unit_id)));
        }
        Ok(unit)
    }

    async fn owned_conversion(
        &self,
        owner_id: OwnerId,
        conversion_id: ConversionId,
    ) -> UomResult<UnitConversion> {
        let conversion = self
            .conversion_repo
            .find_by_id(conversion_id)
            .await?
            .ok_or_else(|| UomError::not_found(format!("换算关系 {} 不存在", conversion_id)))?;
        if !conversion.is_owned_by(owner_id) {
            return Err(UomError::forbidden(format!("无权访问换算关系 {}", conversion_id)));
        }
        Ok(conversion)
    }
}

fn reject(owner_id: OwnerId, err: &UomError) {
    warn!(owner_id = %owner_id, reason = err.kind(), error = %err, "Unit conversion rejected");
    metrics::record_validation_rejection(err.kind());
}

fn invalid(err: &UomError) -> CandidateValidation {
    CandidateValidation {
        valid: false,
        reason: Some(err.to_string()),
        kind: Some(err.kind()),
        warnings: Vec::new(),
    }
}

/// 存储层唯一键冲突视为重复换算
fn duplicate_on_conflict(err: AppError, candidate: &ConversionCandidate) -> UomError {
    match err {
        AppError::Conflict(_) => {
            metrics::record_validation_rejection("duplicate_conversion");
            UomError::DuplicateConversion {
                from: candidate.from_unit_id,
                to: candidate.to_unit_id,
                material_id: candidate.material_id,
                existing: None,
            }
        }
        other => UomError::App(other),
    }
}
