use crate::diff::planner::{plan_execution, ExecutionPlan};
use crate::diff::{diff_database, diff_resource, diff_role, Change};
use crate::model::{Catalog, CurrentState, Database, DatabaseState, ResourceRef, Role, RoleState};
use crate::pg::executor::CommandExecutor;
use crate::pg::introspect::introspect_state;
use crate::pg::sqlgen::generate_invocation;
use crate::util::{Error, Result};
use log::{info, warn};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Compute and report changes without running them.
    pub dry_run: bool,
}

/// What reconciliation did to one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    NoChange,
    Created,
    Modified,
    Removed,
    /// Changes were computed but not run (dry run).
    Pending,
    Failed { error: String },
    Skipped { reason: String },
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed { .. } | Outcome::Skipped { .. })
    }

    fn for_changes(changes: &[Change]) -> Self {
        match changes.first() {
            None => Outcome::NoChange,
            Some(Change::CreateRole(_) | Change::CreateDatabase(_)) => Outcome::Created,
            Some(Change::DropRole { .. } | Change::DropDatabase { .. }) => Outcome::Removed,
            Some(Change::AlterRole { .. }) => Outcome::Modified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceReport {
    pub resource: ResourceRef,
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Command lines issued, or that would be issued on a dry run. For a failed
    /// resource the last entry is the command that failed.
    pub commands: Vec<String>,
}

/// Receives per-resource progress from [`apply_catalog`].
pub trait Reporter {
    fn on_resource_start(&mut self, _resource: &ResourceRef) {}

    fn on_resource_complete(&mut self, report: &ResourceReport);
}

pub struct NoReport;

impl Reporter for NoReport {
    fn on_resource_complete(&mut self, _report: &ResourceReport) {}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub created: usize,
    pub modified: usize,
    pub removed: usize,
    pub pending: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ApplySummary {
    pub fn add(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::NoChange => self.unchanged += 1,
            Outcome::Created => self.created += 1,
            Outcome::Modified => self.modified += 1,
            Outcome::Removed => self.removed += 1,
            Outcome::Pending => self.pending += 1,
            Outcome::Failed { .. } => self.failed += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }

    pub fn total_changes(&self) -> usize {
        self.created + self.modified + self.removed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplyResult {
    pub plan: ExecutionPlan,
    pub reports: Vec<ResourceReport>,
    pub summary: ApplySummary,
}

/// Runs `changes` in order, appending each command line to `issued` before it runs.
///
/// The first failure stops the remaining changes; earlier ones stay applied and
/// the failing command is the last entry of `issued`.
pub fn apply_changes(
    executor: &dyn CommandExecutor,
    changes: &[Change],
    issued: &mut Vec<String>,
) -> Result<()> {
    for change in changes {
        let invocation = generate_invocation(change);
        let rendered = invocation.to_string();
        info!("{}: {}", change.resource(), rendered);
        issued.push(rendered);
        executor.execute(&invocation)?;
    }
    Ok(())
}

pub fn reconcile_role(
    executor: &dyn CommandExecutor,
    desired: &Role,
    current: Option<&RoleState>,
) -> Result<Outcome> {
    let changes = diff_role(desired, current);
    apply_changes(executor, &changes, &mut Vec::new())?;
    Ok(Outcome::for_changes(&changes))
}

pub fn reconcile_database(
    executor: &dyn CommandExecutor,
    desired: &Database,
    current: Option<&DatabaseState>,
) -> Result<Outcome> {
    let changes = diff_database(desired, current)?;
    apply_changes(executor, &changes, &mut Vec::new())?;
    Ok(Outcome::for_changes(&changes))
}

/// Reconciles every resource of `catalog` against the server.
///
/// Current state is discovered once up front, one listing per kind. A failing
/// resource is reported and the run moves on; resources that depend on it are
/// skipped. When a listing fails, every resource of that kind fails with it.
pub fn apply_catalog(
    executor: &dyn CommandExecutor,
    catalog: &Catalog,
    options: &ApplyOptions,
    reporter: &mut dyn Reporter,
) -> Result<ApplyResult> {
    let plan = plan_execution(catalog)?;
    let discovery = introspect_state(executor, catalog);

    let mut reports = Vec::with_capacity(plan.order.len());
    let mut summary = ApplySummary::default();
    let mut unsuccessful: HashSet<&ResourceRef> = HashSet::new();

    for resource in &plan.order {
        reporter.on_resource_start(resource);

        let report = match plan.prerequisites(resource).find(|r| unsuccessful.contains(r)) {
            Some(prerequisite) => ResourceReport {
                resource: resource.clone(),
                outcome: Outcome::Skipped {
                    reason: format!("dependency {prerequisite} did not succeed"),
                },
                commands: Vec::new(),
            },
            None => match discovery.failure(resource) {
                Some(error) => ResourceReport {
                    resource: resource.clone(),
                    outcome: Outcome::Failed {
                        error: error.to_string(),
                    },
                    commands: Vec::new(),
                },
                None => reconcile_resource(executor, catalog, &discovery.state, resource, options),
            },
        };

        if report.outcome.is_failure() {
            warn!("{}: {:?}", report.resource, report.outcome);
            unsuccessful.insert(resource);
        }
        summary.add(&report.outcome);
        reporter.on_resource_complete(&report);
        reports.push(report);
    }

    Ok(ApplyResult {
        plan,
        reports,
        summary,
    })
}

fn reconcile_resource(
    executor: &dyn CommandExecutor,
    catalog: &Catalog,
    current: &CurrentState,
    resource: &ResourceRef,
    options: &ApplyOptions,
) -> ResourceReport {
    let failed = |error: Error, commands: Vec<String>| ResourceReport {
        resource: resource.clone(),
        outcome: Outcome::Failed {
            error: error.to_string(),
        },
        commands,
    };

    let changes = match diff_resource(catalog, current, resource) {
        Ok(changes) => changes,
        Err(error) => return failed(error, Vec::new()),
    };

    if options.dry_run {
        let commands = changes
            .iter()
            .map(|change| generate_invocation(change).to_string())
            .collect();
        let outcome = if changes.is_empty() {
            Outcome::NoChange
        } else {
            Outcome::Pending
        };
        return ResourceReport {
            resource: resource.clone(),
            outcome,
            commands,
        };
    }

    let mut issued = Vec::with_capacity(changes.len());
    match apply_changes(executor, &changes, &mut issued) {
        Ok(()) => ResourceReport {
            resource: resource.clone(),
            outcome: Outcome::for_changes(&changes),
            commands: issued,
        },
        Err(error) => failed(error, issued),
    }
}
