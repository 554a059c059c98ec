use crate::apply::{apply_catalog, ApplyOptions, NoReport, Outcome, ResourceReport};
use crate::model::Catalog;
use crate::pg::executor::CommandExecutor;
use crate::util::Result;
use serde::Serialize;

/// Resources whose server state differs from the catalog, or could not be compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    pub has_drift: bool,
    pub resources: Vec<ResourceReport>,
}

impl DriftReport {
    fn from_reports(reports: Vec<ResourceReport>) -> Self {
        let resources: Vec<ResourceReport> = reports
            .into_iter()
            .filter(|report| report.outcome != Outcome::NoChange)
            .collect();
        Self {
            has_drift: !resources.is_empty(),
            resources,
        }
    }
}

/// Compares the catalog against the server without changing anything.
pub fn detect_drift(executor: &dyn CommandExecutor, catalog: &Catalog) -> Result<DriftReport> {
    let result = apply_catalog(
        executor,
        catalog,
        &ApplyOptions { dry_run: true },
        &mut NoReport,
    )?;
    Ok(DriftReport::from_reports(result.reports))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceRef;

    fn report(name: &str, outcome: Outcome) -> ResourceReport {
        ResourceReport {
            resource: ResourceRef::Role(name.to_string()),
            outcome,
            commands: Vec::new(),
        }
    }

    #[test]
    fn unchanged_resources_are_not_drift() {
        let report = DriftReport::from_reports(vec![report("a", Outcome::NoChange)]);
        assert!(!report.has_drift);
        assert!(report.resources.is_empty());
    }

    #[test]
    fn pending_and_failed_resources_are_drift() {
        let report = DriftReport::from_reports(vec![
            report("a", Outcome::NoChange),
            report("b", Outcome::Pending),
            report(
                "c",
                Outcome::Failed {
                    error: "unsupported".to_string(),
                },
            ),
        ]);
        assert!(report.has_drift);
        let names: Vec<_> = report.resources.iter().map(|r| r.resource.name()).collect();
        assert_eq!(names, ["b", "c"]);
    }

    #[test]
    fn drift_report_serializes() {
        let report = DriftReport::from_reports(vec![report("b", Outcome::Pending)]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["has_drift"], true);
        assert_eq!(json["resources"][0]["status"], "pending");
        assert_eq!(json["resources"][0]["resource"]["kind"], "role");
    }
}
