#![allow(unused_imports, dead_code)]

pub use pgstate::apply::{
    apply_catalog, reconcile_database, reconcile_role, ApplyOptions, NoReport, Outcome, Reporter,
    ResourceReport,
};
pub use pgstate::diff::Change;
pub use pgstate::drift::detect_drift;
pub use pgstate::manifest::{load_manifest_sources, parse_manifest_str};
pub use pgstate::model::{
    Catalog, Database, DatabaseState, Encoding, Ensure, Flag, Password, ResourceRef, Role,
    RoleAttribute, RoleFlags, RoleState,
};
pub use pgstate::pg::executor::{CommandExecutor, Invocation, Tool};
pub use pgstate::pg::introspect::{database_list_invocation, role_list_invocation};
pub use pgstate::pg::{introspect_databases, introspect_roles};
pub use pgstate::util::{Error, Result};
pub use std::cell::RefCell;
pub use std::fs;

pub const HASH: &str = "md559faa421729e846dd800dce59943bfc0";

pub fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {path}: {e}"))
}

/// Stands in for the PostgreSQL client programs.
///
/// Listing invocations return the scripted output; every other invocation
/// succeeds with empty output unless its rendered command line contains one of
/// the registered failure patterns.
#[derive(Default)]
pub struct FakeExecutor {
    role_list: String,
    database_list: String,
    failures: Vec<String>,
    failing_listings: Vec<Invocation>,
    invocations: RefCell<Vec<Invocation>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roles(mut self, output: &str) -> Self {
        self.role_list = output.to_string();
        self
    }

    pub fn with_databases(mut self, output: &str) -> Self {
        self.database_list = output.to_string();
        self
    }

    pub fn failing_on(mut self, pattern: &str) -> Self {
        self.failures.push(pattern.to_string());
        self
    }

    pub fn failing_role_list(mut self) -> Self {
        self.failing_listings.push(role_list_invocation());
        self
    }

    pub fn failing_database_list(mut self) -> Self {
        self.failing_listings.push(database_list_invocation());
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }

    /// Rendered command lines of everything except the two listings.
    pub fn mutations(&self) -> Vec<String> {
        let role_list = role_list_invocation();
        let database_list = database_list_invocation();
        self.invocations
            .borrow()
            .iter()
            .filter(|invocation| **invocation != role_list && **invocation != database_list)
            .map(ToString::to_string)
            .collect()
    }

    pub fn listing_count(&self) -> usize {
        self.invocations.borrow().len() - self.mutations().len()
    }
}

impl CommandExecutor for FakeExecutor {
    fn execute(&self, invocation: &Invocation) -> Result<String> {
        self.invocations.borrow_mut().push(invocation.clone());

        if self.failing_listings.contains(invocation) {
            return Err(Error::command_failure(
                invocation.to_string(),
                "psql: could not connect to server: No such file or directory",
            ));
        }

        if *invocation == role_list_invocation() {
            return Ok(self.role_list.clone());
        }
        if *invocation == database_list_invocation() {
            return Ok(self.database_list.clone());
        }

        let rendered = invocation.to_string();
        if self.failures.iter().any(|pattern| rendered.contains(pattern)) {
            return Err(Error::command_failure(
                rendered,
                "ERROR:  permission denied to create role",
            ));
        }
        Ok(String::new())
    }
}

/// Records every report it receives.
#[derive(Default)]
pub struct RecordingReporter {
    pub started: Vec<ResourceRef>,
    pub completed: Vec<ResourceReport>,
}

impl Reporter for RecordingReporter {
    fn on_resource_start(&mut self, resource: &ResourceRef) {
        self.started.push(resource.clone());
    }

    fn on_resource_complete(&mut self, report: &ResourceReport) {
        self.completed.push(report.clone());
    }
}

pub fn role(name: &str) -> ResourceRef {
    ResourceRef::Role(name.to_string())
}

pub fn database(name: &str) -> ResourceRef {
    ResourceRef::Database(name.to_string())
}
