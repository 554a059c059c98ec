//! Convenient re-exports for common pgstate usage.
//!
//! # Example
//!
//! ```no_run
//! use pgstate::prelude::*;
//!
//! let catalog = load_manifest_sources(&["roles.json".to_string()]).unwrap();
//! let executor = SystemExecutor::new(ExecutorConfig::default());
//! let report = detect_drift(&executor, &catalog).unwrap();
//!
//! println!("drift: {}", report.has_drift);
//! ```

// Operations
pub use crate::apply::{apply_catalog, reconcile_database, reconcile_role};
pub use crate::drift::detect_drift;
pub use crate::manifest::{load_manifest_sources, parse_manifest_str};
pub use crate::password::postgresql_password;

// Options and results
pub use crate::apply::{ApplyOptions, ApplyResult, ApplySummary, NoReport, Outcome, Reporter};
pub use crate::drift::DriftReport;

// Execution
pub use crate::pg::{CommandExecutor, ExecutorConfig, Invocation, SystemExecutor, Tool};

// Core types
pub use crate::diff::Change;
pub use crate::model::{
    Catalog, Database, Encoding, Ensure, Flag, Password, ResourceRef, Role, RoleAttribute,
};

// Error types
pub use crate::util::Error;
