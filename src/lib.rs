//! pgstate - declarative management of PostgreSQL roles and databases.
//!
//! Desired state is declared in JSON manifests, compared against what the
//! server reports through `psql`, and converged with the standard client tools.
//!
//! # Quick Start
//!
//! ```no_run
//! use pgstate::prelude::*;
//!
//! let catalog = load_manifest_sources(&["manifests/".to_string()]).unwrap();
//! let executor = SystemExecutor::new(ExecutorConfig::default());
//! let result = apply_catalog(&executor, &catalog, &ApplyOptions::default(), &mut NoReport).unwrap();
//!
//! println!("{} change(s) applied", result.summary.total_changes());
//! ```
//!
//! # Modules
//!
//! - [`model`] - Desired and current state records (roles, databases)
//! - [`manifest`] - JSON manifest loading
//! - [`pg`] - Client program execution, discovery and command generation
//! - [`diff`] - State comparison and dependency ordering
//! - [`apply`] - Reconciliation driver
//! - [`drift`] - Read-only comparison reports
//! - [`password`] - `md5` password hashing

pub mod apply;
pub mod diff;
pub mod drift;
pub mod manifest;
pub mod model;
pub mod password;
pub mod pg;
pub mod prelude;
pub mod util;

pub use util::{Error, Result};
