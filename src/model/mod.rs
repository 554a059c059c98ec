//! Desired-state and current-state records for roles and databases.

mod database;
mod role;

pub use database::{Database, DatabaseState, Encoding};
pub use role::{Password, Role, RoleAttribute, RoleFlags, RoleState};

use crate::util::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Desired lifecycle state of a resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

impl Ensure {
    pub fn as_str(self) -> &'static str {
        match self {
            Ensure::Present => "present",
            Ensure::Absent => "absent",
        }
    }
}

impl FromStr for Ensure {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "present" => Ok(Ensure::Present),
            "absent" => Ok(Ensure::Absent),
            other => Err(Error::validation(format!(
                "{other:?} for ensure (expected present or absent)"
            ))),
        }
    }
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tri-state boolean attribute.
///
/// `Unspecified` leaves the attribute unmanaged: it is omitted from `CREATE ROLE`
/// and never compared against the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Flag {
    #[default]
    Unspecified,
    True,
    False,
}

impl Flag {
    /// Parses a boolean token for the named attribute.
    pub fn parse(attribute: &str, token: &str) -> Result<Self> {
        match token {
            "true" | "yes" => Ok(Flag::True),
            "false" | "no" => Ok(Flag::False),
            other => Err(Error::validation(format!(
                "{other:?} for {attribute}, expected a boolean value (true, yes, false or no)"
            ))),
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Flag::Unspecified => None,
            Flag::True => Some(true),
            Flag::False => Some(false),
        }
    }

    pub fn is_specified(self) -> bool {
        self != Flag::Unspecified
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        if value {
            Flag::True
        } else {
            Flag::False
        }
    }
}

/// Identifies one desired-state record in a catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum ResourceRef {
    Role(String),
    Database(String),
}

impl ResourceRef {
    pub fn name(&self) -> &str {
        match self {
            ResourceRef::Role(name) | ResourceRef::Database(name) => name,
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::Role(name) => write!(f, "Role[{name}]"),
            ResourceRef::Database(name) => write!(f, "Database[{name}]"),
        }
    }
}

/// The set of desired-state records for one run, keyed by name within each kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub roles: BTreeMap<String, Role>,
    pub databases: BTreeMap<String, Database>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_role(&mut self, role: Role) -> Result<()> {
        if self.roles.contains_key(&role.name) {
            return Err(Error::manifest(format!(
                "role {:?} is declared more than once",
                role.name
            )));
        }
        self.roles.insert(role.name.clone(), role);
        Ok(())
    }

    pub fn add_database(&mut self, database: Database) -> Result<()> {
        if self.databases.contains_key(&database.name) {
            return Err(Error::manifest(format!(
                "database {:?} is declared more than once",
                database.name
            )));
        }
        self.databases.insert(database.name.clone(), database);
        Ok(())
    }

    /// Merges another catalog into this one, rejecting names declared in both.
    pub fn merge(&mut self, other: Catalog) -> Result<()> {
        for role in other.roles.into_values() {
            self.add_role(role)?;
        }
        for database in other.databases.into_values() {
            self.add_database(database)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.roles.len() + self.databases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.databases.is_empty()
    }
}

/// Current state discovered from the server for one run, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentState {
    pub roles: BTreeMap<String, RoleState>,
    pub databases: BTreeMap<String, DatabaseState>,
}

impl CurrentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(
        roles: impl IntoIterator<Item = RoleState>,
        databases: impl IntoIterator<Item = DatabaseState>,
    ) -> Self {
        Self {
            roles: roles.into_iter().map(|r| (r.name.clone(), r)).collect(),
            databases: databases.into_iter().map(|d| (d.name.clone(), d)).collect(),
        }
    }
}

fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::validation(format!("empty {kind} name")));
    }
    Ok(())
}
