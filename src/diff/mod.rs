pub mod planner;

use crate::model::{
    Catalog, CurrentState, Database, DatabaseState, Encoding, Ensure, Flag, Password,
    ResourceRef, Role, RoleAttribute, RoleState,
};
use crate::util::{Error, Result};

/// One corrective action against the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    CreateRole(Role),
    DropRole {
        name: String,
    },
    AlterRole {
        name: String,
        alteration: RoleAlteration,
    },
    CreateDatabase(Database),
    DropDatabase {
        name: String,
    },
}

/// A single-attribute role change. Each one becomes its own `ALTER ROLE` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleAlteration {
    Password(Password),
    Flag {
        attribute: RoleAttribute,
        enabled: bool,
    },
}

impl Change {
    pub fn resource(&self) -> ResourceRef {
        match self {
            Change::CreateRole(role) => ResourceRef::Role(role.name.clone()),
            Change::DropRole { name } | Change::AlterRole { name, .. } => {
                ResourceRef::Role(name.clone())
            }
            Change::CreateDatabase(database) => ResourceRef::Database(database.name.clone()),
            Change::DropDatabase { name } => ResourceRef::Database(name.clone()),
        }
    }
}

/// Changes needed to bring a role from `current` (`None` when missing) to `desired`.
pub fn diff_role(desired: &Role, current: Option<&RoleState>) -> Vec<Change> {
    match (desired.ensure, current) {
        (Ensure::Absent, None) => Vec::new(),
        (Ensure::Absent, Some(_)) => vec![Change::DropRole {
            name: desired.name.clone(),
        }],
        (Ensure::Present, None) => vec![Change::CreateRole(desired.clone())],
        (Ensure::Present, Some(current)) => diff_role_attributes(desired, current),
    }
}

fn diff_role_attributes(desired: &Role, current: &RoleState) -> Vec<Change> {
    let mut alterations = Vec::new();

    if let Some(password) = &desired.password {
        if *password != current.password {
            alterations.push(RoleAlteration::Password(password.clone()));
        }
    }

    for attribute in RoleAttribute::ALL {
        let Some(enabled) = desired.flags.get(attribute).as_bool() else {
            continue;
        };
        if current.flags.get(attribute) != Flag::from(enabled) {
            alterations.push(RoleAlteration::Flag { attribute, enabled });
        }
    }

    alterations
        .into_iter()
        .map(|alteration| Change::AlterRole {
            name: desired.name.clone(),
            alteration,
        })
        .collect()
}

/// Changes needed to bring a database from `current` to `desired`.
///
/// Owner, encoding and locales are fixed at creation; a divergence on an existing
/// database is an [`Error::UnsupportedMutation`] rather than a drop and recreate.
pub fn diff_database(desired: &Database, current: Option<&DatabaseState>) -> Result<Vec<Change>> {
    match (desired.ensure, current) {
        (Ensure::Absent, None) => Ok(Vec::new()),
        (Ensure::Absent, Some(_)) => Ok(vec![Change::DropDatabase {
            name: desired.name.clone(),
        }]),
        (Ensure::Present, None) => Ok(vec![Change::CreateDatabase(desired.clone())]),
        (Ensure::Present, Some(current)) => {
            check_immutable_attributes(desired, current)?;
            Ok(Vec::new())
        }
    }
}

fn check_immutable_attributes(desired: &Database, current: &DatabaseState) -> Result<()> {
    let attributes = [
        ("owner", desired.owner.as_deref(), current.owner.as_str()),
        (
            "encoding",
            desired.encoding.map(Encoding::as_str),
            current.encoding.as_str(),
        ),
        ("collate", desired.collate.as_deref(), current.collate.as_str()),
        ("ctype", desired.ctype.as_deref(), current.ctype.as_str()),
    ];

    for (attribute, wanted, actual) in attributes {
        match wanted {
            Some(wanted) if wanted != actual => {
                return Err(Error::UnsupportedMutation {
                    database: desired.name.clone(),
                    attribute,
                });
            }
            _ => {}
        }
    }
    Ok(())
}

/// Changes for one resource of the catalog, looked up in `current` by name.
pub fn diff_resource(
    catalog: &Catalog,
    current: &CurrentState,
    resource: &ResourceRef,
) -> Result<Vec<Change>> {
    match resource {
        ResourceRef::Role(name) => {
            let desired = catalog.roles.get(name).ok_or_else(|| unknown(resource))?;
            Ok(diff_role(desired, current.roles.get(name)))
        }
        ResourceRef::Database(name) => {
            let desired = catalog
                .databases
                .get(name)
                .ok_or_else(|| unknown(resource))?;
            diff_database(desired, current.databases.get(name))
        }
    }
}

fn unknown(resource: &ResourceRef) -> Error {
    Error::manifest(format!("{resource} is not part of the catalog"))
}
