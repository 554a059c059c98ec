//! JSON manifests describing desired roles and databases.

use crate::model::{Catalog, Database, Encoding, Ensure, Flag, Password, Role, RoleAttribute};
use crate::util::{Error, Result};
use glob::glob;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub roles: Vec<RoleEntry>,
    #[serde(default)]
    pub databases: Vec<DatabaseEntry>,
}

/// A boolean attribute as written in a manifest: a JSON boolean or one of the
/// tokens `true`, `yes`, `false`, `no`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FlagToken {
    Bool(bool),
    Text(String),
}

impl FlagToken {
    fn to_flag(&self, attribute: RoleAttribute) -> Result<Flag> {
        match self {
            FlagToken::Bool(value) => Ok(Flag::from(*value)),
            FlagToken::Text(token) => Flag::parse(attribute.name(), token),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleEntry {
    pub name: String,
    pub ensure: Option<String>,
    pub password: Option<String>,
    pub superuser: Option<FlagToken>,
    pub createdb: Option<FlagToken>,
    pub createrole: Option<FlagToken>,
    pub inherit: Option<FlagToken>,
    pub login: Option<FlagToken>,
}

impl RoleEntry {
    fn flag(&self, attribute: RoleAttribute) -> Option<&FlagToken> {
        match attribute {
            RoleAttribute::Superuser => self.superuser.as_ref(),
            RoleAttribute::Createdb => self.createdb.as_ref(),
            RoleAttribute::Createrole => self.createrole.as_ref(),
            RoleAttribute::Inherit => self.inherit.as_ref(),
            RoleAttribute::Login => self.login.as_ref(),
        }
    }
}

impl TryFrom<RoleEntry> for Role {
    type Error = Error;

    fn try_from(entry: RoleEntry) -> Result<Self> {
        let label = format!("Role[{}]", entry.name);
        build_role(&entry).map_err(|error| qualify(&label, error))
    }
}

fn build_role(entry: &RoleEntry) -> Result<Role> {
    let mut role = Role::new(entry.name.clone())?;
    if let Some(ensure) = &entry.ensure {
        role = role.with_ensure(ensure.parse::<Ensure>()?);
    }
    if let Some(password) = &entry.password {
        role = role.with_password(Password::parse(password)?);
    }
    for attribute in RoleAttribute::ALL {
        if let Some(token) = entry.flag(attribute) {
            role = role.with_flag(attribute, token.to_flag(attribute)?);
        }
    }
    Ok(role)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseEntry {
    pub name: String,
    pub ensure: Option<String>,
    pub owner: Option<String>,
    pub encoding: Option<String>,
    pub collate: Option<String>,
    pub ctype: Option<String>,
}

impl TryFrom<DatabaseEntry> for Database {
    type Error = Error;

    fn try_from(entry: DatabaseEntry) -> Result<Self> {
        let label = format!("Database[{}]", entry.name);
        build_database(entry).map_err(|error| qualify(&label, error))
    }
}

fn build_database(entry: DatabaseEntry) -> Result<Database> {
    let mut database = Database::new(entry.name)?;
    if let Some(ensure) = entry.ensure {
        database = database.with_ensure(ensure.parse::<Ensure>()?);
    }
    if let Some(owner) = entry.owner {
        database = database.with_owner(owner);
    }
    if let Some(encoding) = entry.encoding {
        database = database.with_encoding(encoding.parse::<Encoding>()?);
    }
    if let Some(collate) = entry.collate {
        database = database.with_collate(collate);
    }
    if let Some(ctype) = entry.ctype {
        database = database.with_ctype(ctype);
    }
    Ok(database)
}

fn qualify(label: &str, error: Error) -> Error {
    match error {
        Error::Validation { message } => Error::validation(format!("{label}: {message}")),
        other => other,
    }
}

impl Manifest {
    /// Validates every entry and collects them into a catalog.
    pub fn into_catalog(self) -> Result<Catalog> {
        let mut catalog = Catalog::new();
        for entry in self.roles {
            catalog.add_role(Role::try_from(entry)?)?;
        }
        for entry in self.databases {
            catalog.add_database(Database::try_from(entry)?)?;
        }
        Ok(catalog)
    }
}

pub fn parse_manifest_str(content: &str) -> Result<Catalog> {
    let manifest: Manifest = serde_json::from_str(content)
        .map_err(|e| Error::manifest(format!("Invalid manifest: {e}")))?;
    manifest.into_catalog()
}

pub fn load_manifest_file(path: &Path) -> Result<Catalog> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::manifest(format!("Cannot read {}: {e}", path.display())))?;
    parse_manifest_str(&content).map_err(|error| match error {
        Error::Manifest { message } => Error::manifest(format!("{}: {message}", path.display())),
        other => other,
    })
}

/// Load manifests from multiple sources (files, directories, glob patterns).
/// Returns the merged catalog; a resource declared in two documents is an error.
pub fn load_manifest_sources(sources: &[String]) -> Result<Catalog> {
    let mut files: Vec<PathBuf> = Vec::new();
    for source in sources {
        for path in resolve_source(source)? {
            if !files.contains(&path) {
                files.push(path);
            }
        }
    }

    let mut catalog = Catalog::new();
    for file in &files {
        debug!("loading manifest {}", file.display());
        catalog.merge(load_manifest_file(file)?)?;
    }
    Ok(catalog)
}

fn resolve_source(source: &str) -> Result<Vec<PathBuf>> {
    let path = Path::new(source);

    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    if path.is_dir() {
        let pattern = path.join("**/*.json");
        return resolve_glob(pattern.to_str().unwrap_or(source));
    }

    resolve_glob(source)
}

fn resolve_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries =
        glob(pattern).map_err(|e| Error::manifest(format!("Invalid glob pattern: {e}")))?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::manifest(format!("Glob error: {e}")))?;
        if path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(Error::manifest(format!(
            "No manifest files found matching pattern: {pattern}"
        )));
    }

    files.sort();
    Ok(files)
}
