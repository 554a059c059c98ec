use super::{validate_name, Ensure};
use crate::util::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Character encodings a managed database may be created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Encoding {
    #[serde(rename = "LATIN1")]
    Latin1,
    #[serde(rename = "LATIN9")]
    Latin9,
    #[serde(rename = "UTF8")]
    Utf8,
}

impl Encoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Encoding::Latin1 => "LATIN1",
            Encoding::Latin9 => "LATIN9",
            Encoding::Utf8 => "UTF8",
        }
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_uppercase().as_str() {
            "LATIN1" => Ok(Encoding::Latin1),
            "LATIN9" => Ok(Encoding::Latin9),
            "UTF8" => Ok(Encoding::Utf8),
            _ => Err(Error::validation(format!(
                "{value:?} for encoding (expected LATIN1, LATIN9 or UTF8)"
            ))),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired state of a database. Unset attributes are left to the server defaults on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Database {
    pub name: String,
    pub ensure: Ensure,
    pub owner: Option<String>,
    pub encoding: Option<Encoding>,
    pub collate: Option<String>,
    pub ctype: Option<String>,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name("database", &name)?;
        Ok(Self {
            name,
            ensure: Ensure::Present,
            owner: None,
            encoding: None,
            collate: None,
            ctype: None,
        })
    }

    pub fn with_ensure(mut self, ensure: Ensure) -> Self {
        self.ensure = ensure;
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn with_collate(mut self, collate: impl Into<String>) -> Self {
        self.collate = Some(collate.into());
        self
    }

    pub fn with_ctype(mut self, ctype: impl Into<String>) -> Self {
        self.ctype = Some(ctype.into());
        self
    }
}

/// A database as reported by `psql --list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseState {
    pub name: String,
    pub owner: String,
    pub encoding: String,
    pub collate: String,
    pub ctype: String,
}
