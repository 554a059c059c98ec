use super::{validate_name, Ensure, Flag};
use crate::util::{Error, Result};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::str::FromStr;
use std::sync::LazyLock;

static PASSWORD_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^md5[0-9a-f]+$").expect("password hash pattern"));

/// A role password as stored by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Password {
    /// No password set (`absent`).
    NoPassword,
    /// A pre-computed `md5` salted hash, used verbatim.
    Hash(String),
}

impl Password {
    /// Accepts `absent` or an `md5` hash. Plain-text passwords are refused, never hashed implicitly.
    pub fn parse(value: &str) -> Result<Self> {
        if value == "absent" {
            return Ok(Password::NoPassword);
        }
        if PASSWORD_HASH.is_match(value) {
            return Ok(Password::Hash(value.to_string()));
        }
        Err(Error::validation(
            "Passing a password in plain text is invalid. \
             The password has to be specified as a hash and must start with 'md5'",
        ))
    }

    pub fn hash(&self) -> Option<&str> {
        match self {
            Password::NoPassword => None,
            Password::Hash(hash) => Some(hash),
        }
    }
}

impl FromStr for Password {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Password::parse(value)
    }
}

impl Serialize for Password {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.hash().unwrap_or("absent"))
    }
}

/// Boolean role attributes, in the order they appear in `CREATE ROLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoleAttribute {
    Superuser,
    Createdb,
    Createrole,
    Inherit,
    Login,
}

impl RoleAttribute {
    pub const ALL: [RoleAttribute; 5] = [
        RoleAttribute::Superuser,
        RoleAttribute::Createdb,
        RoleAttribute::Createrole,
        RoleAttribute::Inherit,
        RoleAttribute::Login,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RoleAttribute::Superuser => "superuser",
            RoleAttribute::Createdb => "createdb",
            RoleAttribute::Createrole => "createrole",
            RoleAttribute::Inherit => "inherit",
            RoleAttribute::Login => "login",
        }
    }

    /// SQL keyword granting the attribute.
    pub fn enabled_keyword(self) -> &'static str {
        match self {
            RoleAttribute::Superuser => "SUPERUSER",
            RoleAttribute::Createdb => "CREATEDB",
            RoleAttribute::Createrole => "CREATEROLE",
            RoleAttribute::Inherit => "INHERIT",
            RoleAttribute::Login => "LOGIN",
        }
    }

    /// SQL keyword revoking the attribute.
    pub fn disabled_keyword(self) -> &'static str {
        match self {
            RoleAttribute::Superuser => "NOSUPERUSER",
            RoleAttribute::Createdb => "NOCREATEDB",
            RoleAttribute::Createrole => "NOCREATEROLE",
            RoleAttribute::Inherit => "NOINHERIT",
            RoleAttribute::Login => "NOLOGIN",
        }
    }

    pub fn keyword(self, enabled: bool) -> &'static str {
        if enabled {
            self.enabled_keyword()
        } else {
            self.disabled_keyword()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct RoleFlags {
    pub superuser: Flag,
    pub createdb: Flag,
    pub createrole: Flag,
    pub inherit: Flag,
    pub login: Flag,
}

impl RoleFlags {
    pub fn get(&self, attribute: RoleAttribute) -> Flag {
        match attribute {
            RoleAttribute::Superuser => self.superuser,
            RoleAttribute::Createdb => self.createdb,
            RoleAttribute::Createrole => self.createrole,
            RoleAttribute::Inherit => self.inherit,
            RoleAttribute::Login => self.login,
        }
    }

    pub fn set(&mut self, attribute: RoleAttribute, value: Flag) {
        let slot = match attribute {
            RoleAttribute::Superuser => &mut self.superuser,
            RoleAttribute::Createdb => &mut self.createdb,
            RoleAttribute::Createrole => &mut self.createrole,
            RoleAttribute::Inherit => &mut self.inherit,
            RoleAttribute::Login => &mut self.login,
        };
        *slot = value;
    }
}

/// Desired state of a role. `password: None` leaves the password unmanaged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    pub ensure: Ensure,
    pub password: Option<Password>,
    pub flags: RoleFlags,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name("role", &name)?;
        Ok(Self {
            name,
            ensure: Ensure::Present,
            password: None,
            flags: RoleFlags::default(),
        })
    }

    pub fn with_ensure(mut self, ensure: Ensure) -> Self {
        self.ensure = ensure;
        self
    }

    pub fn with_password(mut self, password: Password) -> Self {
        self.password = Some(password);
        self
    }

    pub fn with_flag(mut self, attribute: RoleAttribute, value: impl Into<Flag>) -> Self {
        self.flags.set(attribute, value.into());
        self
    }
}

/// A role as reported by the server. Flags are always explicit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleState {
    pub name: String,
    pub password: Password,
    #[serde(flatten)]
    pub flags: RoleFlags,
}
