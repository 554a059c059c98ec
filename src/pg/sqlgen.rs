use crate::diff::{Change, RoleAlteration};
use crate::model::{Database, Password, Role, RoleAttribute};
use crate::pg::executor::{Invocation, Tool};

pub fn generate_invocations(changes: &[Change]) -> Vec<Invocation> {
    changes.iter().map(generate_invocation).collect()
}

pub fn generate_invocation(change: &Change) -> Invocation {
    match change {
        Change::CreateRole(role) => psql_statement(generate_create_role(role)),
        Change::DropRole { name } => psql_statement(generate_drop_role(name)),
        Change::AlterRole { name, alteration } => {
            psql_statement(generate_alter_role(name, alteration))
        }
        Change::CreateDatabase(database) => {
            Invocation::new(Tool::Createdb, generate_createdb_args(database))
        }
        Change::DropDatabase { name } => {
            Invocation::new(Tool::Dropdb, ["--no-password".to_string(), name.clone()])
        }
    }
}

/// The SQL statement for a role change; `None` for database changes, which use `createdb`/`dropdb`.
pub fn generate_role_sql(change: &Change) -> Option<String> {
    match change {
        Change::CreateRole(role) => Some(generate_create_role(role)),
        Change::DropRole { name } => Some(generate_drop_role(name)),
        Change::AlterRole { name, alteration } => Some(generate_alter_role(name, alteration)),
        Change::CreateDatabase(_) | Change::DropDatabase { .. } => None,
    }
}

fn psql_statement(sql: String) -> Invocation {
    Invocation::new(Tool::Psql, ["--no-password".to_string(), "-c".to_string(), sql])
}

fn generate_create_role(role: &Role) -> String {
    let mut sql = format!("CREATE ROLE {}", quote_ident(&role.name));

    for attribute in RoleAttribute::ALL {
        if let Some(enabled) = role.flags.get(attribute).as_bool() {
            sql.push(' ');
            sql.push_str(attribute.keyword(enabled));
        }
    }

    // Hashes are validated against ^md5[0-9a-f]+$ and passed through verbatim.
    if let Some(Password::Hash(hash)) = &role.password {
        sql.push_str(&format!(" ENCRYPTED PASSWORD '{hash}'"));
    }

    sql.push(';');
    sql
}

fn generate_drop_role(name: &str) -> String {
    format!("DROP ROLE {};", quote_ident(name))
}

fn generate_alter_role(name: &str, alteration: &RoleAlteration) -> String {
    let name = quote_ident(name);
    match alteration {
        RoleAlteration::Password(Password::NoPassword) => {
            format!("ALTER ROLE {name} PASSWORD NULL;")
        }
        RoleAlteration::Password(Password::Hash(hash)) => {
            format!("ALTER ROLE {name} ENCRYPTED PASSWORD '{hash}';")
        }
        RoleAlteration::Flag { attribute, enabled } => {
            format!("ALTER ROLE {name} {};", attribute.keyword(*enabled))
        }
    }
}

fn generate_createdb_args(database: &Database) -> Vec<String> {
    let mut args = vec!["--no-password".to_string()];
    if let Some(encoding) = database.encoding {
        args.push(format!("--encoding={encoding}"));
    }
    if let Some(collate) = &database.collate {
        args.push(format!("--lc-collate={collate}"));
    }
    if let Some(ctype) = &database.ctype {
        args.push(format!("--lc-ctype={ctype}"));
    }
    if let Some(owner) = &database.owner {
        args.push(format!("--owner={owner}"));
    }
    args.push(database.name.clone());
    args
}

pub fn quote_ident(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
