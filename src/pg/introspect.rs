use crate::model::{
    Catalog, CurrentState, DatabaseState, Flag, Password, ResourceRef, RoleFlags, RoleState,
};
use crate::pg::executor::{CommandExecutor, Invocation, Tool};
use crate::util::Result;
use log::{debug, warn};
use regex::Regex;
use std::sync::LazyLock;

pub const ROLE_LIST_QUERY: &str = "select rolname, rolsuper, rolinherit, rolcreaterole, rolcreatedb, rolcanlogin, passwd from pg_roles left outer join pg_shadow on rolname = usename;";

static DATABASE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)\|(.*?)\|(.*?)\|(.*?)\|(.*?)\|").expect("database list pattern")
});

const ROLE_COLUMNS: usize = 6;

pub fn role_list_invocation() -> Invocation {
    Invocation::new(
        Tool::Psql,
        [
            "--no-password",
            "--no-align",
            "--tuples-only",
            "-c",
            ROLE_LIST_QUERY,
        ],
    )
}

pub fn database_list_invocation() -> Invocation {
    Invocation::new(
        Tool::Psql,
        ["--no-password", "--no-align", "--tuples-only", "--list"],
    )
}

pub fn introspect_roles(executor: &dyn CommandExecutor) -> Result<Vec<RoleState>> {
    let output = executor.execute(&role_list_invocation())?;
    let roles = parse_roles(&output);
    debug!("discovered {} role(s)", roles.len());
    Ok(roles)
}

pub fn introspect_databases(executor: &dyn CommandExecutor) -> Result<Vec<DatabaseState>> {
    let output = executor.execute(&database_list_invocation())?;
    let databases = parse_databases(&output);
    debug!("discovered {} database(s)", databases.len());
    Ok(databases)
}

/// Current state of one run, plus the listing failure of each kind that could not be discovered.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub state: CurrentState,
    pub role_error: Option<String>,
    pub database_error: Option<String>,
}

impl Discovery {
    /// Why the current state of `resource` is unknown, if it is.
    pub fn failure(&self, resource: &ResourceRef) -> Option<&str> {
        match resource {
            ResourceRef::Role(_) => self.role_error.as_deref(),
            ResourceRef::Database(_) => self.database_error.as_deref(),
        }
    }
}

/// Discovers current state for the resource kinds the catalog declares, one listing per kind.
///
/// A failed listing is recorded against its kind; the other kind is still discovered.
pub fn introspect_state(executor: &dyn CommandExecutor, catalog: &Catalog) -> Discovery {
    let (roles, role_error) = discover(!catalog.roles.is_empty(), || introspect_roles(executor));
    let (databases, database_error) =
        discover(!catalog.databases.is_empty(), || introspect_databases(executor));
    Discovery {
        state: CurrentState::from_records(roles, databases),
        role_error,
        database_error,
    }
}

fn discover<T>(wanted: bool, list: impl FnOnce() -> Result<Vec<T>>) -> (Vec<T>, Option<String>) {
    if !wanted {
        return (Vec::new(), None);
    }
    match list() {
        Ok(records) => (records, None),
        Err(error) => {
            warn!("discovery failed: {error}");
            (Vec::new(), Some(error.to_string()))
        }
    }
}

/// Parses unaligned, tuples-only output of [`ROLE_LIST_QUERY`].
///
/// Columns are split strictly on `|`, so an empty column keeps its position.
pub fn parse_roles(output: &str) -> Vec<RoleState> {
    let mut roles = Vec::new();
    for line in output_lines(output) {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() < ROLE_COLUMNS {
            debug!("skipping role list line with {} column(s): {line:?}", fields.len());
            continue;
        }
        let password = match fields.get(6) {
            Some(hash) if !hash.is_empty() => Password::Hash((*hash).to_string()),
            _ => Password::NoPassword,
        };
        roles.push(RoleState {
            name: fields[0].to_string(),
            password,
            flags: RoleFlags {
                superuser: pg_bool(fields[1]),
                inherit: pg_bool(fields[2]),
                createrole: pg_bool(fields[3]),
                createdb: pg_bool(fields[4]),
                login: pg_bool(fields[5]),
            },
        });
    }
    roles
}

/// Parses unaligned, tuples-only `psql --list` output.
///
/// Only the first five columns are read. Lines that do not carry them (headers,
/// footers, wrapped access privileges) are skipped. A name or owner containing
/// `|` cannot be told apart from a column boundary.
pub fn parse_databases(output: &str) -> Vec<DatabaseState> {
    output_lines(output)
        .filter_map(|line| {
            let Some(captures) = DATABASE_LINE.captures(line) else {
                debug!("skipping database list line: {line:?}");
                return None;
            };
            Some(DatabaseState {
                name: captures[1].to_string(),
                owner: captures[2].to_string(),
                encoding: captures[3].to_string(),
                collate: captures[4].to_string(),
                ctype: captures[5].to_string(),
            })
        })
        .collect()
}

fn output_lines(output: &str) -> impl Iterator<Item = &str> {
    output
        .split_terminator('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

fn pg_bool(field: &str) -> Flag {
    Flag::from(field == "t")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_role_list() {
        let output = "postgres|t|t|t|t|t|\nfoobar|f|t|f|f|t|md559faa421729e846dd800dce59943bfc0\n";
        let roles = parse_roles(output);
        assert_eq!(roles.len(), 2);

        assert_eq!(roles[0].name, "postgres");
        assert_eq!(roles[0].password, Password::NoPassword);
        assert_eq!(
            roles[0].flags,
            RoleFlags {
                superuser: Flag::True,
                createdb: Flag::True,
                createrole: Flag::True,
                inherit: Flag::True,
                login: Flag::True,
            }
        );

        assert_eq!(roles[1].name, "foobar");
        assert_eq!(
            roles[1].password,
            Password::Hash("md559faa421729e846dd800dce59943bfc0".to_string())
        );
        assert_eq!(roles[1].flags.superuser, Flag::False);
        assert_eq!(roles[1].flags.createdb, Flag::False);
        assert_eq!(roles[1].flags.createrole, Flag::False);
        assert_eq!(roles[1].flags.inherit, Flag::True);
        assert_eq!(roles[1].flags.login, Flag::True);
    }

    #[test]
    fn trailing_newline_adds_no_role() {
        assert_eq!(parse_roles("postgres|t|t|t|t|t|\n\n").len(), 1);
        assert!(parse_roles("").is_empty());
    }

    #[test]
    fn empty_columns_keep_their_position() {
        let roles = parse_roles("app||t||t|f|md5abc");
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].flags.superuser, Flag::False);
        assert_eq!(roles[0].flags.inherit, Flag::True);
        assert_eq!(roles[0].flags.createrole, Flag::False);
        assert_eq!(roles[0].flags.createdb, Flag::True);
        assert_eq!(roles[0].flags.login, Flag::False);
        assert_eq!(roles[0].password, Password::Hash("md5abc".to_string()));
    }

    #[test]
    fn only_literal_t_is_true() {
        let roles = parse_roles("app|true|T|1|yes|f|");
        for attribute in crate::model::RoleAttribute::ALL {
            assert_eq!(roles[0].flags.get(attribute), Flag::False);
        }
    }

    #[test]
    fn crlf_line_endings_are_stripped() {
        let roles = parse_roles("app|f|f|f|f|t|md5abc\r\n");
        assert_eq!(roles[0].password, Password::Hash("md5abc".to_string()));
    }

    #[test]
    fn short_role_lines_are_skipped() {
        assert!(parse_roles("(0 rows)\n").is_empty());
    }

    #[test]
    fn parses_database_list_ignoring_trailing_columns() {
        let output = "postgres|postgres|UTF8|de_DE.utf8|de_DE.utf8|\n";
        let databases = parse_databases(output);
        assert_eq!(
            databases,
            vec![DatabaseState {
                name: "postgres".to_string(),
                owner: "postgres".to_string(),
                encoding: "UTF8".to_string(),
                collate: "de_DE.utf8".to_string(),
                ctype: "de_DE.utf8".to_string(),
            }]
        );

        let icu = parse_databases("app|app|UTF8|C|C|libc|||=Tc/app");
        assert_eq!(icu.len(), 1);
        assert_eq!(icu[0].ctype, "C");
    }

    #[test]
    fn malformed_database_lines_are_skipped() {
        let output = "List of databases\n\
                      postgres|postgres|UTF8|C|C|\n\
                      template0|postgres|UTF8|C|C|=c/postgres\n\
                      postgres=CTc/postgres\n\
                      (2 rows)\n";
        let names: Vec<_> = parse_databases(output)
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, ["postgres", "template0"]);
    }

    struct FailingDatabaseList;

    impl CommandExecutor for FailingDatabaseList {
        fn execute(&self, invocation: &Invocation) -> Result<String> {
            if invocation.args.iter().any(|arg| arg == "--list") {
                return Err(crate::util::Error::command_failure(
                    invocation.to_string(),
                    "psql: could not connect to server",
                ));
            }
            Ok("app|f|t|f|f|t|\n".to_string())
        }
    }

    #[test]
    fn failed_listing_is_recorded_against_its_kind_only() {
        let mut catalog = Catalog::new();
        catalog.add_role(crate::model::Role::new("app").unwrap()).unwrap();
        catalog
            .add_database(crate::model::Database::new("other").unwrap())
            .unwrap();

        let discovery = introspect_state(&FailingDatabaseList, &catalog);
        assert!(discovery.state.roles.contains_key("app"));
        assert_eq!(discovery.failure(&ResourceRef::Role("app".to_string())), None);
        let failure = discovery
            .failure(&ResourceRef::Database("other".to_string()))
            .unwrap();
        assert!(failure.contains("could not connect"));
    }

    #[test]
    fn role_list_invocation_uses_tuples_only_flags() {
        let invocation = role_list_invocation();
        assert_eq!(invocation.tool, Tool::Psql);
        assert_eq!(
            &invocation.args[..4],
            ["--no-password", "--no-align", "--tuples-only", "-c"]
        );
        assert_eq!(invocation.sql(), Some(ROLE_LIST_QUERY));
    }

    #[test]
    fn database_list_invocation() {
        assert_eq!(
            super::database_list_invocation().args,
            ["--no-password", "--no-align", "--tuples-only", "--list"]
        );
    }
}
