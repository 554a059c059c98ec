use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pgstate::apply::{apply_catalog, ApplyOptions, NoReport, Outcome, Reporter, ResourceReport};
use pgstate::drift::detect_drift;
use pgstate::manifest::load_manifest_sources;
use pgstate::password::postgresql_password;
use pgstate::pg::{introspect_databases, introspect_roles, ExecutorConfig, SystemExecutor};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pgstate")]
#[command(about = "Declarative PostgreSQL role and database management", long_about = None)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    tools: ToolArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ToolArgs {
    /// Path to psql
    #[arg(long, global = true, env = "PGSTATE_PSQL", default_value = "/usr/bin/psql")]
    psql: PathBuf,

    /// Path to createdb
    #[arg(long, global = true, env = "PGSTATE_CREATEDB", default_value = "/usr/bin/createdb")]
    createdb: PathBuf,

    /// Path to dropdb
    #[arg(long, global = true, env = "PGSTATE_DROPDB", default_value = "/usr/bin/dropdb")]
    dropdb: PathBuf,

    /// Account the client programs run as, through sudo
    #[arg(long, global = true, env = "PGSTATE_RUN_AS", default_value = "postgres")]
    run_as: String,

    /// Run the client programs as the invoking user instead
    #[arg(long, global = true)]
    current_user: bool,
}

impl ToolArgs {
    fn executor_config(&self) -> ExecutorConfig {
        let run_as = (!self.current_user).then(|| self.run_as.clone());
        ExecutorConfig::default()
            .with_psql(self.psql.clone())
            .with_createdb(self.createdb.clone())
            .with_dropdb(self.dropdb.clone())
            .with_run_as(run_as)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the commands needed to reach the manifest's state
    Plan {
        #[arg(short, long = "manifest", required = true)]
        manifests: Vec<String>,
    },

    /// Reconcile the server with the manifest
    Apply {
        #[arg(short, long = "manifest", required = true)]
        manifests: Vec<String>,
        #[arg(long)]
        dry_run: bool,
    },

    /// Report resources that differ from the manifest as JSON
    Drift {
        #[arg(short, long = "manifest", required = true)]
        manifests: Vec<String>,
    },

    /// Print the server's current roles or databases as JSON
    List {
        #[arg(value_enum)]
        kind: ListKind,
    },

    /// Print the md5 hash PostgreSQL stores for a password
    Password {
        username: String,
        #[arg(env = "PGSTATE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ListKind {
    Roles,
    Databases,
}

pub fn run(cli: Cli) -> Result<ExitCode> {
    let executor = SystemExecutor::new(cli.tools.executor_config());

    match cli.command {
        Commands::Plan { manifests } => {
            let catalog = load_manifest_sources(&manifests)?;
            let result = apply_catalog(
                &executor,
                &catalog,
                &ApplyOptions { dry_run: true },
                &mut NoReport,
            )?;
            for report in &result.reports {
                if let Outcome::Failed { error } = &report.outcome {
                    println!("-- {}: {error}", report.resource);
                }
                for command in &report.commands {
                    println!("{command}");
                }
            }
            Ok(exit_code(result.summary.is_success()))
        }
        Commands::Apply { manifests, dry_run } => {
            let catalog = load_manifest_sources(&manifests)?;
            let mut reporter = TextReporter { quiet: cli.quiet };
            let result = apply_catalog(&executor, &catalog, &ApplyOptions { dry_run }, &mut reporter)?;
            let summary = &result.summary;
            if dry_run {
                println!(
                    "Dry run: {} pending, {} unchanged, {} failed, {} skipped",
                    summary.pending, summary.unchanged, summary.failed, summary.skipped
                );
            } else {
                println!(
                    "Applied: {} created, {} modified, {} removed, {} unchanged, {} failed, {} skipped",
                    summary.created,
                    summary.modified,
                    summary.removed,
                    summary.unchanged,
                    summary.failed,
                    summary.skipped
                );
            }
            Ok(exit_code(summary.is_success()))
        }
        Commands::Drift { manifests } => {
            let catalog = load_manifest_sources(&manifests)?;
            let report = detect_drift(&executor, &catalog)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(exit_code(!report.has_drift))
        }
        Commands::List { kind } => {
            let json = match kind {
                ListKind::Roles => serde_json::to_string_pretty(&introspect_roles(&executor)?)?,
                ListKind::Databases => {
                    serde_json::to_string_pretty(&introspect_databases(&executor)?)?
                }
            };
            println!("{json}");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Password { username, password } => {
            let Some(password) = password else {
                bail!("no password given (pass it as an argument or set PGSTATE_PASSWORD)");
            };
            println!("{}", postgresql_password(&username, &password));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Prints one line per resource as reconciliation proceeds.
struct TextReporter {
    quiet: bool,
}

impl Reporter for TextReporter {
    fn on_resource_complete(&mut self, report: &ResourceReport) {
        let status = match &report.outcome {
            Outcome::NoChange if self.quiet => return,
            Outcome::NoChange => "unchanged".to_string(),
            Outcome::Created => "created".to_string(),
            Outcome::Modified => "modified".to_string(),
            Outcome::Removed => "removed".to_string(),
            Outcome::Pending => "pending".to_string(),
            Outcome::Failed { error } => format!("failed: {error}"),
            Outcome::Skipped { reason } => format!("skipped: {reason}"),
        };
        println!("{}: {status}", report.resource);
        for command in &report.commands {
            println!("    {command}");
        }
    }
}
