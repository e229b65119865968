mod error_presentation;

use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use minfold_core::{ConnectionConfig, Mode, Orchestrator, OrchestratorOptions, OrchestratorOutput};
use minfold_dialect_mssql::MssqlDialect;

use error_presentation::{CliError, CliResult, render_runtime_error};

/// Connects to a SQL Server target, diffs its current schema against a
/// desired schema, and prints (or writes) the resulting `up`/`down`
/// migration scripts.
///
/// Applying the migration and exporting the live schema are available as
/// separate modes, but `minfold` never introspects or scripts anything
/// beyond what `Orchestrator` already exposes; this binary only wires
/// its flags to that API.
#[derive(Debug, Parser)]
#[command(name = "minfold", version)]
struct Cli {
    /// Server hostname. Omit when connecting over a local socket.
    #[arg(long)]
    host: Option<String>,

    /// Server port.
    #[arg(long)]
    port: Option<u16>,

    /// Login user.
    #[arg(long)]
    user: Option<String>,

    /// Login password.
    #[arg(long)]
    password: Option<String>,

    /// Local socket path, as an alternative to --host/--port.
    #[arg(long)]
    socket: Option<String>,

    /// Target database name.
    database: String,

    /// Path to the desired schema. Reads from stdin when omitted.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Allow the generated migration to emit DROP statements.
    #[arg(long)]
    enable_drop: bool,

    /// Apply the diff directly instead of producing migration scripts.
    #[arg(long)]
    apply: bool,

    /// Print the pending diff without generating migration scripts.
    #[arg(long)]
    dry_run: bool,

    /// Print the current schema, re-exported through the dialect's renderer.
    #[arg(long)]
    export: bool,

    /// Write the generated scripts to `<out>/up.sql` and `<out>/down.sql`
    /// instead of printing `up.sql` to stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn read_desired_sql(file: Option<&PathBuf>) -> CliResult<String> {
    match file {
        Some(path) => std::fs::read_to_string(path).map_err(|source| CliError::ReadFile {
            path: path.clone(),
            source,
        }),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(CliError::ReadStdin)?;
            if buffer.trim().is_empty() {
                return Err(CliError::MissingDesiredSchemaInput);
            }
            Ok(buffer)
        }
    }
}

fn connection_config(cli: &Cli) -> ConnectionConfig {
    ConnectionConfig {
        host: cli.host.clone(),
        port: cli.port,
        user: cli.user.clone(),
        password: cli.password.clone(),
        database: cli.database.clone(),
        socket: cli.socket.clone(),
        extra: BTreeMap::new(),
    }
}

fn mode(cli: &Cli) -> &'static str {
    if cli.export {
        "export"
    } else if cli.apply {
        "apply"
    } else if cli.dry_run {
        "dry-run"
    } else {
        "migrate"
    }
}

fn run(cli: Cli) -> CliResult<()> {
    if cli.apply && cli.export {
        return Err(CliError::ConflictingModes);
    }

    let connection_config = connection_config(&cli);
    let dialect = MssqlDialect;
    let orchestrator = Orchestrator::new(&dialect);

    let mode_name = mode(&cli);
    let options = OrchestratorOptions {
        mode: match mode_name {
            "export" => Mode::Export,
            "apply" => Mode::Apply,
            "dry-run" => Mode::DryRun,
            _ => Mode::Migrate,
        },
        enable_drop: cli.enable_drop,
    };

    let desired_sql = if mode_name == "export" {
        String::new()
    } else {
        read_desired_sql(cli.file.as_ref())?
    };

    let output = orchestrator.run(&connection_config, &desired_sql, options)?;

    match output {
        OrchestratorOutput::Applied => println!("migration applied"),
        OrchestratorOutput::DryRunSql(sql) | OrchestratorOutput::ExportSql(sql) => {
            println!("{sql}");
        }
        OrchestratorOutput::Migration(script) => match &cli.out {
            Some(out_dir) => {
                let up_path = out_dir.join("up.sql");
                let down_path = out_dir.join("down.sql");
                script.write_to(&up_path, &down_path)?;
                println!("wrote {}", up_path.display());
                println!("wrote {}", down_path.display());
            }
            None => println!("{}", script.up_sql),
        },
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => {}
        Err(CliError::Core(minfold_core::Error::NoChangesToMigrate)) => {
            println!("no changes to migrate");
        }
        Err(error) => {
            eprintln!("{}", render_runtime_error(error));
            std::process::exit(1);
        }
    }
}
