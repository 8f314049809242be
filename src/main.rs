use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Deserialize;

use secure_fs::config_io;
use secure_fs::ops::catalog;
use secure_fs::telemetry::{self, LogFormat};
use secure_fs::{Context, Error, OperationResponse, Result};

#[derive(Debug, Parser)]
#[command(name = "secure-fs", version)]
#[command(about = "Filesystem operations confined to an allow-list of root directories.")]
struct Cli {
    /// Allowed root directory. Repeatable; merged with roots from `--config`.
    #[arg(short = 'r', long = "root", value_name = "DIR", global = true)]
    roots: Vec<PathBuf>,

    /// TOML or JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read one JSON request per stdin line and write one response envelope per stdout line.
    Serve,
    /// Dispatch a single operation and print its response envelope.
    Call {
        name: String,
        /// JSON object with the operation arguments.
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Print the operation catalog with argument schemas.
    Operations,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Request {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = telemetry::init(cli.log_format) {
        eprintln!("{err}");
        std::process::exit(1);
    }
    if let Err(err) = run(cli) {
        tracing::error!(error = %err, "secure-fs failed");
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        roots,
        config,
        command,
        ..
    } = cli;
    match command {
        Command::Operations => {
            println!("{}", serde_json::to_string_pretty(&catalog::operations()?)?);
            Ok(())
        }
        Command::Serve => serve(&build_context(config.as_deref(), &roots)?),
        Command::Call { name, args } => {
            let arguments: serde_json::Value = serde_json::from_str(&args)?;
            let ctx = build_context(config.as_deref(), &roots)?;
            let response = ctx.dispatch(&name, arguments);
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
    }
}

fn build_context(config: Option<&Path>, roots: &[PathBuf]) -> Result<Context> {
    Context::new(config_io::startup_config(config, roots)?)
}

fn serve(ctx: &Context) -> Result<()> {
    tracing::info!(roots = ?ctx.allowed_roots(), "serving requests from stdin");
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.map_err(|err| Error::io_path("read_stdin", "<stdin>", err))?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => ctx.dispatch(&request.name, request.arguments),
            Err(err) => OperationResponse::error(&Error::Json(err)),
        };
        serde_json::to_writer(&mut stdout, &response)?;
        stdout
            .write_all(b"\n")
            .and_then(|()| stdout.flush())
            .map_err(|err| Error::io_path("write_stdout", "<stdout>", err))?;
    }
    tracing::info!("stdin closed; shutting down");
    Ok(())
}
