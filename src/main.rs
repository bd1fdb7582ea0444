//! Purpose: `jsonrpc-router` CLI entry point.
//! Role: Binary crate root; parses args, installs tracing, runs the chosen command.
//! Invariants: stdout carries command output only; logs and errors go to stderr.
//! Invariants: Errors are emitted as JSON on stderr when stderr is not a terminal.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
use std::io::{self, IsTerminal, Write};

use clap::{Parser, Subcommand, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

use jsonrpc_router::api::{Error, ErrorKind, format_routes, to_exit_code};

mod demo_routes;
mod serve;

use serve::ServeConfig;

const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

#[derive(Parser, Debug)]
#[command(
    name = "jsonrpc-router",
    version,
    about = "Dispatch JSON-RPC style requests to registered routes",
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Log filter used when RUST_LOG is unset (e.g. info, jsonrpc_router=debug)"
    )]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Serve the built-in routes over newline-delimited JSON on stdio")]
    Serve {
        #[arg(long, help = "Log the registered route groups before serving")]
        list_routes: bool,
        #[arg(
            long,
            default_value_t = DEFAULT_MAX_LINE_BYTES,
            help = "Reject request lines longer than this many bytes"
        )]
        max_line_bytes: usize,
    },
    #[command(about = "Print the built-in route groups and their methods")]
    Routes,
}

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<i32, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(code);
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `jsonrpc-router --help` for usage."));
            }
        },
    };

    init_tracing(cli.log_filter.as_deref());

    match cli.command {
        Command::Serve {
            list_routes,
            max_line_bytes,
        } => {
            serve::serve(ServeConfig {
                list_routes,
                max_line_bytes,
            })?;
        }
        Command::Routes => {
            let listing = format_routes(&demo_routes::route_groups());
            io::stdout().write_all(listing.as_bytes()).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to write route listing")
                    .with_source(err)
            })?;
        }
    }
    Ok(0)
}

fn init_tracing(fallback: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback.unwrap_or("info")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn clap_error_summary(err: &clap::Error) -> String {
    err.to_string()
        .lines()
        .next()
        .unwrap_or("invalid arguments")
        .trim_start_matches("error: ")
        .to_string()
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(err.to_string()));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    json!({ "error": Value::Object(inner) })
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {err}");
        if let Some(hint) = err.hint() {
            eprintln!("hint: {hint}");
        }
        return;
    }

    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}
