//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::app::{AppContext, OutputFlags};
use crate::commands;
use crate::domain::{ConfigError, ErrorKind, ProvisionError};
use crate::output::json::format_error;

/// Provision and bootstrap vCloud Director vApps
#[derive(Parser)]
#[command(
    name = "vcprov",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        action = clap::ArgAction::SetTrue,
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Provision or delete servers
    #[command(subcommand)]
    Server(commands::server::ServerCommand),

    /// Power, inspect and network vApps
    #[command(subcommand)]
    Vapp(commands::vapp::VappCommand),

    /// Configure VMs
    #[command(subcommand)]
    Vm(commands::vm::VmCommand),

    /// Inspect virtual data centers
    #[command(subcommand)]
    Vdc(commands::vdc::VdcCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command. Errors are rendered here, in the selected
    /// output mode, and turned into a failing exit code.
    pub async fn run(self, cancel: CancellationToken) -> ExitCode {
        let Cli {
            json,
            quiet,
            no_color,
            command,
        } = self;
        let app = AppContext::new(
            &OutputFlags {
                no_color,
                quiet,
                json,
            },
            cancel,
        );
        match dispatch(&app, command).await {
            Ok(code) => code,
            Err(err) => {
                report_error(&app, &err);
                ExitCode::FAILURE
            }
        }
    }
}

async fn dispatch(app: &AppContext, command: Command) -> Result<ExitCode> {
    match command {
        Command::Server(cmd) => commands::server::run(app, cmd).await,
        Command::Vapp(cmd) => commands::vapp::run(app, cmd).await,
        Command::Vm(cmd) => commands::vm::run(app, cmd).await,
        Command::Vdc(cmd) => commands::vdc::run(app, cmd).await,
        Command::Config(cmd) => commands::config::run(app, cmd),
        Command::Version => commands::version::run(app),
    }
}

/// Classify an error escaping a command for the JSON error document.
#[must_use]
pub fn error_kind(err: &anyhow::Error) -> ErrorKind {
    if let Some(e) = err.downcast_ref::<ProvisionError>() {
        e.kind()
    } else if err.downcast_ref::<ConfigError>().is_some() {
        ErrorKind::InvalidRequest
    } else {
        ErrorKind::ApiError
    }
}

fn report_error(app: &AppContext, err: &anyhow::Error) {
    let message = format!("{err:#}");
    if app.is_json() {
        match format_error(&message, &error_kind(err).to_string()) {
            Ok(doc) => println!("{doc}"),
            Err(_) => eprintln!("Error: {message}"),
        }
    } else {
        app.output.error(&message);
    }
}
