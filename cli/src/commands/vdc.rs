//! `vcprov vdc`: VDC inventory.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::services::{inventory, session};

/// VDC subcommands.
#[derive(Subcommand)]
pub enum VdcCommand {
    /// List the vApps of a VDC with status and address
    Show {
        /// VDC id
        vdc_id: String,
    },
}

/// Run the vdc command.
///
/// # Errors
///
/// Returns an error if the VDC or one of its vApps cannot be read.
pub async fn run(app: &AppContext, cmd: VdcCommand) -> Result<ExitCode> {
    let VdcCommand::Show { vdc_id } = cmd;
    let config = app.config()?;
    let client = app.vcloud(&config)?;
    let overview = session::scoped(&client, inventory::vdc_overview(&client, &vdc_id)).await??;
    app.renderer().render_vdc(&overview)?;
    Ok(ExitCode::SUCCESS)
}
