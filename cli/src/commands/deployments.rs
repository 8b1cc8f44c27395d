//! `swarm deployments`: list, inspect and remove committed deployments.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::services::config_service;
use crate::application::services::deployments::{self, bundle_state};
use crate::infra::fs::LocalFs;

#[derive(Subcommand)]
pub enum DeploymentsCommand {
    /// List committed deployments
    List,
    /// Show one deployment (key material is never printed)
    Show {
        /// Deployment label
        label: String,
    },
    /// Remove a deployment record and its artifacts
    Remove {
        /// Deployment label
        label: String,
    },
}

/// Run the deployments command.
pub fn run(app: &AppContext, cmd: DeploymentsCommand) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let mut vault = app.vault(&config)?;
    match cmd {
        DeploymentsCommand::List => {
            app.renderer().render_deployment_list(&vault.deployments()?)?;
        }
        DeploymentsCommand::Show { label } => {
            let record = deployments::find(&vault, &label)?;
            let state = bundle_state(&record, &LocalFs);
            app.renderer().render_deployment(&record, state)?;
        }
        DeploymentsCommand::Remove { label } => {
            // Fail on unknown labels before prompting.
            deployments::find(&vault, &label)?;
            if !app.confirm(&format!("Remove deployment '{label}' and its artifacts?"), true)? {
                app.output.info("Cancelled.");
                return Ok(ExitCode::SUCCESS);
            }
            let record = deployments::remove(&mut vault, &label, &LocalFs)?;
            app.renderer().render_removed(&record)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
