//! `swarm deploy`: compile, seal and commit a deployment.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::{InputLoader, ProgressReporter};
use crate::application::services::config_service;
use crate::application::services::deploy::{DeployRequest, deploy};
use crate::application::services::package::PackageOptions;
use crate::infra::fs::LocalFs;
use crate::infra::loader::FileLoader;
use crate::output::TerminalReporter;

#[derive(Args)]
pub struct DeployArgs {
    /// Agent tree file (JSON or YAML)
    #[arg(long)]
    pub tree: PathBuf,

    /// Registry snapshot (JSON or YAML)
    #[arg(long)]
    pub registry: PathBuf,

    /// Deployment label, used in artifact file names
    #[arg(long)]
    pub label: String,

    /// Directory for the bundle and key file (default: `deploy.dir`)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Embed each agent's source file into the directive
    #[arg(long, requires = "source_root")]
    pub embed_sources: bool,

    /// Stamp each agent with the SHA-256 of its source file
    #[arg(long, requires = "source_root")]
    pub stamp_hash: bool,

    /// Directory holding agent sources
    #[arg(long)]
    pub source_root: Option<PathBuf>,

    /// Print the swarm key instead of writing `keys/<label>.key`
    #[arg(long)]
    pub key_in_memory: bool,

    /// Replace an existing deployment with the same label
    #[arg(long)]
    pub force: bool,
}

/// Run the deploy command.
pub fn run(app: &AppContext, args: DeployArgs) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let tree = FileLoader.load_tree(&args.tree)?;
    let registry = FileLoader.load_registry(&args.registry)?;
    let mut vault = app.vault(&config)?;

    if args.force
        && vault.deployment(&args.label)?.is_some()
        && !app.confirm(&format!("Replace deployment '{}'?", args.label), true)?
    {
        app.output.info("Cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    let out_dir = app.deploy_dir(&config, args.out_dir)?;
    let reporter = TerminalReporter::new(&app.output);
    let result = deploy(
        DeployRequest {
            label: &args.label,
            tree,
            registry: &registry,
            crypto: &config.crypto,
            out_dir: &out_dir,
            package: PackageOptions {
                embed_sources: args.embed_sources,
                stamp_hash: args.stamp_hash,
                source_root: args.source_root.as_deref(),
                source_template: &config.deploy.source_template,
            },
            key_in_memory: args.key_in_memory,
            overwrite: args.force,
        },
        &mut vault,
        &LocalFs,
        &LocalFs,
        &reporter,
    );
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            reporter.fail("deploy failed");
            return Err(e);
        }
    };
    reporter.success("deployment committed");
    drop(reporter);

    app.renderer().render_deploy(&outcome)?;
    Ok(ExitCode::SUCCESS)
}
