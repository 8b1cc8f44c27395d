//! `swarm validate`: preflight a tree without minting key material.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use swarm_common::Registry;

use crate::app::AppContext;
use crate::application::ports::InputLoader;
use crate::application::services::validate::validate_tree;
use crate::infra::loader::FileLoader;

#[derive(Args)]
pub struct ValidateArgs {
    /// Agent tree file (JSON or YAML)
    #[arg(long)]
    pub tree: PathBuf,

    /// Registry snapshot (JSON or YAML); registry-backed constraints fail without it
    #[arg(long)]
    pub registry: Option<PathBuf>,
}

/// Run the validate command.
pub fn run(app: &AppContext, args: &ValidateArgs) -> Result<ExitCode> {
    let tree = FileLoader.load_tree(&args.tree)?;
    let registry = match &args.registry {
        Some(path) => FileLoader.load_registry(path)?,
        None => Registry::default(),
    };
    let summary = validate_tree(tree, &registry)?;
    app.renderer().render_validate(&summary)?;
    Ok(ExitCode::SUCCESS)
}
