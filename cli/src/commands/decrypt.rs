//! `swarm decrypt`: open an encrypted directive bundle.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::services::config_service;
use crate::application::services::deployments::{decrypt_with_key, decrypt_with_record, find};
use crate::infra::fs::set_owner_only;

#[derive(Args)]
pub struct DecryptArgs {
    /// Encrypted bundle (`<label>.enc.json`)
    pub bundle: PathBuf,

    /// File holding the base64 swarm key
    #[arg(long, conflicts_with = "label", required_unless_present = "label")]
    pub key: Option<PathBuf>,

    /// Use the swarm key from this deployment's vault record and verify its hashes
    #[arg(long)]
    pub label: Option<String>,

    /// Write the directive here instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Run the decrypt command.
pub fn run(app: &AppContext, args: &DecryptArgs) -> Result<ExitCode> {
    let bytes = std::fs::read(&args.bundle)
        .with_context(|| format!("cannot read {}", args.bundle.display()))?;

    let plaintext = match (&args.key, &args.label) {
        (Some(key_file), _) => {
            let key = std::fs::read_to_string(key_file)
                .with_context(|| format!("cannot read {}", key_file.display()))?;
            decrypt_with_key(&bytes, &key)?
        }
        (None, Some(label)) => {
            let config = config_service::load_config(&app.config_store)?;
            let vault = app.vault(&config)?;
            decrypt_with_record(&bytes, &find(&vault, label)?)?
        }
        (None, None) => anyhow::bail!("either --key or --label is required"),
    };

    match &args.out {
        Some(path) => {
            std::fs::write(path, &plaintext)
                .with_context(|| format!("cannot write {}", path.display()))?;
            set_owner_only(path)?;
            app.output
                .success(&format!("Wrote directive to {}", path.display()));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&plaintext)?;
            writeln!(stdout)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
