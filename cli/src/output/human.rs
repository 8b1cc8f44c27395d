//! Human-readable terminal renderer.

use std::collections::BTreeMap;
use std::path::Path;

use owo_colors::OwoColorize as _;
use swarm_common::DeploymentRecord;

use crate::application::services::deploy::DeployOutcome;
use crate::application::services::deployments::BundleState;
use crate::domain::SwarmConfig;
use crate::domain::constraint::Preflight;
use crate::output::OutputContext;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        println!("swarm {version}");
    }

    /// Render the result of a committed deploy.
    pub fn render_deploy(&self, outcome: &DeployOutcome) {
        let record = &outcome.record;
        if !self.ctx.quiet {
            println!();
        }
        let verb = if outcome.replaced { "Replaced" } else { "Deployed" };
        self.ctx.success(&format!(
            "{verb} '{}' ({} agents)",
            record.label.style(self.ctx.styles.label),
            record.agents.len()
        ));
        self.ctx.kv("Workspace:     ", &record.workspace_id);
        self.ctx.kv("Bundle:        ", &outcome.bundle_path.display().to_string());
        self.ctx.kv("Directive hash:", &record.directive_hash);
        if outcome.embedded > 0 {
            self.ctx.kv("Embedded:      ", &format!("{} sources", outcome.embedded));
        }
        if outcome.stamped > 0 {
            self.ctx.kv("Stamped:       ", &format!("{} sources", outcome.stamped));
        }
        match &outcome.key_path {
            Some(path) => self.ctx.kv("Key file:      ", &path.display().to_string()),
            // Never suppressed: this is the only copy outside the vault.
            None => println!(
                "  {}  {}",
                "Swarm key:     ".style(self.ctx.styles.dim),
                record.swarm_key.style(self.ctx.styles.secret)
            ),
        }
        if !outcome.invalid_agents.is_empty() {
            self.ctx.warn(&format!(
                "Agents with unresolved optional constraints: {}",
                outcome.invalid_agents.join(", ")
            ));
        }
    }

    /// Render a preflight summary.
    pub fn render_validate(&self, summary: &Preflight) {
        self.ctx.header("Preflight");
        self.ctx.kv("Agents:        ", &summary.agents.to_string());
        self.ctx.kv("Constraints:   ", &summary.constraints.to_string());
        self.ctx.kv("Registry-backed:", &summary.registry_backed.to_string());
        self.ctx.kv("Autogen:       ", &summary.autogen.to_string());
        for issue in &summary.issues {
            self.ctx.warn(&issue.to_string());
        }
        if summary.issues.is_empty() {
            self.ctx.success("Tree is ready to deploy");
        } else {
            self.ctx.warn(&format!(
                "Tree is deployable with {} unresolved optional constraint(s)",
                summary.issues.len()
            ));
        }
    }

    /// Render every committed deployment.
    pub fn render_deployment_list(&self, deployments: &BTreeMap<String, DeploymentRecord>) {
        if deployments.is_empty() {
            if !self.ctx.quiet {
                println!(
                    "No deployments. Create one: swarm deploy --tree <file> --registry <file> --label <label>"
                );
            }
            return;
        }
        println!("Deployments:\n");
        for (label, record) in deployments {
            println!(
                "  {:<24} {:<24} {:>3} agents",
                label,
                record.deployed_at.format(TIME_FORMAT),
                record.agents.len()
            );
        }
    }

    /// Render one deployment record. Key material is never printed.
    pub fn render_deployment(&self, record: &DeploymentRecord, state: BundleState) {
        self.ctx.header(&format!("Deployment '{}'", record.label));
        self.ctx.kv("Workspace:     ", &record.workspace_id);
        self.ctx.kv("Deployed at:   ", &record.deployed_at.format(TIME_FORMAT).to_string());
        self.ctx.kv("Bundle:        ", &record.encrypted_path);
        self.ctx.kv("Bundle hash:   ", &record.encrypted_hash);
        self.ctx.kv("Directive hash:", &record.directive_hash);
        match state {
            BundleState::Intact => self.ctx.success("Bundle matches the recorded hash"),
            BundleState::Modified => self.ctx.warn("Bundle differs from the recorded hash"),
            BundleState::Unreadable => self.ctx.warn("Bundle file is missing or unreadable"),
        }
        if self.ctx.quiet {
            return;
        }
        println!();
        println!("  {}", "Agents:".style(self.ctx.styles.bold));
        for agent in &record.agents {
            let material = record
                .certs
                .get(&agent.universal_id)
                .map(|m| m.keys().cloned().collect::<Vec<_>>().join(", "))
                .unwrap_or_default();
            println!(
                "    {:<24} {:<16} {}",
                agent.universal_id,
                agent.name,
                material.style(self.ctx.styles.dim)
            );
        }
    }

    /// Confirm a removal.
    pub fn render_removed(&self, record: &DeploymentRecord) {
        self.ctx.success(&format!("Removed deployment '{}'", record.label));
    }

    /// Confirm a configuration change.
    pub fn render_config_set(&self, key: &str, value: &str) {
        self.ctx.success(&format!("Set {key} = {value}"));
    }

    /// Render the current configuration.
    pub fn render_config(&self, config: &SwarmConfig, path: &Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        let unset = || "(default)".to_string();
        let rows = [
            (
                "vault.path:",
                config.vault.path.as_ref().map_or_else(unset, |p| p.display().to_string()),
            ),
            ("vault.min_bytes:", config.vault.min_bytes.to_string()),
            ("crypto.ca_bits:", config.crypto.ca_bits.to_string()),
            ("crypto.leaf_bits:", config.crypto.leaf_bits.to_string()),
            ("crypto.signing_bits:", config.crypto.signing_bits.to_string()),
            ("crypto.validity_days:", config.crypto.validity_days.to_string()),
            (
                "deploy.dir:",
                config.deploy.dir.as_ref().map_or_else(unset, |p| p.display().to_string()),
            ),
            ("deploy.source_template:", config.deploy.source_template.clone()),
        ];
        for (key, value) in rows {
            println!("  {key:<24} {value}");
        }
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in ["SWARM_CONFIG", "SWARM_YES", "NO_COLOR"] {
            println!(
                "    {:<18} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
    }
}
