//! Constraint resolution engine.
//!
//! Resolution runs in two phases over an immutable [`AgentTree`]:
//!
//! 1. **Plan**: every (agent, constraint) pair is classified. Registry-backed
//!    constraints resolve immediately against the read-only [`Registry`];
//!    autogen constraints are queued per kind. Any blocking failure aborts
//!    here, before a single key is generated.
//! 2. **Mint**: each autogen queue is handed to its crypto factory once, and
//!    the results are slotted back into their owning agents. Connection
//!    fields are merged per agent only after all of its constraints resolve.
//!
//! Non-blocking failures mark the agent invalid and are collected as
//! [`ConstraintIssue`]s rather than aborting the compile.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use swarm_common::{AgentNode, ConstraintDescriptor, Registry};

use super::handler::{AutogenHandler, AutogenKind, Handler, RegistryHandler, allow_listed, lookup};
use crate::domain::crypto::{
    ConnectionRequest, CryptoSettings, MintError, SigningRequest, connection_cert_factory,
    signing_cert_factory, symmetric_encryption_factory,
};
use crate::domain::error::{CompileError, CryptoError};
use crate::domain::path::ConfigPath;
use crate::domain::tree::{AgentTree, NodeId};

/// SAN host used when neither the constraint nor the agent names one.
pub const DEFAULT_HOST: &str = "127.0.0.1";

// ── Resolved IR ───────────────────────────────────────────────────────────────

/// A constraint after resolution. Lives only for one compile.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConstraint {
    pub class: String,
    pub handler: &'static Handler,
    /// Where `fields` and `directive` nest. Empty for connection-only handlers.
    pub path: ConfigPath,
    /// Private projection, for the deployment artifact.
    pub fields: Map<String, Value>,
    /// Allow-listed projection, for the directive artifact.
    pub directive: Map<String, Value>,
    /// Full generated bundle and its key under `certs[universal_id]`.
    pub material: Option<(ConfigPath, Value)>,
}

impl ResolvedConstraint {
    #[must_use]
    pub fn is_connection(&self) -> bool {
        self.handler.is_connection()
    }

    /// Whether this constraint's fields are merged into the connection block.
    #[must_use]
    pub fn feeds_connection(&self) -> bool {
        self.handler.is_connection() || self.handler.inject_into_connection()
    }
}

/// A non-blocking resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintIssue {
    pub agent: String,
    pub class: String,
    pub reason: String,
}

impl fmt::Display for ConstraintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.agent, self.class, self.reason)
    }
}

/// Resolution result for one agent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentIr {
    /// In declaration order.
    pub resolved: Vec<ResolvedConstraint>,
    /// Deploy fields of every connection-feeding constraint, last write wins.
    pub connection: Map<String, Value>,
    /// Directive fields of the same constraints.
    pub directive_connection: Map<String, Value>,
    pub valid: bool,
}

/// The fully resolved tree both compilers read from.
#[derive(Debug, Clone)]
pub struct ResolvedTree {
    pub tree: AgentTree,
    agents: Vec<AgentIr>,
    pub issues: Vec<ConstraintIssue>,
}

impl ResolvedTree {
    #[must_use]
    pub fn ir(&self, id: NodeId) -> &AgentIr {
        &self.agents[id.index()]
    }

    /// `universal_id`s of agents with at least one failed constraint.
    #[must_use]
    pub fn invalid_agents(&self) -> Vec<&str> {
        self.tree
            .preorder()
            .into_iter()
            .filter(|id| !self.ir(*id).valid)
            .map(|id| self.tree.node(id).universal_id.as_str())
            .collect()
    }
}

/// Summary of a resolution dry run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Preflight {
    pub agents: usize,
    pub constraints: usize,
    pub registry_backed: usize,
    pub autogen: usize,
    pub issues: Vec<ConstraintIssue>,
}

// ── Entry points ──────────────────────────────────────────────────────────────

/// Resolves every constraint in `tree`, minting fresh material for autogen
/// constraints.
///
/// # Errors
///
/// Returns a [`CompileError`] for any blocking constraint failure or crypto
/// failure. No partial result is returned.
pub fn resolve(
    tree: AgentTree,
    registry: &Registry,
    settings: &CryptoSettings,
    now: DateTime<Utc>,
) -> Result<ResolvedTree, CompileError> {
    let plan = Plan::build(&tree, registry)?;
    tracing::debug!(
        signing = plan.signing.len(),
        connection = plan.connection.len(),
        symmetric = plan.symmetric.len(),
        "autogen requests queued"
    );
    let (agents, issues) = plan.mint(settings, now)?;
    Ok(ResolvedTree {
        tree,
        agents,
        issues,
    })
}

/// Runs the planning phase only. Nothing is generated.
///
/// # Errors
///
/// Returns the same blocking errors [`resolve`] would.
pub fn preflight(tree: &AgentTree, registry: &Registry) -> Result<Preflight, CompileError> {
    let plan = Plan::build(tree, registry)?;
    let mut summary = Preflight {
        agents: tree.len(),
        ..Preflight::default()
    };
    for pending in plan.slots.iter().flatten() {
        summary.constraints += 1;
        match pending {
            Source::Registry(_) => summary.registry_backed += 1,
            Source::Autogen(_) => summary.autogen += 1,
        }
    }
    summary.issues = plan.issues;
    Ok(summary)
}

// ── Planning ──────────────────────────────────────────────────────────────────

/// Blocking constraints abort the whole compile when they cannot resolve.
fn is_blocking(descriptor: &ConstraintDescriptor) -> bool {
    descriptor.required && !descriptor.auto
}

enum Source {
    Registry(ResolvedConstraint),
    Autogen(PendingAutogen),
}

struct PendingAutogen {
    agent: String,
    class: String,
    handler: &'static Handler,
    kind: AutogenKind,
    /// Index into the queue for `kind`.
    slot: usize,
    settings: Map<String, Value>,
}

struct Plan {
    /// Pending constraints per node, indexed by `NodeId`.
    slots: Vec<Vec<Source>>,
    invalid: Vec<bool>,
    issues: Vec<ConstraintIssue>,
    signing: Vec<(SigningRequest, String)>,
    connection: Vec<(ConnectionRequest, String)>,
    symmetric: Vec<(String, String)>,
}

impl Plan {
    fn build(tree: &AgentTree, registry: &Registry) -> Result<Self, CompileError> {
        let mut plan = Self {
            slots: (0..tree.len()).map(|_| Vec::new()).collect(),
            invalid: vec![false; tree.len()],
            issues: Vec::new(),
            signing: Vec::new(),
            connection: Vec::new(),
            symmetric: Vec::new(),
        };
        for id in tree.preorder() {
            let node = tree.node(id);
            for descriptor in &node.constraints {
                plan.classify_constraint(id, node, descriptor, registry)?;
            }
        }
        Ok(plan)
    }

    fn soft_fail(&mut self, id: NodeId, node: &AgentNode, class: &str, reason: String) {
        tracing::warn!(agent = %node.universal_id, class, %reason, "constraint unresolved; agent marked invalid");
        self.invalid[id.index()] = true;
        self.issues.push(ConstraintIssue {
            agent: node.universal_id.clone(),
            class: class.to_string(),
            reason,
        });
    }

    fn classify_constraint(
        &mut self,
        id: NodeId,
        node: &AgentNode,
        descriptor: &ConstraintDescriptor,
        registry: &Registry,
    ) -> Result<(), CompileError> {
        let Some(handler) = lookup(&descriptor.class) else {
            let reason = "no handler registered for this class".to_string();
            if is_blocking(descriptor) {
                return Err(CompileError::ConstraintUnresolvable {
                    agent: node.universal_id.clone(),
                    class: descriptor.class.clone(),
                    reason,
                });
            }
            self.soft_fail(id, node, &descriptor.class, reason);
            return Ok(());
        };

        let pending = match handler {
            Handler::Registry(registry_handler) => {
                match resolve_registry(handler, registry_handler, node, descriptor, registry) {
                    Ok(resolved) => Source::Registry(resolved),
                    Err(failure) if is_blocking(descriptor) => return Err(failure),
                    Err(failure) => {
                        let reason = failure.to_string();
                        self.soft_fail(id, node, &descriptor.class, reason);
                        return Ok(());
                    }
                }
            }
            Handler::Autogen(autogen) => {
                Source::Autogen(self.queue_autogen(handler, autogen, node, descriptor))
            }
        };
        self.slots[id.index()].push(pending);
        Ok(())
    }

    fn queue_autogen(
        &mut self,
        handler: &'static Handler,
        autogen: &AutogenHandler,
        node: &AgentNode,
        descriptor: &ConstraintDescriptor,
    ) -> PendingAutogen {
        let agent = node.universal_id.clone();
        let class = descriptor.class.clone();
        let mut settings = descriptor.raw.clone();
        let slot = match autogen.kind {
            AutogenKind::PacketSigning => {
                let out = descriptor.raw_flag("out").unwrap_or(true);
                settings.insert("out".to_string(), Value::Bool(out));
                self.signing.push((
                    SigningRequest {
                        agent: agent.clone(),
                        out,
                    },
                    class.clone(),
                ));
                self.signing.len() - 1
            }
            AutogenKind::ConnectionCert => {
                let proto = descriptor
                    .raw_str("proto")
                    .or_else(|| node.config.get("proto").and_then(Value::as_str))
                    .or(autogen.default_proto);
                let host = descriptor
                    .raw_str("host")
                    .or_else(|| node.config.get("host").and_then(Value::as_str))
                    .unwrap_or(DEFAULT_HOST)
                    .to_string();
                if let Some(proto) = proto {
                    settings.insert("proto".to_string(), Value::String(proto.to_string()));
                }
                settings.insert("host".to_string(), Value::String(host.clone()));
                let request = ConnectionRequest {
                    agent: agent.clone(),
                    proto: proto.unwrap_or_default().to_string(),
                    host,
                };
                self.connection.push((request, class.clone()));
                self.connection.len() - 1
            }
            AutogenKind::SymmetricEncryption => {
                settings.insert(
                    "type".to_string(),
                    Value::String(crate::domain::crypto::symmetric::SYMMETRIC_KEY_TYPE.to_string()),
                );
                self.symmetric.push((agent.clone(), class.clone()));
                self.symmetric.len() - 1
            }
        };
        PendingAutogen {
            agent,
            class,
            handler,
            kind: autogen.kind,
            slot,
            settings,
        }
    }

    // ── Minting ──────────────────────────────────────────────────────────────

    fn mint(
        self,
        settings: &CryptoSettings,
        now: DateTime<Utc>,
    ) -> Result<(Vec<AgentIr>, Vec<ConstraintIssue>), CompileError> {
        let signing_requests: Vec<SigningRequest> =
            self.signing.iter().map(|(r, _)| r.clone()).collect();
        let mut signing = signing_cert_factory(&signing_requests, settings, now)
            .map_err(|e| crypto_failure(e, &self.signing))?;

        let connection_requests: Vec<ConnectionRequest> =
            self.connection.iter().map(|(r, _)| r.clone()).collect();
        let mut connection = connection_cert_factory(&connection_requests, settings, now)
            .map_err(|e| crypto_failure(e, &self.connection))?;

        let symmetric_agents: Vec<String> = self.symmetric.iter().map(|(a, _)| a.clone()).collect();
        let mut symmetric: Vec<Option<_>> = symmetric_encryption_factory(&symmetric_agents, now)
            .map_err(|e| crypto_failure(e, &self.symmetric))?
            .into_iter()
            .map(Some)
            .collect();

        let mut agents = Vec::with_capacity(self.slots.len());
        for (index, pendings) in self.slots.into_iter().enumerate() {
            let mut ir = AgentIr {
                valid: !self.invalid[index],
                ..AgentIr::default()
            };
            for pending in pendings {
                let resolved = match pending {
                    Source::Registry(resolved) => resolved,
                    Source::Autogen(autogen) => match autogen.kind {
                        AutogenKind::PacketSigning => {
                            let minted = signing[autogen.slot].take();
                            finish_autogen(autogen, minted, |b| b.directive_fields())?
                        }
                        AutogenKind::ConnectionCert => {
                            let minted = connection[autogen.slot].take();
                            finish_autogen(autogen, minted, |b| b.directive_fields())?
                        }
                        AutogenKind::SymmetricEncryption => {
                            let minted = symmetric[autogen.slot].take();
                            finish_autogen(autogen, minted, |k| k.directive_fields())?
                        }
                    },
                };
                if resolved.feeds_connection() {
                    for (key, value) in &resolved.fields {
                        ir.connection.insert(key.clone(), value.clone());
                    }
                    for (key, value) in &resolved.directive {
                        ir.directive_connection.insert(key.clone(), value.clone());
                    }
                }
                ir.resolved.push(resolved);
            }
            agents.push(ir);
        }
        Ok((agents, self.issues))
    }
}

fn resolve_registry(
    handler: &'static Handler,
    registry_handler: &RegistryHandler,
    node: &AgentNode,
    descriptor: &ConstraintDescriptor,
    registry: &Registry,
) -> Result<ResolvedConstraint, CompileError> {
    let agent = node.universal_id.clone();
    let class = descriptor.class.clone();
    let Some(serial) = descriptor.serial.as_deref() else {
        return Err(CompileError::ConstraintUnresolvable {
            agent,
            class,
            reason: "unresolved: missing both serial and autogen".to_string(),
        });
    };
    let Some(object) = registry.get(&descriptor.class, serial) else {
        return Err(CompileError::RegistryValidationFailed {
            agent,
            class,
            serial: serial.to_string(),
            reason: "does not exist in the registry".to_string(),
        });
    };
    if let Err(missing) = registry_handler.is_validated(object) {
        return Err(CompileError::RegistryValidationFailed {
            agent,
            class,
            serial: serial.to_string(),
            reason: format!("is missing required fields: {}", missing.join(", ")),
        });
    }
    Ok(ResolvedConstraint {
        class,
        handler,
        path: registry_handler.path(object),
        fields: registry_handler.deploy_fields(object),
        directive: registry_handler.directive_fields(object),
        material: None,
    })
}

fn finish_autogen<T: Serialize>(
    pending: PendingAutogen,
    minted: Option<T>,
    directive_of: impl Fn(&T) -> Map<String, Value>,
) -> Result<ResolvedConstraint, CompileError> {
    let PendingAutogen {
        agent,
        class,
        handler,
        kind,
        settings,
        ..
    } = pending;
    let mut directive = allow_listed(&settings, kind.settings_allow());
    let material = match minted {
        Some(bundle) => {
            directive.extend(directive_of(&bundle));
            let value = serde_json::to_value(&bundle).map_err(|e| {
                CompileError::CryptoGenerationFailure {
                    agent,
                    class: class.clone(),
                    source: CryptoError::KeyEncoding(e.to_string()),
                }
            })?;
            Some((kind.cert_path(), value))
        }
        None => None,
    };
    Ok(ResolvedConstraint {
        class,
        handler,
        path: kind.config_path(),
        fields: settings,
        directive,
        material,
    })
}

fn crypto_failure<R>(error: MintError, owners: &[(R, String)]) -> CompileError {
    let class = owners
        .get(error.index)
        .map(|(_, class)| class.clone())
        .unwrap_or_default();
    CompileError::CryptoGenerationFailure {
        agent: error.agent,
        class,
        source: error.source,
    }
}
