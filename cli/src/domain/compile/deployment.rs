//! Private artifact: full secrets and the per-agent `certs` map.

use serde_json::{Map, Value};
use swarm_common::DeployedAgent;

use super::{CertsMap, CompiledNode};
use crate::domain::constraint::ResolvedTree;
use crate::domain::path::{merge_nested, set_nested};
use crate::domain::tree::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentArtifact {
    pub tree: CompiledNode,
    pub certs: CertsMap,
}

impl DeploymentArtifact {
    /// Flattens the tree in pre-order for the vault record.
    #[must_use]
    pub fn agents(&self) -> Vec<DeployedAgent> {
        let mut agents = Vec::new();
        self.tree.walk(&mut |node| {
            agents.push(DeployedAgent {
                universal_id: node.universal_id.clone(),
                name: node.name.clone(),
                serial: node.serial.clone(),
                security_tag: node.security_tag.clone(),
                config: node.config.clone(),
                connection: node.connection.clone(),
            });
        });
        agents
    }
}

pub struct DeploymentCompiler<'a> {
    resolved: &'a ResolvedTree,
}

impl<'a> DeploymentCompiler<'a> {
    #[must_use]
    pub fn new(resolved: &'a ResolvedTree) -> Self {
        Self { resolved }
    }

    #[must_use]
    pub fn compile(&self) -> DeploymentArtifact {
        let mut certs = CertsMap::new();
        let tree = self.build(self.resolved.tree.root(), &mut certs);
        DeploymentArtifact { tree, certs }
    }

    fn build(&self, id: NodeId, certs: &mut CertsMap) -> CompiledNode {
        let agent = self.resolved.tree.node(id);
        let ir = self.resolved.ir(id);

        let mut config = agent.config.clone();
        let mut agent_certs: Map<String, Value> = Map::new();
        for constraint in &ir.resolved {
            if !constraint.path.is_empty() {
                merge_nested(
                    &mut config,
                    &constraint.path.strip_config_root(),
                    Value::Object(constraint.fields.clone()),
                );
            }
            if let Some((cert_path, bundle)) = &constraint.material {
                set_nested(&mut agent_certs, cert_path, bundle.clone());
            }
        }
        if !agent_certs.is_empty() {
            certs.insert(agent.universal_id.clone(), agent_certs);
        }

        let children = self
            .resolved
            .tree
            .children(id)
            .iter()
            .map(|child| self.build(*child, certs))
            .collect();
        CompiledNode::from_agent(agent, config, ir.connection.clone(), children)
    }
}
