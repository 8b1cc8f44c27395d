//! Public artifact: allow-listed fields only, nested under `config`.

use serde_json::Value;

use super::CompiledNode;
use crate::domain::constraint::ResolvedTree;
use crate::domain::path::merge_nested;
use crate::domain::tree::NodeId;

/// Key of the tree in the directive plaintext.
pub const DIRECTIVE_ROOT_KEY: &str = "agent_tree";

#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveArtifact {
    pub tree: CompiledNode,
}

pub struct DirectiveCompiler<'a> {
    resolved: &'a ResolvedTree,
}

impl<'a> DirectiveCompiler<'a> {
    #[must_use]
    pub fn new(resolved: &'a ResolvedTree) -> Self {
        Self { resolved }
    }

    #[must_use]
    pub fn compile(&self) -> DirectiveArtifact {
        DirectiveArtifact {
            tree: self.build(self.resolved.tree.root()),
        }
    }

    fn build(&self, id: NodeId) -> CompiledNode {
        let agent = self.resolved.tree.node(id);
        let ir = self.resolved.ir(id);

        let mut config = agent.config.clone();
        for constraint in &ir.resolved {
            if constraint.path.is_empty() {
                continue;
            }
            merge_nested(
                &mut config,
                &constraint.path.strip_config_root(),
                Value::Object(constraint.directive.clone()),
            );
        }

        let children = self
            .resolved
            .tree
            .children(id)
            .iter()
            .map(|child| self.build(*child))
            .collect();
        CompiledNode::from_agent(agent, config, ir.directive_connection.clone(), children)
    }
}
