//! Immutable snapshot of the agent tree.
//!
//! Nodes are stored in an arena and addressed by [`NodeId`]. Children lists
//! are derived from parent pointers once, at snapshot time, so both compilers
//! walk the same shape without copying node data.

use std::collections::{HashMap, HashSet};

use swarm_common::{AgentNode, ROOT_AGENT_NAME};

use crate::domain::error::TreeError;
use crate::domain::validate::is_valid_universal_id;

/// Index of a node inside an [`AgentTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Slot {
    node: AgentNode,
    children: Vec<NodeId>,
}

/// A validated, rooted agent tree.
#[derive(Debug, Clone)]
pub struct AgentTree {
    slots: Vec<Slot>,
    root: NodeId,
}

impl AgentTree {
    /// Snapshots `nodes` into a tree.
    ///
    /// Nodes whose parent is missing or unknown are reassigned to the root.
    ///
    /// # Errors
    ///
    /// Returns a [`TreeError`] when the tree is empty, the root is missing,
    /// duplicated or renamed, a `graph_id` or `universal_id` repeats, a
    /// `universal_id` is malformed, or a parent chain loops.
    pub fn from_nodes(mut nodes: Vec<AgentNode>) -> Result<Self, TreeError> {
        if nodes.is_empty() {
            return Err(TreeError::Empty);
        }

        let mut by_graph_id: HashMap<String, usize> = HashMap::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            if by_graph_id.insert(node.graph_id.clone(), idx).is_some() {
                return Err(TreeError::DuplicateGraphId(node.graph_id.clone()));
            }
        }

        let roots: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_root())
            .map(|(idx, _)| idx)
            .collect();
        let root = match roots.as_slice() {
            [] => return Err(TreeError::MissingRoot),
            [only] => *only,
            many => {
                return Err(TreeError::MultipleRoots(
                    many.iter().map(|i| nodes[*i].universal_id.clone()).collect(),
                ));
            }
        };
        if nodes[root].universal_id != ROOT_AGENT_NAME {
            return Err(TreeError::RootRenamed(nodes[root].universal_id.clone()));
        }

        let mut seen_uids: HashSet<&str> = HashSet::with_capacity(nodes.len());
        for node in &nodes {
            if !is_valid_universal_id(&node.universal_id) {
                return Err(TreeError::InvalidUniversalId(node.universal_id.clone()));
            }
            if !seen_uids.insert(node.universal_id.as_str()) {
                return Err(TreeError::DuplicateUniversalId(node.universal_id.clone()));
            }
        }

        let root_graph_id = nodes[root].graph_id.clone();
        let mut parents: Vec<Option<usize>> = vec![None; nodes.len()];
        for (idx, node) in nodes.iter_mut().enumerate() {
            if idx == root {
                continue;
            }
            match node.parent.as_deref().and_then(|p| by_graph_id.get(p)) {
                Some(&parent) => parents[idx] = Some(parent),
                None => {
                    tracing::warn!(
                        universal_id = %node.universal_id,
                        parent = ?node.parent,
                        "orphaned agent reassigned to root"
                    );
                    node.parent = Some(root_graph_id.clone());
                    parents[idx] = Some(root);
                }
            }
        }

        detect_cycles(&nodes, &parents, root)?;

        let mut slots: Vec<Slot> = nodes
            .into_iter()
            .map(|node| Slot {
                node,
                children: Vec::new(),
            })
            .collect();
        for (idx, parent) in parents.iter().enumerate() {
            if let Some(parent) = parent {
                slots[*parent].children.push(NodeId(idx));
            }
        }

        Ok(Self {
            slots,
            root: NodeId(root),
        })
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &AgentNode {
        &self.slots[id.0].node
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slots[id.0].children
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Node ids in depth-first pre-order, children in declaration order.
    #[must_use]
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.slots.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        order
    }

    #[must_use]
    pub fn find(&self, universal_id: &str) -> Option<NodeId> {
        self.slots
            .iter()
            .position(|s| s.node.universal_id == universal_id)
            .map(NodeId)
    }
}

/// Every parent chain must reach the root.
fn detect_cycles(
    nodes: &[AgentNode],
    parents: &[Option<usize>],
    root: usize,
) -> Result<(), TreeError> {
    let mut reaches_root = vec![false; nodes.len()];
    reaches_root[root] = true;

    for start in 0..nodes.len() {
        let mut chain = Vec::new();
        let mut on_chain = HashSet::new();
        let mut cursor = start;
        while !reaches_root[cursor] {
            if !on_chain.insert(cursor) {
                return Err(TreeError::Cycle(nodes[start].universal_id.clone()));
            }
            chain.push(cursor);
            match parents[cursor] {
                Some(parent) => cursor = parent,
                None => return Err(TreeError::Cycle(nodes[start].universal_id.clone())),
            }
        }
        for idx in chain {
            reaches_root[idx] = true;
        }
    }
    Ok(())
}
