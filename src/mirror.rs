//! In-memory tree mirror.
//!
//! The mirror caches per-node channel states so that a toggle can be
//! recomputed locally. It is always rebuildable from the structural input
//! plus the state table.

use std::collections::HashSet;

use crate::error::{Diagnostic, EngineError};
use crate::model::{NodeKind, State, StateTable, TreeDescription};
use crate::traits::{IconHandle, NodeId};

/// A node of the mirror.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    pub color: Option<String>,
    /// Empty for leaves and stubs.
    pub children: Vec<TreeNode>,
    /// One state per channel. Authoritative for leaves, cached aggregate for
    /// internal nodes.
    pub states: Vec<State>,
    /// Renderer handles, one per channel. Empty until the structure is rendered.
    pub handles: Vec<IconHandle>,
    /// Set on stubs described as leaves that had no state row.
    pub awaiting_row: bool,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }

    pub fn is_internal(&self) -> bool {
        self.kind == NodeKind::Internal
    }

    pub fn state(&self, channel: usize) -> Option<State> {
        self.states.get(channel).copied()
    }

    pub fn handle(&self, channel: usize) -> Option<IconHandle> {
        self.handles.get(channel).copied()
    }

    /// Depth-first search by id, self first.
    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut TreeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    /// Visits every node in pre-order.
    pub fn walk(&self, visit: &mut dyn FnMut(&TreeNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut TreeNode)) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }

    /// Leaves of this subtree in depth-first order (stubs excluded).
    pub fn leaves(&self) -> Vec<&TreeNode> {
        fn collect<'a>(node: &'a TreeNode, out: &mut Vec<&'a TreeNode>) {
            if node.is_leaf() {
                out.push(node);
            }
            for child in &node.children {
                collect(child, out);
            }
        }

        let mut out = Vec::new();
        collect(self, &mut out);
        out
    }

    /// Turns a stub that was described as a leaf back into a leaf.
    ///
    /// Its channels stay `Empty` until the caller writes the row. Returns
    /// false for any other node.
    pub fn restore_leaf(&mut self) -> bool {
        if self.kind != NodeKind::Stub || !self.awaiting_row {
            return false;
        }
        self.kind = NodeKind::Leaf;
        self.awaiting_row = false;
        true
    }

    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |node| {
            if node.is_leaf() {
                count += 1;
            }
        });
        count
    }

    fn stub(desc: &TreeDescription, channels: usize, awaiting_row: bool) -> Self {
        TreeNode {
            id: desc.id.clone(),
            kind: NodeKind::Stub,
            name: desc.name.clone(),
            color: desc.color.clone(),
            children: Vec::new(),
            states: vec![State::Empty; channels],
            handles: Vec::new(),
            awaiting_row,
        }
    }
}

/// Builds the mirror from the structural input.
///
/// Leaves copy their state table row; internal nodes are seeded fully
/// selected and must be aggregated afterwards. Unknown node types and leaves
/// without a row become stubs and are reported in `diagnostics`.
pub fn build_mirror(
    desc: &TreeDescription,
    table: &StateTable,
    channels: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> TreeNode {
    let mut seen = HashSet::new();
    build_node(desc, table, channels, diagnostics, &mut seen)
}

fn build_node(
    desc: &TreeDescription,
    table: &StateTable,
    channels: usize,
    diagnostics: &mut Vec<Diagnostic>,
    seen: &mut HashSet<NodeId>,
) -> TreeNode {
    if !seen.insert(desc.id.clone()) {
        // Lookups resolve to the first occurrence; later ones stay reachable
        // through their parent only.
        diagnostics.push(Diagnostic::structural(EngineError::DuplicateId(desc.id.clone())));
    }

    match NodeKind::from_type_name(&desc.node_type) {
        Some(NodeKind::Internal) => TreeNode {
            id: desc.id.clone(),
            kind: NodeKind::Internal,
            name: desc.name.clone(),
            color: desc.color.clone(),
            children: desc
                .children
                .iter()
                .map(|child| build_node(child, table, channels, diagnostics, seen))
                .collect(),
            states: vec![State::Selected; channels],
            handles: Vec::new(),
            awaiting_row: false,
        },
        Some(NodeKind::Leaf | NodeKind::Stub) => {
            let Some(row) = table.get(&desc.id) else {
                diagnostics.push(Diagnostic::structural(EngineError::MissingLeafState(desc.id.clone())));
                return TreeNode::stub(desc, channels, true);
            };
            if row.len() != channels {
                diagnostics.push(Diagnostic::consistency(EngineError::StateRowLength {
                    id: desc.id.clone(),
                    expected: channels,
                    actual: row.len(),
                }));
            }
            let states = (0..channels)
                .map(|channel| row.get(channel).copied().unwrap_or(State::Empty))
                .collect();
            TreeNode {
                id: desc.id.clone(),
                kind: NodeKind::Leaf,
                name: desc.name.clone(),
                color: desc.color.clone(),
                children: Vec::new(),
                states,
                handles: Vec::new(),
                awaiting_row: false,
            }
        }
        None => {
            diagnostics.push(Diagnostic::structural(EngineError::UnknownNodeType {
                id: desc.id.clone(),
                node_type: desc.node_type.clone(),
            }));
            TreeNode::stub(desc, channels, false)
        }
    }
}
