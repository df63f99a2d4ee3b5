//! The tree state engine.
//!
//! Owns the mirror and the state table and keeps them consistent:
//! - local clicks patch the mirror, recompute the touched channel and publish
//! - external tables are diffed into the mirror and recomputed, never published
//!
//! Every mutating operation takes `&mut self` and runs to completion, so the
//! (mirror, table) pair is never observed half-updated.

use std::collections::HashSet;

use crate::aggregate::{self, Redraw};
use crate::config::EngineConfig;
use crate::error::{Diagnostic, EngineError};
use crate::loader::WidgetDocument;
use crate::mirror::{build_mirror, TreeNode};
use crate::model::{NodeKind, State, StateChange, StateTable, TreeDescription};
use crate::traits::{Channel, IconRenderer, NodeId, StateSync};

/// Diagnostics kept before the oldest ones are dropped.
pub const MAX_DIAGNOSTICS: usize = 1024;

pub struct TreeStateEngine<R: IconRenderer, S: StateSync> {
    root: TreeNode,
    table: StateTable,
    channels: usize,
    renderer: R,
    sync: S,
    diagnostics: Vec<Diagnostic>,
}

impl<R: IconRenderer, S: StateSync> TreeStateEngine<R, S> {
    /// Builds the mirror, aggregates every channel and asks the renderer to
    /// materialize the tree.
    ///
    /// Structural problems never fail construction; they are available from
    /// [`diagnostics`](Self::diagnostics) afterwards.
    pub fn new(tree: &TreeDescription, table: StateTable, channels: usize, renderer: R, sync: S) -> Self {
        let mut diagnostics = Vec::new();
        let mut root = build_mirror(tree, &table, channels, &mut diagnostics);
        for channel in 0..channels {
            // Nothing is rendered yet, so the redraws have nowhere to go.
            aggregate::recompute_channel(&mut root, channel, &mut Vec::new());
        }

        let leaf_ids = leaf_id_set(&root);
        let unknown = table
            .ids()
            .filter(|id| !leaf_ids.contains(id.as_str()))
            .map(|id| Diagnostic::consistency(EngineError::UnknownStateEntry(id.clone())));
        record(&mut diagnostics, unknown);

        let mut engine = Self {
            root,
            table,
            channels,
            renderer,
            sync,
            diagnostics,
        };
        engine.sync_table_from_mirror();
        engine.render_structure();
        tracing::debug!(
            channels,
            leaves = engine.root.leaf_count(),
            diagnostics = engine.diagnostics.len(),
            "tree state engine initialized"
        );
        engine
    }

    /// Builds an engine from a loaded document.
    ///
    /// The channel count comes from `config` when set, otherwise from the document.
    pub fn from_document(doc: &WidgetDocument, config: &EngineConfig, renderer: R, sync: S) -> Self {
        let channels = config.channels.unwrap_or_else(|| doc.channel_count());
        Self::new(&doc.tree, doc.state.clone(), channels, renderer, sync)
    }

    fn render_structure(&mut self) {
        let mut handles = self.renderer.request_structure_render(&self.root);
        self.root.walk_mut(&mut |node| {
            if let Some(row) = handles.remove(&node.id) {
                node.handles = row;
            }
        });
    }

    /// Flips one leaf channel, recomputes that channel and publishes.
    ///
    /// An `Empty` channel is left alone but the table is still published.
    /// Returns the leaf's resulting state.
    pub fn toggle_leaf(&mut self, id: &str, channel: Channel) -> Result<State, EngineError> {
        self.check_channel(channel)?;
        let leaf = match find_kind_mut(&mut self.root, id, NodeKind::Leaf) {
            Ok(leaf) => leaf,
            Err(error) => return Err(reject(&mut self.diagnostics, error)),
        };

        let mut effects = Vec::new();
        let current = leaf.states[channel];
        let new_state = if current.is_empty() { current } else { current.flipped() };
        if aggregate::set_leaf_state(leaf, channel, new_state, &mut effects) {
            self.table.set_state(id, channel, new_state);
        }
        tracing::debug!(id, channel, from = %current, to = %new_state, "leaf toggled");

        aggregate::recompute_channel(&mut self.root, channel, &mut effects);
        self.apply_redraws(effects);
        self.publish();
        Ok(new_state)
    }

    /// Flips an internal node's aggregated state and pushes the result to
    /// every non-empty descendant leaf, then recomputes and publishes.
    ///
    /// Returns the state that was propagated.
    pub fn toggle_node(&mut self, id: &str, channel: Channel) -> Result<State, EngineError> {
        self.check_channel(channel)?;
        let node = match find_kind_mut(&mut self.root, id, NodeKind::Internal) {
            Ok(node) => node,
            Err(error) => return Err(reject(&mut self.diagnostics, error)),
        };

        let mut effects = Vec::new();
        let current = node.states[channel];
        let new_state = current.flipped();
        let changed = aggregate::propagate_down(node, channel, new_state, &mut effects);
        tracing::debug!(id, channel, from = %current, to = %new_state, leaves = changed, "node toggled");

        aggregate::recompute_channel(&mut self.root, channel, &mut effects);
        self.apply_redraws(effects);
        self.publish();
        Ok(new_state)
    }

    /// Routes a click from the renderer to the matching toggle.
    pub fn handle_click(&mut self, node_type: &str, id: &str, channel: Channel) -> Result<State, EngineError> {
        match NodeKind::from_type_name(node_type) {
            Some(NodeKind::Leaf) => self.toggle_leaf(id, channel),
            Some(NodeKind::Internal) => self.toggle_node(id, channel),
            _ => {
                let error = EngineError::UnknownNodeType {
                    id: id.to_string(),
                    node_type: node_type.to_string(),
                };
                record(&mut self.diagnostics, [Diagnostic::structural(error.clone())]);
                Err(error)
            }
        }
    }

    /// Recomputes the subtree rooted at `id` for `channel` and redraws every
    /// aggregate that changed.
    pub fn recompute_channel(&mut self, id: &str, channel: Channel) -> Result<State, EngineError> {
        self.check_channel(channel)?;
        let Some(node) = self.root.find_mut(id) else {
            return Err(reject(&mut self.diagnostics, EngineError::NodeNotFound(id.to_string())));
        };
        let mut effects = Vec::new();
        let result = aggregate::recompute_channel(node, channel, &mut effects);
        self.apply_redraws(effects);
        Ok(result.state)
    }

    /// Replaces the leaf states with an externally supplied table.
    ///
    /// Only the `(leaf, channel)` pairs whose value differs are written and
    /// redrawn; channels with at least one change are recomputed over the
    /// whole tree. Leaves missing from `new_table` keep their state and
    /// entries matching no leaf are ignored. A leaf that had no row when the
    /// mirror was built becomes a regular leaf again once a row arrives.
    /// Nothing is published.
    ///
    /// Returns the leaf changes that were applied.
    pub fn apply_external_state_change(&mut self, new_table: StateTable) -> Vec<StateChange> {
        let channels = self.channels;
        let mut effects = Vec::new();
        let mut changes = Vec::new();
        let mut dirty = vec![false; channels];
        let mut problems = Vec::new();

        self.root.walk_mut(&mut |node| {
            if node.awaiting_row && new_table.contains(&node.id) && node.restore_leaf() {
                tracing::info!(id = %node.id, "state row received for stub leaf");
            }
            if !node.is_leaf() {
                return;
            }
            let Some(row) = new_table.get(&node.id) else {
                problems.push(EngineError::MissingLeafState(node.id.clone()));
                return;
            };
            if row.len() != channels {
                problems.push(EngineError::StateRowLength {
                    id: node.id.clone(),
                    expected: channels,
                    actual: row.len(),
                });
            }
            for (channel, &state) in row.iter().enumerate().take(channels) {
                if node.states[channel] == state {
                    continue;
                }
                node.states[channel] = state;
                dirty[channel] = true;
                effects.push(Redraw {
                    id: node.id.clone(),
                    handle: node.handle(channel),
                    channel,
                    state,
                });
                changes.push(StateChange {
                    id: node.id.clone(),
                    channel,
                    new: state,
                });
            }
        });

        let leaf_ids = leaf_id_set(&self.root);
        for id in new_table.ids().filter(|id| !leaf_ids.contains(id.as_str())) {
            problems.push(EngineError::UnknownStateEntry(id.clone()));
        }
        record(&mut self.diagnostics, problems.into_iter().map(Diagnostic::consistency));

        for channel in (0..channels).filter(|&c| dirty[c]) {
            aggregate::recompute_channel(&mut self.root, channel, &mut effects);
        }

        self.table = new_table;
        self.sync_table_from_mirror();
        tracing::debug!(changes = changes.len(), redraws = effects.len(), "external state applied");
        self.apply_redraws(effects);
        changes
    }

    /// Copies the leaf states into the table and hands a structural copy to
    /// the sync collaborator.
    pub fn publish(&mut self) {
        self.sync_table_from_mirror();
        tracing::debug!(rows = self.table.len(), "publishing state table");
        self.sync.publish(self.table.clone());
    }

    /// Depth-first lookup; `None` when no node has this id.
    pub fn find_node(&self, id: &str) -> Option<&TreeNode> {
        self.root.find(id)
    }

    pub fn node_state(&self, id: &str, channel: Channel) -> Option<State> {
        self.find_node(id).and_then(|node| node.state(channel))
    }

    /// Ids of leaves currently `Selected` on `channel`, in tree order.
    pub fn selected_leaves(&self, channel: Channel) -> Vec<NodeId> {
        self.root
            .leaves()
            .into_iter()
            .filter(|leaf| leaf.state(channel) == Some(State::Selected))
            .map(|leaf| leaf.id.clone())
            .collect()
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn state_table(&self) -> &StateTable {
        &self.table
    }

    pub fn channel_count(&self) -> usize {
        self.channels
    }

    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    /// Problems seen so far, oldest first. Only the latest
    /// [`MAX_DIAGNOSTICS`] are kept; long-running hosts should drain them
    /// with [`take_diagnostics`](Self::take_diagnostics).
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn sync(&self) -> &S {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut S {
        &mut self.sync
    }

    fn check_channel(&mut self, channel: Channel) -> Result<(), EngineError> {
        if channel < self.channels {
            Ok(())
        } else {
            Err(reject(
                &mut self.diagnostics,
                EngineError::ChannelOutOfRange {
                    channel,
                    count: self.channels,
                },
            ))
        }
    }

    /// Writes leaf rows into the table. For duplicate ids the first leaf in
    /// depth-first order wins, as it does for lookups.
    fn sync_table_from_mirror(&mut self) {
        let mut written = HashSet::new();
        for leaf in self.root.leaves() {
            if written.insert(leaf.id.as_str()) {
                self.table.insert(leaf.id.clone(), leaf.states.clone());
            }
        }
    }

    fn apply_redraws(&mut self, effects: Vec<Redraw>) {
        for redraw in effects {
            match redraw.handle {
                Some(handle) => self.renderer.request_icon_redraw(handle, redraw.channel, redraw.state),
                None => tracing::trace!(id = %redraw.id, channel = redraw.channel, "no icon to redraw"),
            }
        }
    }
}

fn reject(diagnostics: &mut Vec<Diagnostic>, error: EngineError) -> EngineError {
    record(diagnostics, [Diagnostic::lookup(error.clone())]);
    error
}

/// Appends to the diagnostics, dropping the oldest past [`MAX_DIAGNOSTICS`].
fn record(diagnostics: &mut Vec<Diagnostic>, new: impl IntoIterator<Item = Diagnostic>) {
    diagnostics.extend(new);
    if diagnostics.len() > MAX_DIAGNOSTICS {
        let excess = diagnostics.len() - MAX_DIAGNOSTICS;
        diagnostics.drain(..excess);
        tracing::trace!(dropped = excess, "oldest diagnostics dropped");
    }
}

fn find_kind_mut<'a>(root: &'a mut TreeNode, id: &str, expected: NodeKind) -> Result<&'a mut TreeNode, EngineError> {
    let node = root
        .find_mut(id)
        .ok_or_else(|| EngineError::NodeNotFound(id.to_string()))?;
    if node.kind != expected {
        return Err(EngineError::WrongKind {
            id: id.to_string(),
            expected,
            actual: node.kind,
        });
    }
    Ok(node)
}

fn leaf_id_set(root: &TreeNode) -> HashSet<&str> {
    root.leaves().into_iter().map(|leaf| leaf.id.as_str()).collect()
}
