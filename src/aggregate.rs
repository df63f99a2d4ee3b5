//! Aggregation and propagation over the mirror.
//!
//! The walks here only touch the mirror. Every icon that needs repainting is
//! appended to an effect list as a [`Redraw`]; the engine hands those to the
//! renderer after the walk, so these functions can be tested without one.

use crate::mirror::TreeNode;
use crate::model::{NodeKind, State};
use crate::traits::{Channel, IconHandle, NodeId};

/// Repaint request collected during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redraw {
    pub id: NodeId,
    /// `None` when the node has not been rendered yet.
    pub handle: Option<IconHandle>,
    pub channel: Channel,
    pub state: State,
}

impl Redraw {
    fn for_node(node: &TreeNode, channel: Channel) -> Self {
        Redraw {
            id: node.id.clone(),
            handle: node.handle(channel),
            channel,
            state: node.states[channel],
        }
    }
}

/// Result of recomputing one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregate {
    pub state: State,
    /// Whether the cached state of the node itself changed.
    pub changed: bool,
}

/// Folds child states into a parent state.
///
/// `Empty` children are ignored. No remaining children gives `Empty`, a
/// single distinct value gives that value, anything else gives `Mixed`.
pub fn combine<I>(states: I) -> State
where
    I: IntoIterator<Item = State>,
{
    let mut result: Option<State> = None;
    for state in states.into_iter().filter(|s| !s.is_empty()) {
        result = match result {
            None => Some(state),
            Some(prev) if prev == state => Some(prev),
            Some(_) => return State::Mixed,
        };
    }
    result.unwrap_or(State::Empty)
}

/// Evaluates the aggregate of `node` for `channel` from its leaves without
/// reading or writing any cached internal state.
pub fn evaluate(node: &TreeNode, channel: Channel) -> State {
    match node.kind {
        NodeKind::Internal => combine(node.children.iter().map(|child| evaluate(child, channel))),
        NodeKind::Leaf | NodeKind::Stub => node.state(channel).unwrap_or(State::Empty),
    }
}

/// Post-order recomputation of `node` for `channel`.
///
/// Internal nodes whose cached state changes get their cache updated and a
/// [`Redraw`] appended to `effects`. Leaves and stubs are returned unchanged.
pub fn recompute_channel(node: &mut TreeNode, channel: Channel, effects: &mut Vec<Redraw>) -> Aggregate {
    if node.kind != NodeKind::Internal {
        return Aggregate {
            state: node.state(channel).unwrap_or(State::Empty),
            changed: false,
        };
    }

    let child_states: Vec<State> = node
        .children
        .iter_mut()
        .map(|child| recompute_channel(child, channel, effects).state)
        .collect();
    let state = combine(child_states);

    let changed = match node.states.get_mut(channel) {
        Some(slot) if *slot != state => {
            *slot = state;
            true
        }
        _ => false,
    };
    if changed {
        effects.push(Redraw::for_node(node, channel));
    }
    Aggregate { state, changed }
}

/// Sets `channel` of every descendant leaf to `state`.
///
/// Leaves whose channel is `Empty` keep it and do not stop the walk. Returns
/// the number of leaves that changed; each of them also gets a [`Redraw`].
pub fn propagate_down(node: &mut TreeNode, channel: Channel, state: State, effects: &mut Vec<Redraw>) -> usize {
    match node.kind {
        NodeKind::Leaf => usize::from(set_leaf_state(node, channel, state, effects)),
        NodeKind::Internal => node
            .children
            .iter_mut()
            .map(|child| propagate_down(child, channel, state, effects))
            .sum(),
        NodeKind::Stub => 0,
    }
}

/// Writes one leaf channel unless it is `Empty` or already `state`.
///
/// Returns whether the leaf changed.
pub fn set_leaf_state(leaf: &mut TreeNode, channel: Channel, state: State, effects: &mut Vec<Redraw>) -> bool {
    match leaf.states.get_mut(channel) {
        Some(slot) if !slot.is_empty() && *slot != state => {
            *slot = state;
            effects.push(Redraw::for_node(leaf, channel));
            true
        }
        _ => false,
    }
}
