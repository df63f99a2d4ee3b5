use std::collections::HashMap;

use crate::mirror::TreeNode;
use crate::model::{State, StateTable};

/// Type alias for node ids (unique across the whole tree)
pub type NodeId = String;

/// Type alias for icon channel indices (`0..channel_count`)
pub type Channel = usize;

/// Opaque reference to one rendered icon, issued by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IconHandle(pub u64);

/// Rendering collaborator that owns the visual tree.
///
/// The engine never feeds rendering results back into its state; it only
/// tells the renderer which icons changed.
pub trait IconRenderer {
    /// Materializes the tree once after initialization.
    ///
    /// Returns one handle per channel for every node that got icons. Nodes
    /// missing from the map simply never receive redraw requests.
    fn request_structure_render(&mut self, root: &TreeNode) -> HashMap<NodeId, Vec<IconHandle>>;

    /// Shows `state` on the icon behind `handle` for `channel`.
    fn request_icon_redraw(&mut self, handle: IconHandle, channel: Channel, state: State);
}

/// Outbound half of the state table sync channel.
///
/// The inbound half is the host calling
/// [`TreeStateEngine::apply_external_state_change`](crate::TreeStateEngine::apply_external_state_change).
pub trait StateSync {
    /// Receives a structural copy of the full table.
    fn publish(&mut self, table: StateTable);
}

impl<T: IconRenderer + ?Sized> IconRenderer for Box<T> {
    fn request_structure_render(&mut self, root: &TreeNode) -> HashMap<NodeId, Vec<IconHandle>> {
        (**self).request_structure_render(root)
    }

    fn request_icon_redraw(&mut self, handle: IconHandle, channel: Channel, state: State) {
        (**self).request_icon_redraw(handle, channel, state)
    }
}

impl<T: StateSync + ?Sized> StateSync for Box<T> {
    fn publish(&mut self, table: StateTable) {
        (**self).publish(table)
    }
}

/// Renderer for headless use: hands out sequential handles and draws nothing.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    issued: u64,
}

impl IconRenderer for HeadlessRenderer {
    fn request_structure_render(&mut self, root: &TreeNode) -> HashMap<NodeId, Vec<IconHandle>> {
        let mut handles = HashMap::new();
        root.walk(&mut |node| {
            let row = (0..node.states.len())
                .map(|_| {
                    self.issued += 1;
                    IconHandle(self.issued)
                })
                .collect();
            handles.insert(node.id.clone(), row);
        });
        handles
    }

    fn request_icon_redraw(&mut self, _handle: IconHandle, _channel: Channel, _state: State) {}
}

/// Sync endpoint that only remembers the last published table.
#[derive(Debug, Default)]
pub struct LatestTable {
    pub latest: Option<StateTable>,
    pub publish_count: usize,
}

impl StateSync for LatestTable {
    fn publish(&mut self, table: StateTable) {
        self.latest = Some(table);
        self.publish_count += 1;
    }
}
