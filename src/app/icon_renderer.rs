//! egui-backed rendering collaborator.
//!
//! egui redraws every frame, so "rendering" an icon means remembering which
//! state each handle shows. The tree panel reads these states back when it
//! paints.

use cadtree::{Channel, IconHandle, IconRenderer, NodeId, State, TreeNode};
use std::collections::HashMap;

pub struct EguiIconRenderer {
    icons: HashMap<IconHandle, State>,
    next_handle: u64,
    redraw_count: usize,
    ctx: Option<egui::Context>,
}

impl EguiIconRenderer {
    pub fn new(ctx: egui::Context) -> Self {
        Self {
            icons: HashMap::new(),
            next_handle: 0,
            redraw_count: 0,
            ctx: Some(ctx),
        }
    }

    /// State currently shown by `handle`, if it was ever issued.
    pub fn icon_state(&self, handle: IconHandle) -> Option<State> {
        self.icons.get(&handle).copied()
    }

    pub fn redraw_count(&self) -> usize {
        self.redraw_count
    }
}

impl IconRenderer for EguiIconRenderer {
    fn request_structure_render(&mut self, root: &TreeNode) -> HashMap<NodeId, Vec<IconHandle>> {
        let mut handles = HashMap::new();
        root.walk(&mut |node| {
            let row: Vec<IconHandle> = node
                .states
                .iter()
                .map(|&state| {
                    self.next_handle += 1;
                    let handle = IconHandle(self.next_handle);
                    self.icons.insert(handle, state);
                    handle
                })
                .collect();
            handles.insert(node.id.clone(), row);
        });
        tracing::debug!(icons = self.icons.len(), "tree structure rendered");
        handles
    }

    fn request_icon_redraw(&mut self, handle: IconHandle, channel: Channel, state: State) {
        tracing::trace!(?handle, channel, %state, "icon redraw");
        self.icons.insert(handle, state);
        self.redraw_count += 1;
        if let Some(ctx) = &self.ctx {
            ctx.request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadtree::{LatestTable, StateTable, TreeDescription, TreeStateEngine};

    fn renderer() -> EguiIconRenderer {
        EguiIconRenderer {
            icons: HashMap::new(),
            next_handle: 0,
            redraw_count: 0,
            ctx: None,
        }
    }

    #[test]
    fn test_icons_follow_engine_state() {
        let tree = TreeDescription::node("r", "r", vec![TreeDescription::leaf("a", "a")]);
        let mut table = StateTable::new();
        table.insert("a", vec![State::Selected]);
        let mut engine = TreeStateEngine::new(&tree, table, 1, renderer(), LatestTable::default());

        let root_handle = engine.find_node("r").unwrap().handles[0];
        assert_eq!(engine.renderer().icon_state(root_handle), Some(State::Selected));

        engine.toggle_leaf("a", 0).unwrap();
        assert_eq!(engine.renderer().icon_state(root_handle), Some(State::Unselected));
        assert_eq!(engine.renderer().redraw_count(), 2);
    }
}
