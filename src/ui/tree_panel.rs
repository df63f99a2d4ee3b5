//! Tree panel UI rendering
//!
//! Draws the mirror as collapsible rows: one icon button per channel, then
//! the part color swatch and name. Clicks are collected and returned so the
//! caller can feed them to the engine after the frame is laid out.

use cadtree::{Channel, IconTheme, NodeId, NodeKind, State, TreeNode};
use egui::{Button, RichText, ScrollArea};

use crate::app::EguiIconRenderer;

/// An icon click, in the `(node type, node id, channel)` shape the engine expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconClick {
    pub node_type: &'static str,
    pub id: NodeId,
    pub channel: Channel,
}

/// Renders the whole tree inside a scroll area.
pub fn render_tree_panel(
    ui: &mut egui::Ui,
    root: &TreeNode,
    renderer: &EguiIconRenderer,
    theme: &IconTheme,
    mark_broken: bool,
) -> Vec<IconClick> {
    let mut clicks = Vec::new();
    ScrollArea::both().auto_shrink([false, false]).show(ui, |ui| {
        render_node(ui, root, renderer, theme, mark_broken, &mut clicks);
    });
    clicks
}

fn render_node(
    ui: &mut egui::Ui,
    node: &TreeNode,
    renderer: &EguiIconRenderer,
    theme: &IconTheme,
    mark_broken: bool,
    clicks: &mut Vec<IconClick>,
) {
    if node.kind == NodeKind::Internal {
        let id = ui.make_persistent_id(&node.id);
        egui::collapsing_header::CollapsingState::load_with_default_open(ui.ctx(), id, true)
            .show_header(ui, |ui| {
                render_icons(ui, node, renderer, theme, clicks);
                render_label(ui, node, theme, mark_broken);
            })
            .body(|ui| {
                for child in &node.children {
                    render_node(ui, child, renderer, theme, mark_broken, clicks);
                }
            });
    } else {
        ui.horizontal(|ui| {
            render_icons(ui, node, renderer, theme, clicks);
            render_label(ui, node, theme, mark_broken);
        });
    }
}

fn render_icons(
    ui: &mut egui::Ui,
    node: &TreeNode,
    renderer: &EguiIconRenderer,
    theme: &IconTheme,
    clicks: &mut Vec<IconClick>,
) {
    for channel in 0..node.states.len() {
        let state = node
            .handle(channel)
            .and_then(|handle| renderer.icon_state(handle))
            .unwrap_or(State::Empty);
        // Empty leaf channels and broken nodes take no clicks.
        let clickable = match node.kind {
            NodeKind::Internal => true,
            NodeKind::Leaf => !state.is_empty(),
            NodeKind::Stub => false,
        };

        let text = RichText::new(theme.glyph(channel, state))
            .monospace()
            .color(theme.color(state));
        let response = ui
            .add_enabled(clickable, Button::new(text).frame(false))
            .on_hover_text(format!("{}: {}", theme.label(channel), state));
        if response.clicked() {
            clicks.push(IconClick {
                node_type: node.kind.type_name(),
                id: node.id.clone(),
                channel,
            });
        }
    }
}

fn render_label(ui: &mut egui::Ui, node: &TreeNode, theme: &IconTheme, mark_broken: bool) {
    if node.kind == NodeKind::Stub && mark_broken {
        ui.label(RichText::new(format!("⚠ {}", node.name)).color(theme.colors.error))
            .on_hover_text("This node could not be built; see the log for details");
        return;
    }
    if let Some(color) = &node.color {
        ui.label(RichText::new("■").color(cadtree::hex_to_color32(color)));
    }
    ui.label(&node.name);
}
