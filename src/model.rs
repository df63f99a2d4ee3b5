//! Data model shared between the engine and its collaborators.
//!
//! - [`State`] is the per-channel icon state of a node
//! - [`TreeDescription`] is the immutable structural input
//! - [`StateTable`] is the per-leaf state mapping that crosses the sync boundary

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::traits::{Channel, NodeId};

/// Icon state of one channel of a node.
///
/// Serialized as its integer code (`0..=3`), which is the format the
/// remote counterpart exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum State {
    Unselected = 0,
    Selected = 1,
    /// Descendant leaves disagree. Only ever computed for internal nodes.
    Mixed = 2,
    /// The channel does not apply to this node.
    Empty = 3,
}

impl State {
    /// All states in code order.
    pub const ALL: [State; 4] = [State::Unselected, State::Selected, State::Mixed, State::Empty];

    /// Returns the state a click moves to.
    ///
    /// `Selected` becomes `Unselected`; everything else becomes `Selected`.
    /// Callers must not flip `Empty`.
    pub fn flipped(self) -> State {
        match self {
            State::Selected => State::Unselected,
            _ => State::Selected,
        }
    }

    pub fn is_empty(self) -> bool {
        self == State::Empty
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for State {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(State::Unselected),
            1 => Ok(State::Selected),
            2 => Ok(State::Mixed),
            3 => Ok(State::Empty),
            other => Err(format!("invalid state code {}", other)),
        }
    }
}

impl From<State> for u8 {
    fn from(state: State) -> Self {
        state.code()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Unselected => "unselected",
            State::Selected => "selected",
            State::Mixed => "mixed",
            State::Empty => "empty",
        };
        f.write_str(name)
    }
}

/// Kind of a node in the tree mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Node with children; its states are derived.
    Internal,
    /// Node holding authoritative per-channel states.
    Leaf,
    /// Node that could not be built (unknown type or missing state row).
    /// Behaves like a leaf whose channels are all `Empty`.
    Stub,
}

impl NodeKind {
    /// Maps the `type` string of the structural input.
    pub fn from_type_name(name: &str) -> Option<NodeKind> {
        match name {
            "node" => Some(NodeKind::Internal),
            "leaf" => Some(NodeKind::Leaf),
            _ => None,
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            NodeKind::Internal => "node",
            NodeKind::Leaf => "leaf",
            NodeKind::Stub => "stub",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Immutable structural input: `{id, type, name, color?, children?}`.
///
/// `type` is kept as a raw string so that unknown types surface as
/// structural diagnostics while building the mirror instead of failing
/// deserialization of the whole tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeDescription {
    #[serde(deserialize_with = "deserialize_node_id")]
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeDescription>,
}

impl TreeDescription {
    pub fn node(id: impl Into<NodeId>, name: impl Into<String>, children: Vec<TreeDescription>) -> Self {
        Self {
            id: id.into(),
            node_type: NodeKind::Internal.type_name().to_string(),
            name: name.into(),
            color: None,
            children,
        }
    }

    pub fn leaf(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: NodeKind::Leaf.type_name().to_string(),
            name: name.into(),
            color: None,
            children: Vec::new(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Ids of all `leaf` entries in depth-first order.
    pub fn leaf_ids(&self) -> Vec<NodeId> {
        fn collect(desc: &TreeDescription, out: &mut Vec<NodeId>) {
            if desc.node_type == NodeKind::Leaf.type_name() {
                out.push(desc.id.clone());
            }
            for child in &desc.children {
                collect(child, out);
            }
        }

        let mut ids = Vec::new();
        collect(self, &mut ids);
        ids
    }
}

/// Node ids arrive either as strings or as integers; both normalize to a string key.
fn deserialize_node_id<'de, D>(deserializer: D) -> Result<NodeId, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "node id must be a string or an integer, got {}",
            other
        ))),
    }
}

/// One per-channel difference between two state tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub id: NodeId,
    pub channel: Channel,
    pub new: State,
}

/// Per-leaf channel states, keyed by leaf id.
///
/// Ordered by id so that published tables serialize deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateTable {
    rows: BTreeMap<NodeId, Vec<State>>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&[State]> {
        self.rows.get(id).map(Vec::as_slice)
    }

    pub fn get_state(&self, id: &str, channel: Channel) -> Option<State> {
        self.rows.get(id).and_then(|row| row.get(channel).copied())
    }

    pub fn insert(&mut self, id: impl Into<NodeId>, states: Vec<State>) -> Option<Vec<State>> {
        self.rows.insert(id.into(), states)
    }

    /// Sets a single channel of an existing row. Returns false if the row
    /// or the channel does not exist.
    pub fn set_state(&mut self, id: &str, channel: Channel, state: State) -> bool {
        match self.rows.get_mut(id).and_then(|row| row.get_mut(channel)) {
            Some(slot) => {
                *slot = state;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Vec<State>)> {
        self.rows.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.rows.keys()
    }

    /// Widest row in the table; used to infer the channel count when the
    /// input does not name its channels.
    pub fn max_channels(&self) -> usize {
        self.rows.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Lists every `(id, channel)` whose value differs from `old` to `new`.
    ///
    /// Only ids present in both tables are compared, channel by channel up to
    /// the shorter row.
    pub fn diff(old: &StateTable, new: &StateTable) -> Vec<StateChange> {
        let mut changes = Vec::new();
        for (id, old_row) in &old.rows {
            let Some(new_row) = new.rows.get(id) else {
                continue;
            };
            if old_row == new_row {
                continue;
            }
            for (channel, (before, after)) in old_row.iter().zip(new_row.iter()).enumerate() {
                if before != after {
                    changes.push(StateChange {
                        id: id.clone(),
                        channel,
                        new: *after,
                    });
                }
            }
        }
        changes
    }
}

impl FromIterator<(NodeId, Vec<State>)> for StateTable {
    fn from_iter<I: IntoIterator<Item = (NodeId, Vec<State>)>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_rule() {
        assert_eq!(State::Selected.flipped(), State::Unselected);
        assert_eq!(State::Unselected.flipped(), State::Selected);
        assert_eq!(State::Mixed.flipped(), State::Selected);
    }

    #[test]
    fn test_state_wire_codes() {
        let json = serde_json::to_string(&vec![State::Unselected, State::Empty]).unwrap();
        assert_eq!(json, "[0,3]");

        let parsed: Vec<State> = serde_json::from_str("[1,2]").unwrap();
        assert_eq!(parsed, vec![State::Selected, State::Mixed]);

        assert!(serde_json::from_str::<State>("7").is_err());
    }

    #[test]
    fn test_tree_description_accepts_integer_ids() {
        let json = r##"{
            "id": 1, "type": "node", "name": "assembly",
            "children": [
                {"id": "/assembly/base", "type": "leaf", "name": "base", "color": "#e8b024"},
                {"id": 3, "type": "leaf", "name": "lid"}
            ]
        }"##;
        let tree: TreeDescription = serde_json::from_str(json).unwrap();
        assert_eq!(tree.id, "1");
        assert_eq!(tree.children[0].color.as_deref(), Some("#e8b024"));
        assert_eq!(tree.leaf_ids(), vec!["/assembly/base".to_string(), "3".to_string()]);
    }

    #[test]
    fn test_tree_description_rejects_object_id() {
        let json = r#"{"id": {"x": 1}, "type": "leaf", "name": "bad"}"#;
        assert!(serde_json::from_str::<TreeDescription>(json).is_err());
    }

    #[test]
    fn test_state_table_diff_reports_changed_channels_only() {
        let old: StateTable = [
            ("a".to_string(), vec![State::Selected, State::Selected]),
            ("b".to_string(), vec![State::Selected, State::Empty]),
            ("gone".to_string(), vec![State::Selected]),
        ]
        .into_iter()
        .collect();
        let mut new = old.clone();
        new.set_state("a", 1, State::Unselected);
        new.insert("extra", vec![State::Unselected]);

        let changes = StateTable::diff(&old, &new);
        assert_eq!(
            changes,
            vec![StateChange {
                id: "a".to_string(),
                channel: 1,
                new: State::Unselected,
            }]
        );
    }

    #[test]
    fn test_state_table_serializes_as_plain_map() {
        let mut table = StateTable::new();
        table.insert("/a", vec![State::Selected, State::Empty]);
        assert_eq!(serde_json::to_string(&table).unwrap(), r#"{"/a":[1,3]}"#);
        assert_eq!(table.max_channels(), 2);
        assert!(!table.set_state("/a", 5, State::Selected));
    }
}
