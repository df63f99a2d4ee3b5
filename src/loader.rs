use anyhow::{Context, Result};
use brotli::Decompressor;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};

use crate::model::{StateTable, TreeDescription};

/// Everything a host needs to start the widget: channel names, the
/// structure and the initial state table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetDocument {
    /// One label per icon channel (e.g. `["shape", "mesh"]`). May be empty,
    /// in which case the channel count is inferred from the state table.
    #[serde(default)]
    pub channels: Vec<String>,
    pub tree: TreeDescription,
    pub state: StateTable,
}

impl WidgetDocument {
    pub fn channel_count(&self) -> usize {
        if self.channels.is_empty() {
            self.state.max_channels()
        } else {
            self.channels.len()
        }
    }
}

/// Opens `file_path` for reading, decompressing Brotli when the path ends in `.br`.
pub fn open_reader(file_path: &str) -> Result<Box<dyn BufRead>> {
    let file = File::open(file_path)
        .with_context(|| format!("Failed to open file: {}", file_path))?;

    let reader: Box<dyn BufRead> = if file_path.ends_with(".br") {
        let decompressor = Decompressor::new(file, 4096);
        Box::new(BufReader::new(decompressor))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

/// Parses a widget document from any reader.
pub fn parse_document<R: Read>(reader: R) -> Result<WidgetDocument> {
    serde_json::from_reader(reader).context("Failed to parse widget document")
}

/// Loads a widget document (`{channels?, tree, state}`) from a JSON file.
///
/// # Examples
///
/// ```no_run
/// # use cadtree::loader::load_document;
/// # fn main() -> anyhow::Result<()> {
/// let doc = load_document("assembly.json")?;
/// // Compressed documents are decompressed transparently
/// let doc = load_document("assembly.json.br")?;
/// # Ok(())
/// # }
/// ```
pub fn load_document(file_path: &str) -> Result<WidgetDocument> {
    let reader = open_reader(file_path)?;
    parse_document(reader).with_context(|| format!("Failed to load document: {}", file_path))
}

/// Loads a bare state table (`{leaf_id: [state, ...]}`) from a JSON file.
pub fn load_state_table(file_path: &str) -> Result<StateTable> {
    let reader = open_reader(file_path)?;
    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse state table: {}", file_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::State;

    #[test]
    fn test_parse_document_infers_channels() {
        let json = r#"{
            "tree": {"id": "/a", "type": "node", "name": "a", "children": [
                {"id": "/a/b", "type": "leaf", "name": "b"}
            ]},
            "state": {"/a/b": [1, 3]}
        }"#;
        let doc = parse_document(json.as_bytes()).unwrap();
        assert_eq!(doc.channel_count(), 2);
        assert_eq!(doc.state.get("/a/b"), Some(&[State::Selected, State::Empty][..]));
    }

    #[test]
    fn test_named_channels_win() {
        let json = r#"{
            "channels": ["shape"],
            "tree": {"id": "/b", "type": "leaf", "name": "b"},
            "state": {"/b": [0, 0]}
        }"#;
        let doc = parse_document(json.as_bytes()).unwrap();
        assert_eq!(doc.channel_count(), 1);
    }

    #[test]
    fn test_bad_state_code_fails() {
        let json = r#"{"tree": {"id": "/b", "type": "leaf", "name": "b"}, "state": {"/b": [9]}}"#;
        assert!(parse_document(json.as_bytes()).is_err());
    }
}
