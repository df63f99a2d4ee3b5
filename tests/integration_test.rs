use anyhow::Result;
use cadtree::{
    load_document, load_state_table, write_state_table, AssemblyGenerator, Channel, EngineConfig,
    HeadlessRenderer, IconHandle, IconRenderer, LatestTable, NodeId, State, StateTable, StateWriter,
    TreeDescription, TreeNode, TreeStateEngine, WidgetDocument,
};
use std::collections::HashMap;
use std::env;
use std::fs;

/// Headless renderer that counts redraw requests.
#[derive(Default)]
struct CountingRenderer {
    inner: HeadlessRenderer,
    redraws: Vec<(IconHandle, Channel, State)>,
}

impl IconRenderer for CountingRenderer {
    fn request_structure_render(&mut self, root: &TreeNode) -> HashMap<NodeId, Vec<IconHandle>> {
        self.inner.request_structure_render(root)
    }

    fn request_icon_redraw(&mut self, handle: IconHandle, channel: Channel, state: State) {
        self.redraws.push((handle, channel, state));
    }
}

fn flat_tree() -> TreeDescription {
    TreeDescription::node(
        "root",
        "Assembly",
        vec![
            TreeDescription::leaf("a", "Bolt"),
            TreeDescription::leaf("b", "Nut"),
            TreeDescription::leaf("c", "Washer"),
        ],
    )
}

fn flat_table(states: [State; 3]) -> StateTable {
    let mut table = StateTable::new();
    table.insert("a", vec![states[0]]);
    table.insert("b", vec![states[1]]);
    table.insert("c", vec![states[2]]);
    table
}

fn engine_for(states: [State; 3]) -> TreeStateEngine<CountingRenderer, LatestTable> {
    TreeStateEngine::new(
        &flat_tree(),
        flat_table(states),
        1,
        CountingRenderer::default(),
        LatestTable::default(),
    )
}

#[test]
fn test_toggle_root_selects_every_leaf() -> Result<()> {
    use State::*;
    let mut engine = engine_for([Selected, Selected, Unselected]);
    assert_eq!(engine.node_state("root", 0), Some(Mixed));

    let propagated = engine.toggle_node("root", 0)?;
    assert_eq!(propagated, Selected);

    for id in ["a", "b", "c"] {
        assert_eq!(engine.node_state(id, 0), Some(Selected));
    }
    assert_eq!(engine.node_state("root", 0), Some(Selected));

    let published = engine.sync().latest.as_ref().expect("toggle publishes");
    assert_eq!(published, &flat_table([Selected, Selected, Selected]));
    Ok(())
}

#[test]
fn test_recompute_excludes_empty_children() -> Result<()> {
    use State::*;
    let mut engine = engine_for([Selected, Unselected, Empty]);
    assert_eq!(engine.recompute_channel("root", 0)?, Mixed);
    assert_eq!(engine.node_state("root", 0), Some(Mixed));
    Ok(())
}

#[test]
fn test_all_empty_children_make_empty_parent() -> Result<()> {
    use State::*;
    let mut engine = engine_for([Empty, Empty, Empty]);
    assert_eq!(engine.recompute_channel("root", 0)?, Empty);

    // Toggling the root has no leaf to push to.
    engine.toggle_node("root", 0)?;
    for id in ["a", "b", "c"] {
        assert_eq!(engine.node_state(id, 0), Some(Empty));
    }
    Ok(())
}

#[test]
fn test_toggle_empty_leaf_changes_nothing() -> Result<()> {
    use State::*;
    let mut engine = engine_for([Selected, Unselected, Empty]);
    let before = engine.state_table().clone();

    let state = engine.toggle_leaf("c", 0)?;
    assert_eq!(state, Empty);
    assert!(engine.renderer().redraws.is_empty());
    assert_eq!(engine.state_table(), &before);
    assert_eq!(engine.sync().latest.as_ref(), Some(&before));
    Ok(())
}

#[test]
fn test_published_table_applied_back_is_quiet() -> Result<()> {
    use State::*;
    let mut engine = engine_for([Selected, Unselected, Selected]);
    engine.toggle_leaf("b", 0)?;
    let published = engine.sync().latest.clone().expect("toggle publishes");
    let redraws = engine.renderer().redraws.len();
    let publishes = engine.sync().publish_count;

    let changes = engine.apply_external_state_change(published);
    assert!(changes.is_empty());
    assert_eq!(engine.renderer().redraws.len(), redraws);
    assert_eq!(engine.sync().publish_count, publishes);
    Ok(())
}

#[test]
fn test_external_change_updates_aggregates_without_publishing() -> Result<()> {
    use State::*;
    let mut engine = engine_for([Selected, Selected, Selected]);
    assert_eq!(engine.node_state("root", 0), Some(Selected));

    let changes = engine.apply_external_state_change(flat_table([Selected, Unselected, Selected]));
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].id, "b");
    assert_eq!(changes[0].new, Unselected);
    assert_eq!(engine.node_state("root", 0), Some(Mixed));
    assert_eq!(engine.sync().publish_count, 0);

    // One redraw for the leaf, one for the root that turned mixed.
    assert_eq!(engine.renderer().redraws.len(), 2);
    Ok(())
}

#[test]
fn test_document_round_trip_through_brotli() -> Result<()> {
    let test_file = env::temp_dir().join("cadtree_doc_roundtrip.json.br");
    let test_file = test_file.to_str().unwrap();
    let _ = fs::remove_file(test_file);

    let doc = AssemblyGenerator::with_config(3, 3, 7)
        .channels(vec!["shape".into(), "mesh".into()])
        .generate();
    {
        let mut writer = StateWriter::new(test_file)?;
        writer.write_document(&doc)?;
    }

    let loaded = load_document(test_file)?;
    assert_eq!(loaded, doc);
    assert_eq!(loaded.channel_count(), 2);

    fs::remove_file(test_file)?;
    Ok(())
}

#[test]
fn test_state_table_file_round_trip() -> Result<()> {
    let test_file = env::temp_dir().join("cadtree_state_roundtrip.json");
    let test_file = test_file.to_str().unwrap();
    let _ = fs::remove_file(test_file);

    let table = flat_table([State::Selected, State::Mixed, State::Empty]);
    write_state_table(test_file, &table)?;

    let raw = fs::read_to_string(test_file)?;
    assert!(raw.contains("\"b\""));
    assert_eq!(load_state_table(test_file)?, table);

    fs::remove_file(test_file)?;
    Ok(())
}

#[test]
fn test_document_with_integer_ids() -> Result<()> {
    let test_file = env::temp_dir().join("cadtree_int_ids.json");
    let test_file = test_file.to_str().unwrap();
    fs::write(
        test_file,
        r#"{
            "tree": {"id": 1, "type": "node", "name": "Top", "children": [
                {"id": 2, "type": "leaf", "name": "Pin"},
                {"id": 3, "type": "leaf", "name": "Clip"}
            ]},
            "state": {"2": [1, 3], "3": [0, 3]}
        }"#,
    )?;

    let doc = load_document(test_file)?;
    assert_eq!(doc.channel_count(), 2);

    let engine = TreeStateEngine::from_document(
        &doc,
        &EngineConfig::default(),
        HeadlessRenderer::default(),
        LatestTable::default(),
    );
    assert!(engine.diagnostics().is_empty());
    assert_eq!(engine.node_state("1", 0), Some(State::Mixed));
    assert_eq!(engine.node_state("1", 1), Some(State::Empty));

    fs::remove_file(test_file)?;
    Ok(())
}

#[test]
fn test_generated_assembly_toggles_cleanly() -> Result<()> {
    let doc: WidgetDocument = AssemblyGenerator::with_config(4, 4, 42)
        .channels(vec!["shape".into(), "mesh".into(), "label".into()])
        .generate();
    let mut engine = TreeStateEngine::from_document(
        &doc,
        &EngineConfig::default(),
        CountingRenderer::default(),
        LatestTable::default(),
    );
    assert!(engine.diagnostics().is_empty());
    assert_eq!(engine.leaf_count(), doc.tree.leaf_ids().len());

    let root_id = engine.root().id.clone();
    let propagated = engine.toggle_node(&root_id, 0)?;
    let table = engine.state_table();
    for id in doc.tree.leaf_ids() {
        let state = table.get_state(&id, 0).expect("every generated leaf has a row");
        // Channel 0 is never generated empty.
        assert_eq!(state, propagated);
    }
    assert_eq!(engine.node_state(&root_id, 0), Some(propagated));
    assert_eq!(engine.selected_leaves(0).len(), match propagated {
        State::Selected => engine.leaf_count(),
        _ => 0,
    });
    Ok(())
}
