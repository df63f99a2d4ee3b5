//! Random assembly generator.
//!
//! Produces a widget document shaped like a CAD assembly: nested groups of
//! parts, path-like ids, part colors, and a state table where some parts
//! have no mesh (channel inapplicable).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::loader::WidgetDocument;
use crate::model::{State, StateTable, TreeDescription};

const DEFAULT_MAX_DEPTH: usize = 4;
const DEFAULT_MAX_CHILDREN: usize = 6;
const DEFAULT_CHANNELS: &[&str] = &["shape", "mesh"];

const PART_COLORS: &[&str] = &["#e8b024", "#707070", "#3ba3ed", "#c0c0c0", "#d94c4c", "#4cd98a"];
const PART_NAMES: &[&str] = &["Plate", "Bolt", "Nut", "Shaft", "Bearing", "Bracket", "Arm", "Hinge"];

pub struct AssemblyGenerator {
    max_depth: usize,
    max_children: usize,
    channels: Vec<String>,
    /// Probability that a non-first channel of a part is `Empty`.
    empty_ratio: f64,
    /// Probability that a channel starts `Unselected`.
    hidden_ratio: f64,
    seed: u64,
}

impl AssemblyGenerator {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_children: DEFAULT_MAX_CHILDREN,
            channels: DEFAULT_CHANNELS.iter().map(|c| c.to_string()).collect(),
            empty_ratio: 0.2,
            hidden_ratio: 0.1,
            seed: 42, // Default seed for reproducibility
        }
    }

    pub fn with_config(max_depth: usize, max_children: usize, seed: u64) -> Self {
        Self {
            max_depth,
            max_children: max_children.max(1),
            seed,
            ..Self::new()
        }
    }

    pub fn channels(mut self, channels: Vec<String>) -> Self {
        self.channels = channels;
        self
    }

    pub fn empty_ratio(mut self, ratio: f64) -> Self {
        self.empty_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn hidden_ratio(mut self, ratio: f64) -> Self {
        self.hidden_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn generate(&self) -> WidgetDocument {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut state = StateTable::new();
        let tree = self.generate_group(&mut rng, "/Assembly", "Assembly", 0, &mut state);
        WidgetDocument {
            channels: self.channels.clone(),
            tree,
            state,
        }
    }

    fn generate_group(
        &self,
        rng: &mut StdRng,
        id: &str,
        name: &str,
        depth: usize,
        state: &mut StateTable,
    ) -> TreeDescription {
        let num_children = rng.gen_range(1..=self.max_children);
        let children = (0..num_children)
            .map(|index| {
                let base = PART_NAMES[rng.gen_range(0..PART_NAMES.len())];
                let child_name = format!("{}_{}", base, index);
                let child_id = format!("{}/{}", id, child_name);
                // Deeper levels are increasingly likely to be parts.
                let is_part = depth + 1 >= self.max_depth || rng.gen_bool((0.3 + 0.15 * depth as f64).min(1.0));
                if is_part {
                    state.insert(child_id.clone(), self.generate_states(rng));
                    let color = PART_COLORS[rng.gen_range(0..PART_COLORS.len())];
                    TreeDescription::leaf(child_id, child_name).with_color(color)
                } else {
                    self.generate_group(rng, &child_id, &child_name, depth + 1, state)
                }
            })
            .collect();
        TreeDescription::node(id, name, children)
    }

    fn generate_states(&self, rng: &mut StdRng) -> Vec<State> {
        (0..self.channels.len())
            .map(|channel| {
                if channel > 0 && rng.gen_bool(self.empty_ratio) {
                    State::Empty
                } else if rng.gen_bool(self.hidden_ratio) {
                    State::Unselected
                } else {
                    State::Selected
                }
            })
            .collect()
    }
}

impl Default for AssemblyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_reproducible() {
        let a = AssemblyGenerator::with_config(3, 4, 7).generate();
        let b = AssemblyGenerator::with_config(3, 4, 7).generate();
        assert_eq!(a, b);
    }

    #[test]
    fn test_every_leaf_has_a_full_row() {
        let doc = AssemblyGenerator::with_config(4, 5, 11).generate();
        let leaves = doc.tree.leaf_ids();
        assert!(!leaves.is_empty());
        assert_eq!(leaves.len(), doc.state.len());
        for id in leaves {
            let row = doc.state.get(&id).unwrap();
            assert_eq!(row.len(), 2);
            assert_ne!(row[0], State::Empty);
        }
    }

    #[test]
    fn test_depth_is_bounded() {
        fn depth(desc: &TreeDescription) -> usize {
            1 + desc.children.iter().map(depth).max().unwrap_or(0)
        }
        let doc = AssemblyGenerator::with_config(2, 6, 3).generate();
        assert!(depth(&doc.tree) <= 3);
    }
}
