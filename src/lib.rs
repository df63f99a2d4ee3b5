pub mod traits;
pub mod model;
pub mod error;
pub mod mirror;
pub mod aggregate;
pub mod engine;
pub mod config;
pub mod loader;
pub mod writer;
pub mod generator;
pub mod theme;

// Export collaborator traits
pub use traits::{
    NodeId, Channel, IconHandle,
    IconRenderer, StateSync,
    HeadlessRenderer, LatestTable
};

// Export data model
pub use model::{State, NodeKind, TreeDescription, StateTable, StateChange};

// Export the engine
pub use engine::TreeStateEngine;
pub use mirror::TreeNode;
pub use error::{EngineError, Diagnostic, DiagnosticKind};

// Export configuration and I/O
pub use config::EngineConfig;
pub use loader::{WidgetDocument, load_document, load_state_table};
pub use writer::{StateWriter, write_state_table};

// Export generator and theme support
pub use generator::AssemblyGenerator;
pub use theme::{IconTheme, ThemeManager, hex_to_color32};
