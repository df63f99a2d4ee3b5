//! Error taxonomy of the engine.
//!
//! Operations that reject an event return [`EngineError`]. Problems the
//! engine degrades around (a broken subtree, a sloppy external table) are
//! recorded as [`Diagnostic`]s and logged; none of them terminate the host.

use thiserror::Error;

use crate::model::NodeKind;
use crate::traits::{Channel, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("node '{0}' not found")]
    NodeNotFound(NodeId),

    #[error("node '{id}' is a {actual}, expected a {expected}")]
    WrongKind {
        id: NodeId,
        expected: NodeKind,
        actual: NodeKind,
    },

    #[error("channel {channel} out of range (channel count {count})")]
    ChannelOutOfRange { channel: Channel, count: usize },

    #[error("unknown node type '{node_type}' for node '{id}'")]
    UnknownNodeType { id: NodeId, node_type: String },

    #[error("duplicate node id '{0}'")]
    DuplicateId(NodeId),

    #[error("leaf '{0}' has no entry in the state table")]
    MissingLeafState(NodeId),

    #[error("leaf '{id}' has {actual} channel states, expected {expected}")]
    StateRowLength {
        id: NodeId,
        expected: usize,
        actual: usize,
    },

    #[error("state table entry '{0}' matches no leaf in the tree")]
    UnknownStateEntry(NodeId),
}

/// Which class of degradation a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Broken tree structure; the offending node became a stub.
    Structural,
    /// An event referenced something that does not exist; it was dropped.
    Lookup,
    /// The external table disagrees with the tree; the mismatch was ignored.
    Consistency,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub error: EngineError,
}

impl Diagnostic {
    pub fn structural(error: EngineError) -> Self {
        tracing::error!(%error, "structural error in tree");
        Self {
            kind: DiagnosticKind::Structural,
            error,
        }
    }

    pub fn lookup(error: EngineError) -> Self {
        tracing::warn!(%error, "event dropped");
        Self {
            kind: DiagnosticKind::Lookup,
            error,
        }
    }

    pub fn consistency(error: EngineError) -> Self {
        tracing::warn!(%error, "state table inconsistent with tree");
        Self {
            kind: DiagnosticKind::Consistency,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EngineError::WrongKind {
            id: "/a".to_string(),
            expected: NodeKind::Leaf,
            actual: NodeKind::Internal,
        };
        assert_eq!(err.to_string(), "node '/a' is a node, expected a leaf");

        let err = EngineError::ChannelOutOfRange { channel: 4, count: 2 };
        assert_eq!(err.to_string(), "channel 4 out of range (channel count 2)");
    }

    #[test]
    fn test_diagnostic_constructors_set_kind() {
        let diag = Diagnostic::consistency(EngineError::UnknownStateEntry("/x".to_string()));
        assert_eq!(diag.kind, DiagnosticKind::Consistency);
        assert_eq!(diag.error, EngineError::UnknownStateEntry("/x".to_string()));
    }
}
