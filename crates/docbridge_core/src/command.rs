//! Payloads attached to batched write commands.

use crate::document::Document;

/// Which write command a split payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Documents to insert.
    Insert,
    /// Update statements.
    Update,
    /// Delete statements.
    Delete,
}

impl PayloadKind {
    /// The field name the payload occupies in the command.
    #[must_use]
    pub const fn field_name(&self) -> &'static str {
        match self {
            PayloadKind::Insert => "documents",
            PayloadKind::Update => "updates",
            PayloadKind::Delete => "deletes",
        }
    }
}

/// A sequence of documents sent alongside a command, split into batches by
/// the driver. `position` marks how many documents were already sent.
#[derive(Debug, Clone, PartialEq)]
pub struct SplittablePayload {
    /// The command the payload belongs to.
    pub kind: PayloadKind,
    /// All payload documents.
    pub documents: Vec<Document>,
    /// Number of documents already consumed.
    pub position: usize,
}

impl SplittablePayload {
    /// Creates a payload starting at position 0.
    #[must_use]
    pub fn new(kind: PayloadKind, documents: Vec<Document>) -> Self {
        Self {
            kind,
            documents,
            position: 0,
        }
    }

    /// Documents not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> &[Document] {
        self.documents.get(self.position..).unwrap_or(&[])
    }

    /// Returns true if documents remain past `position`.
    #[must_use]
    pub fn has_another_split(&self) -> bool {
        self.position < self.documents.len()
    }
}
