//! Write requests, write concerns and their results.

use crate::document::{Bson, Document};
use std::time::Duration;

/// How many members must acknowledge a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acknowledgement {
    /// A fixed number of members; `0` means fire-and-forget.
    Nodes(u32),
    /// A majority of members.
    Majority,
    /// A named tag set.
    Tag(String),
}

/// Durability policy applied to a write.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WriteConcern {
    /// Acknowledgement requirement; `None` means the server default.
    pub w: Option<Acknowledgement>,
    /// Whether the write must reach the journal.
    pub journal: Option<bool>,
    /// How long to wait for acknowledgement.
    pub wtimeout: Option<Duration>,
}

impl WriteConcern {
    /// Server default acknowledgement.
    pub const ACKNOWLEDGED: Self = Self {
        w: None,
        journal: None,
        wtimeout: None,
    };

    /// Acknowledged by a single member.
    pub const W1: Self = Self {
        w: Some(Acknowledgement::Nodes(1)),
        journal: None,
        wtimeout: None,
    };

    /// Fire-and-forget: completion is reported without confirming anything.
    pub const UNACKNOWLEDGED: Self = Self {
        w: Some(Acknowledgement::Nodes(0)),
        journal: None,
        wtimeout: None,
    };

    /// Acknowledged once written to the journal.
    pub const JOURNALED: Self = Self {
        w: None,
        journal: Some(true),
        wtimeout: None,
    };

    /// Acknowledged by a majority of members.
    pub const MAJORITY: Self = Self {
        w: Some(Acknowledgement::Majority),
        journal: None,
        wtimeout: None,
    };

    /// Returns a copy requiring acknowledgement from `nodes` members.
    #[must_use]
    pub fn with_w(mut self, nodes: u32) -> Self {
        self.w = Some(Acknowledgement::Nodes(nodes));
        self
    }

    /// Returns a copy with a timeout.
    #[must_use]
    pub fn with_wtimeout(mut self, timeout: Duration) -> Self {
        self.wtimeout = Some(timeout);
        self
    }

    /// Returns true if the writer waits for some acknowledgement.
    #[must_use]
    pub fn is_acknowledged(&self) -> bool {
        match self.w {
            Some(Acknowledgement::Nodes(0)) => self.journal == Some(true),
            _ => true,
        }
    }
}

/// Outcome of a write as seen through its write concern.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteConcernResult {
    /// The write was not acknowledged; no counts are available.
    Unacknowledged,
    /// The write was acknowledged.
    Acknowledged {
        /// Number of documents inserted, matched or deleted.
        count: u64,
        /// Whether an update modified an existing document.
        is_update_of_existing: bool,
        /// `_id` of a document created by an upsert.
        upserted_id: Option<Bson>,
    },
}

impl WriteConcernResult {
    /// Creates an acknowledged result.
    #[must_use]
    pub fn acknowledged(
        count: u64,
        is_update_of_existing: bool,
        upserted_id: Option<Bson>,
    ) -> Self {
        Self::Acknowledged {
            count,
            is_update_of_existing,
            upserted_id,
        }
    }

    /// Returns true for acknowledged results.
    #[must_use]
    pub fn was_acknowledged(&self) -> bool {
        matches!(self, Self::Acknowledged { .. })
    }

    /// Document count, if acknowledged.
    #[must_use]
    pub fn count(&self) -> Option<u64> {
        match self {
            Self::Acknowledged { count, .. } => Some(*count),
            Self::Unacknowledged => None,
        }
    }
}

/// A single document to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertRequest {
    /// The document to insert.
    pub document: Document,
}

impl InsertRequest {
    /// Creates an insert request.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

/// Whether an update carries operators or a full replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Update operators such as `$set`.
    Update,
    /// A replacement document.
    Replace,
}

/// A single update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    /// Selects the documents to update.
    pub filter: Document,
    /// Operators or replacement document.
    pub update: Document,
    /// Operator update or replacement.
    pub kind: UpdateKind,
    /// Insert when nothing matches.
    pub upsert: bool,
    /// Update every match instead of the first.
    pub multi: bool,
}

impl UpdateRequest {
    /// Creates an operator update of the first matching document.
    #[must_use]
    pub fn update(filter: Document, update: Document) -> Self {
        Self {
            filter,
            update,
            kind: UpdateKind::Update,
            upsert: false,
            multi: false,
        }
    }

    /// Creates a replacement of the first matching document.
    #[must_use]
    pub fn replace(filter: Document, replacement: Document) -> Self {
        Self {
            filter,
            update: replacement,
            kind: UpdateKind::Replace,
            upsert: false,
            multi: false,
        }
    }

    /// Sets the upsert flag.
    #[must_use]
    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    /// Sets the multi flag.
    #[must_use]
    pub fn multi(mut self, multi: bool) -> Self {
        self.multi = multi;
        self
    }
}

/// A single delete.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteRequest {
    /// Selects the documents to delete.
    pub filter: Document,
    /// Delete every match instead of the first.
    pub multi: bool,
}

impl DeleteRequest {
    /// Deletes the first document matching `filter`.
    #[must_use]
    pub fn one(filter: Document) -> Self {
        Self {
            filter,
            multi: false,
        }
    }

    /// Deletes every document matching `filter`.
    #[must_use]
    pub fn many(filter: Document) -> Self {
        Self {
            filter,
            multi: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn acknowledgement_rules() {
        assert!(!WriteConcern::UNACKNOWLEDGED.is_acknowledged());
        assert!(WriteConcern::ACKNOWLEDGED.is_acknowledged());
        assert!(WriteConcern::W1.is_acknowledged());
        assert!(WriteConcern::MAJORITY.is_acknowledged());

        let journaled_w0 = WriteConcern {
            journal: Some(true),
            ..WriteConcern::UNACKNOWLEDGED
        };
        assert!(journaled_w0.is_acknowledged());
    }

    #[test]
    fn update_request_builders() {
        let req = UpdateRequest::update(doc! { "a" => 1 }, doc! { "$set" => doc! { "b" => 2 } })
            .upsert(true)
            .multi(true);
        assert_eq!(req.kind, UpdateKind::Update);
        assert!(req.upsert);
        assert!(req.multi);

        let req = UpdateRequest::replace(doc! {}, doc! { "b" => 2 });
        assert_eq!(req.kind, UpdateKind::Replace);
        assert!(!req.multi);
    }

    #[test]
    fn write_concern_result_accessors() {
        let result = WriteConcernResult::acknowledged(3, false, None);
        assert!(result.was_acknowledged());
        assert_eq!(result.count(), Some(3));
        assert_eq!(WriteConcernResult::Unacknowledged.count(), None);
    }
}
