//! Closed sets of read and write operations.
//!
//! Operations are plain values. The dispatcher hands them to the engine,
//! which pattern-matches on the variant.

use crate::document::{Bson, Document};
use crate::query::QueryResult;
use crate::types::Namespace;
use crate::write::{DeleteRequest, InsertRequest, UpdateRequest, WriteConcern, WriteConcernResult};

/// A read against the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOperation {
    /// Find documents matching a filter.
    Find {
        /// Collection to read.
        namespace: Namespace,
        /// Query filter.
        filter: Document,
        /// Optional inclusion projection.
        projection: Option<Document>,
        /// Documents to skip.
        skip: u32,
        /// Maximum documents to return, `0` for no limit.
        limit: u32,
        /// Size of the first batch, `0` for the engine default.
        batch_size: u32,
    },
    /// Count documents matching a filter.
    Count {
        /// Collection to read.
        namespace: Namespace,
        /// Query filter.
        filter: Document,
    },
    /// Distinct values of a field among matching documents.
    Distinct {
        /// Collection to read.
        namespace: Namespace,
        /// Field (dotted paths allowed).
        field: String,
        /// Query filter.
        filter: Document,
    },
    /// Names of collections in a database.
    ListCollectionNames {
        /// Database to list.
        database: String,
    },
    /// Names of all databases.
    ListDatabaseNames,
}

impl ReadOperation {
    /// Creates an unbounded find.
    #[must_use]
    pub fn find(namespace: Namespace, filter: Document) -> Self {
        Self::Find {
            namespace,
            filter,
            projection: None,
            skip: 0,
            limit: 0,
            batch_size: 0,
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Find { .. } => "find",
            Self::Count { .. } => "count",
            Self::Distinct { .. } => "distinct",
            Self::ListCollectionNames { .. } => "listCollectionNames",
            Self::ListDatabaseNames => "listDatabaseNames",
        }
    }
}

/// The value a read produces.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// First page of a cursor.
    Cursor(QueryResult<Document>),
    /// A count.
    Count(u64),
    /// Distinct values.
    Values(Vec<Bson>),
    /// Collection or database names.
    Names(Vec<String>),
}

/// A write against the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOperation {
    /// Insert documents.
    Insert {
        /// Target collection.
        namespace: Namespace,
        /// Stop at the first failure.
        ordered: bool,
        /// Acknowledgement policy.
        write_concern: WriteConcern,
        /// Documents to insert.
        requests: Vec<InsertRequest>,
    },
    /// Update documents.
    Update {
        /// Target collection.
        namespace: Namespace,
        /// Stop at the first failure.
        ordered: bool,
        /// Acknowledgement policy.
        write_concern: WriteConcern,
        /// Update statements.
        requests: Vec<UpdateRequest>,
    },
    /// Delete documents.
    Delete {
        /// Target collection.
        namespace: Namespace,
        /// Stop at the first failure.
        ordered: bool,
        /// Acknowledgement policy.
        write_concern: WriteConcern,
        /// Delete statements.
        requests: Vec<DeleteRequest>,
    },
    /// Drop a collection.
    DropCollection {
        /// Collection to drop.
        namespace: Namespace,
    },
    /// Drop a database.
    DropDatabase {
        /// Database to drop.
        database: String,
    },
}

impl WriteOperation {
    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::DropCollection { .. } => "dropCollection",
            Self::DropDatabase { .. } => "dropDatabase",
        }
    }
}

/// The value a write produces.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// A document write and its acknowledgement.
    WriteConcern(WriteConcernResult),
    /// An administrative write with no payload.
    Completed,
}
