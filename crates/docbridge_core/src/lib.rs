//! # DocBridge Core
//!
//! Shared vocabulary for DocBridge: documents, requests, write concerns,
//! operation values, errors, and the synchronous [`Engine`] contract that
//! the asynchronous adapter drives.
//!
//! This crate performs no I/O and holds no state.
//!
//! ## Example
//!
//! ```rust
//! use docbridge_core::{doc, InsertRequest, Namespace, WriteConcern};
//!
//! let ns = Namespace::parse("db.coll").unwrap();
//! let request = InsertRequest::new(doc! { "_id" => 1, "name" => "Ada" });
//! assert_eq!(ns.collection(), "coll");
//! assert!(!WriteConcern::UNACKNOWLEDGED.is_acknowledged());
//! assert_eq!(request.document.get_i64("_id"), Some(1));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod command;
mod config;
mod document;
mod engine;
mod error;
mod operation;
mod query;
mod session;
mod types;
mod validation;
mod write;

pub use codec::{Decoder, DocumentDecoder, SerdeDecoder};
pub use command::{PayloadKind, SplittablePayload};
pub use config::BridgeConfig;
pub use document::{Bson, Document};
pub use engine::{Engine, ServerVersionSource};
pub use error::{CoreError, CoreResult};
pub use operation::{ReadOperation, ReadOutcome, WriteOperation, WriteOutcome};
pub use query::{CursorFlags, QueryResult};
pub use session::{ClientSession, SessionContext};
pub use types::{
    ClusterId, ConnectionId, Namespace, ReadPreference, ServerAddress, ServerId, ServerVersion,
};
pub use validation::{FieldNameValidator, NoOpFieldNameValidator, StorageFieldNameValidator};
pub use write::{
    Acknowledgement, DeleteRequest, InsertRequest, UpdateKind, UpdateRequest, WriteConcern,
    WriteConcernResult,
};
