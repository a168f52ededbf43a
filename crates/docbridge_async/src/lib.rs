//! # DocBridge Async
//!
//! Presents a synchronous, in-process document [`Engine`] behind the
//! callback-style connection contract a driver expects.
//!
//! This crate provides:
//! - [`AsyncConnection`]: the callback contract plus nominal lifecycle
//!   (`retain`, `release`, `count`)
//! - [`AsyncBridge`]: completes every operation inline on the calling thread
//! - [`OperationExecutor`] / [`OperationDispatcher`]: synchronous read and
//!   write dispatch
//! - [`SimulatedServer`]: hands out bridges and dispatchers sharing one engine
//!
//! ## Key Invariants
//!
//! - Every callback is invoked exactly once, before the method returns
//! - A callback receives either a value or an error, never both
//! - Engine failures and engine panics are delivered, never thrown
//! - Sessions are accepted and ignored
//!
//! ## Example
//!
//! ```rust
//! use docbridge_async::{AsyncConnection, SimulatedServer};
//! use docbridge_core::{
//!     doc, Bson, DocumentDecoder, NoOpFieldNameValidator, ReadPreference, SessionContext,
//! };
//! use docbridge_memory::MemoryEngine;
//!
//! let server = SimulatedServer::new(MemoryEngine::new());
//! let connection = server.connect();
//!
//! let mut reply = None;
//! connection.command_async(
//!     "admin",
//!     &doc! { "ping" => 1 },
//!     &NoOpFieldNameValidator,
//!     ReadPreference::Primary,
//!     &DocumentDecoder,
//!     &SessionContext::none(),
//!     |outcome| reply = Some(outcome),
//! );
//! assert_eq!(reply.unwrap().unwrap().get("ok"), Some(&Bson::Double(1.0)));
//! ```
//!
//! [`Engine`]: docbridge_core::Engine

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod connection;
mod description;
mod executor;
mod server;

pub use connection::{AsyncBridge, AsyncConnection, SingleResultCallback};
pub use description::ConnectionDescription;
pub use executor::{OperationDispatcher, OperationExecutor};
pub use server::SimulatedServer;
