//! # DocBridge Memory
//!
//! A synchronous, single-node document engine held entirely in memory.
//!
//! This crate provides:
//! - [`MemoryEngine`]: implements [`docbridge_core::Engine`]
//! - [`MemoryConfig`]: reported version, batch sizing and wire version
//! - [`filter`]: query filters and inclusion projections
//! - [`update`]: update operators and replacement documents
//!
//! ## Key Invariants
//!
//! - Documents keep insertion order within a collection
//! - `_id` is unique per collection and immutable once stored
//! - Cursor ids are never reused; `0` means exhausted
//! - Reads and writes see a consistent snapshot per call

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod command;
mod config;
mod cursor;
mod engine;
pub mod filter;
mod store;
pub mod update;

pub use config::MemoryConfig;
pub use engine::MemoryEngine;
