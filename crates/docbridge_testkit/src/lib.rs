//! # DocBridge Testkit
//!
//! Test utilities for DocBridge.
//!
//! This crate provides:
//! - A scripted, call-recording engine double
//! - A capture of completion callbacks
//! - Sample data and a seeded memory engine
//! - Property-based test generators using proptest
//! - Tracing setup for tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docbridge_testkit::prelude::*;
//!
//! #[test]
//! fn records_calls() {
//!     let engine = RecordingEngine::new();
//!     let capture = CallbackCapture::<()>::new();
//!     // ... drive a connection over `engine`
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod capture;
pub mod fixtures;
pub mod generators;
pub mod logging;
pub mod recording;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::capture::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
    pub use crate::recording::*;
}

pub use capture::*;
pub use fixtures::*;
pub use generators::*;
pub use logging::*;
pub use recording::*;
