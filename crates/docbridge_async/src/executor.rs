//! Synchronous operation dispatch.

use docbridge_core::{
    ClientSession, CoreResult, Engine, ReadOperation, ReadOutcome, ReadPreference,
    WriteOperation, WriteOutcome,
};
use std::sync::Arc;
use tracing::trace;

/// Executes read and write operations.
///
/// Session-accepting overloads exist for callers written against a
/// session-aware contract. They behave exactly like their session-less
/// counterparts.
pub trait OperationExecutor {
    /// Executes a read.
    ///
    /// # Errors
    ///
    /// Returns whatever error the engine raised.
    fn execute_read(
        &self,
        operation: ReadOperation,
        read_preference: ReadPreference,
    ) -> CoreResult<ReadOutcome>;

    /// Executes a write.
    ///
    /// # Errors
    ///
    /// Returns whatever error the engine raised.
    fn execute_write(&self, operation: WriteOperation) -> CoreResult<WriteOutcome>;

    /// Executes a read; the session is ignored.
    ///
    /// # Errors
    ///
    /// Returns whatever error the engine raised.
    fn execute_read_in_session(
        &self,
        operation: ReadOperation,
        read_preference: ReadPreference,
        session: &ClientSession,
    ) -> CoreResult<ReadOutcome>;

    /// Executes a write; the session is ignored.
    ///
    /// # Errors
    ///
    /// Returns whatever error the engine raised.
    fn execute_write_in_session(
        &self,
        operation: WriteOperation,
        session: &ClientSession,
    ) -> CoreResult<WriteOutcome>;
}

/// Forwards operations straight to the engine. No retry, no routing.
pub struct OperationDispatcher<E: Engine> {
    engine: Arc<E>,
}

impl<E: Engine> OperationDispatcher<E> {
    /// Creates a dispatcher over `engine`.
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    /// The engine behind this dispatcher.
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }
}

impl<E: Engine> Clone for OperationDispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<E: Engine> OperationExecutor for OperationDispatcher<E> {
    fn execute_read(
        &self,
        operation: ReadOperation,
        read_preference: ReadPreference,
    ) -> CoreResult<ReadOutcome> {
        trace!(operation = operation.name(), ?read_preference, "execute_read");
        self.engine.execute_read(operation, read_preference)
    }

    fn execute_write(&self, operation: WriteOperation) -> CoreResult<WriteOutcome> {
        trace!(operation = operation.name(), "execute_write");
        self.engine.execute_write(operation)
    }

    fn execute_read_in_session(
        &self,
        operation: ReadOperation,
        read_preference: ReadPreference,
        _session: &ClientSession,
    ) -> CoreResult<ReadOutcome> {
        self.execute_read(operation, read_preference)
    }

    fn execute_write_in_session(
        &self,
        operation: WriteOperation,
        _session: &ClientSession,
    ) -> CoreResult<WriteOutcome> {
        self.execute_write(operation)
    }
}
