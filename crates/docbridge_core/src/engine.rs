//! The synchronous engine contract.

use crate::codec::Decoder;
use crate::command::SplittablePayload;
use crate::document::Document;
use crate::error::CoreResult;
use crate::operation::{ReadOperation, ReadOutcome, WriteOperation, WriteOutcome};
use crate::query::{CursorFlags, QueryResult};
use crate::session::SessionContext;
use crate::types::{Namespace, ReadPreference, ServerVersion};
use crate::validation::FieldNameValidator;
use crate::write::{DeleteRequest, InsertRequest, UpdateRequest, WriteConcern, WriteConcernResult};

/// A synchronous, in-process document engine.
///
/// Every method runs to completion on the calling thread and either returns
/// a value or an error. There are no partial results and no side channel.
///
/// # Invariants
///
/// - Implementations own all mutable state (documents, cursors, counters)
///   and its locking
/// - Implementations must be `Send + Sync`; adapters share them via `Arc`
pub trait Engine: Send + Sync {
    /// Inserts documents.
    fn insert(
        &self,
        namespace: &Namespace,
        ordered: bool,
        write_concern: &WriteConcern,
        inserts: &[InsertRequest],
    ) -> CoreResult<WriteConcernResult>;

    /// Applies updates.
    fn update(
        &self,
        namespace: &Namespace,
        ordered: bool,
        write_concern: &WriteConcern,
        updates: &[UpdateRequest],
    ) -> CoreResult<WriteConcernResult>;

    /// Applies deletes.
    fn delete(
        &self,
        namespace: &Namespace,
        ordered: bool,
        write_concern: &WriteConcern,
        deletes: &[DeleteRequest],
    ) -> CoreResult<WriteConcernResult>;

    /// Runs a command.
    fn command<T>(
        &self,
        database: &str,
        command: &Document,
        field_name_validator: &dyn FieldNameValidator,
        read_preference: ReadPreference,
        decoder: &dyn Decoder<T>,
        session: &SessionContext,
    ) -> CoreResult<T>;

    /// Runs a command whose bulk documents travel in a split payload.
    #[allow(clippy::too_many_arguments)]
    fn command_with_payload<T>(
        &self,
        database: &str,
        command: &Document,
        command_validator: &dyn FieldNameValidator,
        read_preference: ReadPreference,
        decoder: &dyn Decoder<T>,
        session: &SessionContext,
        response_expected: bool,
        payload: Option<&SplittablePayload>,
        payload_validator: &dyn FieldNameValidator,
    ) -> CoreResult<T>;

    /// Runs a command using the legacy slave-ok flag instead of a read
    /// preference.
    fn legacy_command<T>(
        &self,
        database: &str,
        command: &Document,
        slave_ok: bool,
        field_name_validator: &dyn FieldNameValidator,
        decoder: &dyn Decoder<T>,
    ) -> CoreResult<T>;

    /// Legacy slave-ok command carrying a session context.
    fn legacy_command_in_session<T>(
        &self,
        database: &str,
        command: &Document,
        slave_ok: bool,
        field_name_validator: &dyn FieldNameValidator,
        decoder: &dyn Decoder<T>,
        session: &SessionContext,
    ) -> CoreResult<T>;

    /// Runs a query whose first batch holds `number_to_return` documents.
    #[allow(clippy::too_many_arguments)]
    fn query<T>(
        &self,
        namespace: &Namespace,
        query: &Document,
        fields: Option<&Document>,
        number_to_return: i32,
        skip: i32,
        flags: CursorFlags,
        decoder: &dyn Decoder<T>,
    ) -> CoreResult<QueryResult<T>>;

    /// Runs a query bounded by `skip`, `limit` and `batch_size`.
    #[allow(clippy::too_many_arguments)]
    fn query_with_limit<T>(
        &self,
        namespace: &Namespace,
        query: &Document,
        fields: Option<&Document>,
        skip: i32,
        limit: i32,
        batch_size: i32,
        flags: CursorFlags,
        decoder: &dyn Decoder<T>,
    ) -> CoreResult<QueryResult<T>>;

    /// Fetches the next batch of an open cursor.
    fn get_more<T>(
        &self,
        namespace: &Namespace,
        cursor_id: u64,
        number_to_return: i32,
        decoder: &dyn Decoder<T>,
    ) -> CoreResult<QueryResult<T>>;

    /// Releases cursors.
    fn kill_cursor(&self, cursors: &[u64]) -> CoreResult<()>;

    /// Releases cursors belonging to `namespace`.
    fn kill_cursor_in_namespace(&self, namespace: &Namespace, cursors: &[u64]) -> CoreResult<()>;

    /// The version the engine currently reports.
    fn server_version(&self) -> ServerVersion;

    /// Executes a read operation.
    fn execute_read(
        &self,
        operation: ReadOperation,
        read_preference: ReadPreference,
    ) -> CoreResult<ReadOutcome>;

    /// Executes a write operation.
    fn execute_write(&self, operation: WriteOperation) -> CoreResult<WriteOutcome>;
}

/// Live source of the server version reported by connection descriptions.
pub trait ServerVersionSource: Send + Sync {
    /// The current server version.
    fn current_server_version(&self) -> ServerVersion;
}
