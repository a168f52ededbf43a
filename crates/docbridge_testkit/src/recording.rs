//! A scripted engine double that records every call.

use docbridge_core::{
    doc, CoreError, CoreResult, CursorFlags, Decoder, DeleteRequest, Document, Engine,
    FieldNameValidator, InsertRequest, Namespace, QueryResult, ReadOperation, ReadOutcome,
    ReadPreference, ServerAddress, ServerVersion, SessionContext, SplittablePayload,
    UpdateRequest, WriteConcern, WriteConcernResult, WriteOperation, WriteOutcome,
};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};
use tracing::trace;

/// One engine call as observed by [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    /// `insert`.
    Insert {
        /// Target namespace.
        namespace: Namespace,
        /// Ordered flag.
        ordered: bool,
        /// Write concern passed by the caller.
        write_concern: WriteConcern,
        /// Number of requests.
        requests: usize,
    },
    /// `update`.
    Update {
        /// Target namespace.
        namespace: Namespace,
        /// Ordered flag.
        ordered: bool,
        /// Write concern passed by the caller.
        write_concern: WriteConcern,
        /// Number of requests.
        requests: usize,
    },
    /// `delete`.
    Delete {
        /// Target namespace.
        namespace: Namespace,
        /// Ordered flag.
        ordered: bool,
        /// Write concern passed by the caller.
        write_concern: WriteConcern,
        /// Number of requests.
        requests: usize,
    },
    /// `command`.
    Command {
        /// Target database.
        database: String,
        /// The command document.
        command: Document,
        /// Read preference.
        read_preference: ReadPreference,
        /// Whether a session id was attached.
        has_session: bool,
    },
    /// `command_with_payload`.
    CommandWithPayload {
        /// Target database.
        database: String,
        /// The command document.
        command: Document,
        /// Read preference.
        read_preference: ReadPreference,
        /// Whether a session id was attached.
        has_session: bool,
        /// Whether the caller expects a reply.
        response_expected: bool,
        /// Remaining payload documents, if a payload was attached.
        payload_len: Option<usize>,
    },
    /// `legacy_command`.
    LegacyCommand {
        /// Target database.
        database: String,
        /// The command document.
        command: Document,
        /// Legacy slave-ok flag.
        slave_ok: bool,
    },
    /// `legacy_command_in_session`.
    LegacyCommandInSession {
        /// Target database.
        database: String,
        /// The command document.
        command: Document,
        /// Legacy slave-ok flag.
        slave_ok: bool,
        /// Whether a session id was attached.
        has_session: bool,
    },
    /// `query`.
    Query {
        /// Target namespace.
        namespace: Namespace,
        /// Requested first batch size.
        number_to_return: i32,
        /// Documents to skip.
        skip: i32,
        /// Cursor flags as received.
        flags: CursorFlags,
    },
    /// `query_with_limit`.
    QueryWithLimit {
        /// Target namespace.
        namespace: Namespace,
        /// Documents to skip.
        skip: i32,
        /// Total limit.
        limit: i32,
        /// Batch size.
        batch_size: i32,
        /// Cursor flags as received.
        flags: CursorFlags,
    },
    /// `get_more`.
    GetMore {
        /// Target namespace.
        namespace: Namespace,
        /// Cursor to continue.
        cursor_id: u64,
        /// Requested batch size.
        number_to_return: i32,
    },
    /// `kill_cursor` or `kill_cursor_in_namespace`.
    KillCursor {
        /// Namespace for the namespaced variant.
        namespace: Option<Namespace>,
        /// Cursor ids.
        cursors: Vec<u64>,
    },
    /// `execute_read`.
    ExecuteRead {
        /// Operation name.
        operation: &'static str,
        /// Read preference.
        read_preference: ReadPreference,
    },
    /// `execute_write`.
    ExecuteWrite {
        /// Operation name.
        operation: &'static str,
    },
}

/// A call together with where and when it happened.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// The call.
    pub call: EngineCall,
    /// Thread the engine was invoked on.
    pub thread: ThreadId,
    /// Position in the engine's global call order, starting at 0.
    pub sequence: u64,
}

/// Engine double with scripted responses.
///
/// Writes succeed by default, acknowledging one document per request when
/// the write concern is acknowledged. Commands answer `{ "ok": 1.0 }`,
/// queries return an empty exhausted page, and reads and writes through the
/// operation interface answer `Count(0)` and `Completed`. Every response can
/// be replaced with a setter. [`fail_next`](Self::fail_next) and
/// [`panic_with`](Self::panic_with) make the next call fail or panic after it
/// is recorded.
pub struct RecordingEngine {
    calls: Mutex<Vec<RecordedCall>>,
    sequence: AtomicU64,
    write_failure: Mutex<Option<CoreError>>,
    command_response: Mutex<CoreResult<Document>>,
    query_response: Mutex<(Vec<Document>, u64)>,
    kill_cursor_response: Mutex<CoreResult<()>>,
    read_outcome: Mutex<CoreResult<ReadOutcome>>,
    write_outcome: Mutex<CoreResult<WriteOutcome>>,
    pending_failure: Mutex<Option<CoreError>>,
    pending_panic: Mutex<Option<String>>,
    server_version: RwLock<ServerVersion>,
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingEngine {
    /// Creates a double with default responses.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            sequence: AtomicU64::new(0),
            write_failure: Mutex::new(None),
            command_response: Mutex::new(Ok(doc! { "ok" => 1.0 })),
            query_response: Mutex::new((Vec::new(), 0)),
            kill_cursor_response: Mutex::new(Ok(())),
            read_outcome: Mutex::new(Ok(ReadOutcome::Count(0))),
            write_outcome: Mutex::new(Ok(WriteOutcome::Completed)),
            pending_failure: Mutex::new(None),
            pending_panic: Mutex::new(None),
            server_version: RwLock::new(ServerVersion::default()),
        }
    }

    /// Makes insert, update and delete fail with `failure`, or succeed again
    /// with `None`.
    pub fn set_write_failure(&self, failure: Option<CoreError>) {
        *self.write_failure.lock() = failure;
    }

    /// Sets the raw reply of every command variant.
    pub fn set_command_response(&self, response: CoreResult<Document>) {
        *self.command_response.lock() = response;
    }

    /// Sets the documents and cursor id returned by queries and get-more.
    pub fn set_query_response(&self, documents: Vec<Document>, cursor_id: u64) {
        *self.query_response.lock() = (documents, cursor_id);
    }

    /// Sets the outcome of both kill-cursor variants.
    pub fn set_kill_cursor_response(&self, response: CoreResult<()>) {
        *self.kill_cursor_response.lock() = response;
    }

    /// Sets the outcome of `execute_read`.
    pub fn set_read_outcome(&self, outcome: CoreResult<ReadOutcome>) {
        *self.read_outcome.lock() = outcome;
    }

    /// Sets the outcome of `execute_write`.
    pub fn set_write_outcome(&self, outcome: CoreResult<WriteOutcome>) {
        *self.write_outcome.lock() = outcome;
    }

    /// Makes the next call fail with `failure`, whatever its kind.
    pub fn fail_next(&self, failure: CoreError) {
        *self.pending_failure.lock() = Some(failure);
    }

    /// Makes the next call panic with `message`.
    pub fn panic_with(&self, message: impl Into<String>) {
        *self.pending_panic.lock() = Some(message.into());
    }

    /// Replaces the reported server version.
    pub fn set_server_version(&self, version: ServerVersion) {
        *self.server_version.write() = version;
    }

    /// Recorded calls in order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().iter().map(|r| r.call.clone()).collect()
    }

    /// Recorded calls with thread and sequence information.
    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Forgets recorded calls.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: EngineCall) -> CoreResult<()> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        trace!(sequence, ?call, "engine call recorded");
        self.calls.lock().push(RecordedCall {
            call,
            thread: thread::current().id(),
            sequence,
        });
        let pending = self.pending_panic.lock().take();
        if let Some(message) = pending {
            panic!("{message}");
        }
        match self.pending_failure.lock().take() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    fn write_result(
        &self,
        write_concern: &WriteConcern,
        requests: usize,
    ) -> CoreResult<WriteConcernResult> {
        if let Some(failure) = self.write_failure.lock().clone() {
            return Err(failure);
        }
        Ok(if write_concern.is_acknowledged() {
            WriteConcernResult::acknowledged(requests as u64, false, None)
        } else {
            WriteConcernResult::Unacknowledged
        })
    }

    fn command_result<T>(&self, decoder: &dyn Decoder<T>) -> CoreResult<T> {
        let response = self.command_response.lock().clone();
        response.and_then(|reply| decoder.decode(&reply))
    }

    fn query_result<T>(
        &self,
        namespace: &Namespace,
        decoder: &dyn Decoder<T>,
    ) -> CoreResult<QueryResult<T>> {
        let (documents, cursor_id) = self.query_response.lock().clone();
        let results = documents
            .iter()
            .map(|d| decoder.decode(d))
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(QueryResult::new(namespace.clone(), results, cursor_id, ServerAddress::default()))
    }
}

impl Engine for RecordingEngine {
    fn insert(
        &self,
        namespace: &Namespace,
        ordered: bool,
        write_concern: &WriteConcern,
        inserts: &[InsertRequest],
    ) -> CoreResult<WriteConcernResult> {
        self.record(EngineCall::Insert {
            namespace: namespace.clone(),
            ordered,
            write_concern: write_concern.clone(),
            requests: inserts.len(),
        })?;
        self.write_result(write_concern, inserts.len())
    }

    fn update(
        &self,
        namespace: &Namespace,
        ordered: bool,
        write_concern: &WriteConcern,
        updates: &[UpdateRequest],
    ) -> CoreResult<WriteConcernResult> {
        self.record(EngineCall::Update {
            namespace: namespace.clone(),
            ordered,
            write_concern: write_concern.clone(),
            requests: updates.len(),
        })?;
        self.write_result(write_concern, updates.len())
    }

    fn delete(
        &self,
        namespace: &Namespace,
        ordered: bool,
        write_concern: &WriteConcern,
        deletes: &[DeleteRequest],
    ) -> CoreResult<WriteConcernResult> {
        self.record(EngineCall::Delete {
            namespace: namespace.clone(),
            ordered,
            write_concern: write_concern.clone(),
            requests: deletes.len(),
        })?;
        self.write_result(write_concern, deletes.len())
    }

    fn command<T>(
        &self,
        database: &str,
        command: &Document,
        _field_name_validator: &dyn FieldNameValidator,
        read_preference: ReadPreference,
        decoder: &dyn Decoder<T>,
        session: &SessionContext,
    ) -> CoreResult<T> {
        self.record(EngineCall::Command {
            database: database.to_string(),
            command: command.clone(),
            read_preference,
            has_session: session.has_session(),
        })?;
        self.command_result(decoder)
    }

    fn command_with_payload<T>(
        &self,
        database: &str,
        command: &Document,
        _command_validator: &dyn FieldNameValidator,
        read_preference: ReadPreference,
        decoder: &dyn Decoder<T>,
        session: &SessionContext,
        response_expected: bool,
        payload: Option<&SplittablePayload>,
        _payload_validator: &dyn FieldNameValidator,
    ) -> CoreResult<T> {
        self.record(EngineCall::CommandWithPayload {
            database: database.to_string(),
            command: command.clone(),
            read_preference,
            has_session: session.has_session(),
            response_expected,
            payload_len: payload.map(|p| p.remaining().len()),
        })?;
        self.command_result(decoder)
    }

    fn legacy_command<T>(
        &self,
        database: &str,
        command: &Document,
        slave_ok: bool,
        _field_name_validator: &dyn FieldNameValidator,
        decoder: &dyn Decoder<T>,
    ) -> CoreResult<T> {
        self.record(EngineCall::LegacyCommand {
            database: database.to_string(),
            command: command.clone(),
            slave_ok,
        })?;
        self.command_result(decoder)
    }

    fn legacy_command_in_session<T>(
        &self,
        database: &str,
        command: &Document,
        slave_ok: bool,
        _field_name_validator: &dyn FieldNameValidator,
        decoder: &dyn Decoder<T>,
        session: &SessionContext,
    ) -> CoreResult<T> {
        self.record(EngineCall::LegacyCommandInSession {
            database: database.to_string(),
            command: command.clone(),
            slave_ok,
            has_session: session.has_session(),
        })?;
        self.command_result(decoder)
    }

    fn query<T>(
        &self,
        namespace: &Namespace,
        _query: &Document,
        _fields: Option<&Document>,
        number_to_return: i32,
        skip: i32,
        flags: CursorFlags,
        decoder: &dyn Decoder<T>,
    ) -> CoreResult<QueryResult<T>> {
        self.record(EngineCall::Query {
            namespace: namespace.clone(),
            number_to_return,
            skip,
            flags,
        })?;
        self.query_result(namespace, decoder)
    }

    fn query_with_limit<T>(
        &self,
        namespace: &Namespace,
        _query: &Document,
        _fields: Option<&Document>,
        skip: i32,
        limit: i32,
        batch_size: i32,
        flags: CursorFlags,
        decoder: &dyn Decoder<T>,
    ) -> CoreResult<QueryResult<T>> {
        self.record(EngineCall::QueryWithLimit {
            namespace: namespace.clone(),
            skip,
            limit,
            batch_size,
            flags,
        })?;
        self.query_result(namespace, decoder)
    }

    fn get_more<T>(
        &self,
        namespace: &Namespace,
        cursor_id: u64,
        number_to_return: i32,
        decoder: &dyn Decoder<T>,
    ) -> CoreResult<QueryResult<T>> {
        self.record(EngineCall::GetMore {
            namespace: namespace.clone(),
            cursor_id,
            number_to_return,
        })?;
        self.query_result(namespace, decoder)
    }

    fn kill_cursor(&self, cursors: &[u64]) -> CoreResult<()> {
        self.record(EngineCall::KillCursor {
            namespace: None,
            cursors: cursors.to_vec(),
        })?;
        self.kill_cursor_response.lock().clone()
    }

    fn kill_cursor_in_namespace(&self, namespace: &Namespace, cursors: &[u64]) -> CoreResult<()> {
        self.record(EngineCall::KillCursor {
            namespace: Some(namespace.clone()),
            cursors: cursors.to_vec(),
        })?;
        self.kill_cursor_response.lock().clone()
    }

    fn server_version(&self) -> ServerVersion {
        self.server_version.read().clone()
    }

    fn execute_read(
        &self,
        operation: ReadOperation,
        read_preference: ReadPreference,
    ) -> CoreResult<ReadOutcome> {
        self.record(EngineCall::ExecuteRead {
            operation: operation.name(),
            read_preference,
        })?;
        self.read_outcome.lock().clone()
    }

    fn execute_write(&self, operation: WriteOperation) -> CoreResult<WriteOutcome> {
        self.record(EngineCall::ExecuteWrite {
            operation: operation.name(),
        })?;
        self.write_outcome.lock().clone()
    }
}
