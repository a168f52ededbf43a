//! Callback-style connection over a synchronous engine.
//!
//! [`AsyncBridge`] implements [`AsyncConnection`] by calling the engine
//! inline and handing the outcome to the caller's callback before returning.
//! Nothing is queued, spawned or deferred.

use crate::description::{ConnectionDescription, EngineVersionSource};
use docbridge_core::{
    BridgeConfig, ClusterId, CoreError, CoreResult, CursorFlags, Decoder, DeleteRequest,
    Document, Engine, FieldNameValidator, InsertRequest, Namespace, QueryResult, ReadPreference,
    ServerId, SessionContext, SplittablePayload, UpdateRequest, WriteConcern, WriteConcernResult,
};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A completion handler invoked exactly once with an operation's outcome.
pub trait SingleResultCallback<T>: FnOnce(CoreResult<T>) {}

impl<T, F: FnOnce(CoreResult<T>)> SingleResultCallback<T> for F {}

/// The asynchronous connection contract.
///
/// Every `*_async` method delivers exactly one outcome to its callback.
/// Implementations decide when; [`AsyncBridge`] always does so before the
/// method returns.
pub trait AsyncConnection {
    /// Takes another reference to the connection.
    fn retain(&self) -> &Self
    where
        Self: Sized;

    /// Gives back a reference taken with [`retain`](Self::retain).
    fn release(&self);

    /// Number of outstanding operations.
    fn count(&self) -> u32;

    /// Identity of the connection.
    fn description(&self) -> &ConnectionDescription;

    /// Inserts one document with the connection's default write concern.
    fn insert_async<F>(
        &self,
        namespace: &Namespace,
        ordered: bool,
        request: &InsertRequest,
        callback: F,
    ) where
        F: SingleResultCallback<WriteConcernResult>;

    /// Applies one update with the connection's default write concern.
    fn update_async<F>(
        &self,
        namespace: &Namespace,
        ordered: bool,
        request: &UpdateRequest,
        callback: F,
    ) where
        F: SingleResultCallback<WriteConcernResult>;

    /// Applies one delete with the connection's default write concern.
    fn delete_async<F>(
        &self,
        namespace: &Namespace,
        ordered: bool,
        request: &DeleteRequest,
        callback: F,
    ) where
        F: SingleResultCallback<WriteConcernResult>;

    /// Inserts documents with an explicit write concern.
    fn insert_many_async<F>(
        &self,
        namespace: &Namespace,
        ordered: bool,
        write_concern: &WriteConcern,
        requests: &[InsertRequest],
        callback: F,
    ) where
        F: SingleResultCallback<WriteConcernResult>;

    /// Applies updates with an explicit write concern.
    fn update_many_async<F>(
        &self,
        namespace: &Namespace,
        ordered: bool,
        write_concern: &WriteConcern,
        requests: &[UpdateRequest],
        callback: F,
    ) where
        F: SingleResultCallback<WriteConcernResult>;

    /// Applies deletes with an explicit write concern.
    fn delete_many_async<F>(
        &self,
        namespace: &Namespace,
        ordered: bool,
        write_concern: &WriteConcern,
        requests: &[DeleteRequest],
        callback: F,
    ) where
        F: SingleResultCallback<WriteConcernResult>;

    /// Runs a command.
    #[allow(clippy::too_many_arguments)]
    fn command_async<T, F>(
        &self,
        database: &str,
        command: &Document,
        field_name_validator: &dyn FieldNameValidator,
        read_preference: ReadPreference,
        decoder: &dyn Decoder<T>,
        session: &SessionContext,
        callback: F,
    ) where
        F: SingleResultCallback<T>;

    /// Runs a command with a split bulk-write payload.
    #[allow(clippy::too_many_arguments)]
    fn command_with_payload_async<T, F>(
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
        callback: F,
    ) where
        F: SingleResultCallback<T>;

    /// Runs a command with the legacy slave-ok flag.
    fn legacy_command_async<T, F>(
        &self,
        database: &str,
        command: &Document,
        slave_ok: bool,
        field_name_validator: &dyn FieldNameValidator,
        decoder: &dyn Decoder<T>,
        callback: F,
    ) where
        F: SingleResultCallback<T>;

    /// Runs a legacy slave-ok command carrying a session context.
    #[allow(clippy::too_many_arguments)]
    fn legacy_command_in_session_async<T, F>(
        &self,
        database: &str,
        command: &Document,
        slave_ok: bool,
        field_name_validator: &dyn FieldNameValidator,
        decoder: &dyn Decoder<T>,
        session: &SessionContext,
        callback: F,
    ) where
        F: SingleResultCallback<T>;

    /// Runs a query whose first batch holds `number_to_return` documents.
    #[allow(clippy::too_many_arguments)]
    fn query_async<T, F>(
        &self,
        namespace: &Namespace,
        query: &Document,
        fields: Option<&Document>,
        number_to_return: i32,
        skip: i32,
        flags: CursorFlags,
        decoder: &dyn Decoder<T>,
        callback: F,
    ) where
        F: SingleResultCallback<QueryResult<T>>;

    /// Runs a query bounded by skip, limit and batch size.
    #[allow(clippy::too_many_arguments)]
    fn query_with_limit_async<T, F>(
        &self,
        namespace: &Namespace,
        query: &Document,
        fields: Option<&Document>,
        skip: i32,
        limit: i32,
        batch_size: i32,
        flags: CursorFlags,
        decoder: &dyn Decoder<T>,
        callback: F,
    ) where
        F: SingleResultCallback<QueryResult<T>>;

    /// Fetches the next batch of a cursor.
    fn get_more_async<T, F>(
        &self,
        namespace: &Namespace,
        cursor_id: u64,
        number_to_return: i32,
        decoder: &dyn Decoder<T>,
        callback: F,
    ) where
        F: SingleResultCallback<QueryResult<T>>;

    /// Releases cursors.
    fn kill_cursor_async<F>(&self, cursors: &[u64], callback: F)
    where
        F: SingleResultCallback<()>;

    /// Releases cursors of one namespace.
    fn kill_cursor_in_namespace_async<F>(&self, namespace: &Namespace, cursors: &[u64], callback: F)
    where
        F: SingleResultCallback<()>;
}

/// A single logical connection that completes every operation inline.
///
/// The engine has no connection resource, so reference counting is nominal:
/// [`retain`](AsyncConnection::retain) hands back the same instance,
/// [`release`](AsyncConnection::release) does nothing, and
/// [`count`](AsyncConnection::count) is always zero because no operation is
/// ever outstanding once its method has returned.
///
/// # Example
///
/// ```
/// use docbridge_async::{AsyncBridge, AsyncConnection};
/// use docbridge_core::{doc, BridgeConfig, InsertRequest, Namespace};
/// use docbridge_memory::MemoryEngine;
/// use std::sync::Arc;
///
/// let bridge = AsyncBridge::new(Arc::new(MemoryEngine::new()), &BridgeConfig::default());
/// let ns = Namespace::parse("db.coll").unwrap();
///
/// let mut delivered = None;
/// bridge.insert_async(&ns, true, &InsertRequest::new(doc! { "_id" => 1 }), |outcome| {
///     delivered = Some(outcome);
/// });
/// assert!(delivered.unwrap().is_ok());
/// ```
pub struct AsyncBridge<E: Engine> {
    engine: Arc<E>,
    description: ConnectionDescription,
    default_write_concern: WriteConcern,
}

impl<E: Engine + 'static> AsyncBridge<E> {
    /// Creates a bridge in a fresh cluster.
    pub fn new(engine: Arc<E>, config: &BridgeConfig) -> Self {
        let server_id = ServerId::new(ClusterId::new(), config.server_address.clone());
        Self::with_server_id(engine, server_id, config)
    }

    /// Creates a bridge for a known server.
    pub fn with_server_id(engine: Arc<E>, server_id: ServerId, config: &BridgeConfig) -> Self {
        let version_source = Arc::new(EngineVersionSource(Arc::clone(&engine)));
        Self {
            engine,
            description: ConnectionDescription::new(server_id, version_source),
            default_write_concern: config.default_write_concern.clone(),
        }
    }
}

impl<E: Engine> AsyncBridge<E> {
    /// The engine behind this connection.
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Write concern used by the single-request write overloads.
    pub fn default_write_concern(&self) -> &WriteConcern {
        &self.default_write_concern
    }

    /// Runs `call` inline and hands its outcome to `callback`.
    ///
    /// Engine errors and engine panics both become `Err` outcomes. A panic
    /// raised by the callback itself is not caught.
    fn complete<T, F>(
        &self,
        operation: &'static str,
        call: impl FnOnce() -> CoreResult<T>,
        callback: F,
    ) where
        F: SingleResultCallback<T>,
    {
        let outcome = match panic::catch_unwind(AssertUnwindSafe(call)) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(operation, %message, "engine panicked, delivering failure");
                Err(CoreError::EnginePanicked { message })
            }
        };
        if let Err(error) = &outcome {
            debug!(operation, %error, "delivering failure");
        }
        callback(outcome);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<E: Engine> AsyncConnection for AsyncBridge<E> {
    fn retain(&self) -> &Self {
        debug!("retain()");
        self
    }

    fn release(&self) {
        debug!("release()");
    }

    fn count(&self) -> u32 {
        info!("count()");
        0
    }

    fn description(&self) -> &ConnectionDescription {
        &self.description
    }

    fn insert_async<F>(
        &self,
        namespace: &Namespace,
        ordered: bool,
        request: &InsertRequest,
        callback: F,
    ) where
        F: SingleResultCallback<WriteConcernResult>,
    {
        self.insert_many_async(
            namespace,
            ordered,
            &self.default_write_concern,
            std::slice::from_ref(request),
            callback,
        );
    }

    fn update_async<F>(
        &self,
        namespace: &Namespace,
        ordered: bool,
        request: &UpdateRequest,
        callback: F,
    ) where
        F: SingleResultCallback<WriteConcernResult>,
    {
        self.update_many_async(
            namespace,
            ordered,
            &self.default_write_concern,
            std::slice::from_ref(request),
            callback,
        );
    }

    fn delete_async<F>(
        &self,
        namespace: &Namespace,
        ordered: bool,
        request: &DeleteRequest,
        callback: F,
    ) where
        F: SingleResultCallback<WriteConcernResult>,
    {
        self.delete_many_async(
            namespace,
            ordered,
            &self.default_write_concern,
            std::slice::from_ref(request),
            callback,
        );
    }

    fn insert_many_async<F>(
        &self,
        namespace: &Namespace,
        ordered: bool,
        write_concern: &WriteConcern,
        requests: &[InsertRequest],
        callback: F,
    ) where
        F: SingleResultCallback<WriteConcernResult>,
    {
        self.complete(
            "insert",
            || self.engine.insert(namespace, ordered, write_concern, requests),
            callback,
        );
    }

    fn update_many_async<F>(
        &self,
        namespace: &Namespace,
        ordered: bool,
        write_concern: &WriteConcern,
        requests: &[UpdateRequest],
        callback: F,
    ) where
        F: SingleResultCallback<WriteConcernResult>,
    {
        self.complete(
            "update",
            || self.engine.update(namespace, ordered, write_concern, requests),
            callback,
        );
    }

    fn delete_many_async<F>(
        &self,
        namespace: &Namespace,
        ordered: bool,
        write_concern: &WriteConcern,
        requests: &[DeleteRequest],
        callback: F,
    ) where
        F: SingleResultCallback<WriteConcernResult>,
    {
        self.complete(
            "delete",
            || self.engine.delete(namespace, ordered, write_concern, requests),
            callback,
        );
    }

    fn command_async<T, F>(
        &self,
        database: &str,
        command: &Document,
        field_name_validator: &dyn FieldNameValidator,
        read_preference: ReadPreference,
        decoder: &dyn Decoder<T>,
        session: &SessionContext,
        callback: F,
    ) where
        F: SingleResultCallback<T>,
    {
        info!(%command, "command_async()");
        self.complete(
            "command",
            || {
                self.engine.command(
                    database,
                    command,
                    field_name_validator,
                    read_preference,
                    decoder,
                    session,
                )
            },
            callback,
        );
    }

    fn command_with_payload_async<T, F>(
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
        callback: F,
    ) where
        F: SingleResultCallback<T>,
    {
        info!(%command, "command_async()");
        self.complete(
            "command",
            || {
                self.engine.command_with_payload(
                    database,
                    command,
                    command_validator,
                    read_preference,
                    decoder,
                    session,
                    response_expected,
                    payload,
                    payload_validator,
                )
            },
            callback,
        );
    }

    fn legacy_command_async<T, F>(
        &self,
        database: &str,
        command: &Document,
        slave_ok: bool,
        field_name_validator: &dyn FieldNameValidator,
        decoder: &dyn Decoder<T>,
        callback: F,
    ) where
        F: SingleResultCallback<T>,
    {
        info!(%command, "command_async()");
        self.complete(
            "command",
            || {
                self.engine
                    .legacy_command(database, command, slave_ok, field_name_validator, decoder)
            },
            callback,
        );
    }

    fn legacy_command_in_session_async<T, F>(
        &self,
        database: &str,
        command: &Document,
        slave_ok: bool,
        field_name_validator: &dyn FieldNameValidator,
        decoder: &dyn Decoder<T>,
        session: &SessionContext,
        callback: F,
    ) where
        F: SingleResultCallback<T>,
    {
        info!(%command, "command_async()");
        self.complete(
            "command",
            || {
                self.engine.legacy_command_in_session(
                    database,
                    command,
                    slave_ok,
                    field_name_validator,
                    decoder,
                    session,
                )
            },
            callback,
        );
    }

    fn query_async<T, F>(
        &self,
        namespace: &Namespace,
        query: &Document,
        fields: Option<&Document>,
        number_to_return: i32,
        skip: i32,
        flags: CursorFlags,
        decoder: &dyn Decoder<T>,
        callback: F,
    ) where
        F: SingleResultCallback<QueryResult<T>>,
    {
        self.complete(
            "query",
            || {
                self.engine
                    .query(namespace, query, fields, number_to_return, skip, flags, decoder)
            },
            callback,
        );
    }

    fn query_with_limit_async<T, F>(
        &self,
        namespace: &Namespace,
        query: &Document,
        fields: Option<&Document>,
        skip: i32,
        limit: i32,
        batch_size: i32,
        flags: CursorFlags,
        decoder: &dyn Decoder<T>,
        callback: F,
    ) where
        F: SingleResultCallback<QueryResult<T>>,
    {
        info!(%query, "query_async()");
        self.complete(
            "query",
            || {
                self.engine.query_with_limit(
                    namespace, query, fields, skip, limit, batch_size, flags, decoder,
                )
            },
            callback,
        );
    }

    fn get_more_async<T, F>(
        &self,
        namespace: &Namespace,
        cursor_id: u64,
        number_to_return: i32,
        decoder: &dyn Decoder<T>,
        callback: F,
    ) where
        F: SingleResultCallback<QueryResult<T>>,
    {
        self.complete(
            "getMore",
            || {
                self.engine
                    .get_more(namespace, cursor_id, number_to_return, decoder)
            },
            callback,
        );
    }

    fn kill_cursor_async<F>(&self, cursors: &[u64], callback: F)
    where
        F: SingleResultCallback<()>,
    {
        self.complete("killCursor", || self.engine.kill_cursor(cursors), callback);
    }

    fn kill_cursor_in_namespace_async<F>(&self, namespace: &Namespace, cursors: &[u64], callback: F)
    where
        F: SingleResultCallback<()>,
    {
        self.complete(
            "killCursor",
            || self.engine.kill_cursor_in_namespace(namespace, cursors),
            callback,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docbridge_core::{doc, DocumentDecoder, NoOpFieldNameValidator, ServerVersion};
    use docbridge_testkit::{CallbackCapture, EngineCall, RecordingEngine};

    fn bridge() -> (Arc<RecordingEngine>, AsyncBridge<RecordingEngine>) {
        let engine = Arc::new(RecordingEngine::new());
        let bridge = AsyncBridge::new(Arc::clone(&engine), &BridgeConfig::default());
        (engine, bridge)
    }

    fn ns() -> Namespace {
        Namespace::new("db", "coll")
    }

    #[test]
    fn retain_returns_same_instance() {
        let (_, bridge) = bridge();
        assert!(std::ptr::eq(bridge.retain(), &bridge));
        assert!(std::ptr::eq(bridge.retain().retain().retain(), &bridge));
        bridge.release();
        bridge.release();
    }

    #[test]
    fn count_is_always_zero() {
        let (_, bridge) = bridge();
        assert_eq!(bridge.count(), 0);
        for _ in 0..5 {
            bridge.kill_cursor_async(&[1], |_| {});
        }
        assert_eq!(bridge.count(), 0);
    }

    #[test]
    fn single_insert_uses_unacknowledged_write_concern() {
        let (engine, bridge) = bridge();
        let capture = CallbackCapture::new();
        let request = InsertRequest::new(doc! { "x" => 1 });
        bridge.insert_async(&ns(), true, &request, capture.callback());

        assert_eq!(capture.take_single(), Ok(WriteConcernResult::Unacknowledged));
        assert_eq!(
            engine.calls(),
            vec![EngineCall::Insert {
                namespace: ns(),
                ordered: true,
                write_concern: WriteConcern::UNACKNOWLEDGED,
                requests: 1,
            }]
        );
    }

    #[test]
    fn single_update_and_delete_use_default_write_concern() {
        let (engine, bridge) = bridge();
        bridge.update_async(
            &ns(),
            false,
            &UpdateRequest::update(doc! {}, doc! { "$set" => doc! { "a" => 1 } }),
            |_| {},
        );
        bridge.delete_async(&ns(), false, &DeleteRequest::one(doc! {}), |_| {});

        let calls = engine.calls();
        assert!(matches!(
            &calls[0],
            EngineCall::Update { write_concern, requests: 1, ordered: false, .. }
                if *write_concern == WriteConcern::UNACKNOWLEDGED
        ));
        assert!(matches!(
            &calls[1],
            EngineCall::Delete { write_concern, requests: 1, .. }
                if *write_concern == WriteConcern::UNACKNOWLEDGED
        ));
    }

    #[test]
    fn configured_default_write_concern_applies_to_single_requests() {
        let engine = Arc::new(RecordingEngine::new());
        let config = BridgeConfig::new().default_write_concern(WriteConcern::W1);
        let bridge = AsyncBridge::new(Arc::clone(&engine), &config);

        let capture = CallbackCapture::new();
        bridge.insert_async(&ns(), true, &InsertRequest::new(doc! {}), capture.callback());
        assert_eq!(
            capture.take_single(),
            Ok(WriteConcernResult::acknowledged(1, false, None))
        );
    }

    #[test]
    fn many_requests_use_caller_write_concern() {
        let (engine, bridge) = bridge();
        let requests = vec![
            InsertRequest::new(doc! { "_id" => 1 }),
            InsertRequest::new(doc! { "_id" => 2 }),
        ];
        let capture = CallbackCapture::new();
        bridge.insert_many_async(
            &ns(),
            false,
            &WriteConcern::JOURNALED,
            &requests,
            capture.callback(),
        );

        assert_eq!(
            capture.take_single(),
            Ok(WriteConcernResult::acknowledged(2, false, None))
        );
        assert_eq!(
            engine.calls(),
            vec![EngineCall::Insert {
                namespace: ns(),
                ordered: false,
                write_concern: WriteConcern::JOURNALED,
                requests: 2,
            }]
        );
    }

    #[test]
    fn command_failure_is_delivered_unchanged() {
        let (engine, bridge) = bridge();
        let failure = CoreError::DuplicateKey {
            namespace: "db.coll".into(),
            key: "1".into(),
        };
        engine.set_command_response(Err(failure.clone()));

        let capture = CallbackCapture::<Document>::new();
        bridge.command_async(
            "db",
            &doc! { "insert" => "coll" },
            &NoOpFieldNameValidator,
            ReadPreference::Primary,
            &DocumentDecoder,
            &SessionContext::none(),
            capture.callback(),
        );

        assert_eq!(capture.take_single(), Err(failure));
    }

    #[test]
    fn command_variants_reach_their_engine_calls() {
        let (engine, bridge) = bridge();
        let cmd = doc! { "ping" => 1 };
        let session = SessionContext::with_new_session();

        bridge.command_with_payload_async(
            "db",
            &cmd,
            &NoOpFieldNameValidator,
            ReadPreference::Nearest,
            &DocumentDecoder,
            &session,
            false,
            None,
            &NoOpFieldNameValidator,
            |_| {},
        );
        bridge.legacy_command_async(
            "db",
            &cmd,
            true,
            &NoOpFieldNameValidator,
            &DocumentDecoder,
            |_| {},
        );
        bridge.legacy_command_in_session_async(
            "db",
            &cmd,
            false,
            &NoOpFieldNameValidator,
            &DocumentDecoder,
            &session,
            |_| {},
        );

        let calls = engine.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(
            &calls[0],
            EngineCall::CommandWithPayload {
                read_preference: ReadPreference::Nearest,
                response_expected: false,
                has_session: true,
                ..
            }
        ));
        assert!(matches!(&calls[1], EngineCall::LegacyCommand { slave_ok: true, .. }));
        assert!(matches!(
            &calls[2],
            EngineCall::LegacyCommandInSession { slave_ok: false, has_session: true, .. }
        ));
    }

    #[test]
    fn query_flags_are_forwarded_untouched() {
        let (engine, bridge) = bridge();
        let flags = CursorFlags::new()
            .tailable(true)
            .await_data(true)
            .no_cursor_timeout(true)
            .partial(true)
            .oplog_replay(true)
            .slave_ok(true);

        bridge.query_async(&ns(), &doc! {}, None, 10, 5, flags, &DocumentDecoder, |_| {});
        bridge.query_with_limit_async(
            &ns(),
            &doc! {},
            None,
            1,
            2,
            3,
            flags,
            &DocumentDecoder,
            |_| {},
        );

        assert_eq!(
            engine.calls(),
            vec![
                EngineCall::Query {
                    namespace: ns(),
                    number_to_return: 10,
                    skip: 5,
                    flags,
                },
                EngineCall::QueryWithLimit {
                    namespace: ns(),
                    skip: 1,
                    limit: 2,
                    batch_size: 3,
                    flags,
                },
            ]
        );
    }

    #[test]
    fn kill_cursor_success_carries_no_payload() {
        let (engine, bridge) = bridge();
        let capture = CallbackCapture::new();
        bridge.kill_cursor_async(&[1, 2, 3], capture.callback());

        assert_eq!(capture.take_single(), Ok(()));
        assert_eq!(
            engine.calls(),
            vec![EngineCall::KillCursor {
                namespace: None,
                cursors: vec![1, 2, 3],
            }]
        );
    }

    #[test]
    fn kill_cursor_in_namespace_forwards_namespace() {
        let (engine, bridge) = bridge();
        bridge.kill_cursor_in_namespace_async(&ns(), &[9], |_| {});
        assert_eq!(
            engine.calls(),
            vec![EngineCall::KillCursor {
                namespace: Some(ns()),
                cursors: vec![9],
            }]
        );
    }

    #[test]
    fn engine_panic_becomes_failure() {
        let (engine, bridge) = bridge();
        engine.panic_with("index corrupted");

        let capture = CallbackCapture::new();
        bridge.get_more_async(&ns(), 7, 10, &DocumentDecoder, capture.callback());

        assert_eq!(
            capture.take_single(),
            Err(CoreError::EnginePanicked {
                message: "index corrupted".into()
            })
        );
    }

    #[test]
    fn callback_runs_before_method_returns_on_calling_thread() {
        let (engine, bridge) = bridge();
        let caller = std::thread::current().id();
        let mut observed_calls = None;

        bridge.kill_cursor_async(&[1], |_| {
            observed_calls = Some(engine.recorded().len());
        });

        assert_eq!(observed_calls, Some(1));
        assert_eq!(engine.recorded()[0].thread, caller);
    }

    #[test]
    fn description_tracks_engine_version() {
        let (engine, bridge) = bridge();
        engine.set_server_version(ServerVersion::triple(4, 2, 0));
        assert_eq!(bridge.description().server_version(), ServerVersion::triple(4, 2, 0));

        engine.set_server_version(ServerVersion::triple(5, 0, 0));
        assert_eq!(bridge.description().server_version(), ServerVersion::triple(5, 0, 0));
    }

    #[test]
    fn panic_message_extracts_strings() {
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
