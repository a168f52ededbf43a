//! Integration tests for connections and executors over real and scripted
//! engines.

use docbridge_async::{AsyncConnection, OperationExecutor, SimulatedServer};
use docbridge_core::{
    doc, BridgeConfig, ClientSession, CoreError, CoreResult, CursorFlags, DeleteRequest, Document,
    DocumentDecoder, InsertRequest, Namespace, NoOpFieldNameValidator, QueryResult, ReadOperation,
    ReadOutcome, ReadPreference, SerdeDecoder, ServerVersion, SessionContext,
    StorageFieldNameValidator, UpdateRequest, WriteConcern, WriteConcernResult, WriteOperation,
    WriteOutcome,
};
use docbridge_memory::MemoryEngine;
use docbridge_testkit::prelude::*;
use proptest::prelude::*;
use serde::Deserialize;
use std::sync::Arc;

fn memory_bridge() -> (SimulatedServer<MemoryEngine>, docbridge_async::AsyncBridge<MemoryEngine>) {
    init_tracing();
    let server = SimulatedServer::from_arc(memory_server(), BridgeConfig::default());
    let connection = server.connect();
    (server, connection)
}

#[test]
fn insert_with_default_write_concern_is_unacknowledged() {
    let (server, connection) = memory_bridge();
    let ns = Namespace::new("db", "coll");
    let capture = CallbackCapture::new();

    connection.insert_async(&ns, true, &InsertRequest::new(doc! { "x" => 1 }), capture.callback());

    assert_eq!(capture.take_single(), Ok(WriteConcernResult::Unacknowledged));
    assert_eq!(server.engine().document_count(&ns), 1);
}

#[test]
fn acknowledged_batch_reports_counts() {
    let (server, connection) = memory_bridge();
    let ns = people_namespace();
    let capture = CallbackCapture::new();

    connection.update_many_async(
        &ns,
        true,
        &WriteConcern::ACKNOWLEDGED,
        &[UpdateRequest::update(
            doc! { "age" => doc! { "$gt" => 60 } },
            doc! { "$set" => doc! { "retired" => true } },
        )
        .multi(true)],
        capture.callback(),
    );
    assert_eq!(capture.take_single().unwrap().count(), Some(2));

    connection.delete_many_async(
        &ns,
        false,
        &WriteConcern::ACKNOWLEDGED,
        &[DeleteRequest::many(doc! { "retired" => true })],
        capture.callback(),
    );
    assert_eq!(capture.take_single().unwrap().count(), Some(2));
    assert_eq!(server.engine().document_count(&ns), sample_people().len() - 2);
}

#[test]
fn duplicate_key_reaches_callback_unchanged() {
    let (_, connection) = memory_bridge();
    let capture = CallbackCapture::new();

    connection.insert_many_async(
        &people_namespace(),
        true,
        &WriteConcern::ACKNOWLEDGED,
        &[InsertRequest::new(doc! { "_id" => 1, "name" => "Twin" })],
        capture.callback(),
    );

    assert!(matches!(capture.take_single(), Err(CoreError::DuplicateKey { .. })));
}

#[test]
fn scripted_command_failure_is_delivered_as_is() {
    let engine = Arc::new(RecordingEngine::new());
    let server = SimulatedServer::from_arc(Arc::clone(&engine), BridgeConfig::default());
    let failure = CoreError::DuplicateKey {
        namespace: "db.coll".into(),
        key: "1".into(),
    };
    engine.set_command_response(Err(failure.clone()));

    let capture = CallbackCapture::<Document>::new();
    server.connect().command_async(
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
fn ping_command_over_memory_engine() {
    let (_, connection) = memory_bridge();
    let capture = CallbackCapture::<Document>::new();

    connection.command_async(
        "admin",
        &doc! { "ping" => 1 },
        &NoOpFieldNameValidator,
        ReadPreference::Primary,
        &DocumentDecoder,
        &SessionContext::with_new_session(),
        capture.callback(),
    );

    assert_eq!(capture.take_single(), Ok(doc! { "ok" => 1.0 }));
}

#[test]
fn query_then_get_more_drains_cursor() {
    let (server, connection) = memory_bridge();
    let ns = people_namespace();
    let capture = CallbackCapture::<QueryResult<Document>>::new();

    connection.query_async(
        &ns,
        &doc! {},
        None,
        2,
        0,
        CursorFlags::new(),
        &DocumentDecoder,
        capture.callback(),
    );
    let first = capture.take_single().unwrap();
    assert_eq!(first.results.len(), 2);
    assert!(first.has_more());

    connection.get_more_async(&ns, first.cursor_id, 0, &DocumentDecoder, capture.callback());
    let rest = capture.take_single().unwrap();
    assert_eq!(rest.results.len(), sample_people().len() - 2);
    assert_eq!(rest.cursor_id, 0);
    assert!(!server.engine().is_cursor_open(first.cursor_id));

    connection.get_more_async(&ns, first.cursor_id, 0, &DocumentDecoder, capture.callback());
    assert_eq!(
        capture.take_single(),
        Err(CoreError::CursorNotFound {
            cursor_id: first.cursor_id
        })
    );
}

#[test]
fn kill_cursor_with_unknown_ids_succeeds() {
    let (_, connection) = memory_bridge();
    let capture = CallbackCapture::new();
    connection.kill_cursor_async(&[1, 2, 3], capture.callback());
    assert_eq!(capture.take_single(), Ok(()));
}

#[test]
fn kill_cursor_in_namespace_closes_open_cursor() {
    let (server, connection) = memory_bridge();
    let ns = people_namespace();
    let capture = CallbackCapture::<QueryResult<Document>>::new();
    connection.query_with_limit_async(
        &ns,
        &doc! {},
        None,
        0,
        0,
        1,
        CursorFlags::new(),
        &DocumentDecoder,
        capture.callback(),
    );
    let page = capture.take_single().unwrap();
    assert!(server.engine().is_cursor_open(page.cursor_id));

    let killed = CallbackCapture::new();
    connection.kill_cursor_in_namespace_async(&ns, &[page.cursor_id], killed.callback());
    assert_eq!(killed.take_single(), Ok(()));
    assert!(!server.engine().is_cursor_open(page.cursor_id));
}

#[test]
fn storage_validator_rejects_dollar_fields_in_payload() {
    let (_, connection) = memory_bridge();
    let payload = docbridge_core::SplittablePayload::new(
        docbridge_core::PayloadKind::Insert,
        vec![doc! { "$bad" => 1 }],
    );
    let capture = CallbackCapture::<Document>::new();

    connection.command_with_payload_async(
        "test",
        &doc! { "insert" => "people" },
        &NoOpFieldNameValidator,
        ReadPreference::Primary,
        &DocumentDecoder,
        &SessionContext::none(),
        true,
        Some(&payload),
        &StorageFieldNameValidator,
        capture.callback(),
    );

    assert!(matches!(capture.take_single(), Err(CoreError::InvalidFieldName { .. })));
}

#[derive(Debug, Deserialize, PartialEq)]
struct Person {
    #[serde(rename = "_id")]
    id: i32,
    name: String,
    age: i32,
}

#[test]
fn serde_decoder_maps_results_into_structs() {
    let (_, connection) = memory_bridge();
    let capture = CallbackCapture::<QueryResult<Person>>::new();
    let decoder = SerdeDecoder::<Person>::new();

    connection.query_async(
        &people_namespace(),
        &doc! { "name" => "Ada" },
        None,
        0,
        0,
        CursorFlags::new(),
        &decoder,
        capture.callback(),
    );

    let page = capture.take_single().unwrap();
    assert_eq!(
        page.results,
        vec![Person {
            id: 1,
            name: "Ada".into(),
            age: 36,
        }]
    );
}

#[test]
fn connections_share_server_identity() {
    let (server, first) = memory_bridge();
    let second = server.connect();

    assert_eq!(first.description().server_id(), second.description().server_id());
    assert_eq!(first.description().server_id(), &server.server_id());
    assert!(std::ptr::eq(first.retain(), &first));
    assert_eq!(first.count(), 0);
    first.release();
}

#[test]
fn description_sees_live_version_changes() {
    let (server, connection) = memory_bridge();
    server.engine().set_server_version(ServerVersion::triple(4, 0, 9));
    assert_eq!(connection.description().server_version(), ServerVersion::triple(4, 0, 9));
}

#[test]
fn executor_session_overloads_match_plain_calls() {
    let (server, _) = memory_bridge();
    let executor = server.executor();
    let session = ClientSession::start();
    let count = || ReadOperation::Count {
        namespace: people_namespace(),
        filter: doc! { "age" => doc! { "$lt" => 40 } },
    };

    let plain = executor.execute_read(count(), ReadPreference::Primary);
    let with_session = executor.execute_read_in_session(count(), ReadPreference::Primary, &session);
    assert_eq!(plain, Ok(ReadOutcome::Count(2)));
    assert_eq!(plain, with_session);

    let drop_people = WriteOperation::DropCollection {
        namespace: people_namespace(),
    };
    assert_eq!(
        executor.execute_write_in_session(drop_people, &session),
        Ok(WriteOutcome::Completed)
    );
    assert_eq!(server.engine().document_count(&people_namespace()), 0);
}

fn expected_outcome(fault: &Fault) -> Option<CoreError> {
    match fault {
        Fault::None => None,
        Fault::Fail(error) => Some(error.clone()),
        Fault::Panic(message) => Some(CoreError::EnginePanicked {
            message: message.clone(),
        }),
    }
}

/// Collapses any result type to the error it carried, if any.
fn sink<T>(capture: &CallbackCapture<Option<CoreError>>) -> impl FnOnce(CoreResult<T>) {
    let callback = capture.callback();
    move |outcome| callback(Ok(outcome.err()))
}

fn issue<C: AsyncConnection>(
    connection: &C,
    call: &BridgeCall,
    errors: &CallbackCapture<Option<CoreError>>,
) {
    let ns = Namespace::new("db", "coll");
    match call {
        BridgeCall::Insert(document) => {
            connection.insert_async(&ns, true, &InsertRequest::new(document.clone()), sink(errors));
        }
        BridgeCall::InsertMany(documents, write_concern) => {
            let requests: Vec<InsertRequest> =
                documents.iter().cloned().map(InsertRequest::new).collect();
            connection.insert_many_async(&ns, false, write_concern, &requests, sink(errors));
        }
        BridgeCall::Update { field, value } => {
            let mut set = Document::new();
            set.insert(field.clone(), value.clone());
            let request = UpdateRequest::update(doc! {}, doc! { "$set" => set });
            connection.update_async(&ns, true, &request, sink(errors));
        }
        BridgeCall::Delete(filter) => {
            connection.delete_async(&ns, true, &DeleteRequest::one(filter.clone()), sink(errors));
        }
        BridgeCall::Command(command) => connection.command_async(
            "db",
            command,
            &NoOpFieldNameValidator,
            ReadPreference::Primary,
            &DocumentDecoder,
            &SessionContext::with_new_session(),
            sink(errors),
        ),
        BridgeCall::Query {
            filter,
            number_to_return,
        } => connection.query_async(
            &ns,
            filter,
            None,
            *number_to_return,
            0,
            CursorFlags::new(),
            &DocumentDecoder,
            sink(errors),
        ),
        BridgeCall::GetMore(cursor_id) => {
            connection.get_more_async(&ns, *cursor_id, 0, &DocumentDecoder, sink(errors));
        }
        BridgeCall::KillCursors(cursors) => connection.kill_cursor_async(cursors, sink(errors)),
    }
}

proptest! {
    #[test]
    fn every_call_delivers_exactly_one_outcome(
        steps in prop::collection::vec((bridge_call_strategy(), fault_strategy()), 1..20)
    ) {
        let engine = Arc::new(RecordingEngine::new());
        let server = SimulatedServer::from_arc(Arc::clone(&engine), BridgeConfig::default());
        let connection = server.connect();
        let errors = CallbackCapture::<Option<CoreError>>::new();

        for (index, (call, fault)) in steps.iter().enumerate() {
            match fault {
                Fault::None => {}
                Fault::Fail(error) => engine.fail_next(error.clone()),
                Fault::Panic(message) => engine.panic_with(message.clone()),
            }

            issue(&connection, call, &errors);

            prop_assert_eq!(engine.call_count(), index + 1);
            prop_assert_eq!(errors.take_single(), Ok(expected_outcome(fault)));
            prop_assert_eq!(connection.count(), 0);
        }
    }
}
