//! Property-based test generators using proptest.

use docbridge_core::{Bson, CoreError, Document, Namespace, WriteConcern};
use proptest::prelude::*;

/// Strategy for field names accepted by storage validation.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,11}").expect("Invalid regex")
}

/// Strategy for valid namespaces.
pub fn namespace_strategy() -> impl Strategy<Value = Namespace> {
    (
        prop::string::string_regex("[a-z][a-z0-9]{0,7}").expect("Invalid regex"),
        prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex"),
    )
        .prop_map(|(db, coll)| Namespace::new(db, coll))
}

/// Strategy for scalar values.
pub fn scalar_strategy() -> impl Strategy<Value = Bson> {
    prop_oneof![
        Just(Bson::Null),
        any::<bool>().prop_map(Bson::Boolean),
        any::<i32>().prop_map(Bson::Int32),
        any::<i64>().prop_map(Bson::Int64),
        (-1.0e6..1.0e6f64).prop_map(Bson::Double),
        prop::string::string_regex("[a-zA-Z0-9 ]{0,16}")
            .expect("Invalid regex")
            .prop_map(Bson::String),
    ]
}

/// Strategy for flat documents without an `_id`.
pub fn document_strategy() -> impl Strategy<Value = Document> {
    prop::collection::btree_map(field_name_strategy(), scalar_strategy(), 0..6)
        .prop_map(|fields| fields.into_iter().collect())
}

/// Strategy for write concerns, acknowledged or not.
pub fn write_concern_strategy() -> impl Strategy<Value = WriteConcern> {
    prop_oneof![
        Just(WriteConcern::ACKNOWLEDGED),
        Just(WriteConcern::W1),
        Just(WriteConcern::UNACKNOWLEDGED),
        Just(WriteConcern::JOURNALED),
    ]
}

/// Strategy for engine failures.
pub fn core_error_strategy() -> impl Strategy<Value = CoreError> {
    prop_oneof![
        (namespace_strategy(), any::<i32>()).prop_map(|(ns, key)| CoreError::DuplicateKey {
            namespace: ns.full_name(),
            key: key.to_string(),
        }),
        any::<u64>().prop_map(|cursor_id| CoreError::CursorNotFound { cursor_id }),
        Just(CoreError::malformed_query("unknown operator: $near")),
        (1..200i32).prop_map(|code| CoreError::command_failed(code, "rejected")),
        Just(CoreError::write_concern(100, "not enough data-bearing nodes")),
    ]
}

/// How a scripted engine should misbehave on the next call.
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    /// Answer normally.
    None,
    /// Fail with the given error.
    Fail(CoreError),
    /// Panic with the given message.
    Panic(String),
}

/// Strategy for faults, mostly [`Fault::None`].
pub fn fault_strategy() -> impl Strategy<Value = Fault> {
    prop_oneof![
        6 => Just(Fault::None),
        2 => core_error_strategy().prop_map(Fault::Fail),
        1 => prop::string::string_regex("[a-z ]{1,20}")
            .expect("Invalid regex")
            .prop_map(Fault::Panic),
    ]
}

/// One callback-style call against a connection, described as data.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeCall {
    /// Single insert with the default write concern.
    Insert(Document),
    /// Batch insert with an explicit write concern.
    InsertMany(Vec<Document>, WriteConcern),
    /// Single `$set` update.
    Update {
        /// Field to match on.
        field: String,
        /// Value to set.
        value: Bson,
    },
    /// Single delete by equality filter.
    Delete(Document),
    /// A command with a session.
    Command(Document),
    /// A query with a first batch size.
    Query {
        /// Filter.
        filter: Document,
        /// First batch size.
        number_to_return: i32,
    },
    /// A get-more on an arbitrary cursor id.
    GetMore(u64),
    /// Kill cursors.
    KillCursors(Vec<u64>),
}

/// Strategy for [`BridgeCall`]s.
pub fn bridge_call_strategy() -> impl Strategy<Value = BridgeCall> {
    prop_oneof![
        document_strategy().prop_map(BridgeCall::Insert),
        (prop::collection::vec(document_strategy(), 1..4), write_concern_strategy())
            .prop_map(|(docs, wc)| BridgeCall::InsertMany(docs, wc)),
        (field_name_strategy(), scalar_strategy())
            .prop_map(|(field, value)| BridgeCall::Update { field, value }),
        document_strategy().prop_map(BridgeCall::Delete),
        Just(BridgeCall::Command(docbridge_core::doc! { "ping" => 1 })),
        (document_strategy(), -2..5i32).prop_map(|(filter, number_to_return)| BridgeCall::Query {
            filter,
            number_to_return,
        }),
        any::<u64>().prop_map(BridgeCall::GetMore),
        prop::collection::vec(any::<u64>(), 0..4).prop_map(BridgeCall::KillCursors),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_documents_have_no_id(doc in document_strategy()) {
            prop_assert!(!doc.contains_key("_id"));
        }

        #[test]
        fn generated_namespaces_round_trip_through_parse(ns in namespace_strategy()) {
            prop_assert_eq!(Namespace::parse(&ns.full_name()).unwrap(), ns);
        }
    }
}
