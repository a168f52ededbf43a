//! The in-memory engine.

use crate::config::MemoryConfig;
use crate::cursor::CursorRegistry;
use crate::store::{position_of_id, Store};
use crate::{filter, update};
use docbridge_core::{
    Acknowledgement, Bson, CoreError, CoreResult, CursorFlags, Decoder, DeleteRequest, Document,
    DocumentDecoder, Engine, FieldNameValidator, InsertRequest, Namespace, QueryResult,
    ReadOperation, ReadOutcome, ReadPreference, ServerVersion, SessionContext, SplittablePayload,
    UpdateRequest, WriteConcern, WriteConcernResult, WriteOperation, WriteOutcome,
};
use parking_lot::{Mutex, RwLock};
use tracing::trace;
use uuid::Uuid;

/// Counts gathered while applying a batch of writes.
#[derive(Debug, Default)]
pub(crate) struct WriteTally {
    /// Documents inserted, matched, upserted or deleted.
    pub(crate) count: u64,
    /// Matched documents whose contents actually changed.
    pub(crate) modified: u64,
    pub(crate) updated_existing: bool,
    /// Statement index and `_id` of every upserted document.
    pub(crate) upserted: Vec<(usize, Bson)>,
}

/// A single-node document engine held entirely in memory.
///
/// All state sits behind `parking_lot` locks, so one engine can be shared
/// across threads through an `Arc`.
///
/// # Example
///
/// ```
/// use docbridge_core::{doc, Engine, InsertRequest, Namespace, WriteConcern};
/// use docbridge_memory::MemoryEngine;
///
/// let engine = MemoryEngine::new();
/// let ns = Namespace::new("db", "people");
/// let result = engine
///     .insert(
///         &ns,
///         true,
///         &WriteConcern::ACKNOWLEDGED,
///         &[InsertRequest::new(doc! { "name" => "Ada" })],
///     )
///     .unwrap();
/// assert_eq!(result.count(), Some(1));
/// assert_eq!(engine.document_count(&ns), 1);
/// ```
pub struct MemoryEngine {
    config: MemoryConfig,
    server_version: RwLock<ServerVersion>,
    store: RwLock<Store>,
    cursors: Mutex<CursorRegistry>,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    /// Creates an empty engine with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MemoryConfig::default())
    }

    /// Creates an empty engine.
    pub fn with_config(config: MemoryConfig) -> Self {
        Self {
            server_version: RwLock::new(config.server_version.clone()),
            config,
            store: RwLock::new(Store::default()),
            cursors: Mutex::new(CursorRegistry::default()),
        }
    }

    /// The configuration the engine was created with.
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Replaces the reported server version. Existing connection
    /// descriptions observe the change.
    pub fn set_server_version(&self, version: ServerVersion) {
        *self.server_version.write() = version;
    }

    /// Number of documents stored in `namespace`.
    pub fn document_count(&self, namespace: &Namespace) -> usize {
        self.store.read().collection(namespace).map_or(0, Vec::len)
    }

    /// Returns true while `cursor_id` has documents left to fetch.
    pub fn is_cursor_open(&self, cursor_id: u64) -> bool {
        self.cursors.lock().is_open(cursor_id)
    }

    pub(crate) fn select(
        &self,
        namespace: &Namespace,
        query: &Document,
        projection: Option<&Document>,
        skip: usize,
        limit: Option<usize>,
    ) -> CoreResult<Vec<Document>> {
        filter::validate(query)?;
        let store = self.store.read();
        let Some(collection) = store.collection(namespace) else {
            return Ok(Vec::new());
        };
        let mut selected = Vec::new();
        let mut skipped = 0;
        for document in collection {
            if limit.is_some_and(|limit| selected.len() >= limit) {
                break;
            }
            if !filter::matches(document, query)? {
                continue;
            }
            if skipped < skip {
                skipped += 1;
                continue;
            }
            selected.push(match projection {
                Some(projection) => filter::project(document, projection)?,
                None => document.clone(),
            });
        }
        Ok(selected)
    }

    /// Splits off the first batch and parks the rest under a cursor.
    fn first_page<T>(
        &self,
        namespace: &Namespace,
        mut documents: Vec<Document>,
        batch: usize,
        single_batch: bool,
        decoder: &dyn Decoder<T>,
    ) -> CoreResult<QueryResult<T>> {
        let rest = documents.split_off(batch.min(documents.len()));
        let results = decode_all(&documents, decoder)?;
        let cursor_id = if single_batch {
            0
        } else {
            self.cursors.lock().open(namespace, rest)
        };
        Ok(QueryResult::new(
            namespace.clone(),
            results,
            cursor_id,
            self.config.server_address.clone(),
        ))
    }

    fn first_batch_size(&self, requested: i32) -> usize {
        if requested == 0 {
            usize::try_from(self.config.default_batch_size).unwrap_or(usize::MAX)
        } else {
            to_count(requested)
        }
    }

    fn write_documents(
        &self,
        namespace: &Namespace,
        ordered: bool,
        documents: Vec<Document>,
    ) -> CoreResult<WriteTally> {
        let mut store = self.store.write();
        let collection = store.collection_entry(namespace);
        let mut tally = WriteTally::default();
        run_batch(ordered, documents, |document| {
            insert_one(namespace, collection, document)?;
            tally.count += 1;
            Ok(())
        })?;
        trace!(%namespace, count = tally.count, "inserted");
        Ok(tally)
    }

    /// Checks `write_concern` and applies `updates`, returning the full tally.
    pub(crate) fn update_with_tally(
        &self,
        namespace: &Namespace,
        ordered: bool,
        write_concern: &WriteConcern,
        updates: &[UpdateRequest],
    ) -> CoreResult<WriteTally> {
        check_write_concern(write_concern)?;
        let mut store = self.store.write();
        let mut tally = WriteTally::default();
        run_batch(ordered, updates.iter().enumerate(), |(index, request)| {
            filter::validate(&request.filter)?;
            update_one(namespace, &mut store, index, request, &mut tally)
        })?;
        trace!(%namespace, count = tally.count, upserted = tally.upserted.len(), "updated");
        Ok(tally)
    }

    fn apply_deletes(
        &self,
        namespace: &Namespace,
        ordered: bool,
        deletes: &[DeleteRequest],
    ) -> CoreResult<WriteTally> {
        let mut store = self.store.write();
        let mut tally = WriteTally::default();
        run_batch(ordered, deletes, |request| {
            filter::validate(&request.filter)?;
            tally.count += delete_matching(&mut store, namespace, request)?;
            Ok(())
        })?;
        trace!(%namespace, count = tally.count, "deleted");
        Ok(tally)
    }

    pub(crate) fn drop_collection(&self, namespace: &Namespace) -> Option<usize> {
        let dropped = self.store.write().drop_collection(namespace);
        self.cursors.lock().kill_where(|open| open == namespace);
        trace!(%namespace, existed = dropped.is_some(), "collection dropped");
        dropped
    }

    pub(crate) fn drop_database(&self, database: &str) -> bool {
        let existed = self.store.write().drop_database(database);
        self.cursors.lock().kill_where(|open| open.database() == database);
        trace!(database, existed, "database dropped");
        existed
    }

    pub(crate) fn collection_names(&self, database: &str) -> Vec<String> {
        self.store.read().collection_names(database)
    }
}

pub(crate) fn decode_all<T>(
    documents: &[Document],
    decoder: &dyn Decoder<T>,
) -> CoreResult<Vec<T>> {
    documents.iter().map(|d| decoder.decode(d)).collect()
}

/// Converts a possibly negative wire count into a size.
fn to_count(n: i32) -> usize {
    usize::try_from(n.unsigned_abs()).unwrap_or(usize::MAX)
}

pub(crate) fn check_write_concern(write_concern: &WriteConcern) -> CoreResult<()> {
    match &write_concern.w {
        Some(Acknowledgement::Nodes(n)) if *n > 1 => Err(CoreError::write_concern(
            100,
            format!("not enough data-bearing nodes to satisfy w:{n}"),
        )),
        Some(Acknowledgement::Tag(tag)) => Err(CoreError::write_concern(
            79,
            format!("no write concern mode named {tag:?}"),
        )),
        _ => Ok(()),
    }
}

fn acknowledge(write_concern: &WriteConcern, tally: WriteTally) -> WriteConcernResult {
    if write_concern.is_acknowledged() {
        let upserted_id = tally.upserted.into_iter().next().map(|(_, id)| id);
        WriteConcernResult::acknowledged(tally.count, tally.updated_existing, upserted_id)
    } else {
        WriteConcernResult::Unacknowledged
    }
}

/// Ordered batches stop at the first failure. Unordered batches apply every
/// request and report the first failure.
fn run_batch<R>(
    ordered: bool,
    requests: impl IntoIterator<Item = R>,
    mut apply: impl FnMut(R) -> CoreResult<()>,
) -> CoreResult<()> {
    let mut first_error = None;
    for request in requests {
        if let Err(error) = apply(request) {
            if ordered {
                return Err(error);
            }
            first_error.get_or_insert(error);
        }
    }
    first_error.map_or(Ok(()), Err)
}

fn insert_one(
    namespace: &Namespace,
    collection: &mut Vec<Document>,
    mut document: Document,
) -> CoreResult<Bson> {
    let id = match document.get("_id") {
        Some(id) => id.clone(),
        None => {
            let id = Bson::String(Uuid::new_v4().to_string());
            document.insert_first("_id", id.clone());
            id
        }
    };
    if position_of_id(collection, &id).is_some() {
        return Err(CoreError::DuplicateKey {
            namespace: namespace.full_name(),
            key: id.to_string(),
        });
    }
    collection.push(document);
    Ok(id)
}

fn update_one(
    namespace: &Namespace,
    store: &mut Store,
    statement: usize,
    request: &UpdateRequest,
    tally: &mut WriteTally,
) -> CoreResult<()> {
    let mut matched = 0;
    if let Some(collection) = store.collection_mut(namespace) {
        for index in 0..collection.len() {
            if !filter::matches(&collection[index], &request.filter)? {
                continue;
            }
            let updated = update::apply(&collection[index], &request.update, request.kind)?;
            if let Some(id) = updated.get("_id") {
                if position_of_id(collection, id).is_some_and(|other| other != index) {
                    return Err(CoreError::DuplicateKey {
                        namespace: namespace.full_name(),
                        key: id.to_string(),
                    });
                }
            }
            if updated != collection[index] {
                tally.modified += 1;
            }
            collection[index] = updated;
            matched += 1;
            if !request.multi {
                break;
            }
        }
    }
    if matched > 0 {
        tally.count += matched;
        tally.updated_existing = true;
        return Ok(());
    }
    if !request.upsert {
        return Ok(());
    }
    let seed = update::upsert_seed(&request.filter)?;
    let document = update::apply(&seed, &request.update, request.kind)?;
    let id = insert_one(namespace, store.collection_entry(namespace), document)?;
    tally.count += 1;
    tally.upserted.push((statement, id));
    Ok(())
}

fn delete_matching(
    store: &mut Store,
    namespace: &Namespace,
    request: &DeleteRequest,
) -> CoreResult<u64> {
    let Some(collection) = store.collection_mut(namespace) else {
        return Ok(0);
    };
    let mut removed = 0;
    let mut index = 0;
    while index < collection.len() {
        if filter::matches(&collection[index], &request.filter)? {
            collection.remove(index);
            removed += 1;
            if !request.multi {
                break;
            }
        } else {
            index += 1;
        }
    }
    Ok(removed)
}

impl Engine for MemoryEngine {
    fn insert(
        &self,
        namespace: &Namespace,
        ordered: bool,
        write_concern: &WriteConcern,
        inserts: &[InsertRequest],
    ) -> CoreResult<WriteConcernResult> {
        check_write_concern(write_concern)?;
        let documents = inserts.iter().map(|r| r.document.clone()).collect();
        let tally = self.write_documents(namespace, ordered, documents)?;
        Ok(acknowledge(write_concern, tally))
    }

    fn update(
        &self,
        namespace: &Namespace,
        ordered: bool,
        write_concern: &WriteConcern,
        updates: &[UpdateRequest],
    ) -> CoreResult<WriteConcernResult> {
        let tally = self.update_with_tally(namespace, ordered, write_concern, updates)?;
        Ok(acknowledge(write_concern, tally))
    }

    fn delete(
        &self,
        namespace: &Namespace,
        ordered: bool,
        write_concern: &WriteConcern,
        deletes: &[DeleteRequest],
    ) -> CoreResult<WriteConcernResult> {
        check_write_concern(write_concern)?;
        let tally = self.apply_deletes(namespace, ordered, deletes)?;
        Ok(acknowledge(write_concern, tally))
    }

    fn command<T>(
        &self,
        database: &str,
        command: &Document,
        field_name_validator: &dyn FieldNameValidator,
        _read_preference: ReadPreference,
        decoder: &dyn Decoder<T>,
        _session: &SessionContext,
    ) -> CoreResult<T> {
        let reply = self.run_command(database, command, field_name_validator, None)?;
        decoder.decode(&reply)
    }

    fn command_with_payload<T>(
        &self,
        database: &str,
        command: &Document,
        command_validator: &dyn FieldNameValidator,
        _read_preference: ReadPreference,
        decoder: &dyn Decoder<T>,
        _session: &SessionContext,
        _response_expected: bool,
        payload: Option<&SplittablePayload>,
        payload_validator: &dyn FieldNameValidator,
    ) -> CoreResult<T> {
        let payload = payload.map(|p| (p, payload_validator));
        let reply = self.run_command(database, command, command_validator, payload)?;
        decoder.decode(&reply)
    }

    fn legacy_command<T>(
        &self,
        database: &str,
        command: &Document,
        _slave_ok: bool,
        field_name_validator: &dyn FieldNameValidator,
        decoder: &dyn Decoder<T>,
    ) -> CoreResult<T> {
        let reply = self.run_command(database, command, field_name_validator, None)?;
        decoder.decode(&reply)
    }

    fn legacy_command_in_session<T>(
        &self,
        database: &str,
        command: &Document,
        slave_ok: bool,
        field_name_validator: &dyn FieldNameValidator,
        decoder: &dyn Decoder<T>,
        _session: &SessionContext,
    ) -> CoreResult<T> {
        self.legacy_command(database, command, slave_ok, field_name_validator, decoder)
    }

    fn query<T>(
        &self,
        namespace: &Namespace,
        query: &Document,
        fields: Option<&Document>,
        number_to_return: i32,
        skip: i32,
        _flags: CursorFlags,
        decoder: &dyn Decoder<T>,
    ) -> CoreResult<QueryResult<T>> {
        let single_batch = number_to_return < 0;
        let batch = self.first_batch_size(number_to_return);
        let skip = usize::try_from(skip).unwrap_or(0);
        let documents = self.select(namespace, query, fields, skip, single_batch.then_some(batch))?;
        self.first_page(namespace, documents, batch, single_batch, decoder)
    }

    fn query_with_limit<T>(
        &self,
        namespace: &Namespace,
        query: &Document,
        fields: Option<&Document>,
        skip: i32,
        limit: i32,
        batch_size: i32,
        _flags: CursorFlags,
        decoder: &dyn Decoder<T>,
    ) -> CoreResult<QueryResult<T>> {
        let single_batch = limit < 0 || batch_size < 0;
        let limit = (limit != 0).then(|| to_count(limit));
        let batch = match limit {
            Some(limit) if single_batch && batch_size >= 0 => limit,
            _ => self.first_batch_size(batch_size),
        };
        let cap = if single_batch {
            Some(limit.map_or(batch, |limit| limit.min(batch)))
        } else {
            limit
        };
        let skip = usize::try_from(skip).unwrap_or(0);
        let documents = self.select(namespace, query, fields, skip, cap)?;
        self.first_page(namespace, documents, batch, single_batch, decoder)
    }

    fn get_more<T>(
        &self,
        namespace: &Namespace,
        cursor_id: u64,
        number_to_return: i32,
        decoder: &dyn Decoder<T>,
    ) -> CoreResult<QueryResult<T>> {
        let count = (number_to_return != 0).then(|| to_count(number_to_return));
        let (batch, next_id) = {
            let mut cursors = self.cursors.lock();
            let (batch, next_id) = cursors.next_batch(namespace, cursor_id, count)?;
            if number_to_return < 0 && next_id != 0 {
                cursors.kill(None, &[next_id]);
                (batch, 0)
            } else {
                (batch, next_id)
            }
        };
        let results = decode_all(&batch, decoder)?;
        Ok(QueryResult::new(
            namespace.clone(),
            results,
            next_id,
            self.config.server_address.clone(),
        ))
    }

    fn kill_cursor(&self, cursors: &[u64]) -> CoreResult<()> {
        self.cursors.lock().kill(None, cursors);
        Ok(())
    }

    fn kill_cursor_in_namespace(&self, namespace: &Namespace, cursors: &[u64]) -> CoreResult<()> {
        self.cursors.lock().kill(Some(namespace), cursors);
        Ok(())
    }

    fn server_version(&self) -> ServerVersion {
        self.server_version.read().clone()
    }

    fn execute_read(
        &self,
        operation: ReadOperation,
        _read_preference: ReadPreference,
    ) -> CoreResult<ReadOutcome> {
        match operation {
            ReadOperation::Find {
                namespace,
                filter,
                projection,
                skip,
                limit,
                batch_size,
            } => {
                let skip = usize::try_from(skip).unwrap_or(usize::MAX);
                let limit = (limit != 0).then(|| usize::try_from(limit).unwrap_or(usize::MAX));
                let batch = if batch_size == 0 {
                    self.first_batch_size(0)
                } else {
                    usize::try_from(batch_size).unwrap_or(usize::MAX)
                };
                let documents = self.select(&namespace, &filter, projection.as_ref(), skip, limit)?;
                self.first_page(&namespace, documents, batch, false, &DocumentDecoder)
                    .map(ReadOutcome::Cursor)
            }
            ReadOperation::Count { namespace, filter } => {
                let n = self.select(&namespace, &filter, None, 0, None)?.len();
                Ok(ReadOutcome::Count(n as u64))
            }
            ReadOperation::Distinct {
                namespace,
                field,
                filter,
            } => {
                let mut values: Vec<Bson> = Vec::new();
                for document in self.select(&namespace, &filter, None, 0, None)? {
                    let found = match document.get_path(&field) {
                        Some(Bson::Array(items)) => items.clone(),
                        Some(value) => vec![value.clone()],
                        None => Vec::new(),
                    };
                    for value in found {
                        if !values.iter().any(|seen| seen.matches(&value)) {
                            values.push(value);
                        }
                    }
                }
                Ok(ReadOutcome::Values(values))
            }
            ReadOperation::ListCollectionNames { database } => {
                Ok(ReadOutcome::Names(self.collection_names(&database)))
            }
            ReadOperation::ListDatabaseNames => {
                Ok(ReadOutcome::Names(self.store.read().database_names()))
            }
        }
    }

    fn execute_write(&self, operation: WriteOperation) -> CoreResult<WriteOutcome> {
        match operation {
            WriteOperation::Insert {
                namespace,
                ordered,
                write_concern,
                requests,
            } => self
                .insert(&namespace, ordered, &write_concern, &requests)
                .map(WriteOutcome::WriteConcern),
            WriteOperation::Update {
                namespace,
                ordered,
                write_concern,
                requests,
            } => self
                .update(&namespace, ordered, &write_concern, &requests)
                .map(WriteOutcome::WriteConcern),
            WriteOperation::Delete {
                namespace,
                ordered,
                write_concern,
                requests,
            } => self
                .delete(&namespace, ordered, &write_concern, &requests)
                .map(WriteOutcome::WriteConcern),
            WriteOperation::DropCollection { namespace } => {
                self.drop_collection(&namespace);
                Ok(WriteOutcome::Completed)
            }
            WriteOperation::DropDatabase { database } => {
                self.drop_database(&database);
                Ok(WriteOutcome::Completed)
            }
        }
    }
}
