//! Database commands.

use crate::engine::{check_write_concern, MemoryEngine};
use crate::filter;
use docbridge_core::{
    Acknowledgement, Bson, CoreError, CoreResult, DeleteRequest, Document, Engine,
    FieldNameValidator, InsertRequest, Namespace, NoOpFieldNameValidator, PayloadKind,
    SplittablePayload, UpdateKind, UpdateRequest, WriteConcern, WriteConcernResult,
};
use std::time::Duration;
use tracing::trace;

const MAX_BSON_OBJECT_SIZE: i32 = 16 * 1024 * 1024;
const MAX_MESSAGE_SIZE_BYTES: i32 = 48_000_000;
const MAX_WRITE_BATCH_SIZE: i32 = 100_000;

const NO_SUCH_COMMAND: i32 = 59;
const FAILED_TO_PARSE: i32 = 9;
const BAD_VALUE: i32 = 2;

type Payload<'a> = (&'a SplittablePayload, &'a dyn FieldNameValidator);

impl MemoryEngine {
    /// Runs a command against `database` and returns the raw reply.
    ///
    /// The command name is the first key of `command`. Documents written by
    /// `insert` and replacement documents of `update` are checked with the
    /// matching validator: the payload validator for payload documents, the
    /// command validator for inline ones.
    pub(crate) fn run_command(
        &self,
        database: &str,
        command: &Document,
        validator: &dyn FieldNameValidator,
        payload: Option<Payload<'_>>,
    ) -> CoreResult<Document> {
        let name = command.first_key().unwrap_or_default();
        trace!(database, command = name, "running command");
        match name {
            "ping" => Ok(ok()),
            "buildInfo" | "buildinfo" => Ok(self.build_info()),
            "isMaster" | "ismaster" => Ok(self.is_master("ismaster")),
            "hello" => Ok(self.is_master("isWritablePrimary")),
            "count" => self.count_command(database, command),
            "drop" => self.drop_command(database, command),
            "dropDatabase" => {
                self.drop_database(database);
                let mut reply = ok();
                reply.insert_first("dropped", database);
                Ok(reply)
            }
            "listCollections" => self.list_collections(database, command),
            "insert" => self.insert_command(database, command, validator, payload),
            "update" => self.update_command(database, command, validator, payload),
            "delete" => self.delete_command(database, command, payload),
            other => Err(CoreError::command_failed(
                NO_SUCH_COMMAND,
                format!("no such command: '{other}'"),
            )),
        }
    }

    fn build_info(&self) -> Document {
        let version = self.server_version();
        let mut components: Vec<Bson> = version
            .components()
            .iter()
            .map(|c| Bson::Int32(i32::try_from(*c).unwrap_or(i32::MAX)))
            .collect();
        components.resize(4, Bson::Int32(0));
        let mut reply = Document::new();
        reply.insert("version", version.to_string());
        reply.insert("versionArray", Bson::Array(components));
        reply.insert("maxBsonObjectSize", MAX_BSON_OBJECT_SIZE);
        reply.insert("ok", 1.0);
        reply
    }

    fn is_master(&self, primary_field: &str) -> Document {
        let mut reply = Document::new();
        reply.insert(primary_field, true);
        reply.insert("maxBsonObjectSize", MAX_BSON_OBJECT_SIZE);
        reply.insert("maxMessageSizeBytes", MAX_MESSAGE_SIZE_BYTES);
        reply.insert("maxWriteBatchSize", MAX_WRITE_BATCH_SIZE);
        reply.insert("minWireVersion", 0);
        reply.insert("maxWireVersion", self.config().max_wire_version);
        reply.insert("readOnly", false);
        reply.insert("ok", 1.0);
        reply
    }

    fn count_command(&self, database: &str, command: &Document) -> CoreResult<Document> {
        let namespace = target_namespace(database, command, "count")?;
        let query = optional_document(command, "query")?.unwrap_or_default();
        let skip = non_negative(command, "skip")?;
        let limit = non_negative(command, "limit")?.filter(|l| *l > 0);
        let n = self
            .select(&namespace, &query, None, skip.unwrap_or(0), limit)?
            .len();
        let mut reply = Document::new();
        reply.insert("n", number(n as u64));
        reply.insert("ok", 1.0);
        Ok(reply)
    }

    fn drop_command(&self, database: &str, command: &Document) -> CoreResult<Document> {
        let namespace = target_namespace(database, command, "drop")?;
        if self.drop_collection(&namespace).is_none() {
            return Err(CoreError::NamespaceNotFound(namespace.full_name()));
        }
        let mut reply = Document::new();
        reply.insert("ns", namespace.full_name());
        reply.insert("nIndexesWas", 1);
        reply.insert("ok", 1.0);
        Ok(reply)
    }

    fn list_collections(&self, database: &str, command: &Document) -> CoreResult<Document> {
        let query = optional_document(command, "filter")?.unwrap_or_default();
        filter::validate(&query)?;
        let mut first_batch = Vec::new();
        for name in self.collection_names(database) {
            let mut info = Document::new();
            info.insert("name", name);
            info.insert("type", "collection");
            if filter::matches(&info, &query)? {
                first_batch.push(Bson::Document(info));
            }
        }
        let mut cursor = Document::new();
        cursor.insert("id", 0_i64);
        cursor.insert("ns", format!("{database}.$cmd.listCollections"));
        cursor.insert("firstBatch", Bson::Array(first_batch));
        let mut reply = Document::new();
        reply.insert("cursor", cursor);
        reply.insert("ok", 1.0);
        Ok(reply)
    }

    fn insert_command(
        &self,
        database: &str,
        command: &Document,
        validator: &dyn FieldNameValidator,
        payload: Option<Payload<'_>>,
    ) -> CoreResult<Document> {
        let namespace = target_namespace(database, command, "insert")?;
        let (documents, validator) =
            batch_documents(command, PayloadKind::Insert, validator, payload)?;
        let mut requests = Vec::with_capacity(documents.len());
        for document in documents {
            validator.check_document(&document)?;
            requests.push(InsertRequest::new(document));
        }
        let write_concern = command_write_concern(command)?;
        let result = self.insert(&namespace, ordered(command), &write_concern, &requests)?;
        Ok(write_reply(&result))
    }

    fn update_command(
        &self,
        database: &str,
        command: &Document,
        validator: &dyn FieldNameValidator,
        payload: Option<Payload<'_>>,
    ) -> CoreResult<Document> {
        let namespace = target_namespace(database, command, "update")?;
        let (statements, validator) =
            batch_documents(command, PayloadKind::Update, validator, payload)?;
        let mut requests = Vec::with_capacity(statements.len());
        for statement in statements {
            let filter = statement.get_document("q").cloned().unwrap_or_default();
            let update = statement
                .get_document("u")
                .cloned()
                .ok_or_else(|| {
                    CoreError::command_failed(
                        FAILED_TO_PARSE,
                        "update statement needs a 'u' document",
                    )
                })?;
            let mut request = if update.first_key().is_some_and(|k| k.starts_with('$')) {
                UpdateRequest::update(filter, update)
            } else {
                validator.check_document(&update)?;
                UpdateRequest::replace(filter, update)
            };
            request.upsert = statement.get("upsert").is_some_and(Bson::is_truthy);
            request.multi = statement.get("multi").is_some_and(Bson::is_truthy);
            if request.multi && request.kind == UpdateKind::Replace {
                return Err(CoreError::command_failed(
                    BAD_VALUE,
                    "multi update is not supported for replacement documents",
                ));
            }
            requests.push(request);
        }
        let write_concern = command_write_concern(command)?;
        let tally =
            self.update_with_tally(&namespace, ordered(command), &write_concern, &requests)?;
        if !write_concern.is_acknowledged() {
            return Ok(ok());
        }
        let mut reply = Document::new();
        reply.insert("n", number(tally.count));
        reply.insert("nModified", number(tally.modified));
        if !tally.upserted.is_empty() {
            let upserted = tally
                .upserted
                .into_iter()
                .map(|(index, id)| {
                    let mut entry = Document::new();
                    entry.insert("index", number(index as u64));
                    entry.insert("_id", id);
                    Bson::Document(entry)
                })
                .collect();
            reply.insert("upserted", Bson::Array(upserted));
        }
        reply.insert("ok", 1.0);
        Ok(reply)
    }

    fn delete_command(
        &self,
        database: &str,
        command: &Document,
        payload: Option<Payload<'_>>,
    ) -> CoreResult<Document> {
        let namespace = target_namespace(database, command, "delete")?;
        let (statements, _) =
            batch_documents(command, PayloadKind::Delete, &NoOpFieldNameValidator, payload)?;
        let requests: Vec<DeleteRequest> = statements
            .into_iter()
            .map(|statement| {
                let filter = statement.get_document("q").cloned().unwrap_or_default();
                match statement.get_i64("limit") {
                    Some(1) => DeleteRequest::one(filter),
                    _ => DeleteRequest::many(filter),
                }
            })
            .collect();
        let write_concern = command_write_concern(command)?;
        let result = self.delete(&namespace, ordered(command), &write_concern, &requests)?;
        Ok(write_reply(&result))
    }
}

fn ok() -> Document {
    let mut reply = Document::new();
    reply.insert("ok", 1.0);
    reply
}

/// Counts as `Int32` when they fit, like a server reply.
fn number(n: u64) -> Bson {
    match i32::try_from(n) {
        Ok(n) => Bson::Int32(n),
        Err(_) => Bson::Int64(i64::try_from(n).unwrap_or(i64::MAX)),
    }
}

fn write_reply(result: &WriteConcernResult) -> Document {
    let mut reply = Document::new();
    if let Some(n) = result.count() {
        reply.insert("n", number(n));
    }
    reply.insert("ok", 1.0);
    reply
}

fn target_namespace(database: &str, command: &Document, name: &str) -> CoreResult<Namespace> {
    match command.get_str(name) {
        Some(collection) if !collection.is_empty() => Ok(Namespace::new(database, collection)),
        _ => {
            let given = command.get(name).map(ToString::to_string).unwrap_or_default();
            Err(CoreError::InvalidNamespace(format!("{database}.{given}")))
        }
    }
}

fn optional_document(command: &Document, field: &str) -> CoreResult<Option<Document>> {
    match command.get(field) {
        None | Some(Bson::Null) => Ok(None),
        Some(Bson::Document(d)) => Ok(Some(d.clone())),
        Some(other) => Err(CoreError::command_failed(
            FAILED_TO_PARSE,
            format!("'{field}' must be a document, got {}", other.type_name()),
        )),
    }
}

fn non_negative(command: &Document, field: &str) -> CoreResult<Option<usize>> {
    match command.get(field) {
        None => Ok(None),
        Some(value) => value
            .as_i64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                CoreError::command_failed(
                    BAD_VALUE,
                    format!("'{field}' must be a non-negative integer"),
                )
            }),
    }
}

fn ordered(command: &Document) -> bool {
    command.get("ordered").map_or(true, Bson::is_truthy)
}

/// Documents of a batched write, taken from the payload when its kind
/// matches, otherwise from the inline array. Returns the validator that
/// applies to them.
fn batch_documents<'a>(
    command: &Document,
    kind: PayloadKind,
    command_validator: &'a dyn FieldNameValidator,
    payload: Option<Payload<'a>>,
) -> CoreResult<(Vec<Document>, &'a dyn FieldNameValidator)> {
    if let Some((payload, payload_validator)) = payload.filter(|(p, _)| p.kind == kind) {
        return Ok((payload.remaining().to_vec(), payload_validator));
    }
    let field = kind.field_name();
    let items = command.get_array(field).ok_or_else(|| {
        CoreError::command_failed(FAILED_TO_PARSE, format!("missing '{field}' array"))
    })?;
    let documents = items
        .iter()
        .map(|item| {
            item.as_document().cloned().ok_or_else(|| {
                CoreError::command_failed(
                    FAILED_TO_PARSE,
                    format!("'{field}' entries must be documents"),
                )
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;
    Ok((documents, command_validator))
}

fn command_write_concern(command: &Document) -> CoreResult<WriteConcern> {
    let Some(concern) = optional_document(command, "writeConcern")? else {
        return Ok(WriteConcern::ACKNOWLEDGED);
    };
    let w = match concern.get("w") {
        None => None,
        Some(Bson::String(mode)) if mode == "majority" => Some(Acknowledgement::Majority),
        Some(Bson::String(tag)) => Some(Acknowledgement::Tag(tag.clone())),
        Some(value) => Some(Acknowledgement::Nodes(
            value
                .as_i64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| {
                    CoreError::command_failed(
                        FAILED_TO_PARSE,
                        "w must be a non-negative number or a string",
                    )
                })?,
        )),
    };
    let write_concern = WriteConcern {
        w,
        journal: concern.get("j").map(Bson::is_truthy),
        wtimeout: concern
            .get_i64("wtimeout")
            .and_then(|ms| u64::try_from(ms).ok())
            .map(Duration::from_millis),
    };
    check_write_concern(&write_concern)?;
    Ok(write_concern)
}
