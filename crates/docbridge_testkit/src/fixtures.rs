//! Ready-made data and engines for tests.

use docbridge_core::{doc, Document, Engine, InsertRequest, Namespace, WriteConcern};
use docbridge_memory::MemoryEngine;
use std::sync::Arc;

/// Namespace the sample people live in: `test.people`.
pub fn people_namespace() -> Namespace {
    Namespace::new("test", "people")
}

/// Five people with integer ids, ages and nested addresses.
pub fn sample_people() -> Vec<Document> {
    [
        (1, "Ada", 36, "London"),
        (2, "Grace", 85, "New York"),
        (3, "Alan", 41, "Manchester"),
        (4, "Edsger", 72, "Austin"),
        (5, "Barbara", 35, "Boston"),
    ]
    .into_iter()
    .map(|(id, name, age, city)| {
        doc! {
            "_id" => id,
            "name" => name,
            "age" => age,
            "address" => doc! { "city" => city },
        }
    })
    .collect()
}

/// A memory engine with [`sample_people`] inserted into
/// [`people_namespace`].
///
/// # Panics
///
/// Panics if seeding fails, which indicates a broken engine.
pub fn memory_server() -> Arc<MemoryEngine> {
    let engine = MemoryEngine::new();
    let inserts: Vec<InsertRequest> = sample_people().into_iter().map(InsertRequest::new).collect();
    engine
        .insert(&people_namespace(), true, &WriteConcern::ACKNOWLEDGED, &inserts)
        .expect("seeding sample people");
    Arc::new(engine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_server_holds_sample_people() {
        let engine = memory_server();
        assert_eq!(engine.document_count(&people_namespace()), sample_people().len());
    }
}
