//! Collection storage.

use docbridge_core::{Bson, Document, Namespace};
use std::collections::BTreeMap;

/// Documents grouped by database and collection, kept in insertion order.
#[derive(Debug, Default)]
pub(crate) struct Store {
    databases: BTreeMap<String, BTreeMap<String, Vec<Document>>>,
}

impl Store {
    pub(crate) fn collection(&self, namespace: &Namespace) -> Option<&Vec<Document>> {
        self.databases
            .get(namespace.database())?
            .get(namespace.collection())
    }

    pub(crate) fn collection_mut(&mut self, namespace: &Namespace) -> Option<&mut Vec<Document>> {
        self.databases
            .get_mut(namespace.database())?
            .get_mut(namespace.collection())
    }

    /// Returns the collection, creating it (and its database) if missing.
    pub(crate) fn collection_entry(&mut self, namespace: &Namespace) -> &mut Vec<Document> {
        self.databases
            .entry(namespace.database().to_string())
            .or_default()
            .entry(namespace.collection().to_string())
            .or_default()
    }

    /// Removes a collection. Returns the number of documents it held, or
    /// `None` if it did not exist.
    pub(crate) fn drop_collection(&mut self, namespace: &Namespace) -> Option<usize> {
        let database = self.databases.get_mut(namespace.database())?;
        let dropped = database.remove(namespace.collection())?;
        if database.is_empty() {
            self.databases.remove(namespace.database());
        }
        Some(dropped.len())
    }

    pub(crate) fn drop_database(&mut self, database: &str) -> bool {
        self.databases.remove(database).is_some()
    }

    pub(crate) fn collection_names(&self, database: &str) -> Vec<String> {
        self.databases
            .get(database)
            .map(|collections| collections.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn database_names(&self) -> Vec<String> {
        self.databases.keys().cloned().collect()
    }
}

/// Position of the document whose `_id` equals `id`.
pub(crate) fn position_of_id(documents: &[Document], id: &Bson) -> Option<usize> {
    documents
        .iter()
        .position(|d| d.get("_id").is_some_and(|existing| existing.matches(id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docbridge_core::doc;

    #[test]
    fn entry_creates_and_lists() {
        let mut store = Store::default();
        store.collection_entry(&Namespace::new("db", "b")).push(doc! { "_id" => 1 });
        store.collection_entry(&Namespace::new("db", "a"));
        store.collection_entry(&Namespace::new("admin", "x"));

        assert_eq!(store.collection_names("db"), vec!["a", "b"]);
        assert_eq!(store.database_names(), vec!["admin", "db"]);
        assert!(store.collection_names("nope").is_empty());
    }

    #[test]
    fn drop_collection_removes_empty_database() {
        let mut store = Store::default();
        let ns = Namespace::new("db", "c");
        store.collection_entry(&ns).push(doc! {});
        assert_eq!(store.drop_collection(&ns), Some(1));
        assert_eq!(store.drop_collection(&ns), None);
        assert!(store.database_names().is_empty());
    }

    #[test]
    fn id_lookup_is_numeric_aware() {
        let docs = vec![doc! { "_id" => 1 }, doc! { "_id" => "two" }];
        assert_eq!(position_of_id(&docs, &Bson::Int64(1)), Some(0));
        assert_eq!(position_of_id(&docs, &Bson::from("two")), Some(1));
        assert_eq!(position_of_id(&docs, &Bson::from("three")), None);
    }
}
