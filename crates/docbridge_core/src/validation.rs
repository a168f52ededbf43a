//! Field name validation policies.

use crate::document::{Bson, Document};
use crate::error::{CoreError, CoreResult};

/// Decides whether a field name may be stored.
pub trait FieldNameValidator: Send + Sync {
    /// Returns true if `field_name` is acceptable.
    fn validate(&self, field_name: &str) -> bool;

    /// Checks every field of `document`, descending into embedded documents
    /// and arrays.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFieldName`] for the first rejected name.
    fn check_document(&self, document: &Document) -> CoreResult<()> {
        for (name, value) in document.iter() {
            if !self.validate(name) {
                return Err(CoreError::InvalidFieldName {
                    name: name.to_string(),
                });
            }
            check_nested(self, value)?;
        }
        Ok(())
    }
}

fn check_nested<V: FieldNameValidator + ?Sized>(validator: &V, value: &Bson) -> CoreResult<()> {
    match value {
        Bson::Document(doc) => validator.check_document(doc),
        Bson::Array(items) => items.iter().try_for_each(|item| check_nested(validator, item)),
        _ => Ok(()),
    }
}

/// Accepts every name. Used for commands and queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpFieldNameValidator;

impl FieldNameValidator for NoOpFieldNameValidator {
    fn validate(&self, _field_name: &str) -> bool {
        true
    }
}

/// Rejects names that cannot be stored: empty names, names starting with
/// `$`, and names containing `.`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageFieldNameValidator;

impl FieldNameValidator for StorageFieldNameValidator {
    fn validate(&self, field_name: &str) -> bool {
        !field_name.is_empty() && !field_name.starts_with('$') && !field_name.contains('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn storage_validator_rules() {
        let v = StorageFieldNameValidator;
        assert!(v.validate("name"));
        assert!(!v.validate("$set"));
        assert!(!v.validate("a.b"));
        assert!(!v.validate(""));
    }

    #[test]
    fn check_document_descends() {
        let items = vec![Bson::from(doc! { "$bad" => 1 })];
        let d = doc! { "ok" => 1, "nested" => doc! { "items" => items } };
        let err = StorageFieldNameValidator.check_document(&d).unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidFieldName {
                name: "$bad".into()
            }
        );
        assert!(NoOpFieldNameValidator.check_document(&d).is_ok());
    }
}
