//! Update operators and replacement documents.

use crate::filter::is_operator_document;
use docbridge_core::{Bson, CoreError, CoreResult, Document, UpdateKind};

/// Produces the updated form of `document`.
///
/// The input is left untouched so that a failing update never leaves a
/// half-applied document behind.
///
/// # Errors
///
/// Returns [`CoreError::MalformedQuery`] for unknown operators, replacement
/// documents containing operators, `$inc` on non-numeric values, and
/// attempts to change `_id`.
pub fn apply(document: &Document, update: &Document, kind: UpdateKind) -> CoreResult<Document> {
    let updated = match kind {
        UpdateKind::Replace => replace(document, update)?,
        UpdateKind::Update => apply_operators(document, update)?,
    };
    if document.get("_id") != updated.get("_id") && document.contains_key("_id") {
        return Err(CoreError::malformed_query("_id is immutable"));
    }
    Ok(updated)
}

fn replace(document: &Document, replacement: &Document) -> CoreResult<Document> {
    if let Some(key) = replacement.keys().find(|k| k.starts_with('$')) {
        return Err(CoreError::malformed_query(format!(
            "replacement document must not contain operator {key}"
        )));
    }
    let mut updated = replacement.clone();
    if let Some(id) = document.get("_id") {
        if !updated.contains_key("_id") {
            updated.insert_first("_id", id.clone());
        }
    }
    Ok(updated)
}

fn apply_operators(document: &Document, update: &Document) -> CoreResult<Document> {
    if update.is_empty() {
        return Err(CoreError::malformed_query("update document is empty"));
    }
    let mut updated = document.clone();
    for (op, arguments) in update.iter() {
        let fields = arguments
            .as_document()
            .ok_or_else(|| CoreError::malformed_query(format!("{op} needs a document")))?;
        for (path, value) in fields.iter() {
            match op {
                "$set" => set_path(&mut updated, path, value.clone())?,
                "$unset" => unset_path(&mut updated, path),
                "$inc" => increment(&mut updated, path, value)?,
                other if other.starts_with('$') => {
                    return Err(CoreError::malformed_query(format!(
                        "unknown update operator: {other}"
                    )))
                }
                other => {
                    return Err(CoreError::malformed_query(format!(
                        "update document mixes operators with field {other:?}"
                    )))
                }
            }
        }
    }
    Ok(updated)
}

/// Sets a dotted path, creating intermediate documents as needed.
pub(crate) fn set_path(document: &mut Document, path: &str, value: Bson) -> CoreResult<()> {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
            Ok(())
        }
        Some((head, rest)) => {
            if !document.contains_key(head) {
                document.insert(head, Document::new());
            }
            match document.get_mut(head) {
                Some(Bson::Document(inner)) => set_path(inner, rest, value),
                _ => Err(CoreError::malformed_query(format!(
                    "cannot create field {rest:?} inside non-document {head:?}"
                ))),
            }
        }
    }
}

fn unset_path(document: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            document.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(inner)) = document.get_mut(head) {
                unset_path(inner, rest);
            }
        }
    }
}

fn increment(document: &mut Document, path: &str, by: &Bson) -> CoreResult<()> {
    if by.as_f64().is_none() {
        return Err(CoreError::malformed_query(format!(
            "$inc needs a number, got {}",
            by.type_name()
        )));
    }
    let sum = match document.get_path(path) {
        None => by.clone(),
        Some(current) => add(path, current, by)?,
    };
    set_path(document, path, sum)
}

fn add(path: &str, a: &Bson, b: &Bson) -> CoreResult<Bson> {
    match (a, b) {
        (Bson::Int32(x), Bson::Int32(y)) => Ok(x
            .checked_add(*y)
            .map_or_else(|| Bson::Int64(i64::from(*x) + i64::from(*y)), Bson::Int32)),
        (Bson::Int32(x), Bson::Int64(y)) | (Bson::Int64(y), Bson::Int32(x)) => {
            checked_long(path, i64::from(*x).checked_add(*y))
        }
        (Bson::Int64(x), Bson::Int64(y)) => checked_long(path, x.checked_add(*y)),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Ok(Bson::Double(x + y)),
            _ => Err(CoreError::malformed_query(format!(
                "cannot apply $inc to {path:?} of type {}",
                a.type_name()
            ))),
        },
    }
}

fn checked_long(path: &str, sum: Option<i64>) -> CoreResult<Bson> {
    sum.map(Bson::Int64).ok_or_else(|| {
        CoreError::malformed_query(format!("$inc on {path:?} overflows a 64-bit integer"))
    })
}

/// Builds the base document of an upsert from the equality clauses of its
/// filter.
pub(crate) fn upsert_seed(filter: &Document) -> CoreResult<Document> {
    let mut seed = Document::new();
    for (path, condition) in filter.iter() {
        if path.starts_with('$') || is_operator_document(condition) {
            continue;
        }
        set_path(&mut seed, path, condition.clone())?;
    }
    Ok(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docbridge_core::doc;

    fn base() -> Document {
        doc! { "_id" => 1, "name" => "Ada", "visits" => 1 }
    }

    #[test]
    fn set_unset_inc() {
        let update = doc! {
            "$set" => doc! { "name" => "Grace", "address.city" => "Arlington" },
            "$unset" => doc! { "missing" => "" },
            "$inc" => doc! { "visits" => 2 },
        };
        let updated = apply(&base(), &update, UpdateKind::Update).unwrap();
        assert_eq!(updated.get_str("name"), Some("Grace"));
        assert_eq!(updated.get_path("address.city"), Some(&Bson::from("Arlington")));
        assert_eq!(updated.get("visits"), Some(&Bson::Int32(3)));
    }

    #[test]
    fn inc_widens_on_overflow_and_mixes_to_double() {
        let doc = doc! { "a" => i32::MAX, "b" => 1 };
        let bump = doc! { "$inc" => doc! { "a" => 1, "b" => 0.5 } };
        let updated = apply(&doc, &bump, UpdateKind::Update).unwrap();
        assert_eq!(updated.get("a"), Some(&Bson::Int64(i64::from(i32::MAX) + 1)));
        assert_eq!(updated.get("b"), Some(&Bson::Double(1.5)));
    }

    #[test]
    fn inc_past_long_range_reports_overflow() {
        let doc = doc! { "a" => i64::MAX };
        let bump = doc! { "$inc" => doc! { "a" => 1 } };
        let err = apply(&doc, &bump, UpdateKind::Update).unwrap_err();
        assert_eq!(
            err,
            CoreError::malformed_query("$inc on \"a\" overflows a 64-bit integer")
        );
    }

    #[test]
    fn inc_on_missing_field_sets_it() {
        let bump = doc! { "$inc" => doc! { "score" => 5 } };
        let updated = apply(&base(), &bump, UpdateKind::Update).unwrap();
        assert_eq!(updated.get("score"), Some(&Bson::Int32(5)));
    }

    #[test]
    fn inc_on_string_fails() {
        let bump = doc! { "$inc" => doc! { "name" => 1 } };
        let err = apply(&base(), &bump, UpdateKind::Update).unwrap_err();
        assert!(matches!(err, CoreError::MalformedQuery { .. }));
    }

    #[test]
    fn replacement_keeps_id() {
        let updated = apply(&base(), &doc! { "name" => "Bob" }, UpdateKind::Replace).unwrap();
        assert_eq!(updated, doc! { "_id" => 1, "name" => "Bob" });
    }

    #[test]
    fn replacement_with_operator_is_rejected() {
        let set = doc! { "$set" => doc! { "a" => 1 } };
        assert!(apply(&base(), &set, UpdateKind::Replace).is_err());
    }

    #[test]
    fn unknown_operator_and_id_change_are_rejected() {
        let push = doc! { "$push" => doc! { "a" => 1 } };
        assert!(apply(&base(), &push, UpdateKind::Update).is_err());
        let move_id = doc! { "$set" => doc! { "_id" => 2 } };
        assert!(apply(&base(), &move_id, UpdateKind::Update).is_err());
        assert!(apply(&base(), &doc! { "name" => "x" }, UpdateKind::Update).is_err());
    }

    #[test]
    fn failed_update_leaves_input_untouched() {
        let original = base();
        let update = doc! { "$set" => doc! { "name" => "Z" }, "$inc" => doc! { "name" => 1 } };
        assert!(apply(&original, &update, UpdateKind::Update).is_err());
        assert_eq!(original, base());
    }

    #[test]
    fn upsert_seed_takes_equality_clauses() {
        let filter = doc! { "name" => "Ada", "age" => doc! { "$gt" => 3 }, "a.b" => 1 };
        let seed = upsert_seed(&filter).unwrap();
        assert_eq!(seed, doc! { "name" => "Ada", "a" => doc! { "b" => 1 } });
    }
}
