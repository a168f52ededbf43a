//! Query filters and projections.

use docbridge_core::{Bson, CoreError, CoreResult, Document};
use std::cmp::Ordering;

/// Returns true if `document` satisfies `filter`.
///
/// An empty filter matches everything. Each top-level entry is either a
/// field (dotted paths allowed) compared by value, a field with an operator
/// document such as `{ "$gt": 3 }`, or a logical `$and` / `$or` over nested
/// filters.
///
/// # Errors
///
/// Returns [`CoreError::MalformedQuery`] for unknown operators or badly
/// shaped operator arguments.
pub fn matches(document: &Document, filter: &Document) -> CoreResult<bool> {
    for (key, condition) in filter.iter() {
        let satisfied = match key {
            "$and" => all_of(document, condition)?,
            "$or" => any_of(document, condition)?,
            _ if key.starts_with('$') => {
                return Err(CoreError::malformed_query(format!("unknown top-level operator: {key}")))
            }
            _ => field_matches(document.get_path(key), condition)?,
        };
        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses(condition: &Bson) -> CoreResult<Vec<&Document>> {
    let items = condition
        .as_array()
        .ok_or_else(|| CoreError::malformed_query("$and/$or needs an array"))?;
    items
        .iter()
        .map(|item| {
            item.as_document()
                .ok_or_else(|| CoreError::malformed_query("$and/$or entries must be documents"))
        })
        .collect()
}

fn all_of(document: &Document, condition: &Bson) -> CoreResult<bool> {
    for clause in clauses(condition)? {
        if !matches(document, clause)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn any_of(document: &Document, condition: &Bson) -> CoreResult<bool> {
    for clause in clauses(condition)? {
        if matches(document, clause)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Checks a filter for unknown operators and badly shaped arguments without
/// evaluating it.
///
/// [`matches`] stops at the first failing clause, so an invalid clause after
/// it would otherwise go unnoticed.
///
/// # Errors
///
/// Returns [`CoreError::MalformedQuery`] describing the first problem.
pub fn validate(filter: &Document) -> CoreResult<()> {
    for (key, condition) in filter.iter() {
        match key {
            "$and" | "$or" => clauses(condition)?.into_iter().try_for_each(validate)?,
            _ if key.starts_with('$') => {
                return Err(CoreError::malformed_query(format!("unknown top-level operator: {key}")))
            }
            _ => {
                let Some(operators) = condition
                    .as_document()
                    .filter(|_| is_operator_document(condition))
                else {
                    continue;
                };
                for (op, argument) in operators.iter() {
                    match op {
                        "$eq" | "$ne" | "$gt" | "$gte" | "$lt" | "$lte" | "$exists" => {}
                        "$in" | "$nin" if argument.as_array().is_some() => {}
                        "$in" | "$nin" => {
                            return Err(CoreError::malformed_query("$in/$nin needs an array"))
                        }
                        other => {
                            return Err(CoreError::malformed_query(format!(
                                "unknown operator: {other}"
                            )))
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// True if `condition` is an operator document like `{ "$gt": 1 }`.
pub(crate) fn is_operator_document(condition: &Bson) -> bool {
    condition
        .as_document()
        .and_then(Document::first_key)
        .is_some_and(|k| k.starts_with('$'))
}

fn field_matches(value: Option<&Bson>, condition: &Bson) -> CoreResult<bool> {
    let Some(operators) = condition.as_document().filter(|_| is_operator_document(condition)) else {
        return Ok(equals(value, condition));
    };
    for (op, argument) in operators.iter() {
        let satisfied = match op {
            "$eq" => equals(value, argument),
            "$ne" => !equals(value, argument),
            "$gt" => ordered(value, argument, |o| o == Ordering::Greater),
            "$gte" => ordered(value, argument, |o| o != Ordering::Less),
            "$lt" => ordered(value, argument, |o| o == Ordering::Less),
            "$lte" => ordered(value, argument, |o| o != Ordering::Greater),
            "$in" => in_list(value, argument)?,
            "$nin" => !in_list(value, argument)?,
            "$exists" => value.is_some() == argument.is_truthy(),
            other => return Err(CoreError::malformed_query(format!("unknown operator: {other}"))),
        };
        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Equality with array fan-out: an array field equals a scalar if any
/// element does. A missing field equals `null`.
fn equals(value: Option<&Bson>, target: &Bson) -> bool {
    match value {
        None => *target == Bson::Null,
        Some(Bson::Array(items)) if !matches!(target, Bson::Array(_)) => {
            items.iter().any(|item| item.matches(target))
        }
        Some(v) => v.matches(target),
    }
}

fn ordered(value: Option<&Bson>, target: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    let check = |v: &Bson| v.compare(target).is_some_and(&accept);
    match value {
        None => false,
        Some(Bson::Array(items)) => items.iter().any(check),
        Some(v) => check(v),
    }
}

fn in_list(value: Option<&Bson>, argument: &Bson) -> CoreResult<bool> {
    let candidates = argument
        .as_array()
        .ok_or_else(|| CoreError::malformed_query("$in/$nin needs an array"))?;
    Ok(candidates.iter().any(|candidate| equals(value, candidate)))
}

/// Applies an inclusion projection.
///
/// Listed truthy fields are kept in document order. `_id` is kept unless the
/// projection sets it to a falsy value. An empty projection returns the
/// document unchanged.
///
/// # Errors
///
/// Returns [`CoreError::MalformedQuery`] if a field other than `_id` is
/// excluded.
pub fn project(document: &Document, projection: &Document) -> CoreResult<Document> {
    if projection.is_empty() {
        return Ok(document.clone());
    }
    for (field, flag) in projection.iter() {
        if field != "_id" && !flag.is_truthy() {
            return Err(CoreError::malformed_query(format!(
                "exclusion of {field:?} is not supported in an inclusion projection"
            )));
        }
    }
    let keep_id = projection.get("_id").map_or(true, Bson::is_truthy);
    Ok(document
        .iter()
        .filter(|(field, _)| {
            if *field == "_id" {
                keep_id
            } else {
                projection.contains_key(field)
            }
        })
        .map(|(field, value)| (field.to_string(), value.clone()))
        .collect())
}
