//! Document model.
//!
//! Documents are insertion-ordered maps from field names to [`Bson`] values.
//! Field order is preserved because command documents are identified by their
//! first key.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// A dynamic document value.
#[derive(Debug, Clone, PartialEq)]
pub enum Bson {
    /// Null value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Array of values.
    Array(Vec<Bson>),
    /// Embedded document.
    Document(Document),
}

impl Bson {
    /// Returns the numeric value as `f64` for any numeric variant.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Bson::Int32(v) => Some(f64::from(*v)),
            Bson::Int64(v) => Some(*v as f64),
            Bson::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as `i64` for integers and integral doubles.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Bson::Int32(v) => Some(i64::from(*v)),
            Bson::Int64(v) => Some(*v),
            Bson::Double(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }

    /// Returns the string slice for string values.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Bson::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean for boolean values.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Bson::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the embedded document.
    #[must_use]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Bson::Document(d) => Some(d),
            _ => None,
        }
    }

    /// Returns the array elements.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Bson]> {
        match self {
            Bson::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Interprets the value as a flag, the way command and projection
    /// documents use `1`, `true` or `0`, `false`.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Bson::Null => false,
            Bson::Boolean(b) => *b,
            other => other.as_f64().map_or(true, |n| n != 0.0),
        }
    }

    fn as_integer(&self) -> Option<i64> {
        match self {
            Bson::Int32(v) => Some(i64::from(*v)),
            Bson::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Equality used when matching filters: numbers compare by value across
    /// widths, everything else structurally. Two integers compare exactly;
    /// `f64` is used only when a double is involved.
    #[must_use]
    pub fn matches(&self, other: &Bson) -> bool {
        if let (Some(a), Some(b)) = (self.as_integer(), other.as_integer()) {
            return a == b;
        }
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    /// Ordering between comparable values (numbers with numbers, strings
    /// with strings). Other combinations are unordered.
    #[must_use]
    pub fn compare(&self, other: &Bson) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_integer(), other.as_integer()) {
            return Some(a.cmp(&b));
        }
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a.partial_cmp(&b);
        }
        match (self, other) {
            (Bson::String(a), Bson::String(b)) => Some(a.cmp(b)),
            (Bson::Boolean(a), Bson::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Name of the value's type, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Bson::Null => "null",
            Bson::Boolean(_) => "bool",
            Bson::Int32(_) => "int",
            Bson::Int64(_) => "long",
            Bson::Double(_) => "double",
            Bson::String(_) => "string",
            Bson::Array(_) => "array",
            Bson::Document(_) => "object",
        }
    }
}

impl fmt::Display for Bson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bson::Null => f.write_str("null"),
            Bson::Boolean(b) => write!(f, "{b}"),
            Bson::Int32(v) => write!(f, "{v}"),
            Bson::Int64(v) => write!(f, "{v}"),
            Bson::Double(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Bson::Double(v) => write!(f, "{v}"),
            Bson::String(s) => write!(f, "{s:?}"),
            Bson::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Bson::Document(doc) => write!(f, "{doc}"),
        }
    }
}

impl From<bool> for Bson {
    fn from(value: bool) -> Self {
        Bson::Boolean(value)
    }
}

impl From<i32> for Bson {
    fn from(value: i32) -> Self {
        Bson::Int32(value)
    }
}

impl From<i64> for Bson {
    fn from(value: i64) -> Self {
        Bson::Int64(value)
    }
}

impl From<f64> for Bson {
    fn from(value: f64) -> Self {
        Bson::Double(value)
    }
}

impl From<&str> for Bson {
    fn from(value: &str) -> Self {
        Bson::String(value.to_string())
    }
}

impl From<String> for Bson {
    fn from(value: String) -> Self {
        Bson::String(value)
    }
}

impl From<Document> for Bson {
    fn from(value: Document) -> Self {
        Bson::Document(value)
    }
}

impl<T: Into<Bson>> From<Vec<T>> for Bson {
    fn from(values: Vec<T>) -> Self {
        Bson::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Bson>> From<Option<T>> for Bson {
    fn from(value: Option<T>) -> Self {
        value.map_or(Bson::Null, Into::into)
    }
}

impl Serialize for Bson {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Bson::Null => serializer.serialize_unit(),
            Bson::Boolean(b) => serializer.serialize_bool(*b),
            Bson::Int32(v) => serializer.serialize_i32(*v),
            Bson::Int64(v) => serializer.serialize_i64(*v),
            Bson::Double(v) => serializer.serialize_f64(*v),
            Bson::String(s) => serializer.serialize_str(s),
            Bson::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Bson::Document(doc) => doc.serialize(serializer),
        }
    }
}

/// An insertion-ordered document.
///
/// # Example
///
/// ```
/// use docbridge_core::{doc, Bson};
///
/// let person = doc! { "name" => "Ada", "age" => 36 };
/// assert_eq!(person.get("name"), Some(&Bson::from("Ada")));
/// assert_eq!(person.first_key(), Some("name"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    entries: Vec<(String, Bson)>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the document has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the value of a top-level field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Bson> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns a mutable reference to a top-level field.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Bson> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Looks up a dotted path such as `address.city`.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Bson> {
        let mut parts = path.split('.');
        let mut current = self.get(parts.next()?)?;
        for part in parts {
            current = current.as_document()?.get(part)?;
        }
        Some(current)
    }

    /// Returns a string field.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Bson::as_str)
    }

    /// Returns an integral field.
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Bson::as_i64)
    }

    /// Returns an embedded document field.
    #[must_use]
    pub fn get_document(&self, key: &str) -> Option<&Document> {
        self.get(key).and_then(Bson::as_document)
    }

    /// Returns an array field.
    #[must_use]
    pub fn get_array(&self, key: &str) -> Option<&[Bson]> {
        self.get(key).and_then(Bson::as_array)
    }

    /// Returns true if the top-level field exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Sets a field, replacing an existing value in place.
    ///
    /// Returns the previous value if the field existed.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Bson>) -> Option<Bson> {
        let key = key.into();
        let value = value.into();
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Sets a field at the front of the document.
    pub fn insert_first(&mut self, key: impl Into<String>, value: impl Into<Bson>) {
        let key = key.into();
        self.remove(&key);
        self.entries.insert(0, (key, value.into()));
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Bson> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// The first field name; for command documents this is the command name.
    #[must_use]
    pub fn first_key(&self) -> Option<&str> {
        self.entries.first().map(|(k, _)| k.as_str())
    }

    /// Iterates over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bson)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl FromIterator<(String, Bson)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Bson)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl IntoIterator for Document {
    type Item = (String, Bson);
    type IntoIter = std::vec::IntoIter<(String, Bson)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str("{}");
        }
        f.write_str("{ ")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k:?}: {v}")?;
        }
        f.write_str(" }")
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Builds a [`Document`] from `key => value` pairs.
///
/// Values go through `Into<Bson>`, so literals, strings, vectors and nested
/// `doc!` invocations all work.
#[macro_export]
macro_rules! doc {
    () => {
        $crate::Document::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut document = $crate::Document::new();
        $(
            document.insert($key, $value);
        )+
        document
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn insert_replaces_in_place() {
        let mut d = doc! { "a" => 1, "b" => 2 };
        let previous = d.insert("a", 10);
        assert_eq!(previous, Some(Bson::Int32(1)));
        assert_eq!(d.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(d.get_i64("a"), Some(10));
    }

    #[test]
    fn dotted_path_lookup() {
        let d = doc! { "address" => doc! { "city" => "Oslo" } };
        assert_eq!(d.get_path("address.city"), Some(&Bson::from("Oslo")));
        assert_eq!(d.get_path("address.zip"), None);
        assert_eq!(d.get_path("missing.city"), None);
    }

    #[test]
    fn numeric_matching_crosses_widths() {
        assert!(Bson::Int32(3).matches(&Bson::Int64(3)));
        assert!(Bson::Double(3.0).matches(&Bson::Int32(3)));
        assert!(!Bson::from("3").matches(&Bson::Int32(3)));
    }

    #[test]
    fn large_integers_compare_exactly() {
        let low = Bson::Int64(1 << 53);
        let high = Bson::Int64((1 << 53) + 1);
        assert!(!low.matches(&high));
        assert!(low.matches(&Bson::Int64(1 << 53)));
        assert_eq!(low.compare(&high), Some(Ordering::Less));
        assert!(Bson::Int32(7).matches(&Bson::Int64(7)));
        assert!(Bson::Int64(7).matches(&Bson::Double(7.0)));
    }

    #[test]
    fn compare_orders_numbers_and_strings() {
        assert_eq!(Bson::Int32(1).compare(&Bson::Double(2.5)), Some(Ordering::Less));
        assert_eq!(Bson::from("b").compare(&Bson::from("a")), Some(Ordering::Greater));
        assert_eq!(Bson::from("b").compare(&Bson::Int32(1)), None);
    }

    #[test]
    fn insert_first_moves_key_to_front() {
        let mut d = doc! { "a" => 1, "_id" => 7 };
        d.insert_first("_id", 7);
        assert_eq!(d.first_key(), Some("_id"));
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn display_renders_relaxed_json() {
        let d = doc! { "insert" => "coll", "ordered" => true, "n" => 2.0 };
        assert_eq!(d.to_string(), r#"{ "insert": "coll", "ordered": true, "n": 2.0 }"#);
        assert_eq!(Document::new().to_string(), "{}");
    }

    #[test]
    fn truthiness() {
        assert!(Bson::Int32(1).is_truthy());
        assert!(!Bson::Int64(0).is_truthy());
        assert!(!Bson::Null.is_truthy());
        assert!(Bson::from("x").is_truthy());
    }
}
