//! Result decoders.
//!
//! Engines produce raw [`Document`]s; a [`Decoder`] chosen by the caller turns
//! each one into the type the caller asked for. The adapter passes decoders
//! through without looking at them.

use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Turns a raw document into a `T`.
pub trait Decoder<T>: Send + Sync {
    /// Decodes one document.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Decoding`] if the document does not fit `T`.
    fn decode(&self, document: &Document) -> CoreResult<T>;
}

/// Returns documents unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentDecoder;

impl Decoder<Document> for DocumentDecoder {
    fn decode(&self, document: &Document) -> CoreResult<Document> {
        Ok(document.clone())
    }
}

/// Decodes documents into any `serde` type by way of CBOR.
///
/// # Example
///
/// ```
/// use docbridge_core::{doc, Decoder, SerdeDecoder};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Person {
///     name: String,
///     age: i64,
/// }
///
/// let decoder = SerdeDecoder::<Person>::new();
/// let person = decoder.decode(&doc! { "name" => "Ada", "age" => 36 }).unwrap();
/// assert_eq!(person.name, "Ada");
/// assert_eq!(person.age, 36);
/// ```
pub struct SerdeDecoder<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeDecoder<T> {
    /// Creates a decoder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for SerdeDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SerdeDecoder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SerdeDecoder")
    }
}

impl<T: DeserializeOwned> Decoder<T> for SerdeDecoder<T> {
    fn decode(&self, document: &Document) -> CoreResult<T> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(document, &mut buf)
            .map_err(|e| CoreError::decoding(e.to_string()))?;
        ciborium::de::from_reader(buf.as_slice()).map_err(|e| CoreError::decoding(e.to_string()))
    }
}
