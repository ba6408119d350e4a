//! Typed records normalized from store documents.
//!
//! Documents coming back from the store are loosely typed; references to
//! other documents may be embedded objects or bare id strings. Everything
//! is converted into the types below at the boundary so the rest of the
//! crate never inspects raw JSON.

pub mod destination;
pub mod package;
pub mod user;

pub use destination::Destination;
pub use package::{Package, SearchFilters, SortKey, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
pub use user::{Favorite, Notification, NotificationKind, Session};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Deserialize an explicit `null` as the type's default
///
/// The store sends `null` for unset attributes and empty relations; pair
/// with `#[serde(default)]` so a missing key behaves the same.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reference from one document to another
///
/// The store returns relationship attributes either expanded into the
/// referenced document or collapsed to its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordRef {
    /// Bare identifier
    Id(String),
    /// Embedded copy of the referenced document
    Embedded(EmbeddedRecord),
}

/// Embedded document inside a reference attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedRecord {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RecordRef {
    /// Identifier of the referenced document
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Embedded(record) => &record.id,
        }
    }

    /// Collapse a list of references into their ids
    pub fn ids(refs: &[Self]) -> Vec<String> {
        refs.iter().map(|r| r.id().to_string()).collect()
    }
}
