use super::RecordRef;
use crate::ports::{Document, StoreError, StoreResult};
use serde::{Deserialize, Serialize};

/// A travel location packages can point at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Deserialize)]
struct DestinationDocument {
    #[serde(rename = "$id")]
    id: String,
    name: String,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    tags: Vec<RecordRef>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    featured: bool,
}

impl TryFrom<&Document> for Destination {
    type Error = StoreError;

    fn try_from(document: &Document) -> StoreResult<Self> {
        let raw: DestinationDocument = document.parse()?;
        Ok(Self {
            id: raw.id,
            name: raw.name,
            country: raw.country,
            region: raw.region,
            rating: raw.rating,
            tags: RecordRef::ids(&raw.tags),
            featured: raw.featured,
        })
    }
}
