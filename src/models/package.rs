use super::RecordRef;
use crate::ports::{Document, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Page used when the caller does not ask for one
pub const DEFAULT_PAGE: u32 = 1;
/// Page size used when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: u32 = 9;

/// A sellable travel bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: String,
    pub name: String,
    pub price: f64,
    /// Length of the trip in days
    pub duration: u32,
    pub destination_ids: Vec<String>,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    #[serde(default)]
    pub featured: bool,
}

/// Shape of a package as stored in the `packages` collection
#[derive(Debug, Deserialize)]
struct PackageDocument {
    #[serde(rename = "$id")]
    id: String,
    name: String,
    price: f64,
    duration: u32,
    #[serde(default, deserialize_with = "super::null_as_default")]
    destinations: Vec<RecordRef>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    tags: Vec<RecordRef>,
    #[serde(default)]
    discount: Option<f64>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    featured: bool,
}

impl TryFrom<&Document> for Package {
    type Error = StoreError;

    fn try_from(document: &Document) -> StoreResult<Self> {
        let raw: PackageDocument = document.parse()?;
        Ok(Self {
            id: raw.id,
            name: raw.name,
            price: raw.price,
            duration: raw.duration,
            destination_ids: RecordRef::ids(&raw.destinations),
            tags: RecordRef::ids(&raw.tags),
            discount: raw.discount,
            featured: raw.featured,
        })
    }
}

/// Caller-supplied search criteria; every field is optional
///
/// Only `query`, `destination_id`, `sort_by`, `page` and `limit` influence
/// the result. The price, duration, rating, tag and traveler fields are
/// accepted for callers that send them but are not applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    pub query: Option<String>,
    pub destination_id: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_duration: Option<u32>,
    pub max_duration: Option<u32>,
    pub ratings: Option<Vec<f64>>,
    pub tags: Option<Vec<String>>,
    pub sort_by: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub travelers: Option<u32>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_destination(mut self, destination_id: impl Into<String>) -> Self {
        self.destination_id = Some(destination_id.into());
        self
    }

    pub fn sort_by(mut self, sort_by: impl Into<String>) -> Self {
        self.sort_by = Some(sort_by.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Half-open `[start, end)` window selected by `page` and `limit`
    ///
    /// `None` means the window lies entirely before the first element
    /// (page 0) or does not fit in memory, both of which select nothing.
    pub fn window(&self) -> Option<(usize, usize)> {
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        let limit = usize::try_from(self.limit.unwrap_or(DEFAULT_PAGE_SIZE)).ok()?;
        let page_index = usize::try_from(page.checked_sub(1)?).ok()?;
        let start = page_index.checked_mul(limit)?;
        let end = start.checked_add(limit)?;
        Some((start, end))
    }

    /// Resolved sort key, if the requested one is recognized
    pub fn sort_key(&self) -> Option<SortKey> {
        self.sort_by.as_deref().and_then(SortKey::parse)
    }
}

/// Recognized orderings for search results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    PriceAsc,
    PriceDesc,
    DurationAsc,
    DurationDesc,
    NameAsc,
    NameDesc,
}

impl SortKey {
    /// Parse the wire name of a sort key; unknown names yield `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "price-asc" => Some(Self::PriceAsc),
            "price-desc" => Some(Self::PriceDesc),
            "duration-asc" => Some(Self::DurationAsc),
            "duration-desc" => Some(Self::DurationDesc),
            "name-asc" => Some(Self::NameAsc),
            "name-desc" => Some(Self::NameDesc),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::DurationAsc => "duration-asc",
            Self::DurationDesc => "duration-desc",
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
        }
    }

    pub fn compare(self, a: &Package, b: &Package) -> Ordering {
        match self {
            Self::PriceAsc => a.price.total_cmp(&b.price),
            Self::PriceDesc => b.price.total_cmp(&a.price),
            Self::DurationAsc => a.duration.cmp(&b.duration),
            Self::DurationDesc => b.duration.cmp(&a.duration),
            Self::NameAsc => locale_compare(&a.name, &b.name),
            Self::NameDesc => locale_compare(&b.name, &a.name),
        }
    }
}

/// Collation in three levels: base letters, then accents, then case
///
/// Accented letters sort with their base letter (`Éze` before `Fiji`); at
/// equal base letters the unaccented form comes first and lowercase comes
/// before uppercase.
fn locale_compare(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| a.to_lowercase().nfd().cmp(b.to_lowercase().nfd()))
        .then_with(|| b.cmp(a))
}

/// Lowercase with combining marks stripped after compatibility decomposition
fn base_letters(value: &str) -> String {
    value
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
