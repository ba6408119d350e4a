use crate::ports::{Document, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the caller for a single request
///
/// Resolved per request by the HTTP layer and passed explicitly to the
/// services that need it; nothing about the user is kept in process state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub display_name: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// A package saved by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    #[serde(rename = "$id")]
    pub id: String,
    pub user_id: String,
    pub package_id: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&Document> for Favorite {
    type Error = StoreError;

    fn try_from(document: &Document) -> StoreResult<Self> {
        document.parse()
    }
}

/// Severity of a notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// A message addressed to a single user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "$id")]
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub kind: NotificationKind,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&Document> for Notification {
    type Error = StoreError;

    fn try_from(document: &Document) -> StoreResult<Self> {
        document.parse()
    }
}
