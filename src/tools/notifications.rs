use super::catalog::normalize;
use crate::config::Config;
use crate::models::{Notification, NotificationKind, Session};
use crate::ports::{DocumentQuery, DocumentStorePort};
use crate::{Error, Result};
use serde_json::{json, Map};
use std::sync::Arc;
use tracing::{info, instrument};

/// Per-user notifications persisted in the notifications collection
#[derive(Debug, Clone)]
pub struct NotificationService {
    store: Arc<dyn DocumentStorePort>,
    collection: String,
}

impl NotificationService {
    pub fn new(store: Arc<dyn DocumentStorePort>, config: &Config) -> Self {
        Self {
            store,
            collection: config.collections.notifications.clone(),
        }
    }

    /// Deliver a notification to a user
    #[instrument(skip(self, message))]
    pub async fn notify(
        &self,
        user_id: &str,
        title: &str,
        message: &str,
        kind: NotificationKind,
    ) -> Result<Notification> {
        if title.trim().is_empty() {
            return Err(Error::InvalidInput {
                field: "title".to_string(),
                reason: "Title cannot be empty".to_string(),
            });
        }

        let mut data = Map::new();
        data.insert("userId".to_string(), json!(user_id));
        data.insert("title".to_string(), json!(title));
        data.insert("message".to_string(), json!(message));
        data.insert("kind".to_string(), json!(kind));
        data.insert("read".to_string(), json!(false));
        data.insert("createdAt".to_string(), json!(chrono::Utc::now()));

        let document = self.store.create(&self.collection, None, data).await?;
        info!("Notification {} delivered", document.id);
        Ok(Notification::try_from(&document)?)
    }

    /// The session user's notifications, newest first
    #[instrument(skip(self, session), fields(user = %session.user_id))]
    pub async fn list(&self, session: &Session) -> Result<Vec<Notification>> {
        let documents = self
            .store
            .list(
                &self.collection,
                &[DocumentQuery::equal("userId", session.user_id.as_str())],
            )
            .await?;

        let mut notifications: Vec<Notification> = normalize(&documents);
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    pub async fn unread_count(&self, session: &Session) -> Result<usize> {
        Ok(self.list(session).await?.iter().filter(|n| !n.read).count())
    }

    /// Mark one of the session user's notifications as read
    #[instrument(skip(self, session), fields(user = %session.user_id))]
    pub async fn mark_read(&self, session: &Session, id: &str) -> Result<Notification> {
        let owned = self
            .store
            .get(&self.collection, id)
            .await?
            .map(|doc| Notification::try_from(&doc))
            .transpose()?
            .filter(|n| n.user_id == session.user_id);

        // Other users' notifications are reported as missing
        if owned.is_none() {
            return Err(Error::not_found("Notification", id));
        }

        let mut patch = Map::new();
        patch.insert("read".to_string(), json!(true));
        let document = self.store.update(&self.collection, id, patch).await?;
        Ok(Notification::try_from(&document)?)
    }

    /// Mark everything read; returns how many notifications changed
    #[instrument(skip(self, session), fields(user = %session.user_id))]
    pub async fn mark_all_read(&self, session: &Session) -> Result<usize> {
        let mut changed = 0;
        for notification in self.list(session).await?.into_iter().filter(|n| !n.read) {
            let mut patch = Map::new();
            patch.insert("read".to_string(), json!(true));
            self.store
                .update(&self.collection, &notification.id, patch)
                .await?;
            changed += 1;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryDocumentStore;

    fn service() -> NotificationService {
        NotificationService::new(Arc::new(InMemoryDocumentStore::new()), &Config::default())
    }

    #[tokio::test]
    async fn test_notify_and_list_newest_first() {
        let notifications = service();
        let alice = Session::new("alice");

        notifications
            .notify("alice", "Welcome", "Glad to have you", NotificationKind::Info)
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        notifications
            .notify("alice", "Booking confirmed", "Kyoto, 6 days", NotificationKind::Success)
            .await
            .unwrap();
        notifications
            .notify("bob", "Welcome", "Hi Bob", NotificationKind::Info)
            .await
            .unwrap();

        let listed = notifications.list(&alice).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "Booking confirmed");
        assert_eq!(listed[0].kind, NotificationKind::Success);
        assert_eq!(notifications.unread_count(&alice).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_mark_read() {
        let notifications = service();
        let alice = Session::new("alice");
        let created = notifications
            .notify("alice", "Price drop", "Bali is 20% off", NotificationKind::Info)
            .await
            .unwrap();

        let updated = notifications.mark_read(&alice, &created.id).await.unwrap();
        assert!(updated.read);
        assert_eq!(notifications.unread_count(&alice).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cannot_mark_someone_elses_notification() {
        let notifications = service();
        let created = notifications
            .notify("bob", "Hi", "", NotificationKind::Info)
            .await
            .unwrap();

        let result = notifications
            .mark_read(&Session::new("alice"), &created.id)
            .await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let notifications = service();
        let alice = Session::new("alice");
        for title in ["One", "Two", "Three"] {
            notifications
                .notify("alice", title, "", NotificationKind::Warning)
                .await
                .unwrap();
        }

        assert_eq!(notifications.mark_all_read(&alice).await.unwrap(), 3);
        assert_eq!(notifications.mark_all_read(&alice).await.unwrap(), 0);
        assert_eq!(notifications.unread_count(&alice).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_title_is_rejected() {
        let result = service()
            .notify("alice", "  ", "body", NotificationKind::Error)
            .await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }
}
