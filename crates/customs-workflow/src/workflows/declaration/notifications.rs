use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::domain::{Declaration, DocumentId, DocumentStatus};

/// Status-change notice shown in the UI bell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub document_id: DocumentId,
    pub title: String,
    pub message: String,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    pub fn status_changed(declaration: &Declaration, notes: Option<&str>) -> Self {
        let title = format!(
            "{} {} is now {}",
            declaration.kind.code(),
            declaration.display_number(),
            declaration.status.label()
        );
        let message = match notes {
            Some(notes) => notes.to_string(),
            None => format!("Status changed to {}", declaration.status.code()),
        };

        Self {
            id: Uuid::new_v4(),
            document_id: declaration.id,
            title,
            message,
            status: declaration.status,
            created_at: declaration.updated_at,
            read: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Outbound hook for status-change notices.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// Newest notifications kept by a default feed.
pub const DEFAULT_RETENTION: usize = 500;

/// Merged notification list fed by both pushes and polls; ids are never duplicated.
/// Only the newest `retention` entries are kept.
#[derive(Debug, Clone)]
pub struct NotificationFeed {
    inner: Arc<Mutex<FeedState>>,
}

#[derive(Debug)]
struct FeedState {
    retention: usize,
    seen: HashSet<Uuid>,
    entries: Vec<Notification>,
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }
}

impl NotificationFeed {
    pub fn with_retention(retention: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FeedState {
                retention: retention.max(1),
                seen: HashSet::new(),
                entries: Vec::new(),
            })),
        }
    }

    /// Merge a batch, returning how many entries were new.
    pub fn merge<I>(&self, batch: I) -> usize
    where
        I: IntoIterator<Item = Notification>,
    {
        let mut state = self.inner.lock().expect("feed mutex poisoned");
        let mut added = 0;
        for notification in batch {
            if state.seen.insert(notification.id) {
                state.entries.push(notification);
                added += 1;
            }
        }
        if added > 0 {
            state.entries.sort_by_key(|entry| entry.created_at);
            let overflow = state.entries.len().saturating_sub(state.retention);
            if overflow > 0 {
                let evicted: Vec<Uuid> = state
                    .entries
                    .drain(..overflow)
                    .map(|entry| entry.id)
                    .collect();
                for id in evicted {
                    state.seen.remove(&id);
                }
            }
        }
        added
    }

    pub fn all(&self) -> Vec<Notification> {
        self.inner
            .lock()
            .expect("feed mutex poisoned")
            .entries
            .clone()
    }

    /// Entries strictly newer than `since`, oldest first.
    pub fn since(&self, since: Option<DateTime<Utc>>, unread_only: bool) -> Vec<Notification> {
        let state = self.inner.lock().expect("feed mutex poisoned");
        state
            .entries
            .iter()
            .filter(|entry| since.map_or(true, |since| entry.created_at > since))
            .filter(|entry| !unread_only || !entry.read)
            .cloned()
            .collect()
    }

    pub fn unread_count(&self) -> usize {
        let state = self.inner.lock().expect("feed mutex poisoned");
        state.entries.iter().filter(|entry| !entry.read).count()
    }

    /// Returns false when the id is unknown.
    pub fn mark_read(&self, id: Uuid) -> bool {
        let mut state = self.inner.lock().expect("feed mutex poisoned");
        match state.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.read = true;
                true
            }
            None => false,
        }
    }
}

impl NotificationPublisher for NotificationFeed {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        self.merge(std::iter::once(notification));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn notification(minute: i64) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            document_id: DocumentId::new(),
            title: "PEB 001 is now Submitted".to_string(),
            message: "Status changed to SUBMITTED".to_string(),
            status: DocumentStatus::Submitted,
            created_at: Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap()
                + Duration::minutes(minute),
            read: false,
        }
    }

    #[test]
    fn pushed_and_polled_copies_are_merged_once() {
        let feed = NotificationFeed::default();
        let pushed = notification(1);
        feed.publish(pushed.clone()).expect("publish");

        let added = feed.merge(vec![pushed.clone(), notification(2)]);
        assert_eq!(added, 1);
        assert_eq!(feed.all().len(), 2);
        assert_eq!(feed.all()[0].id, pushed.id);
    }

    #[test]
    fn oldest_entries_are_evicted_past_retention() {
        let feed = NotificationFeed::with_retention(2);
        let oldest = notification(0);
        feed.merge(vec![oldest.clone(), notification(5)]);
        feed.publish(notification(10)).expect("publish");

        let kept = feed.all();
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|entry| entry.id != oldest.id));
        assert_eq!(kept[1].created_at, notification(10).created_at);
    }

    #[test]
    fn since_and_unread_filters_apply() {
        let feed = NotificationFeed::default();
        let first = notification(0);
        let second = notification(10);
        feed.merge(vec![second.clone(), first.clone()]);

        assert_eq!(feed.since(Some(first.created_at), false), vec![second.clone()]);
        assert!(feed.mark_read(second.id));
        assert!(!feed.mark_read(Uuid::new_v4()));
        assert_eq!(feed.unread_count(), 1);
        assert_eq!(feed.since(None, true), vec![first]);
    }
}
