use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::domain::{DocumentId, DocumentStatus};
use super::repository::{HistoryStore, RepositoryError};

/// Immutable record of one status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: Uuid,
    pub document_id: DocumentId,
    pub from_status: Option<DocumentStatus>,
    pub to_status: DocumentStatus,
    /// `None` means the change was made by the system.
    pub changed_by: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error(
        "history for {document_id} ends at {last:?} but the new entry starts from {from:?}"
    )]
    ChainBroken {
        document_id: DocumentId,
        last: Option<DocumentStatus>,
        from: Option<DocumentStatus>,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Where `verify_chain` found a discontinuity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("history entry {index} starts from {found:?} but the previous entry ended at {expected:?}")]
pub struct ChainGap {
    pub index: usize,
    pub expected: Option<DocumentStatus>,
    pub found: Option<DocumentStatus>,
}

/// Append-only writer for status history.
pub struct HistoryRecorder<S> {
    store: Arc<S>,
}

impl<S> Clone for HistoryRecorder<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> HistoryRecorder<S>
where
    S: HistoryStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn record(
        &self,
        document_id: DocumentId,
        from_status: Option<DocumentStatus>,
        to_status: DocumentStatus,
        changed_by: Option<String>,
        notes: Option<String>,
    ) -> Result<StatusHistoryEntry, HistoryError> {
        let existing = self.store.list_by_document(&document_id)?;
        let last = existing.last().map(|entry| entry.to_status);
        if last != from_status {
            return Err(HistoryError::ChainBroken {
                document_id,
                last,
                from: from_status,
            });
        }

        // created_at stays monotonic per document even if the clock steps back.
        let now = Utc::now();
        let created_at = existing
            .last()
            .map_or(now, |previous| previous.created_at.max(now));

        let entry = StatusHistoryEntry {
            id: Uuid::new_v4(),
            document_id,
            from_status,
            to_status,
            changed_by: normalize(changed_by),
            notes: normalize(notes),
            created_at,
        };

        self.store.append(entry.clone())?;
        Ok(entry)
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

/// Check that every entry continues from the previous entry's `to_status`.
pub fn verify_chain(entries: &[StatusHistoryEntry]) -> Result<(), ChainGap> {
    let mut expected = None;
    for (index, entry) in entries.iter().enumerate() {
        if entry.from_status != expected {
            return Err(ChainGap {
                index,
                expected,
                found: entry.from_status,
            });
        }
        expected = Some(entry.to_status);
    }
    Ok(())
}
