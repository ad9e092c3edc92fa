use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::audit::{AuditAction, AuditLogEntry};
use super::domain::{Declaration, DocumentId, DocumentKind, DocumentStatus};
use super::history::StatusHistoryEntry;

/// Error enumeration for storage failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record changed concurrently (expected version {expected}, found {found})")]
    VersionMismatch { expected: u64, found: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Filter for cross-document history queries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryFilter {
    #[serde(default)]
    pub to_status: Option<DocumentStatus>,
    #[serde(default)]
    pub changed_by: Option<String>,
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
}

impl HistoryFilter {
    pub fn matches(&self, entry: &StatusHistoryEntry) -> bool {
        self.to_status.map_or(true, |status| entry.to_status == status)
            && self
                .changed_by
                .as_ref()
                .map_or(true, |actor| entry.changed_by.as_ref() == Some(actor))
            && self.since.map_or(true, |since| entry.created_at >= since)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditFilter {
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub action: Option<AuditAction>,
}

impl AuditFilter {
    pub fn for_entity(entity_type: &str, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type: Some(entity_type.to_string()),
            entity_id: Some(entity_id.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.entity_type
            .as_ref()
            .map_or(true, |value| &entry.entity_type == value)
            && self
                .entity_id
                .as_ref()
                .map_or(true, |value| &entry.entity_id == value)
            && self
                .actor
                .as_ref()
                .map_or(true, |value| entry.actor.as_ref() == Some(value))
            && self.action.map_or(true, |action| entry.action == action)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeclarationFilter {
    #[serde(default)]
    pub kind: Option<DocumentKind>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
}

impl DeclarationFilter {
    pub fn matches(&self, declaration: &Declaration) -> bool {
        self.kind.map_or(true, |kind| declaration.kind == kind)
            && self
                .status
                .map_or(true, |status| declaration.status == status)
    }
}

/// Append-only status history storage. Listings keep append order.
pub trait HistoryStore: Send + Sync {
    fn append(&self, entry: StatusHistoryEntry) -> Result<(), RepositoryError>;
    fn list_by_document(&self, id: &DocumentId)
        -> Result<Vec<StatusHistoryEntry>, RepositoryError>;
    fn list_all(&self, filter: &HistoryFilter) -> Result<Vec<StatusHistoryEntry>, RepositoryError>;
}

/// Append-only audit storage. Listings keep append order.
pub trait AuditStore: Send + Sync {
    fn append(&self, entry: AuditLogEntry) -> Result<(), RepositoryError>;
    fn list_all(&self, filter: &AuditFilter) -> Result<Vec<AuditLogEntry>, RepositoryError>;
}

/// Declaration persistence with an optimistic version guard.
pub trait DeclarationStore: Send + Sync {
    fn insert(&self, declaration: Declaration) -> Result<Declaration, RepositoryError>;
    fn fetch(&self, id: &DocumentId) -> Result<Option<Declaration>, RepositoryError>;
    /// Replace the stored declaration only if its version still equals `expected_version`.
    fn update(&self, declaration: Declaration, expected_version: u64)
        -> Result<(), RepositoryError>;
    fn list(&self, filter: &DeclarationFilter) -> Result<Vec<Declaration>, RepositoryError>;
    /// Delete a declaration that never got its initial history entry.
    fn remove(&self, id: &DocumentId) -> Result<(), RepositoryError>;
}
