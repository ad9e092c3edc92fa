//! PEB/PIB declaration lifecycle: transition policy, append-only status history,
//! generic audit log, timeline projection, export, and the HTTP surface over them.

pub mod audit;
pub mod domain;
pub mod export;
pub mod history;
pub mod memory;
pub mod notifications;
pub mod repository;
pub mod router;
pub mod service;
pub mod timeline;
pub mod transition;

#[cfg(test)]
mod tests;

pub use audit::{compute_changes, AuditAction, AuditLogEntry, AuditRecorder, FieldChange};
pub use domain::{
    Declaration, DeclarationFields, DeclarationItem, DocumentId, DocumentKind, DocumentStatus,
    Lane,
};
pub use history::{verify_chain, HistoryRecorder, StatusHistoryEntry};
pub use memory::InMemoryStore;
pub use notifications::{Notification, NotificationError, NotificationFeed, NotificationPublisher};
pub use repository::{
    AuditFilter, AuditStore, DeclarationFilter, DeclarationStore, HistoryFilter, HistoryStore,
    RepositoryError,
};
pub use router::{declaration_router, notification_router};
pub use service::{DeclarationService, ServiceError, TransitionOutcome, TransitionRequest};
pub use timeline::{Timeline, TimelineCategory, TimelineEntry, TimelineProjector};
pub use transition::{InvalidTransition, Transition, TransitionPolicy};
