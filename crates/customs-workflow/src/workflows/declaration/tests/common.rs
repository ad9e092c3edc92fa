use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::workflows::declaration::audit::AuditLogEntry;
use crate::workflows::declaration::domain::{
    Declaration, DeclarationFields, DeclarationItem, DocumentId, DocumentKind,
};
use crate::workflows::declaration::history::StatusHistoryEntry;
use crate::workflows::declaration::memory::InMemoryStore;
use crate::workflows::declaration::notifications::{
    Notification, NotificationError, NotificationFeed, NotificationPublisher,
};
use crate::workflows::declaration::repository::{
    AuditFilter, AuditStore, DeclarationFilter, DeclarationStore, HistoryFilter, HistoryStore,
    RepositoryError,
};
use crate::workflows::declaration::service::DeclarationService;

pub(super) fn fields() -> DeclarationFields {
    DeclarationFields {
        trader_name: "PT Kopi Nusantara".to_string(),
        trader_npwp: "01.234.567.8-901.000".to_string(),
        ppjk_name: Some("PT Mitra Kepabeanan".to_string()),
        customs_office: "040300".to_string(),
        port_of_loading: "IDTPP".to_string(),
        port_of_discharge: "NLRTM".to_string(),
        counterpart_country: "NL".to_string(),
        currency: "USD".to_string(),
        lane: None,
        items: vec![DeclarationItem {
            hs_code: "0901.11".to_string(),
            description: "Arabica green coffee".to_string(),
            quantity: 19200.0,
            unit: "KGM".to_string(),
            value: 86400.0,
        }],
    }
}

pub(super) fn build_service() -> (
    DeclarationService<InMemoryStore, NotificationFeed>,
    Arc<InMemoryStore>,
    NotificationFeed,
) {
    let store = Arc::new(InMemoryStore::default());
    let feed = NotificationFeed::default();
    let service = DeclarationService::new(store.clone(), Arc::new(feed.clone()));
    (service, store, feed)
}

pub(super) fn draft(
    service: &DeclarationService<InMemoryStore, NotificationFeed>,
    kind: DocumentKind,
) -> Declaration {
    service
        .create_draft(kind, fields(), Some("maker".to_string()))
        .expect("draft created")
}

pub(super) fn history_of(store: &InMemoryStore, id: &DocumentId) -> Vec<StatusHistoryEntry> {
    store.list_by_document(id).expect("history listed")
}

pub(super) fn audit_of(store: &InMemoryStore, id: &DocumentId) -> Vec<AuditLogEntry> {
    AuditStore::list_all(
        store,
        &AuditFilter::for_entity("declaration", id.to_string()),
    )
    .expect("audit listed")
}

/// Declarations and audit work; every history write fails.
#[derive(Default)]
pub(super) struct HistoryOfflineStore {
    pub(super) inner: InMemoryStore,
}

impl HistoryStore for HistoryOfflineStore {
    fn append(&self, _entry: StatusHistoryEntry) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("history table offline".to_string()))
    }

    fn list_by_document(
        &self,
        id: &DocumentId,
    ) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        self.inner.list_by_document(id)
    }

    fn list_all(&self, filter: &HistoryFilter) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        HistoryStore::list_all(&self.inner, filter)
    }
}

impl AuditStore for HistoryOfflineStore {
    fn append(&self, entry: AuditLogEntry) -> Result<(), RepositoryError> {
        AuditStore::append(&self.inner, entry)
    }

    fn list_all(&self, filter: &AuditFilter) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        AuditStore::list_all(&self.inner, filter)
    }
}

impl DeclarationStore for HistoryOfflineStore {
    fn insert(&self, declaration: Declaration) -> Result<Declaration, RepositoryError> {
        self.inner.insert(declaration)
    }

    fn fetch(&self, id: &DocumentId) -> Result<Option<Declaration>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn update(
        &self,
        declaration: Declaration,
        expected_version: u64,
    ) -> Result<(), RepositoryError> {
        self.inner.update(declaration, expected_version)
    }

    fn list(&self, filter: &DeclarationFilter) -> Result<Vec<Declaration>, RepositoryError> {
        self.inner.list(filter)
    }

    fn remove(&self, id: &DocumentId) -> Result<(), RepositoryError> {
        self.inner.remove(id)
    }
}

/// Declarations and history work; every audit write fails.
#[derive(Default)]
pub(super) struct AuditOfflineStore {
    pub(super) inner: InMemoryStore,
}

impl HistoryStore for AuditOfflineStore {
    fn append(&self, entry: StatusHistoryEntry) -> Result<(), RepositoryError> {
        HistoryStore::append(&self.inner, entry)
    }

    fn list_by_document(
        &self,
        id: &DocumentId,
    ) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        self.inner.list_by_document(id)
    }

    fn list_all(&self, filter: &HistoryFilter) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        HistoryStore::list_all(&self.inner, filter)
    }
}

impl AuditStore for AuditOfflineStore {
    fn append(&self, _entry: AuditLogEntry) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("audit table offline".to_string()))
    }

    fn list_all(&self, filter: &AuditFilter) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        AuditStore::list_all(&self.inner, filter)
    }
}

impl DeclarationStore for AuditOfflineStore {
    fn insert(&self, declaration: Declaration) -> Result<Declaration, RepositoryError> {
        self.inner.insert(declaration)
    }

    fn fetch(&self, id: &DocumentId) -> Result<Option<Declaration>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn update(
        &self,
        declaration: Declaration,
        expected_version: u64,
    ) -> Result<(), RepositoryError> {
        self.inner.update(declaration, expected_version)
    }

    fn list(&self, filter: &DeclarationFilter) -> Result<Vec<Declaration>, RepositoryError> {
        self.inner.list(filter)
    }

    fn remove(&self, id: &DocumentId) -> Result<(), RepositoryError> {
        self.inner.remove(id)
    }
}

pub(super) struct UnavailableStore;

impl HistoryStore for UnavailableStore {
    fn append(&self, _entry: StatusHistoryEntry) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_by_document(
        &self,
        _id: &DocumentId,
    ) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_all(
        &self,
        _filter: &HistoryFilter,
    ) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl AuditStore for UnavailableStore {
    fn append(&self, _entry: AuditLogEntry) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_all(&self, _filter: &AuditFilter) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl DeclarationStore for UnavailableStore {
    fn insert(&self, _declaration: Declaration) -> Result<Declaration, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &DocumentId) -> Result<Option<Declaration>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(
        &self,
        _declaration: Declaration,
        _expected_version: u64,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _filter: &DeclarationFilter) -> Result<Vec<Declaration>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _id: &DocumentId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct DroppingPublisher;

impl NotificationPublisher for DroppingPublisher {
    fn publish(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("push channel closed".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
