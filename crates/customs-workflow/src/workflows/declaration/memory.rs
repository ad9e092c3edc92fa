use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::audit::AuditLogEntry;
use super::domain::{Declaration, DocumentId};
use super::history::StatusHistoryEntry;
use super::repository::{
    AuditFilter, AuditStore, DeclarationFilter, DeclarationStore, HistoryFilter, HistoryStore,
    RepositoryError,
};

/// Process-local store backing the server and tests.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    declarations: Arc<Mutex<HashMap<DocumentId, Declaration>>>,
    history: Arc<Mutex<Vec<StatusHistoryEntry>>>,
    audit: Arc<Mutex<Vec<AuditLogEntry>>>,
}

impl HistoryStore for InMemoryStore {
    fn append(&self, entry: StatusHistoryEntry) -> Result<(), RepositoryError> {
        let mut guard = self.history.lock().expect("history mutex poisoned");
        if guard.iter().any(|existing| existing.id == entry.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(entry);
        Ok(())
    }

    fn list_by_document(
        &self,
        id: &DocumentId,
    ) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        let guard = self.history.lock().expect("history mutex poisoned");
        Ok(guard
            .iter()
            .filter(|entry| &entry.document_id == id)
            .cloned()
            .collect())
    }

    fn list_all(&self, filter: &HistoryFilter) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        let guard = self.history.lock().expect("history mutex poisoned");
        Ok(guard
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect())
    }
}

impl AuditStore for InMemoryStore {
    fn append(&self, entry: AuditLogEntry) -> Result<(), RepositoryError> {
        let mut guard = self.audit.lock().expect("audit mutex poisoned");
        if guard.iter().any(|existing| existing.id == entry.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(entry);
        Ok(())
    }

    fn list_all(&self, filter: &AuditFilter) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        let guard = self.audit.lock().expect("audit mutex poisoned");
        Ok(guard
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect())
    }
}

impl DeclarationStore for InMemoryStore {
    fn insert(&self, declaration: Declaration) -> Result<Declaration, RepositoryError> {
        let mut guard = self.declarations.lock().expect("declaration mutex poisoned");
        if guard.contains_key(&declaration.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(declaration.id, declaration.clone());
        Ok(declaration)
    }

    fn fetch(&self, id: &DocumentId) -> Result<Option<Declaration>, RepositoryError> {
        let guard = self.declarations.lock().expect("declaration mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(
        &self,
        declaration: Declaration,
        expected_version: u64,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.declarations.lock().expect("declaration mutex poisoned");
        let current = guard
            .get_mut(&declaration.id)
            .ok_or(RepositoryError::NotFound)?;
        if current.version != expected_version {
            return Err(RepositoryError::VersionMismatch {
                expected: expected_version,
                found: current.version,
            });
        }
        *current = declaration;
        Ok(())
    }

    fn list(&self, filter: &DeclarationFilter) -> Result<Vec<Declaration>, RepositoryError> {
        let guard = self.declarations.lock().expect("declaration mutex poisoned");
        let mut declarations: Vec<_> = guard
            .values()
            .filter(|declaration| filter.matches(declaration))
            .cloned()
            .collect();
        declarations.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(declarations)
    }

    fn remove(&self, id: &DocumentId) -> Result<(), RepositoryError> {
        let mut guard = self.declarations.lock().expect("declaration mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}
