use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::audit::{AuditAction, AuditLogEntry, AuditRecorder, DECLARATION_ENTITY};
use super::domain::{Declaration, DeclarationFields, DocumentId, DocumentKind, DocumentStatus};
use super::export::{self, ExportError};
use super::history::{verify_chain, ChainGap, HistoryError, HistoryRecorder, StatusHistoryEntry};
use super::notifications::{Notification, NotificationPublisher};
use super::repository::{
    AuditFilter, AuditStore, DeclarationFilter, DeclarationStore, HistoryFilter, HistoryStore,
    RepositoryError,
};
use super::timeline::TimelineProjector;
use super::transition::{InvalidTransition, TransitionPolicy};

/// Requested status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub target: DocumentStatus,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Registration number to assign; only honoured while the document is editable.
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

impl TransitionRequest {
    pub fn to(target: DocumentStatus) -> Self {
        Self {
            target,
            actor: None,
            notes: None,
            document_number: None,
            expected_version: None,
        }
    }

    pub fn by(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub declaration: Declaration,
    pub entry: StatusHistoryEntry,
}

/// Service composing the transition policy, recorders, and storage.
pub struct DeclarationService<S, N> {
    policy: TransitionPolicy,
    projector: TimelineProjector,
    store: Arc<S>,
    history: HistoryRecorder<S>,
    audit: AuditRecorder<S>,
    notifications: Arc<N>,
}

impl<S, N> DeclarationService<S, N>
where
    S: DeclarationStore + HistoryStore + AuditStore + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(store: Arc<S>, notifications: Arc<N>) -> Self {
        Self {
            policy: TransitionPolicy,
            projector: TimelineProjector,
            history: HistoryRecorder::new(store.clone()),
            audit: AuditRecorder::new(store.clone()),
            store,
            notifications,
        }
    }

    pub fn policy(&self) -> &TransitionPolicy {
        &self.policy
    }

    pub fn projector(&self) -> &TimelineProjector {
        &self.projector
    }

    /// Create a DRAFT declaration with its initial history and audit entries.
    pub fn create_draft(
        &self,
        kind: DocumentKind,
        fields: DeclarationFields,
        actor: Option<String>,
    ) -> Result<Declaration, ServiceError> {
        let now = Utc::now();
        let declaration = Declaration {
            id: DocumentId::new(),
            kind,
            document_number: None,
            status: DocumentStatus::Draft,
            version: 1,
            fields,
            created_by: actor.clone(),
            created_at: now,
            updated_at: now,
        };

        let after = snapshot(&declaration)?;
        let stored = self.store.insert(declaration)?;
        if let Err(err) = self
            .history
            .record(stored.id, None, DocumentStatus::Draft, actor.clone(), None)
        {
            self.discard(&stored.id);
            return Err(err.into());
        }
        self.audit_committed(&stored.id, AuditAction::Create, actor, None, Some(after));

        info!(document_id = %stored.id, kind = %kind, "declaration draft created");
        Ok(stored)
    }

    /// Edit the declaration content; locked documents are read-only.
    pub fn update_fields(
        &self,
        id: &DocumentId,
        fields: DeclarationFields,
        actor: Option<String>,
        expected_version: Option<u64>,
    ) -> Result<Declaration, ServiceError> {
        let current = self.get(id)?;
        if current.is_locked() {
            return Err(ServiceError::DocumentLocked {
                id: current.id,
                status: current.status,
            });
        }
        check_version(&current, expected_version)?;

        let mut updated = current.clone();
        updated.fields = fields;
        updated.version += 1;
        updated.updated_at = Utc::now();
        let (before, after) = (snapshot(&current)?, snapshot(&updated)?);
        self.store.update(updated.clone(), current.version)?;

        self.audit_committed(&updated.id, AuditAction::Update, actor, Some(before), Some(after));

        Ok(updated)
    }

    /// Validate and apply a status change. Rejected requests leave no trace.
    pub fn transition(
        &self,
        id: &DocumentId,
        request: TransitionRequest,
    ) -> Result<TransitionOutcome, ServiceError> {
        let current = self.get(id)?;
        check_version(&current, request.expected_version)?;
        let transition = self
            .policy
            .validate(current.kind, current.status, request.target)?;

        let now = Utc::now();
        let mut updated = current.clone();
        updated.status = transition.to;
        updated.version += 1;
        updated.updated_at = now;
        if !current.is_locked() {
            if let Some(number) = request
                .document_number
                .as_deref()
                .map(str::trim)
                .filter(|number| !number.is_empty())
            {
                updated.document_number = Some(number.to_string());
            }
        }
        if transition.to == DocumentStatus::Submitted && updated.document_number.is_none() {
            updated.document_number = Some(generate_document_number(current.kind));
        }

        let (before, after) = (snapshot(&current)?, snapshot(&updated)?);
        self.store.update(updated.clone(), current.version)?;

        let entry = match self.history.record(
            updated.id,
            Some(transition.from),
            transition.to,
            request.actor.clone(),
            request.notes.clone(),
        ) {
            Ok(entry) => entry,
            Err(err) => {
                self.revert(&current, updated.version);
                return Err(err.into());
            }
        };

        self.audit_committed(
            &updated.id,
            AuditAction::StatusChange,
            request.actor.clone(),
            Some(before),
            Some(after),
        );

        info!(
            document_id = %updated.id,
            from = %transition.from,
            to = %transition.to,
            locked = updated.is_locked(),
            "declaration status changed"
        );
        if transition.locks_document() {
            info!(document_id = %updated.id, "declaration is now read-only");
        }

        let notification = Notification::status_changed(&updated, entry.notes.as_deref());
        if let Err(err) = self.notifications.publish(notification) {
            warn!(document_id = %updated.id, error = %err, "status notification not delivered");
        }

        Ok(TransitionOutcome {
            declaration: updated,
            entry,
        })
    }

    fn revert(&self, previous: &Declaration, current_version: u64) {
        if let Err(err) = self.store.update(previous.clone(), current_version) {
            error!(
                document_id = %previous.id,
                error = %err,
                "failed to revert declaration after history write failure"
            );
        }
    }

    fn discard(&self, id: &DocumentId) {
        if let Err(err) = self.store.remove(id) {
            error!(
                document_id = %id,
                error = %err,
                "failed to discard declaration after history write failure"
            );
        }
    }

    /// Audit write for a change that is already committed. A failure is logged
    /// and the committed outcome still stands.
    fn audit_committed(
        &self,
        id: &DocumentId,
        action: AuditAction,
        actor: Option<String>,
        before: Option<Value>,
        after: Option<Value>,
    ) {
        if let Err(err) = self.audit.record_change(
            DECLARATION_ENTITY,
            &id.to_string(),
            action,
            actor,
            before,
            after,
        ) {
            error!(
                document_id = %id,
                action = ?action,
                error = %err,
                "audit entry missing for committed declaration change"
            );
        }
    }

    pub fn get(&self, id: &DocumentId) -> Result<Declaration, ServiceError> {
        self.store.fetch(id)?.ok_or(ServiceError::NotFound(*id))
    }

    pub fn list(&self, filter: &DeclarationFilter) -> Result<Vec<Declaration>, ServiceError> {
        Ok(self.store.list(filter)?)
    }

    pub fn allowed_transitions(&self, declaration: &Declaration) -> Vec<DocumentStatus> {
        self.policy
            .allowed_targets(declaration.kind, declaration.status)
    }

    /// Status history in storage order.
    pub fn history(&self, id: &DocumentId) -> Result<Vec<StatusHistoryEntry>, ServiceError> {
        self.get(id)?;
        Ok(self.store.list_by_document(id)?)
    }

    /// Status changes across all declarations, in append order.
    pub fn status_history(
        &self,
        filter: &HistoryFilter,
    ) -> Result<Vec<StatusHistoryEntry>, ServiceError> {
        Ok(HistoryStore::list_all(self.store.as_ref(), filter)?)
    }

    pub fn audit_trail(&self, id: &DocumentId) -> Result<Vec<AuditLogEntry>, ServiceError> {
        self.get(id)?;
        self.audit_log(&AuditFilter::for_entity(DECLARATION_ENTITY, id.to_string()))
    }

    pub fn audit_log(&self, filter: &AuditFilter) -> Result<Vec<AuditLogEntry>, ServiceError> {
        Ok(AuditStore::list_all(self.store.as_ref(), filter)?)
    }

    /// Record an audit entry for an arbitrary entity (master data, users, ...).
    pub fn record_audit(
        &self,
        entity_type: &str,
        entity_id: &str,
        action: AuditAction,
        actor: Option<String>,
        before: Option<Value>,
        after: Option<Value>,
    ) -> Result<AuditLogEntry, ServiceError> {
        Ok(self
            .audit
            .record_change(entity_type, entity_id, action, actor, before, after)?)
    }

    pub fn export_xml(
        &self,
        id: &DocumentId,
        actor: Option<String>,
    ) -> Result<(Declaration, String), ServiceError> {
        let declaration = self.get(id)?;
        let xml = export::render_xml(&declaration);
        self.record_export(&declaration, actor, "xml")?;
        Ok((declaration, xml))
    }

    /// Build the ZIP compliance bundle. The history must be an unbroken legal walk
    /// ending at the current status. The export itself is audited after the
    /// bundle is built, so the bundled trail ends with the entries before it.
    pub fn export_bundle(
        &self,
        id: &DocumentId,
        actor: Option<String>,
    ) -> Result<(Declaration, Vec<u8>), ServiceError> {
        let declaration = self.get(id)?;
        let history = self.store.list_by_document(id)?;
        verify_chain(&history)?;
        let statuses: Vec<DocumentStatus> = history.iter().map(|entry| entry.to_status).collect();
        if !self.policy.is_walk(declaration.kind, &statuses)
            || statuses.last() != Some(&declaration.status)
        {
            return Err(ServiceError::ChainBroken(format!(
                "history of {} does not lead to its current status {}",
                declaration.id, declaration.status
            )));
        }
        let trail = self.audit_trail(id)?;
        let bytes = export::build_bundle(&declaration, &history, &trail, actor.as_deref())?;
        self.record_export(&declaration, actor, "zip")?;
        Ok((declaration, bytes))
    }

    fn record_export(
        &self,
        declaration: &Declaration,
        actor: Option<String>,
        format: &str,
    ) -> Result<(), ServiceError> {
        let details = serde_json::json!({ "format": format, "version": declaration.version });
        self.audit.record_change(
            DECLARATION_ENTITY,
            &declaration.id.to_string(),
            AuditAction::Export,
            actor,
            None,
            Some(details),
        )?;
        Ok(())
    }
}

fn check_version(current: &Declaration, expected: Option<u64>) -> Result<(), ServiceError> {
    match expected {
        Some(expected) if expected != current.version => Err(ServiceError::Conflict {
            expected,
            found: current.version,
        }),
        _ => Ok(()),
    }
}

fn snapshot(declaration: &Declaration) -> Result<Value, ServiceError> {
    Ok(serde_json::to_value(declaration)?)
}

fn generate_document_number(kind: DocumentKind) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        kind.code(),
        Utc::now().format("%Y%m%d"),
        suffix[..6].to_ascii_uppercase()
    )
}

/// Error raised by the declaration service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("declaration {id} is locked in status {status}")]
    DocumentLocked { id: DocumentId, status: DocumentStatus },
    #[error("declaration {0} not found")]
    NotFound(DocumentId),
    #[error("declaration changed concurrently (expected version {expected}, found {found})")]
    Conflict { expected: u64, found: u64 },
    #[error("status history is inconsistent: {0}")]
    ChainBroken(String),
    #[error("failed to persist changes: {0}")]
    Persistence(RepositoryError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("failed to snapshot declaration: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::VersionMismatch { expected, found } => {
                Self::Conflict { expected, found }
            }
            other => Self::Persistence(other),
        }
    }
}

impl From<ChainGap> for ServiceError {
    fn from(gap: ChainGap) -> Self {
        Self::ChainBroken(gap.to_string())
    }
}

impl From<HistoryError> for ServiceError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::ChainBroken { .. } => Self::ChainBroken(err.to_string()),
            HistoryError::Repository(inner) => inner.into(),
        }
    }
}
