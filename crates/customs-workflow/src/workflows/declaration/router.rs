use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use super::audit;
use super::domain::{Declaration, DeclarationFields, DocumentId, DocumentKind, DocumentStatus};
use super::export;
use super::notifications::{NotificationFeed, NotificationPublisher};
use super::repository::{
    AuditFilter, AuditStore, DeclarationFilter, DeclarationStore, HistoryFilter, HistoryStore,
};
use super::service::{DeclarationService, ServiceError, TransitionRequest};
use super::timeline::TimelineEntry;

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateDeclarationRequest {
    pub kind: DocumentKind,
    pub fields: DeclarationFields,
    #[serde(default)]
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateDeclarationRequest {
    pub fields: DeclarationFields,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActorQuery {
    #[serde(default)]
    pub actor: Option<String>,
}

/// Declaration plus the flags the UI needs for read-only banners and action buttons.
#[derive(Debug, Clone, Serialize)]
pub struct DeclarationView {
    #[serde(flatten)]
    pub declaration: Declaration,
    pub status_label: &'static str,
    pub locked: bool,
    pub allowed_transitions: Vec<DocumentStatus>,
}

/// Router builder exposing declaration workflow and audit endpoints.
pub fn declaration_router<S, N>(service: Arc<DeclarationService<S, N>>) -> Router
where
    S: DeclarationStore + HistoryStore + AuditStore + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/declarations",
            post(create_handler::<S, N>).get(list_handler::<S, N>),
        )
        .route(
            "/api/v1/declarations/:id",
            get(get_handler::<S, N>).put(update_handler::<S, N>),
        )
        .route(
            "/api/v1/declarations/:id/transitions",
            post(transition_handler::<S, N>),
        )
        .route(
            "/api/v1/declarations/:id/history",
            get(history_handler::<S, N>),
        )
        .route(
            "/api/v1/declarations/:id/timeline",
            get(timeline_handler::<S, N>),
        )
        .route(
            "/api/v1/declarations/:id/audit",
            get(audit_trail_handler::<S, N>),
        )
        .route(
            "/api/v1/declarations/:id/export.xml",
            get(export_xml_handler::<S, N>),
        )
        .route(
            "/api/v1/declarations/:id/export.zip",
            get(export_zip_handler::<S, N>),
        )
        .route("/api/v1/status-history", get(status_history_handler::<S, N>))
        .route("/api/v1/audit-logs", get(audit_log_handler::<S, N>))
        .route(
            "/api/v1/audit-logs/export.csv",
            get(audit_csv_handler::<S, N>),
        )
        .with_state(service)
}

fn view<S, N>(service: &DeclarationService<S, N>, declaration: Declaration) -> DeclarationView
where
    S: DeclarationStore + HistoryStore + AuditStore + 'static,
    N: NotificationPublisher + 'static,
{
    DeclarationView {
        status_label: declaration.status.label(),
        locked: declaration.is_locked(),
        allowed_transitions: service.allowed_transitions(&declaration),
        declaration,
    }
}

pub(crate) fn error_response(error: ServiceError) -> Response {
    let status = match &error {
        ServiceError::InvalidTransition(_) | ServiceError::DocumentLocked { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Conflict { .. } | ServiceError::ChainBroken(_) => StatusCode::CONFLICT,
        ServiceError::Persistence(_) | ServiceError::Export(_) | ServiceError::Snapshot(_) => {
            error!(error = %error, "declaration request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

pub(crate) async fn create_handler<S, N>(
    State(service): State<Arc<DeclarationService<S, N>>>,
    Json(request): Json<CreateDeclarationRequest>,
) -> Response
where
    S: DeclarationStore + HistoryStore + AuditStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.create_draft(request.kind, request.fields, request.actor) {
        Ok(declaration) => {
            (StatusCode::CREATED, Json(view(&*service, declaration))).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<S, N>(
    State(service): State<Arc<DeclarationService<S, N>>>,
    Query(filter): Query<DeclarationFilter>,
) -> Response
where
    S: DeclarationStore + HistoryStore + AuditStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.list(&filter) {
        Ok(declarations) => {
            let views: Vec<_> = declarations
                .into_iter()
                .map(|declaration| view(&*service, declaration))
                .collect();
            Json(views).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<S, N>(
    State(service): State<Arc<DeclarationService<S, N>>>,
    Path(id): Path<DocumentId>,
) -> Response
where
    S: DeclarationStore + HistoryStore + AuditStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.get(&id) {
        Ok(declaration) => Json(view(&*service, declaration)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<S, N>(
    State(service): State<Arc<DeclarationService<S, N>>>,
    Path(id): Path<DocumentId>,
    Json(request): Json<UpdateDeclarationRequest>,
) -> Response
where
    S: DeclarationStore + HistoryStore + AuditStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.update_fields(&id, request.fields, request.actor, request.expected_version) {
        Ok(declaration) => Json(view(&*service, declaration)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn transition_handler<S, N>(
    State(service): State<Arc<DeclarationService<S, N>>>,
    Path(id): Path<DocumentId>,
    Json(request): Json<TransitionRequest>,
) -> Response
where
    S: DeclarationStore + HistoryStore + AuditStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.transition(&id, request) {
        Ok(outcome) => {
            let payload = json!({
                "declaration": view(&*service, outcome.declaration),
                "entry": outcome.entry,
            });
            Json(payload).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn history_handler<S, N>(
    State(service): State<Arc<DeclarationService<S, N>>>,
    Path(id): Path<DocumentId>,
) -> Response
where
    S: DeclarationStore + HistoryStore + AuditStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.history(&id) {
        Ok(entries) => Json(entries).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn timeline_handler<S, N>(
    State(service): State<Arc<DeclarationService<S, N>>>,
    Path(id): Path<DocumentId>,
) -> Response
where
    S: DeclarationStore + HistoryStore + AuditStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.history(&id) {
        Ok(entries) => {
            let timeline = service.projector().project(&entries);
            let items: Vec<TimelineEntry<'_>> = timeline.iter().collect();
            Json(items).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn audit_trail_handler<S, N>(
    State(service): State<Arc<DeclarationService<S, N>>>,
    Path(id): Path<DocumentId>,
) -> Response
where
    S: DeclarationStore + HistoryStore + AuditStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.audit_trail(&id) {
        Ok(entries) => Json(entries).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn export_xml_handler<S, N>(
    State(service): State<Arc<DeclarationService<S, N>>>,
    Path(id): Path<DocumentId>,
    Query(query): Query<ActorQuery>,
) -> Response
where
    S: DeclarationStore + HistoryStore + AuditStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.export_xml(&id, query.actor) {
        Ok((_, xml)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, mime::TEXT_XML.as_ref())],
            xml,
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn export_zip_handler<S, N>(
    State(service): State<Arc<DeclarationService<S, N>>>,
    Path(id): Path<DocumentId>,
    Query(query): Query<ActorQuery>,
) -> Response
where
    S: DeclarationStore + HistoryStore + AuditStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.export_bundle(&id, query.actor) {
        Ok((declaration, bytes)) => {
            let disposition = format!(
                "attachment; filename=\"{}.zip\"",
                export::file_stem(&declaration.display_number())
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/zip".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(err) => error_response(err),
    }
}

/// Status changes across every declaration, e.g. all rejections by one officer.
pub(crate) async fn status_history_handler<S, N>(
    State(service): State<Arc<DeclarationService<S, N>>>,
    Query(filter): Query<HistoryFilter>,
) -> Response
where
    S: DeclarationStore + HistoryStore + AuditStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.status_history(&filter) {
        Ok(entries) => Json(entries).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn audit_log_handler<S, N>(
    State(service): State<Arc<DeclarationService<S, N>>>,
    Query(filter): Query<AuditFilter>,
) -> Response
where
    S: DeclarationStore + HistoryStore + AuditStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.audit_log(&filter) {
        Ok(entries) => Json(entries).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn audit_csv_handler<S, N>(
    State(service): State<Arc<DeclarationService<S, N>>>,
    Query(filter): Query<AuditFilter>,
) -> Response
where
    S: DeclarationStore + HistoryStore + AuditStore + 'static,
    N: NotificationPublisher + 'static,
{
    let entries = match service.audit_log(&filter) {
        Ok(entries) => entries,
        Err(err) => return error_response(err),
    };

    let mut buffer = Vec::new();
    match audit::write_csv(&entries, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, mime::TEXT_CSV.as_ref())],
            buffer,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "audit csv export failed");
            let payload = json!({ "error": format!("failed to export audit log: {err}") });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unread_only: bool,
}

/// Endpoints the UI polls for status-change notifications.
pub fn notification_router(feed: NotificationFeed) -> Router {
    Router::new()
        .route("/api/v1/notifications", get(list_notifications))
        .route("/api/v1/notifications/:id/read", post(mark_notification_read))
        .with_state(feed)
}

pub(crate) async fn list_notifications(
    State(feed): State<NotificationFeed>,
    Query(query): Query<NotificationQuery>,
) -> Response {
    let notifications = feed.since(query.since, query.unread_only);
    let payload = json!({
        "unread": feed.unread_count(),
        "notifications": notifications,
    });
    Json(payload).into_response()
}

pub(crate) async fn mark_notification_read(
    State(feed): State<NotificationFeed>,
    Path(id): Path<Uuid>,
) -> Response {
    if feed.mark_read(id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        let payload = json!({ "error": format!("notification {id} not found") });
        (StatusCode::NOT_FOUND, Json(payload)).into_response()
    }
}
