use super::domain::{DocumentKind, DocumentStatus};
use serde::Serialize;

use DocumentStatus::*;

/// Rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} documents cannot move from {from} to {to}")]
pub struct InvalidTransition {
    pub kind: DocumentKind,
    pub from: DocumentStatus,
    pub to: DocumentStatus,
}

/// Validated edge of the lifecycle graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub kind: DocumentKind,
    pub from: DocumentStatus,
    pub to: DocumentStatus,
}

impl Transition {
    /// Whether this edge leaves the editable part of the lifecycle.
    pub fn locks_document(&self) -> bool {
        !self.from.is_locked() && self.to.is_locked()
    }
}

const PEB_EDGES: &[(DocumentStatus, DocumentStatus)] = &[
    (Draft, Submitted),
    (Submitted, SentToPpjk),
    (Submitted, Draft),
    (SentToPpjk, CeisaAccepted),
    (SentToPpjk, CeisaRejected),
    (CeisaRejected, Draft),
    (CeisaAccepted, NpeIssued),
    (NpeIssued, Completed),
];

const PIB_EDGES: &[(DocumentStatus, DocumentStatus)] = &[
    (Draft, Submitted),
    (Submitted, SentToPpjk),
    (Submitted, Draft),
    (SentToPpjk, CeisaAccepted),
    (SentToPpjk, CeisaRejected),
    (CeisaRejected, Draft),
    (CeisaAccepted, SppbIssued),
    (SppbIssued, Completed),
];

/// Fixed legal-transition table per document kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionPolicy;

impl TransitionPolicy {
    fn edges(kind: DocumentKind) -> &'static [(DocumentStatus, DocumentStatus)] {
        match kind {
            DocumentKind::Peb => PEB_EDGES,
            DocumentKind::Pib => PIB_EDGES,
        }
    }

    pub fn validate(
        &self,
        kind: DocumentKind,
        from: DocumentStatus,
        to: DocumentStatus,
    ) -> Result<Transition, InvalidTransition> {
        let allowed = from != to
            && Self::edges(kind)
                .iter()
                .any(|&(edge_from, edge_to)| edge_from == from && edge_to == to);

        if allowed {
            Ok(Transition { kind, from, to })
        } else {
            Err(InvalidTransition { kind, from, to })
        }
    }

    /// Legal next statuses, in table order.
    pub fn allowed_targets(&self, kind: DocumentKind, from: DocumentStatus) -> Vec<DocumentStatus> {
        Self::edges(kind)
            .iter()
            .filter(|(edge_from, _)| *edge_from == from)
            .map(|(_, edge_to)| *edge_to)
            .collect()
    }

    /// Whether `statuses` is a walk over the graph starting at DRAFT.
    pub fn is_walk(&self, kind: DocumentKind, statuses: &[DocumentStatus]) -> bool {
        match statuses.first() {
            None => true,
            Some(first) if *first != Draft => false,
            Some(_) => statuses
                .windows(2)
                .all(|pair| self.validate(kind, pair[0], pair[1]).is_ok()),
        }
    }
}
