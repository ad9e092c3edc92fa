use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::DocumentStatus;
use super::history::StatusHistoryEntry;

const SYSTEM_ACTOR: &str = "System";

/// Icon class used by the UI to render a timeline node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineCategory {
    Draft,
    Progress,
    Success,
    Danger,
    Final,
}

impl TimelineCategory {
    pub const fn for_status(status: DocumentStatus) -> Self {
        match status {
            DocumentStatus::Draft => Self::Draft,
            DocumentStatus::Submitted | DocumentStatus::SentToPpjk => Self::Progress,
            DocumentStatus::CeisaAccepted
            | DocumentStatus::NpeIssued
            | DocumentStatus::SppbIssued => Self::Success,
            DocumentStatus::CeisaRejected => Self::Danger,
            DocumentStatus::Completed => Self::Final,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry<'a> {
    pub status: DocumentStatus,
    pub label: &'static str,
    pub category: TimelineCategory,
    pub actor: &'a str,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<&'a str>,
}

/// Ordered, read-only view over a document's history.
#[derive(Debug, Clone)]
pub struct Timeline<'a> {
    ordered: Vec<&'a StatusHistoryEntry>,
}

impl<'a> Timeline<'a> {
    /// A fresh iterator; calling this again restarts from the oldest entry.
    pub fn iter(&self) -> impl Iterator<Item = TimelineEntry<'a>> + '_ {
        self.ordered.iter().copied().map(project_entry)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn latest(&self) -> Option<TimelineEntry<'a>> {
        self.ordered.last().copied().map(project_entry)
    }

    pub fn status_counts(&self) -> BTreeMap<DocumentStatus, usize> {
        let mut counts = BTreeMap::new();
        for entry in self.iter() {
            *counts.entry(entry.status).or_insert(0) += 1;
        }
        counts
    }
}

fn project_entry(entry: &StatusHistoryEntry) -> TimelineEntry<'_> {
    TimelineEntry {
        status: entry.to_status,
        label: entry.to_status.label(),
        category: TimelineCategory::for_status(entry.to_status),
        actor: entry.changed_by.as_deref().unwrap_or(SYSTEM_ACTOR),
        timestamp: entry.created_at,
        notes: entry.notes.as_deref(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TimelineProjector;

impl TimelineProjector {
    /// Order entries by `created_at`; the stable sort keeps storage order on ties.
    pub fn project<'a>(&self, entries: &'a [StatusHistoryEntry]) -> Timeline<'a> {
        let mut ordered: Vec<&StatusHistoryEntry> = entries.iter().collect();
        ordered.sort_by_key(|entry| entry.created_at);
        Timeline { ordered }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::declaration::domain::DocumentId;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn entry(
        document_id: DocumentId,
        from: Option<DocumentStatus>,
        to: DocumentStatus,
        minute: i64,
    ) -> StatusHistoryEntry {
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        StatusHistoryEntry {
            id: Uuid::new_v4(),
            document_id,
            from_status: from,
            to_status: to,
            changed_by: Some("ops".to_string()),
            notes: None,
            created_at: base + Duration::minutes(minute),
        }
    }

    #[test]
    fn entries_are_ordered_by_timestamp() {
        let id = DocumentId::new();
        let entries = vec![
            entry(id, Some(DocumentStatus::Draft), DocumentStatus::Submitted, 5),
            entry(id, None, DocumentStatus::Draft, 0),
        ];

        let timeline = TimelineProjector.project(&entries);
        let statuses: Vec<_> = timeline.iter().map(|item| item.status).collect();
        assert_eq!(
            statuses,
            vec![DocumentStatus::Draft, DocumentStatus::Submitted]
        );
    }

    #[test]
    fn identical_timestamps_keep_storage_order() {
        let id = DocumentId::new();
        let entries = vec![
            entry(id, None, DocumentStatus::Draft, 0),
            entry(id, Some(DocumentStatus::Draft), DocumentStatus::Submitted, 0),
            entry(id, Some(DocumentStatus::Submitted), DocumentStatus::Draft, 0),
        ];

        let timeline = TimelineProjector.project(&entries);
        let statuses: Vec<_> = timeline.iter().map(|item| item.status).collect();
        assert_eq!(
            statuses,
            vec![
                DocumentStatus::Draft,
                DocumentStatus::Submitted,
                DocumentStatus::Draft
            ]
        );
    }

    #[test]
    fn iteration_is_restartable() {
        let id = DocumentId::new();
        let entries = vec![
            entry(id, None, DocumentStatus::Draft, 0),
            entry(id, Some(DocumentStatus::Draft), DocumentStatus::Submitted, 1),
        ];
        let timeline = TimelineProjector.project(&entries);

        let mut first = timeline.iter();
        first.next();
        let second: Vec<_> = timeline.iter().collect();
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].status, DocumentStatus::Draft);
        assert_eq!(timeline.latest().map(|item| item.status), Some(DocumentStatus::Submitted));
    }

    #[test]
    fn system_actor_and_categories_are_projected() {
        let id = DocumentId::new();
        let mut rejected = entry(
            id,
            Some(DocumentStatus::SentToPpjk),
            DocumentStatus::CeisaRejected,
            3,
        );
        rejected.changed_by = None;
        rejected.notes = Some("HS code mismatch".to_string());
        let entries = vec![rejected];

        let projected: Vec<_> = TimelineProjector.project(&entries).iter().collect();
        assert_eq!(projected[0].actor, "System");
        assert_eq!(projected[0].category, TimelineCategory::Danger);
        assert_eq!(projected[0].label, "Rejected by CEISA");
        assert_eq!(projected[0].notes, Some("HS code mismatch"));
    }

    #[test]
    fn status_counts_match_raw_distribution() {
        let id = DocumentId::new();
        let entries = vec![
            entry(id, None, DocumentStatus::Draft, 0),
            entry(id, Some(DocumentStatus::Draft), DocumentStatus::Submitted, 1),
            entry(id, Some(DocumentStatus::Submitted), DocumentStatus::Draft, 2),
            entry(id, Some(DocumentStatus::Draft), DocumentStatus::Submitted, 3),
            entry(id, Some(DocumentStatus::Submitted), DocumentStatus::SentToPpjk, 4),
        ];

        let mut raw = BTreeMap::new();
        for item in &entries {
            *raw.entry(item.to_status).or_insert(0) += 1;
        }

        let timeline = TimelineProjector.project(&entries);
        assert_eq!(timeline.status_counts(), raw);
        assert_eq!(timeline.len(), entries.len());
    }

    #[test]
    fn empty_history_projects_to_empty_timeline() {
        let timeline = TimelineProjector.project(&[]);
        assert!(timeline.is_empty());
        assert!(timeline.latest().is_none());
        assert!(timeline.status_counts().is_empty());
    }
}
