use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::repository::{AuditStore, RepositoryError};

/// Entity type used for declaration audit entries.
pub const DECLARATION_ENTITY: &str = "declaration";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    StatusChange,
    Export,
}

impl AuditAction {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::StatusChange => "status_change",
            Self::Export => "export",
        }
    }

    pub fn from_code(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "status_change" => Some(Self::StatusChange),
            "export" => Some(Self::Export),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub before: Value,
    pub after: Value,
}

/// Append-only, cross-entity audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub entity_type: String,
    pub entity_id: String,
    pub action: AuditAction,
    pub actor: Option<String>,
    pub before_data: Option<Value>,
    pub after_data: Option<Value>,
    pub changes: BTreeMap<String, FieldChange>,
    pub created_at: DateTime<Utc>,
}

/// Field-by-field comparison of two snapshots.
///
/// Only top-level keys of JSON objects are compared; nested values are compared by
/// equality as a whole. A missing snapshot behaves like an empty object, and a
/// non-object snapshot is compared under the `value` key.
pub fn compute_changes(
    before: Option<&Value>,
    after: Option<&Value>,
) -> BTreeMap<String, FieldChange> {
    let before = as_fields(before);
    let after = as_fields(after);

    let mut changes = BTreeMap::new();
    for key in before.keys().chain(after.keys()) {
        if changes.contains_key(*key) {
            continue;
        }

        let old = before.get(*key).cloned().cloned().unwrap_or(Value::Null);
        let new = after.get(*key).cloned().cloned().unwrap_or(Value::Null);
        if old != new {
            changes.insert(
                (*key).to_string(),
                FieldChange {
                    before: old,
                    after: new,
                },
            );
        }
    }

    changes
}

fn as_fields(snapshot: Option<&Value>) -> BTreeMap<&str, &Value> {
    match snapshot {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(Value::Object(map)) => map.iter().map(|(key, value)| (key.as_str(), value)).collect(),
        Some(other) => BTreeMap::from([("value", other)]),
    }
}

/// Writes generic audit entries for any entity type.
pub struct AuditRecorder<S> {
    store: Arc<S>,
}

impl<S> Clone for AuditRecorder<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> AuditRecorder<S>
where
    S: AuditStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn record_change(
        &self,
        entity_type: &str,
        entity_id: &str,
        action: AuditAction,
        actor: Option<String>,
        before: Option<Value>,
        after: Option<Value>,
    ) -> Result<AuditLogEntry, RepositoryError> {
        let changes = compute_changes(before.as_ref(), after.as_ref());
        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            action,
            actor,
            before_data: before,
            after_data: after,
            changes,
            created_at: Utc::now(),
        };

        self.store.append(entry.clone())?;
        Ok(entry)
    }
}

#[derive(Debug, Serialize)]
struct AuditCsvRow<'a> {
    #[serde(rename = "Timestamp")]
    created_at: String,
    #[serde(rename = "Entity Type")]
    entity_type: &'a str,
    #[serde(rename = "Entity ID")]
    entity_id: &'a str,
    #[serde(rename = "Action")]
    action: &'static str,
    #[serde(rename = "Actor")]
    actor: &'a str,
    #[serde(rename = "Changed Fields")]
    changed_fields: String,
}

/// Compliance export of audit entries, one row per entry.
pub fn write_csv<W: Write>(entries: &[AuditLogEntry], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for entry in entries {
        csv_writer.serialize(AuditCsvRow {
            created_at: entry.created_at.to_rfc3339(),
            entity_type: &entry.entity_type,
            entity_id: &entry.entity_id,
            action: entry.action.code(),
            actor: entry.actor.as_deref().unwrap_or("system"),
            changed_fields: entry
                .changes
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(";"),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::declaration::memory::InMemoryStore;
    use crate::workflows::declaration::repository::AuditFilter;
    use serde_json::json;

    #[test]
    fn changes_only_include_differing_fields() {
        let before = json!({ "currency": "USD", "lane": null, "items": [1, 2] });
        let after = json!({ "currency": "IDR", "lane": null, "items": [1, 2], "ppjk": "PT Abadi" });

        let changes = compute_changes(Some(&before), Some(&after));

        assert_eq!(
            changes.keys().collect::<Vec<_>>(),
            vec!["currency", "ppjk"]
        );
        assert_eq!(changes["currency"].before, json!("USD"));
        assert_eq!(changes["ppjk"].before, Value::Null);
        assert_eq!(changes["ppjk"].after, json!("PT Abadi"));
    }

    #[test]
    fn nested_values_compare_as_a_whole() {
        let before = json!({ "items": [{ "hs_code": "0901" }] });
        let after = json!({ "items": [{ "hs_code": "0902" }] });

        let changes = compute_changes(Some(&before), Some(&after));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["items"].after, json!([{ "hs_code": "0902" }]));
    }

    #[test]
    fn create_diff_lists_every_field() {
        let after = json!({ "name": "PT Abadi", "license": "PPJK-01" });
        let changes = compute_changes(None, Some(&after));
        assert_eq!(changes.len(), 2);
        assert!(changes.values().all(|change| change.before.is_null()));
    }

    #[test]
    fn scalar_snapshots_are_compared_under_value_key() {
        let changes = compute_changes(Some(&json!(1)), Some(&json!(2)));
        assert_eq!(changes["value"].before, json!(1));
    }

    #[test]
    fn recorder_appends_entries_for_any_entity_type() {
        let store = Arc::new(InMemoryStore::default());
        let recorder = AuditRecorder::new(store.clone());

        let entry = recorder
            .record_change(
                "master_data.ppjk",
                "ppjk-7",
                AuditAction::Update,
                Some("admin".into()),
                Some(json!({ "name": "PT Lama" })),
                Some(json!({ "name": "PT Baru" })),
            )
            .expect("audit entry stored");

        assert_eq!(entry.changes.len(), 1);
        let stored = store
            .list_all(&AuditFilter {
                entity_type: Some("master_data.ppjk".into()),
                ..AuditFilter::default()
            })
            .expect("list");
        assert_eq!(stored, vec![entry]);
    }

    #[test]
    fn csv_export_writes_header_and_rows() {
        let entry = AuditLogEntry {
            id: Uuid::nil(),
            entity_type: DECLARATION_ENTITY.to_string(),
            entity_id: "doc-1".to_string(),
            action: AuditAction::StatusChange,
            actor: None,
            before_data: Some(json!({ "status": "DRAFT" })),
            after_data: Some(json!({ "status": "SUBMITTED" })),
            changes: compute_changes(
                Some(&json!({ "status": "DRAFT", "version": 1 })),
                Some(&json!({ "status": "SUBMITTED", "version": 2 })),
            ),
            created_at: DateTime::parse_from_rfc3339("2025-01-02T03:04:05Z")
                .expect("timestamp")
                .with_timezone(&Utc),
        };

        let mut buffer = Vec::new();
        write_csv(&[entry], &mut buffer).expect("csv written");
        let text = String::from_utf8(buffer).expect("utf8");
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("Timestamp,Entity Type,Entity ID,Action,Actor,Changed Fields")
        );
        assert_eq!(
            lines.next(),
            Some("2025-01-02T03:04:05+00:00,declaration,doc-1,status_change,system,status;version")
        );
    }
}
