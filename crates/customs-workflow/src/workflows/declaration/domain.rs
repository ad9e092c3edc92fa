use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier wrapper for declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Export (PEB) or import (PIB) declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    Peb,
    Pib,
}

impl DocumentKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Peb => "PEB",
            Self::Pib => "PIB",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Peb => "Export Declaration (PEB)",
            Self::Pib => "Import Declaration (PIB)",
        }
    }

    /// Release document issued by customs once the declaration is accepted.
    pub const fn release_status(self) -> DocumentStatus {
        match self {
            Self::Peb => DocumentStatus::NpeIssued,
            Self::Pib => DocumentStatus::SppbIssued,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Draft,
    Submitted,
    SentToPpjk,
    CeisaAccepted,
    CeisaRejected,
    NpeIssued,
    SppbIssued,
    Completed,
}

impl DocumentStatus {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::Draft,
            Self::Submitted,
            Self::SentToPpjk,
            Self::CeisaAccepted,
            Self::CeisaRejected,
            Self::NpeIssued,
            Self::SppbIssued,
            Self::Completed,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::SentToPpjk => "SENT_TO_PPJK",
            Self::CeisaAccepted => "CEISA_ACCEPTED",
            Self::CeisaRejected => "CEISA_REJECTED",
            Self::NpeIssued => "NPE_ISSUED",
            Self::SppbIssued => "SPPB_ISSUED",
            Self::Completed => "COMPLETED",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Submitted => "Submitted",
            Self::SentToPpjk => "Sent to PPJK",
            Self::CeisaAccepted => "Accepted by CEISA",
            Self::CeisaRejected => "Rejected by CEISA",
            Self::NpeIssued => "NPE Issued",
            Self::SppbIssued => "SPPB Issued",
            Self::Completed => "Completed",
        }
    }

    /// Accepted documents and everything after them are read-only.
    pub const fn is_locked(self) -> bool {
        matches!(
            self,
            Self::CeisaAccepted | Self::NpeIssued | Self::SppbIssued | Self::Completed
        )
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn from_code(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_uppercase();
        Self::ordered()
            .into_iter()
            .find(|status| status.code() == normalized)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Customs risk channel assigned by CEISA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Green,
    Yellow,
    Red,
}

impl Lane {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Green => "Green Lane",
            Self::Yellow => "Yellow Lane",
            Self::Red => "Red Lane",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclarationItem {
    pub hs_code: String,
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    pub value: f64,
}

/// Editable declaration content. Everything here is frozen once the document locks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclarationFields {
    pub trader_name: String,
    pub trader_npwp: String,
    #[serde(default)]
    pub ppjk_name: Option<String>,
    pub customs_office: String,
    pub port_of_loading: String,
    pub port_of_discharge: String,
    /// Destination country for PEB, origin country for PIB.
    pub counterpart_country: String,
    pub currency: String,
    #[serde(default)]
    pub lane: Option<Lane>,
    #[serde(default)]
    pub items: Vec<DeclarationItem>,
}

impl DeclarationFields {
    pub fn total_value(&self) -> f64 {
        self.items.iter().map(|item| item.value).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub id: DocumentId,
    pub kind: DocumentKind,
    pub document_number: Option<String>,
    pub status: DocumentStatus,
    pub version: u64,
    pub fields: DeclarationFields,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Declaration {
    pub fn is_locked(&self) -> bool {
        self.status.is_locked()
    }

    /// Number shown to users; drafts without a number fall back to the id.
    pub fn display_number(&self) -> String {
        match &self.document_number {
            Some(number) => number.clone(),
            None => format!("{}-DRAFT-{}", self.kind.code(), self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip_through_from_code() {
        for status in DocumentStatus::ordered() {
            assert_eq!(DocumentStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(
            DocumentStatus::from_code(" sent_to_ppjk "),
            Some(DocumentStatus::SentToPpjk)
        );
        assert_eq!(DocumentStatus::from_code("ARCHIVED"), None);
    }

    #[test]
    fn lock_class_starts_at_acceptance() {
        let locked: Vec<_> = DocumentStatus::ordered()
            .into_iter()
            .filter(|status| status.is_locked())
            .collect();
        assert_eq!(
            locked,
            vec![
                DocumentStatus::CeisaAccepted,
                DocumentStatus::NpeIssued,
                DocumentStatus::SppbIssued,
                DocumentStatus::Completed,
            ]
        );
        assert!(!DocumentStatus::CeisaRejected.is_locked());
    }

    #[test]
    fn status_serializes_in_screaming_snake_case() {
        let json = serde_json::to_string(&DocumentStatus::SentToPpjk).expect("serialize");
        assert_eq!(json, "\"SENT_TO_PPJK\"");
    }
}
