use std::io::{Cursor, Write};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::super::audit::{self, AuditLogEntry};
use super::super::domain::{Declaration, DocumentId, DocumentKind, DocumentStatus};
use super::super::history::StatusHistoryEntry;
use super::xml::render_xml;
use super::{file_stem, ExportError};

pub const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Clone, Serialize)]
pub struct BundleFile {
    pub name: String,
    pub sha256: String,
    pub size: usize,
}

/// Integrity manifest written last into every bundle.
#[derive(Debug, Clone, Serialize)]
pub struct BundleMetadata {
    pub document_id: DocumentId,
    pub document_number: String,
    pub kind: DocumentKind,
    pub status: DocumentStatus,
    pub version: u64,
    pub exported_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exported_by: Option<String>,
    pub files: Vec<BundleFile>,
}

/// ZIP archive bundling XML, JSON snapshot, history, audit trail, and a hash manifest.
pub fn build_bundle(
    declaration: &Declaration,
    history: &[StatusHistoryEntry],
    audit_trail: &[AuditLogEntry],
    exported_by: Option<&str>,
) -> Result<Vec<u8>, ExportError> {
    let document_number = declaration.display_number();

    let mut audit_csv = Vec::new();
    audit::write_csv(audit_trail, &mut audit_csv)?;

    let contents: Vec<(String, Vec<u8>)> = vec![
        (
            format!("{}.xml", file_stem(&document_number)),
            render_xml(declaration).into_bytes(),
        ),
        (
            "declaration.json".to_string(),
            serde_json::to_vec_pretty(declaration)?,
        ),
        ("history.json".to_string(), serde_json::to_vec_pretty(history)?),
        ("audit_trail.csv".to_string(), audit_csv),
    ];

    let files = contents
        .iter()
        .map(|(name, bytes)| BundleFile {
            name: name.clone(),
            sha256: sha256_hex(bytes),
            size: bytes.len(),
        })
        .collect();

    let metadata = BundleMetadata {
        document_id: declaration.id,
        document_number,
        kind: declaration.kind,
        status: declaration.status,
        version: declaration.version,
        exported_at: Utc::now(),
        exported_by: exported_by.map(str::to_string),
        files,
    };

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, bytes) in &contents {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(bytes)?;
    }
    zip.start_file(METADATA_FILE, options)?;
    zip.write_all(&serde_json::to_vec_pretty(&metadata)?)?;

    Ok(zip.finish()?.into_inner())
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
