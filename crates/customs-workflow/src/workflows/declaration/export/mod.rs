//! XML rendering and ZIP compliance bundles for declarations.

mod bundle;
mod xml;

pub use bundle::{build_bundle, sha256_hex, BundleFile, BundleMetadata, METADATA_FILE};
pub use xml::render_xml;

/// Document number reduced to characters safe in archive entry names and
/// `Content-Disposition` filenames.
pub fn file_stem(document_number: &str) -> String {
    document_number
        .trim()
        .chars()
        .map(|ch| match ch {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' => ch,
            _ => '-',
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write bundle entry: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to build zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("failed to serialize snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write audit trail csv: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stem_replaces_separators_and_quotes() {
        assert_eq!(file_stem("PEB-20250301-0A1B2C"), "PEB-20250301-0A1B2C");
        assert_eq!(file_stem(" 000123/KPU.01\\2025 "), "000123-KPU.01-2025");
        assert_eq!(file_stem("PEB\"01\"; x=y"), "PEB-01---x-y");
    }
}
