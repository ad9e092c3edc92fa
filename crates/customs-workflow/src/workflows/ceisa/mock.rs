use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

pub const DEFAULT_LIMIT: usize = 5;
pub const MAX_LIMIT: usize = 50;

const TRADERS: [&str; 5] = [
    "PT Kopi Nusantara",
    "PT Sawit Makmur",
    "CV Rotan Jaya",
    "PT Tekstil Bandung",
    "PT Elektronik Batam",
];
const PARTNER_COUNTRIES: [&str; 6] = ["NL", "SG", "JP", "US", "CN", "AU"];
const OFFICES: [&str; 4] = ["040300", "050100", "020400", "070100"];
const LANES: [&str; 3] = ["green", "yellow", "red"];
const RATES: [(&str, f64); 8] = [
    ("USD", 15_650.0),
    ("EUR", 16_980.0),
    ("SGD", 11_620.0),
    ("JPY", 104.5),
    ("CNY", 2_165.0),
    ("AUD", 10_240.0),
    ("GBP", 19_870.0),
    ("MYR", 3_340.0),
];

/// Record shape served for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockDataset {
    Peb,
    Pib,
    Kurs,
    Generic,
}

impl MockDataset {
    pub fn for_endpoint(endpoint: &str) -> Self {
        let endpoint = endpoint.to_ascii_lowercase();
        if endpoint.contains("kurs") {
            Self::Kurs
        } else if endpoint.contains("peb") || endpoint.contains("export") {
            Self::Peb
        } else if endpoint.contains("pib") || endpoint.contains("import") {
            Self::Pib
        } else {
            Self::Generic
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Peb => "peb",
            Self::Pib => "pib",
            Self::Kurs => "kurs",
            Self::Generic => "generic",
        }
    }
}

/// Deterministic stand-in payload for `endpoint`. Depends only on the endpoint and
/// the `limit` param.
pub fn mock_payload(endpoint: &str, params: &BTreeMap<String, String>) -> Value {
    let dataset = MockDataset::for_endpoint(endpoint);
    let limit = params
        .get("limit")
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_LIMIT)
        .min(MAX_LIMIT);
    let seed = seed(endpoint);

    let records: Vec<Value> = match dataset {
        MockDataset::Kurs => RATES
            .iter()
            .take(limit)
            .enumerate()
            .map(|(index, (currency, rate))| kurs_record(seed, index, currency, *rate))
            .collect(),
        _ => (0..limit)
            .map(|index| match dataset {
                MockDataset::Peb => peb_record(seed, index),
                MockDataset::Pib => pib_record(seed, index),
                _ => generic_record(endpoint, seed, index),
            })
            .collect(),
    };

    json!({
        "endpoint": endpoint,
        "dataset": dataset.code(),
        "count": records.len(),
        "records": records,
    })
}

fn seed(endpoint: &str) -> u64 {
    let digest = Sha256::digest(endpoint.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

fn pick<'a>(values: &[&'a str], seed: u64, index: usize) -> &'a str {
    let slot = (seed as usize).wrapping_add(index) % values.len();
    values[slot]
}

fn mock_date(index: usize) -> String {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .map(|base| {
            (base + Duration::days(index as i64 * 3))
                .format("%Y-%m-%d")
                .to_string()
        })
        .unwrap_or_default()
}

fn amount(seed: u64, index: usize) -> f64 {
    let base = (seed % 9_000) as f64 + 1_000.0;
    ((base + index as f64 * 1_250.5) * 100.0).round() / 100.0
}

fn peb_record(seed: u64, index: usize) -> Value {
    let sequence = index + 1;
    json!({
        "nomor_aju": format!("{:06}-PEB-{:04}", seed % 1_000_000, sequence),
        "nomor_pendaftaran": format!("{:06}", (seed / 7 + sequence as u64) % 1_000_000),
        "tanggal": mock_date(index),
        "kantor_pabean": pick(&OFFICES, seed, index),
        "eksportir": pick(&TRADERS, seed, index),
        "negara_tujuan": pick(&PARTNER_COUNTRIES, seed, index),
        "valuta": "USD",
        "nilai_fob": amount(seed, index),
        "jalur": pick(&LANES, seed, index),
        "status": if index % 3 == 2 { "NPE_ISSUED" } else { "CEISA_ACCEPTED" },
    })
}

fn pib_record(seed: u64, index: usize) -> Value {
    let sequence = index + 1;
    json!({
        "nomor_aju": format!("{:06}-PIB-{:04}", seed % 1_000_000, sequence),
        "nomor_pendaftaran": format!("{:06}", (seed / 11 + sequence as u64) % 1_000_000),
        "tanggal": mock_date(index),
        "kantor_pabean": pick(&OFFICES, seed, index),
        "importir": pick(&TRADERS, seed, index),
        "negara_asal": pick(&PARTNER_COUNTRIES, seed, index),
        "valuta": "USD",
        "nilai_cif": amount(seed, index),
        "jalur": pick(&LANES, seed, index),
        "status": if index % 3 == 2 { "SPPB_ISSUED" } else { "CEISA_ACCEPTED" },
    })
}

fn kurs_record(seed: u64, index: usize, currency: &str, rate: f64) -> Value {
    let drift = ((seed >> 8) % 50) as f64 / 10.0;
    json!({
        "valuta": currency,
        "kurs": ((rate + drift) * 100.0).round() / 100.0,
        "berlaku_mulai": mock_date(index),
    })
}

fn generic_record(endpoint: &str, seed: u64, index: usize) -> Value {
    json!({
        "id": index + 1,
        "endpoint": endpoint,
        "reference": format!("MOCK-{:08X}-{:03}", seed as u32, index + 1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(limit: &str) -> BTreeMap<String, String> {
        BTreeMap::from([("limit".to_string(), limit.to_string())])
    }

    #[test]
    fn endpoint_selects_dataset() {
        assert_eq!(MockDataset::for_endpoint("exports/peb"), MockDataset::Peb);
        assert_eq!(MockDataset::for_endpoint("Imports/PIB"), MockDataset::Pib);
        assert_eq!(MockDataset::for_endpoint("referensi/kurs"), MockDataset::Kurs);
        assert_eq!(MockDataset::for_endpoint("referensi/negara"), MockDataset::Generic);
    }

    #[test]
    fn payload_is_deterministic() {
        let first = mock_payload("exports/peb", &BTreeMap::new());
        let second = mock_payload("exports/peb", &BTreeMap::new());
        assert_eq!(first, second);
        assert_ne!(first, mock_payload("imports/pib", &BTreeMap::new()));
    }

    #[test]
    fn limit_is_capped() {
        let payload = mock_payload("referensi/negara", &params("500"));
        assert_eq!(payload["count"], json!(MAX_LIMIT));

        let payload = mock_payload("referensi/negara", &params("two"));
        assert_eq!(payload["count"], json!(DEFAULT_LIMIT));

        let payload = mock_payload("kurs", &params("20"));
        assert_eq!(payload["count"], json!(RATES.len()));
    }

    #[test]
    fn pib_records_use_import_fields() {
        let payload = mock_payload("imports/pib", &params("3"));
        let records = payload["records"].as_array().expect("records");
        assert_eq!(records.len(), 3);
        assert!(records[0].get("importir").is_some());
        assert!(records[0].get("nilai_cif").is_some());
        assert_eq!(records[2]["status"], json!("SPPB_ISSUED"));
    }
}
