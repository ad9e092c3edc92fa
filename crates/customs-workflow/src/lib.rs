//! Customs declaration (PEB/PIB) workflow: status lifecycle, audit trail,
//! CEISA proxy, and compliance exports.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
