use serde::{Deserialize, Serialize};

use crate::model::Certificate;

/// Public view of a certificate returned by `GET /certificates/{id}`.
///
/// Only the fields shown on the verification page are exposed; contact
/// details stay private to the sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateResponse {
    pub id: String,
    pub name: String,
    pub lastname: String,
    pub event_name: String,
    pub issue_date: String,
}

impl From<Certificate> for CertificateResponse {
    fn from(certificate: Certificate) -> Self {
        Self {
            id: certificate.id,
            name: certificate.name,
            lastname: certificate.lastname,
            event_name: certificate.event_name,
            issue_date: certificate.issue_date,
        }
    }
}

/// Outcome of one full generation run, returned by
/// `POST /generator/certificates` once the write-back barrier completes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Number of data rows read from the sheet.
    pub total: usize,
    /// Rows whose artifacts were generated and uploaded this run.
    pub generated: usize,
    /// Rows that were eligible but failed; they stay eligible for retry.
    pub failed: usize,
    /// Rows not flagged for generation.
    pub skipped: usize,
    pub failures: Vec<RecordFailure>,
}

/// A single failed row inside a [`GenerationReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordFailure {
    /// 1-based sheet row (header is row 1, first data row is row 2).
    pub row: usize,
    /// Row id if one existed before the run; empty otherwise.
    pub id: String,
    pub reason: String,
}
