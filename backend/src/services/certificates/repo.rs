//! Maps the raw sheet grid to certificate records.
//!
//! The first row of the grid provides the field names: each header cell is
//! normalized to a camelCase key (`"Should Be Generated"` →
//! `shouldBeGenerated`) and matched against the known certificate fields.
//! Unknown columns are ignored, and a data row shorter than the header
//! simply leaves its trailing fields empty. Row order is preserved end to
//! end because the write-back addresses rows positionally.

use std::sync::Arc;

use common::model::Certificate;

use super::CertificatesError;
use crate::sheets::SheetStore;

/// Read access to the certificate records backed by a [`SheetStore`].
pub struct CertificateRepo {
    sheets: Arc<dyn SheetStore>,
}

impl CertificateRepo {
    pub fn new(sheets: Arc<dyn SheetStore>) -> Self {
        Self { sheets }
    }

    /// Fetches the grid and returns one record per data row, in sheet order.
    ///
    /// Fails with [`CertificatesError::EmptyHeaders`] when the header row is
    /// absent or empty.
    pub async fn list(&self) -> Result<Vec<Certificate>, CertificatesError> {
        let grid = self.sheets.fetch_grid().await?;
        parse_certificates(&grid)
    }

    /// Linear scan of [`list`](Self::list) for an exact id match.
    pub async fn get_by_id(&self, certificate_id: &str) -> Result<Certificate, CertificatesError> {
        self.list()
            .await?
            .into_iter()
            .find(|certificate| certificate.id == certificate_id)
            .ok_or_else(|| CertificatesError::NotFound(certificate_id.to_string()))
    }
}

/// Parses a header-keyed grid into certificate records.
pub fn parse_certificates(grid: &[Vec<String>]) -> Result<Vec<Certificate>, CertificatesError> {
    let header = match grid.first() {
        Some(row) if !row.is_empty() => row,
        _ => return Err(CertificatesError::EmptyHeaders),
    };

    let keys: Vec<String> = header.iter().map(|cell| to_camel_case(cell)).collect();

    let certificates = grid[1..]
        .iter()
        .map(|row| {
            let mut certificate = Certificate::default();
            for (key, value) in keys.iter().zip(row.iter()) {
                assign_field(&mut certificate, key, value);
            }
            certificate
        })
        .collect();

    Ok(certificates)
}

fn assign_field(certificate: &mut Certificate, key: &str, value: &str) {
    let value = value.to_string();
    match key {
        "id" => certificate.id = value,
        "name" => certificate.name = value,
        "lastname" => certificate.lastname = value,
        "eventName" => certificate.event_name = value,
        "eventCode" => certificate.event_code = value,
        "email" => certificate.email = value,
        "phoneNumber" => certificate.phone_number = value,
        "country" => certificate.country = value,
        "issueDate" => certificate.issue_date = value,
        "certificateImgUrl" => certificate.certificate_img_url = value,
        "certificatePdfUrl" => certificate.certificate_pdf_url = value,
        "observations" => certificate.observations = value,
        "shouldBeGenerated" => certificate.should_be_generated = value,
        "templateName" => certificate.template_name = value,
        // Columns the model does not know about are ignored.
        _ => {}
    }
}

/// Normalizes a free-text header cell to a camelCase key.
///
/// Multi-word headers are lowercased and recapitalized word by word
/// (`"Phone Number"` → `phoneNumber`). A single all-uppercase word is fully
/// lowercased (`"ID"` → `id`); a single mixed-case word only has its first
/// letter lowered so an already-camelCase header survives unchanged.
pub fn to_camel_case(text: &str) -> String {
    let tokens: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|token| !token.is_empty())
        .collect();

    match tokens.as_slice() {
        [] => String::new(),
        [single] => {
            if single.chars().all(|c| !c.is_lowercase()) {
                single.to_lowercase()
            } else {
                let mut chars = single.chars();
                match chars.next() {
                    Some(first) => first.to_lowercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
        [first, rest @ ..] => {
            let mut key = first.to_lowercase();
            for token in rest {
                let token = token.to_lowercase();
                let mut chars = token.chars();
                if let Some(initial) = chars.next() {
                    key.extend(initial.to_uppercase());
                    key.push_str(chars.as_str());
                }
            }
            key
        }
    }
}
