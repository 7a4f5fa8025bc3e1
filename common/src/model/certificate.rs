use serde::{Deserialize, Serialize};

/// One attendee row of the certificates spreadsheet.
///
/// Every field is a raw cell value. Rows shorter than the header simply leave
/// their trailing fields empty; that is not an error. The generation pipeline
/// fills `id`, `certificate_img_url`, `certificate_pdf_url` and flips
/// `should_be_generated` when a certificate is produced.
///
/// Serde names are camelCase so the wire JSON and the template variables use
/// the same spelling as the spreadsheet headers (`eventName`, `issueDate`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Certificate {
    /// Unique identifier. Empty until the row is first generated; the
    /// pipeline assigns a fresh UUID at that point, never at read time.
    pub id: String,
    pub name: String,
    pub lastname: String,
    pub event_name: String,
    pub event_code: String,
    pub email: String,
    pub phone_number: String,
    pub country: String,
    /// Raw date cell. Reformatted to a long human-readable date during
    /// generation.
    pub issue_date: String,
    /// Blob key of the raster certificate, `{eventCode}/{id}/{filename}.png`.
    pub certificate_img_url: String,
    /// Blob key of the PDF certificate, `{eventCode}/{id}/{filename}.pdf`.
    pub certificate_pdf_url: String,
    pub observations: String,
    /// Tri-state eligibility flag: affirmative, negative or empty.
    pub should_be_generated: String,
    /// Name of the certificate template used to render this row.
    pub template_name: String,
}
