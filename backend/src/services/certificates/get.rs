//! # Certificate Lookup Service
//!
//! Backend logic for the `GET /certificates/{certificate_id}` endpoint. This
//! is the page a scanned QR code lands on: given a certificate id it returns
//! the public DTO for that attendee, or a structured 404 when the id does
//! not exist in the sheet.
//!
//! ## Workflow
//!
//! 1.  **HTTP Request**: `process` receives the `certificate_id` from the
//!     URL path.
//! 2.  **Lookup**: it builds a [`CertificateRepo`] over the shared sheets
//!     client and scans the certificate list for an exact id match.
//! 3.  **HTTP Response**: the match is reduced to a
//!     [`CertificateResponse`] (`id`, `name`, `lastname`, `eventName`,
//!     `issueDate`). An unknown id maps to `404`, a malformed sheet or a
//!     transport failure to `500`; both carry a `statusCode`/`message`/
//!     `error` JSON body.

use actix_web::{web, HttpResponse, Responder};
use common::responses::CertificateResponse;
use log::error;

use super::{repo::CertificateRepo, CertificatesError};
use crate::state::AppState;

/// Actix web handler for `GET /certificates/{certificate_id}`.
pub(crate) async fn process(
    state: web::Data<AppState>,
    certificate_id: web::Path<String>,
) -> impl Responder {
    let repo = CertificateRepo::new(state.sheets());

    match repo.get_by_id(&certificate_id).await {
        Ok(certificate) => HttpResponse::Ok().json(CertificateResponse::from(certificate)),
        Err(err @ CertificatesError::NotFound(_)) => HttpResponse::NotFound().json(
            serde_json::json!({
                "statusCode": 404,
                "message": err.to_string(),
                "error": "Not Found",
            }),
        ),
        Err(err) => {
            error!("certificate lookup failed: {}", err);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "statusCode": 500,
                "message": err.to_string(),
                "error": "Internal Server Error",
            }))
        }
    }
}
