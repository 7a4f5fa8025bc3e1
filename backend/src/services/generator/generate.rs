//! # Generation Trigger Service
//!
//! Backend logic for `POST /generator/certificates`. One request runs one
//! full pipeline pass and answers only after the write-back barrier has
//! completed, so the caller (an operator or the platform scheduler) sees the
//! final [`GenerationReport`] of the batch it triggered.

use actix_web::{web, HttpResponse, Responder};
use log::error;

use crate::state::AppState;

/// Actix web handler for `POST /generator/certificates`.
///
/// No request body is required. Returns the run's `GenerationReport` on
/// success; repository or transport failures surface as a 500 with a
/// structured body. Per-record failures are not errors here; they are part
/// of the report and the affected rows stay eligible for the next run.
pub(crate) async fn process(state: web::Data<AppState>) -> impl Responder {
    match state.generator().run().await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(err) => {
            error!("generation run failed: {}", err);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "statusCode": 500,
                "message": err.to_string(),
                "error": "Internal Server Error",
            }))
        }
    }
}
