//! # Generator Service Module
//!
//! The batch document-generation pipeline and its HTTP trigger. One run
//! reads every certificate row, renders a QR code, a PDF and a raster image
//! for each row flagged for generation, uploads the artifacts to blob
//! storage, and writes the resulting ids, URLs and flags back into the
//! sheet in one bulk call per column.
//!
//! ## Sub-modules:
//! - `generate`: handles `POST /generator/certificates`, one full pipeline
//!   run per request.
//! - `pipeline`: the orchestrator: eligibility partitioning, the bounded
//!   parallel per-record sequence, and the write-back barrier.
//! - `format`: pure data shaping (ids, display dates, deterministic
//!   filenames, artifact keys).
//! - `render`: the template renderer seam, PDF composition and first-page
//!   rasterization.
//! - `pdf`: line-based certificate markup to `genpdf` document translation.
//! - `qr`: QR code encoding.
//! - `scratch`: scoped scratch directories with guaranteed cleanup.

mod format;
mod generate;
mod pdf;
pub mod pipeline;
mod qr;
pub mod render;
mod scratch;

use actix_web::web::{post, scope};
use actix_web::Scope;
use thiserror::Error;

use crate::storage::StorageError;

/// The base path for generator endpoints.
const API_PATH: &str = "/generator";

/// Per-record pipeline failures.
///
/// These abort the record they occur in, never the run: the row keeps its
/// affirmative flag and is retried on the next invocation. Run-level
/// failures (sheet transport, malformed header) use
/// [`crate::services::certificates::CertificatesError`] instead.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("QR code was not generated: {0}")]
    Qr(String),

    #[error("certificate PDF was not generated: {0}")]
    Render(String),

    #[error("PDF was not converted to an image: {0}")]
    Rasterize(String),

    #[error("artifact upload failed: {0}")]
    Upload(#[from] StorageError),

    #[error("record processing timed out after {0}s")]
    Timeout(u64),

    #[error("scratch directory error: {0}")]
    Scratch(#[from] std::io::Error),
}

/// Configures and returns the Actix `Scope` for generator routes.
///
/// # Registered Routes:
///
/// *   **`POST /generator/certificates`**:
///     - **Handler**: `generate::process`
///     - **Description**: Runs one full generation pass over the sheet and
///       returns the resulting `GenerationReport` once every record has
///       settled and the column write-back completed. The platform
///       scheduler hits this same endpoint on its cadence.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/certificates", post().to(generate::process))
}
