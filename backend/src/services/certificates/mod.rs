//! # Certificates Service Module
//!
//! Read-side of the certificates sheet. This module groups everything that
//! turns the raw spreadsheet grid into [`common::model::Certificate`] records
//! and exposes the single lookup endpoint.
//!
//! ## Sub-modules:
//! - `repo`: maps the header-keyed grid to certificate records and provides
//!   `list` / `get_by_id` over it.
//! - `get`: handles `GET /certificates/{certificate_id}`, the public
//!   verification lookup reached from each certificate's QR code.

mod get;
pub mod repo;

use actix_web::web::{get, scope};
use actix_web::Scope;
use thiserror::Error;

use crate::sheets::SheetError;

/// The base path for certificate lookup endpoints.
const API_PATH: &str = "/certificates";

/// Repository and lookup failures.
#[derive(Debug, Error)]
pub enum CertificatesError {
    /// The sheet has no header row, so rows cannot be keyed. Surfaced as a
    /// 500 because the data source itself is malformed.
    #[error("empty headers in certificates sheet data format")]
    EmptyHeaders,

    /// No row carries this id. Surfaced as a structured 404.
    #[error("Certificate with id: {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Sheet(#[from] SheetError),
}

/// Configures and returns the Actix `Scope` for certificate routes.
///
/// # Registered Routes:
///
/// *   **`GET /certificates/{certificate_id}`**:
///     - **Handler**: `get::process`
///     - **Description**: Looks the certificate up by id and returns its
///       public fields (`id`, `name`, `lastname`, `eventName`, `issueDate`),
///       or a structured 404 body when the id is unknown.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/{certificate_id}", get().to(get::process))
}
