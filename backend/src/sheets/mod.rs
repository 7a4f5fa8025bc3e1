//! Google Sheets v4 values client.
//!
//! The certificates sheet is the system of record: the first row holds the
//! field names and every data row is one attendee. This module provides the
//! transport layer only: a typed client that can fetch the raw grid and
//! overwrite single columns. Row parsing lives with the certificates
//! service.
//!
//! Authentication uses the service-account JWT bearer grant: an RS256-signed
//! assertion is exchanged at the OAuth token endpoint and the resulting
//! access token is cached until shortly before it expires.

mod auth;
mod client;

use async_trait::async_trait;
use thiserror::Error;

pub use client::SheetsClient;

/// Transport-level failures talking to the Sheets API.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("invalid sheets url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("sheets request failed: {0}")]
    Http(String),

    #[error("sheets API returned unexpected status {0}")]
    UnexpectedStatus(reqwest::StatusCode),

    #[error("failed to decode sheets response: {0}")]
    Decode(String),

    #[error("service account authentication failed: {0}")]
    Auth(String),
}

/// Read and write access to the certificates grid.
///
/// The production implementation is [`SheetsClient`]; pipeline tests drive
/// the orchestrator against in-memory stubs of this trait.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Fetches the whole sheet as rows of cells, header row included.
    /// An empty sheet yields an empty vector.
    async fn fetch_grid(&self) -> Result<Vec<Vec<String>>, SheetError>;

    /// Overwrites one contiguous column starting at the anchor cell of
    /// `range`, one value per original row position. Values are never
    /// reordered or compacted, so row N's value lands on row N.
    async fn update_column(&self, range: &str, values: &[String]) -> Result<(), SheetError>;
}
