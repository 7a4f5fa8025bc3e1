//! Shared application state.
//!
//! One immutable [`Environment`] and one instance of each external
//! collaborator are built in `main.rs` and handed to every worker and
//! request handler through this struct. Components receive the
//! configuration by reference; nothing mutates it after startup.

use std::sync::Arc;

use crate::config::Environment;
use crate::services::generator::pipeline::GeneratorService;
use crate::services::generator::render::TemplateRenderer;
use crate::sheets::{SheetStore, SheetsClient};
use crate::storage::{BlobStorage, BlobUploader};

#[derive(Clone)]
pub struct AppState {
    pub env: Arc<Environment>,
    pub sheets: Arc<SheetsClient>,
    pub storage: Arc<BlobStorage>,
    pub renderer: Arc<TemplateRenderer>,
}

impl AppState {
    /// The sheets client as the pipeline's read/write seam.
    pub fn sheets(&self) -> Arc<dyn SheetStore> {
        self.sheets.clone()
    }

    /// Builds a pipeline wired to the shared collaborators. Cheap: every
    /// component is behind an `Arc`.
    pub fn generator(&self) -> GeneratorService {
        GeneratorService::new(
            self.sheets.clone() as Arc<dyn SheetStore>,
            self.storage.clone() as Arc<dyn BlobUploader>,
            self.renderer.clone(),
            self.env.clone(),
        )
    }
}
