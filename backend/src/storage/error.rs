use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read local artifact '{path}': {source}")]
    LocalRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("S3 PutObject error for key '{key}': {detail}")]
    PutObject { key: String, detail: String },
}
