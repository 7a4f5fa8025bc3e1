//! # Generation Pipeline
//!
//! Turns eligible certificate rows into durable artifacts and a write-back
//! summary, without letting one record's failure corrupt another's result or
//! leave partial local state behind.
//!
//! ## Workflow:
//!
//! 1.  **Fetch**: all rows are read through the certificate repository; a
//!     sheet without data rows short-circuits into an empty report.
//!
//! 2.  **Per-record sequence**: rows flagged `YES` run independently and
//!     concurrently (bounded by `GENERATOR_CONCURRENCY`, each under the
//!     `RECORD_TIMEOUT_SECONDS` budget): format the record, create its
//!     scratch directory, encode the QR code, render the PDF, rasterize
//!     page 1 to PNG, and only then upload the three artifacts together,
//!     so a record that fails mid-sequence leaves no blobs behind. The
//!     scratch directory is removed on every exit path.
//!
//! 3.  **Outcome**: a record resolves to `Generated` (write back the new id,
//!     URLs and the `NO` flag), `Failed` (log it, write back the original
//!     values so the row stays eligible and is retried next run) or
//!     `Skipped` (ineligible, original values pass through). The flag is
//!     decided only after the whole sequence settles; an attempted record
//!     is never marked done.
//!
//! 4.  **Write-back barrier**: after every record has settled, each affected
//!     column (`id`, image URL, PDF URL, flag) is rewritten in one bulk call,
//!     one value per original row position, so row N's value lands on row N.
//!
//! Record failures never abort sibling records or the barrier; the run only
//! fails as a whole on repository or transport errors.

use std::sync::Arc;
use std::time::Duration;

use common::model::{Certificate, Conditional};
use common::responses::{GenerationReport, RecordFailure};
use futures_util::stream::{self, StreamExt};
use log::{info, warn};

use super::render::CertificateRenderer;
use super::scratch::ScratchDir;
use super::{format, qr, GenerateError};
use crate::config::Environment;
use crate::services::certificates::repo::CertificateRepo;
use crate::services::certificates::CertificatesError;
use crate::sheets::SheetStore;
use crate::storage::BlobUploader;

/// Name of the worksheet holding the certificate rows.
const SHEET_NAME: &str = "certificates";
/// Filename of each record's QR artifact inside its scratch directory.
const QR_FILENAME: &str = "code-qr.png";

/// How a single record settled.
enum RecordStatus {
    Skipped,
    Generated,
    Failed(String),
}

/// One full run's orchestrator, wired to the sheet, the blob store and the
/// renderer through their seams.
pub struct GeneratorService {
    sheets: Arc<dyn SheetStore>,
    storage: Arc<dyn BlobUploader>,
    renderer: Arc<dyn CertificateRenderer>,
    env: Arc<Environment>,
}

impl GeneratorService {
    pub fn new(
        sheets: Arc<dyn SheetStore>,
        storage: Arc<dyn BlobUploader>,
        renderer: Arc<dyn CertificateRenderer>,
        env: Arc<Environment>,
    ) -> Self {
        Self {
            sheets,
            storage,
            renderer,
            env,
        }
    }

    /// Runs one full generation pass and returns its report.
    pub async fn run(&self) -> Result<GenerationReport, CertificatesError> {
        let repo = CertificateRepo::new(self.sheets.clone());
        let certificates = repo.list().await?;

        if certificates.is_empty() {
            info!("certificates sheet has no data rows; nothing to generate");
            return Ok(GenerationReport::default());
        }

        let concurrency = self.env.generator_concurrency.max(1);
        let settled: Vec<(Certificate, RecordStatus)> =
            stream::iter(certificates.into_iter().enumerate())
                .map(|(row, certificate)| self.process_record(row, certificate))
                .buffered(concurrency)
                .collect()
                .await;

        // The barrier: every record has settled before any column write-back.
        self.write_back(&settled).await?;

        let mut report = GenerationReport {
            total: settled.len(),
            ..GenerationReport::default()
        };
        for (row, (certificate, status)) in settled.iter().enumerate() {
            match status {
                RecordStatus::Skipped => report.skipped += 1,
                RecordStatus::Generated => report.generated += 1,
                RecordStatus::Failed(reason) => {
                    report.failed += 1;
                    report.failures.push(RecordFailure {
                        // Header is sheet row 1, data starts at row 2.
                        row: row + 2,
                        id: certificate.id.clone(),
                        reason: reason.clone(),
                    });
                }
            }
        }

        info!(
            "generation run finished: {} generated, {} failed, {} skipped of {}",
            report.generated, report.failed, report.skipped, report.total
        );
        Ok(report)
    }

    /// Processes one row. Never fails: the outcome is folded into the
    /// returned status so sibling records and the barrier always proceed.
    async fn process_record(
        &self,
        row: usize,
        certificate: Certificate,
    ) -> (Certificate, RecordStatus) {
        if !Conditional::Yes.matches(&certificate.should_be_generated) {
            return (certificate, RecordStatus::Skipped);
        }

        let formatted = format::format_certificate(certificate.clone());
        let budget = Duration::from_secs(self.env.record_timeout_secs);

        let result = match tokio::time::timeout(budget, self.generate_files(&formatted)).await {
            Ok(result) => result,
            Err(_) => Err(GenerateError::Timeout(self.env.record_timeout_secs)),
        };

        match result {
            Ok(()) => {
                let mut done = formatted;
                done.should_be_generated = Conditional::No.as_str().to_string();
                (done, RecordStatus::Generated)
            }
            Err(err) => {
                warn!(
                    "row {}: certificate generation failed, row stays eligible: {}",
                    row + 2,
                    err
                );
                // Write back the original values so the row is retried.
                (certificate, RecordStatus::Failed(err.to_string()))
            }
        }
    }

    /// The fixed per-record sequence: scratch → QR → render → rasterize →
    /// upload the three artifacts. Uploads come last so a record that fails
    /// while rendering leaves no blobs behind; the scratch guard removes the
    /// directory on every exit path.
    async fn generate_files(&self, certificate: &Certificate) -> Result<(), GenerateError> {
        let record_key = format!("{}/{}", certificate.event_code, certificate.id);
        let scratch = ScratchDir::create(self.env.output_root.join(&record_key))?;

        let qr_path = scratch.path().join(QR_FILENAME);
        let qr_content = format!(
            "{}/{}",
            self.env.website_url.trim_end_matches('/'),
            certificate.id
        );
        qr::write_qr_png(&qr_path, &qr_content)?;

        let pdf_path = self.env.output_root.join(&certificate.certificate_pdf_url);
        let img_path = self.env.output_root.join(&certificate.certificate_img_url);

        self.renderer
            .render_pdf(certificate, &qr_path, &pdf_path)
            .await?;
        self.renderer
            .rasterize_first_page(&pdf_path, &img_path)
            .await?;

        let qr_key = format!("{}/{}", record_key, QR_FILENAME);
        let (qr_upload, pdf_upload, img_upload) = tokio::join!(
            self.storage.upload(&qr_key, &qr_path),
            self.storage.upload(&certificate.certificate_pdf_url, &pdf_path),
            self.storage.upload(&certificate.certificate_img_url, &img_path),
        );
        qr_upload?;
        pdf_upload?;
        img_upload?;

        Ok(())
    }

    /// One bulk update per affected column, in the original row order.
    async fn write_back(
        &self,
        settled: &[(Certificate, RecordStatus)],
    ) -> Result<(), CertificatesError> {
        let column = |field: fn(&Certificate) -> &String| -> Vec<String> {
            settled.iter().map(|(c, _)| field(c).clone()).collect()
        };

        self.sheets
            .update_column(&format!("{}!A2", SHEET_NAME), &column(|c| &c.id))
            .await?;
        self.sheets
            .update_column(
                &format!("{}!K2", SHEET_NAME),
                &column(|c| &c.certificate_img_url),
            )
            .await?;
        self.sheets
            .update_column(
                &format!("{}!L2", SHEET_NAME),
                &column(|c| &c.certificate_pdf_url),
            )
            .await?;
        self.sheets
            .update_column(
                &format!("{}!Q2", SHEET_NAME),
                &column(|c| &c.should_be_generated),
            )
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;
    use crate::config::StorageSettings;
    use crate::sheets::SheetError;
    use crate::storage::StorageError;

    struct StubSheets {
        grid: Vec<Vec<String>>,
        updates: Mutex<HashMap<String, Vec<String>>>,
    }

    impl StubSheets {
        fn new(grid: Vec<Vec<String>>) -> Self {
            Self {
                grid,
                updates: Mutex::new(HashMap::new()),
            }
        }

        async fn column(&self, range: &str) -> Vec<String> {
            self.updates.lock().await.get(range).cloned().unwrap()
        }
    }

    #[async_trait]
    impl SheetStore for StubSheets {
        async fn fetch_grid(&self) -> Result<Vec<Vec<String>>, SheetError> {
            Ok(self.grid.clone())
        }

        async fn update_column(&self, range: &str, values: &[String]) -> Result<(), SheetError> {
            self.updates
                .lock()
                .await
                .insert(range.to_string(), values.to_vec());
            Ok(())
        }
    }

    #[derive(Default)]
    struct StubUploader {
        keys: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BlobUploader for StubUploader {
        async fn upload(&self, key: &str, local_path: &Path) -> Result<bool, StorageError> {
            if !local_path.exists() {
                return Ok(false);
            }
            self.keys.lock().await.push(key.to_string());
            Ok(true)
        }
    }

    /// Renderer stub that writes marker artifacts, optionally failing or
    /// stalling for one attendee name.
    #[derive(Default)]
    struct StubRenderer {
        fail_for: Option<String>,
        stall_for: Option<String>,
        rendered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CertificateRenderer for StubRenderer {
        async fn render_pdf(
            &self,
            certificate: &Certificate,
            _qr_path: &Path,
            output: &Path,
        ) -> Result<(), GenerateError> {
            if self.fail_for.as_deref() == Some(certificate.name.as_str()) {
                return Err(GenerateError::Render("template blew up".into()));
            }
            if self.stall_for.as_deref() == Some(certificate.name.as_str()) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            self.rendered.lock().await.push(certificate.name.clone());
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(output, b"%PDF").unwrap();
            Ok(())
        }

        async fn rasterize_first_page(
            &self,
            pdf_path: &Path,
            output: &Path,
        ) -> Result<(), GenerateError> {
            assert!(pdf_path.exists());
            std::fs::write(output, b"PNG").unwrap();
            Ok(())
        }
    }

    fn test_env(output_root: &Path) -> Arc<Environment> {
        Arc::new(Environment {
            service_account_email: "svc@example.iam.gserviceaccount.com".into(),
            service_account_private_key: String::new(),
            spreadsheet_id: "sheet-id".into(),
            website_url: "https://verify.example.org".into(),
            certificates_url: "https://cdn.example.org/certificates".into(),
            assets_url: "https://cdn.example.org/assets".into(),
            storage: StorageSettings {
                access_key: "AK".into(),
                secret_key: "SK".into(),
                endpoint: None,
                region: "us-east-1".into(),
            },
            container_name: "certificates".into(),
            output_root: output_root.to_path_buf(),
            generator_concurrency: 4,
            record_timeout_secs: 30,
            generation_interval_minutes: None,
            host: "127.0.0.1".into(),
            port: 0,
        })
    }

    fn header() -> Vec<String> {
        [
            "ID",
            "Name",
            "Lastname",
            "Event Name",
            "Event Code",
            "Issue Date",
            "Should Be Generated",
            "Template Name",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn data_row(id: &str, name: &str, flag: &str) -> Vec<String> {
        [
            id,
            name,
            "Ruiz",
            "Dev Summit",
            "DS24",
            "2024-03-05",
            flag,
            "default",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    struct Harness {
        sheets: Arc<StubSheets>,
        uploader: Arc<StubUploader>,
        renderer: Arc<StubRenderer>,
        service: GeneratorService,
        _root: tempfile::TempDir,
    }

    fn harness(grid: Vec<Vec<String>>, renderer: StubRenderer) -> Harness {
        let root = tempfile::tempdir().unwrap();
        let sheets = Arc::new(StubSheets::new(grid));
        let uploader = Arc::new(StubUploader::default());
        let renderer = Arc::new(renderer);
        let service = GeneratorService::new(
            sheets.clone(),
            uploader.clone(),
            renderer.clone(),
            test_env(root.path()),
        );
        Harness {
            sheets,
            uploader,
            renderer,
            service,
            _root: root,
        }
    }

    #[tokio::test]
    async fn rows_marked_done_trigger_no_collaborator_calls() {
        let h = harness(
            vec![header(), data_row("a1", "Ana", "NO"), data_row("b2", "Luis", "")],
            StubRenderer::default(),
        );

        let report = h.service.run().await.unwrap();

        assert_eq!(report.skipped, 2);
        assert_eq!(report.generated, 0);
        assert!(h.renderer.rendered.lock().await.is_empty());
        assert!(h.uploader.keys.lock().await.is_empty());
        // Original values still pass through the write-back.
        assert_eq!(h.sheets.column("certificates!A2").await, vec!["a1", "b2"]);
        assert_eq!(h.sheets.column("certificates!Q2").await, vec!["NO", ""]);
    }

    #[tokio::test]
    async fn write_back_preserves_row_positions() {
        let h = harness(
            vec![
                header(),
                data_row("a1", "Ana", "NO"),
                data_row("", "Luis", "YES"),
                data_row("c3", "Mar", "NO"),
            ],
            StubRenderer::default(),
        );

        let report = h.service.run().await.unwrap();
        assert_eq!(report.generated, 1);

        let ids = h.sheets.column("certificates!A2").await;
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], "a1");
        assert!(!ids[1].is_empty(), "row 2 got a generated id");
        assert_eq!(ids[2], "c3");

        let flags = h.sheets.column("certificates!Q2").await;
        assert_eq!(flags, vec!["NO", "NO", "NO"]);

        let pdfs = h.sheets.column("certificates!L2").await;
        assert_eq!(pdfs[0], "");
        assert_eq!(pdfs[1], format!("DS24/{}/Luis-Ruiz-Dev-Summit.pdf", ids[1]));
        assert_eq!(pdfs[2], "");
    }

    #[tokio::test]
    async fn one_failing_record_does_not_abort_its_siblings() {
        let h = harness(
            vec![
                header(),
                data_row("a1", "Ana", "YES"),
                data_row("b2", "Luis", "YES"),
                data_row("c3", "Mar", "YES"),
            ],
            StubRenderer {
                fail_for: Some("Luis".into()),
                ..StubRenderer::default()
            },
        );

        let report = h.service.run().await.unwrap();

        assert_eq!(report.generated, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].row, 3);
        assert!(report.failures[0].reason.contains("PDF was not generated"));

        // The failed row keeps its affirmative flag for the next run; the
        // siblings are done.
        let flags = h.sheets.column("certificates!Q2").await;
        assert_eq!(flags, vec!["NO", "YES", "NO"]);

        // The failed row's URLs are unchanged (empty), not half-written.
        let imgs = h.sheets.column("certificates!K2").await;
        assert!(!imgs[0].is_empty());
        assert_eq!(imgs[1], "");
        assert!(!imgs[2].is_empty());

        // Nothing was uploaded for the failed row, not even its QR code.
        let keys = h.uploader.keys.lock().await.clone();
        assert_eq!(keys.len(), 6);
        assert!(!keys.iter().any(|key| key.contains("/b2/")));
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_records_stay_eligible_and_leave_nothing_behind() {
        let h = harness(
            vec![
                header(),
                data_row("a1", "Ana", "YES"),
                data_row("b2", "Luis", "YES"),
            ],
            StubRenderer {
                stall_for: Some("Luis".into()),
                ..StubRenderer::default()
            },
        );

        let report = h.service.run().await.unwrap();

        assert_eq!(report.generated, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].row, 3);
        assert!(report.failures[0].reason.contains("timed out"));

        // The row keeps its affirmative flag and is retried next run.
        let flags = h.sheets.column("certificates!Q2").await;
        assert_eq!(flags, vec!["NO", "YES"]);

        // No blobs and no scratch directory survive the timeout.
        let keys = h.uploader.keys.lock().await.clone();
        assert!(!keys.iter().any(|key| key.contains("/b2/")));
        assert!(!h._root.path().join("DS24").join("b2").exists());
    }

    #[tokio::test]
    async fn generated_records_upload_qr_pdf_and_image() {
        let h = harness(
            vec![header(), data_row("a1", "Ana", "YES")],
            StubRenderer::default(),
        );

        h.service.run().await.unwrap();

        let keys = h.uploader.keys.lock().await.clone();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&"DS24/a1/code-qr.png".to_string()));
        assert!(keys.contains(&"DS24/a1/Ana-Ruiz-Dev-Summit.pdf".to_string()));
        assert!(keys.contains(&"DS24/a1/Ana-Ruiz-Dev-Summit.png".to_string()));
    }

    #[tokio::test]
    async fn scratch_directories_are_removed_after_the_run() {
        let h = harness(
            vec![header(), data_row("a1", "Ana", "YES")],
            StubRenderer::default(),
        );

        h.service.run().await.unwrap();

        assert!(!h._root.path().join("DS24").join("a1").exists());
    }

    #[tokio::test]
    async fn sheet_with_only_a_header_short_circuits() {
        let h = harness(vec![header()], StubRenderer::default());

        let report = h.service.run().await.unwrap();

        assert_eq!(report.total, 0);
        assert!(h.sheets.updates.lock().await.is_empty());
    }

    #[tokio::test]
    async fn missing_header_row_fails_the_run() {
        let h = harness(Vec::new(), StubRenderer::default());

        let err = h.service.run().await.unwrap_err();
        assert!(matches!(err, CertificatesError::EmptyHeaders));
    }
}
