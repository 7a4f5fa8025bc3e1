//! The template renderer: external capability behind a trait.
//!
//! The pipeline only knows the [`CertificateRenderer`] seam; the production
//! implementation loads the text template named by the record's
//! `templateName`, interpolates it with Tera from an explicit
//! [`RenderContext`], composes the PDF with `genpdf`, and rasterizes the
//! PDF's first page to PNG with pdfium. Of the two historical strategies
//! (rasterize the PDF vs. render the image straight from the template) the
//! PDF-first one is implemented, so PDF and image always show the same
//! artwork.
//!
//! Both composition and rasterization run inside `spawn_blocking`: genpdf is
//! CPU-bound and pdfium wraps a C++ library with thread-local state that
//! must not run on the async workers.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ::common::model::Certificate;
use pdfium_render::prelude::*;
use serde::Serialize;
use tera::Tera;

use super::pdf::{self, ImageSources};
use super::GenerateError;
use crate::config::Environment;

const TEMPLATES_DIR: &str = "templates";
const FONTS_DIR: &str = "fonts";
// Longest edge of the rasterized certificate, in pixels.
const MAX_RENDERED_PIXELS: i32 = 1650;

/// Everything a template can interpolate: the certificate fields (camelCase,
/// as in the sheet) plus the renderer-specific base URLs, merged explicitly
/// instead of relying on structural spreading.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderContext {
    #[serde(flatten)]
    pub certificate: Certificate,
    pub certificates_url: String,
    pub assets_url: String,
}

/// Rendering capability required by the generation pipeline.
#[async_trait]
pub trait CertificateRenderer: Send + Sync {
    /// Renders the record's certificate PDF at `output`, resolving
    /// `[img:qr]` references to `qr_path`.
    async fn render_pdf(
        &self,
        certificate: &Certificate,
        qr_path: &Path,
        output: &Path,
    ) -> Result<(), GenerateError>;

    /// Converts page 1 of `pdf_path` to a PNG at `output`.
    async fn rasterize_first_page(
        &self,
        pdf_path: &Path,
        output: &Path,
    ) -> Result<(), GenerateError>;
}

/// Production renderer over the local `templates/` and `fonts/` directories.
pub struct TemplateRenderer {
    templates_dir: PathBuf,
    fonts_dir: PathBuf,
    certificates_url: String,
    assets_url: String,
}

impl TemplateRenderer {
    pub fn new(env: &Environment) -> Self {
        Self {
            templates_dir: PathBuf::from(TEMPLATES_DIR),
            fonts_dir: PathBuf::from(FONTS_DIR),
            certificates_url: env.certificates_url.clone(),
            assets_url: env.assets_url.clone(),
        }
    }

    /// Interpolates the raw template with the record's context.
    fn interpolate(&self, raw: &str, certificate: &Certificate) -> Result<String, GenerateError> {
        let mut tera = Tera::default();
        tera.add_raw_template("certificate", raw)
            .map_err(|err| GenerateError::Render(err.to_string()))?;

        let context = RenderContext {
            certificate: certificate.clone(),
            certificates_url: self.certificates_url.clone(),
            assets_url: self.assets_url.clone(),
        };

        let value = serde_json::to_value(&context)
            .map_err(|err| GenerateError::Render(err.to_string()))?;
        let context = tera::Context::from_value(value)
            .map_err(|err| GenerateError::Render(err.to_string()))?;

        tera.render("certificate", &context)
            .map_err(|err| GenerateError::Render(err.to_string()))
    }
}

#[async_trait]
impl CertificateRenderer for TemplateRenderer {
    async fn render_pdf(
        &self,
        certificate: &Certificate,
        qr_path: &Path,
        output: &Path,
    ) -> Result<(), GenerateError> {
        let template_path = self
            .templates_dir
            .join(format!("{}.txt", certificate.template_name));
        let raw = tokio::fs::read_to_string(&template_path)
            .await
            .map_err(|err| {
                GenerateError::Render(format!(
                    "template '{}' could not be read: {}",
                    template_path.display(),
                    err
                ))
            })?;

        let text = self.interpolate(&raw, certificate)?;

        let fonts_dir = self.fonts_dir.clone();
        let images = ImageSources {
            qr_path: qr_path.to_path_buf(),
            assets_dir: self.templates_dir.clone(),
        };
        let output = output.to_path_buf();

        tokio::task::spawn_blocking(move || {
            pdf::compose_certificate(&text, &fonts_dir, &images, &output)
        })
        .await
        .map_err(|err| GenerateError::Render(format!("render task panicked: {}", err)))?
        .map_err(GenerateError::Render)
    }

    async fn rasterize_first_page(
        &self,
        pdf_path: &Path,
        output: &Path,
    ) -> Result<(), GenerateError> {
        let pdf_path = pdf_path.to_path_buf();
        let output = output.to_path_buf();

        tokio::task::spawn_blocking(move || rasterize_blocking(&pdf_path, &output))
            .await
            .map_err(|err| GenerateError::Rasterize(format!("rasterize task panicked: {}", err)))?
    }
}

/// Blocking pdfium call: load the PDF, render page 1, save it as PNG.
fn rasterize_blocking(pdf_path: &Path, output: &Path) -> Result<(), GenerateError> {
    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|err| GenerateError::Rasterize(format!("{:?}", err)))?;

    let page = document
        .pages()
        .get(0)
        .map_err(|err| GenerateError::Rasterize(format!("{:?}", err)))?;

    let render_config = PdfRenderConfig::new()
        .set_target_width(MAX_RENDERED_PIXELS)
        .set_maximum_height(MAX_RENDERED_PIXELS);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|err| GenerateError::Rasterize(format!("{:?}", err)))?;

    bitmap
        .as_image()
        .into_rgb8()
        .save(output)
        .map_err(|err| GenerateError::Rasterize(err.to_string()))
}
