//! Certificate markup to PDF translation.
//!
//! Certificate templates are plain text with a small line-based markup:
//! empty lines become vertical breaks, `- ` prefixes become list items,
//! `[img:NAME]` lines embed an image (`qr` resolves to the record's QR code,
//! any other name to a file next to the templates directory), and inline
//! `***bolditalic***` / `**bold**` / `*italic*` runs style the text. The
//! interpolated template is streamed line by line into a `genpdf` document
//! and rendered to the record's scratch path.

use std::fs;
use std::path::{Path, PathBuf};

use genpdf::elements::{Break, Image as PdfImage, LinearLayout, Paragraph};
use genpdf::style::{Style, StyledString};
use genpdf::Document;

const IMAGE_DPI: f64 = 150.0;
// A4 landscape, in millimetres.
const PAGE_WIDTH_MM: f64 = 297.0;
const PAGE_HEIGHT_MM: f64 = 210.0;
const FONT_SIZE_PT: u8 = 14;

/// Where `[img:...]` lines resolve from.
pub struct ImageSources {
    /// The record's generated QR code, referenced as `[img:qr]`.
    pub qr_path: PathBuf,
    /// Directory holding shared template assets such as logos.
    pub assets_dir: PathBuf,
}

impl ImageSources {
    fn resolve(&self, name: &str) -> PathBuf {
        if name == "qr" {
            return self.qr_path.clone();
        }
        // Bare names default to PNG assets.
        if Path::new(name).extension().is_some() {
            self.assets_dir.join(name)
        } else {
            self.assets_dir.join(format!("{}.png", name))
        }
    }
}

/// Fragments with detected inline styling.
enum TextStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

struct TextSegment {
    text: String,
    style: TextStyle,
}

/// Parse simple markdown-like styles: `***bolditalic***`, `**bold**`,
/// `*italic*`. An unmatched marker is kept as literal text.
fn parse_styles(line: &str) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut rest = line;

    while !rest.is_empty() {
        let Some(start) = rest.find('*') else {
            segments.push(TextSegment {
                text: rest.to_string(),
                style: TextStyle::Regular,
            });
            break;
        };

        if start > 0 {
            segments.push(TextSegment {
                text: rest[..start].to_string(),
                style: TextStyle::Regular,
            });
            rest = &rest[start..];
        }

        let (marker, style) = if rest.starts_with("***") {
            ("***", TextStyle::BoldItalic)
        } else if rest.starts_with("**") {
            ("**", TextStyle::Bold)
        } else {
            ("*", TextStyle::Italic)
        };

        match rest[marker.len()..].find(marker) {
            Some(end) => {
                segments.push(TextSegment {
                    text: rest[marker.len()..marker.len() + end].to_string(),
                    style,
                });
                rest = &rest[2 * marker.len() + end..];
            }
            None => {
                // No closing marker: emit the marker itself as plain text.
                segments.push(TextSegment {
                    text: marker.to_string(),
                    style: TextStyle::Regular,
                });
                rest = &rest[marker.len()..];
            }
        }
    }

    segments
}

/// Push segments into a Paragraph converting each `TextSegment` into a
/// `StyledString`. Centralizes the style mapping.
fn push_segments_into_paragraph(paragraph: &mut Paragraph, segments: &[TextSegment]) {
    for segment in segments {
        let styled = match segment.style {
            TextStyle::Regular => StyledString::new(segment.text.clone(), Style::new()),
            TextStyle::Bold => StyledString::new(segment.text.clone(), Style::new().bold()),
            TextStyle::Italic => StyledString::new(segment.text.clone(), Style::new().italic()),
            TextStyle::BoldItalic => {
                StyledString::new(segment.text.clone(), Style::new().bold().italic())
            }
        };
        paragraph.push(styled);
    }
}

/// Load the font family for certificate text: Arial if its TTFs were added
/// to the fonts directory, LiberationSans as the fallback.
fn load_fonts(
    fonts_dir: &Path,
) -> Result<genpdf::fonts::FontFamily<genpdf::fonts::FontData>, String> {
    if let Ok(family) = genpdf::fonts::from_files(fonts_dir, "Arial", None) {
        return Ok(family);
    }
    genpdf::fonts::from_files(fonts_dir, "LiberationSans", None).map_err(|err| err.to_string())
}

/// Configure an A4-landscape genpdf Document with font and decorator set.
fn configure_document(fonts_dir: &Path) -> Result<Document, String> {
    let mut doc = Document::new(load_fonts(fonts_dir)?);
    doc.set_title("Certificate");
    doc.set_font_size(FONT_SIZE_PT);
    doc.set_paper_size(genpdf::Size::new(PAGE_WIDTH_MM, PAGE_HEIGHT_MM));

    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(18);
    doc.set_page_decorator(decorator);
    Ok(doc)
}

/// Handle a list item line starting with `- `.
fn handle_list_item(doc: &mut Document, item_text: &str) {
    let mut paragraph = Paragraph::new("");
    paragraph.push(StyledString::new("• ", Style::new()));
    push_segments_into_paragraph(&mut paragraph, &parse_styles(item_text));
    let mut layout = LinearLayout::vertical();
    layout.push(paragraph);
    doc.push(layout);
}

/// Handle an image line like `[img:qr]`.
fn handle_image_line(line: &str, images: &ImageSources, doc: &mut Document) -> Result<(), String> {
    let name = &line[5..line.len() - 1];
    let path = images.resolve(name);

    if path.exists() {
        let mut element = PdfImage::from_path(&path)
            .map_err(|err| format!("image '{}': {}", path.display(), err))?;
        element.set_dpi(IMAGE_DPI);
        doc.push(element);
    } else {
        doc.push(Paragraph::new(format!("[imagen no encontrada: {}]", name)));
    }
    Ok(())
}

/// Handle a normal text line (may contain inline styles).
fn handle_normal_line(line: &str, doc: &mut Document) {
    let mut paragraph = Paragraph::new("");
    push_segments_into_paragraph(&mut paragraph, &parse_styles(line));
    doc.push(paragraph);
}

/// Translates interpolated certificate text into a PDF at `output`.
///
/// Streams the text line by line into the document. The output's parent is
/// the record's scratch directory and must already exist: a missing parent
/// means the record was cancelled and its scratch removed, so the write has
/// to fail rather than bring the directory back. Errors are returned as
/// strings so the caller can wrap them into its own taxonomy across the
/// blocking boundary.
pub fn compose_certificate(
    text: &str,
    fonts_dir: &Path,
    images: &ImageSources,
    output: &Path,
) -> Result<(), String> {
    let mut doc = configure_document(fonts_dir)?;

    // Do not trim: empty lines are deliberate vertical spacing.
    for line in text.lines() {
        if line.is_empty() {
            doc.push(Break::new(1));
            continue;
        }

        if let Some(item) = line.strip_prefix("- ") {
            handle_list_item(&mut doc, item);
            continue;
        }

        if line.starts_with("[img:") && line.ends_with(']') {
            handle_image_line(line, images, &mut doc)?;
            continue;
        }

        handle_normal_line(line, &mut doc);
    }

    let mut file = fs::File::create(output).map_err(|err| err.to_string())?;
    doc.render(&mut file).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(segments: &[TextSegment]) -> Vec<&str> {
        segments.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn splits_inline_styles_into_segments() {
        let segments = parse_styles("Se otorga a **Ana Ruiz** por *participar*");
        assert_eq!(
            texts(&segments),
            vec!["Se otorga a ", "Ana Ruiz", " por ", "participar"]
        );
        assert!(matches!(segments[1].style, TextStyle::Bold));
        assert!(matches!(segments[3].style, TextStyle::Italic));
    }

    #[test]
    fn bold_italic_uses_the_longest_marker() {
        let segments = parse_styles("***Dev Summit***");
        assert_eq!(texts(&segments), vec!["Dev Summit"]);
        assert!(matches!(segments[0].style, TextStyle::BoldItalic));
    }

    #[test]
    fn unmatched_markers_stay_literal() {
        let segments = parse_styles("a * b");
        assert_eq!(texts(&segments), vec!["a ", "*", " b"]);
        assert!(segments
            .iter()
            .all(|s| matches!(s.style, TextStyle::Regular)));
    }

    #[test]
    fn image_names_resolve_against_qr_and_assets() {
        let sources = ImageSources {
            qr_path: PathBuf::from("/scratch/code-qr.png"),
            assets_dir: PathBuf::from("templates"),
        };
        assert_eq!(sources.resolve("qr"), PathBuf::from("/scratch/code-qr.png"));
        assert_eq!(sources.resolve("logo"), PathBuf::from("templates/logo.png"));
        assert_eq!(
            sources.resolve("seal.jpg"),
            PathBuf::from("templates/seal.jpg")
        );
    }
}
