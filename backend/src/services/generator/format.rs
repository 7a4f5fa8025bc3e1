//! Pure data shaping for the generation pipeline.
//!
//! Everything here is deterministic string work: stabilizing the record id,
//! rendering the issue date as a long Spanish date, reducing names to their
//! first token, and computing the artifact filename and blob keys. None of
//! it touches the eligibility flag; the pipeline decides the final flag
//! value only after the whole per-record sequence has settled.

use chrono::{Datelike, NaiveDate};
use common::model::Certificate;
use uuid::Uuid;

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Prepares a certificate for generation.
///
/// Assigns a fresh UUID when the row has no id yet, reformats the issue
/// date, keeps only the first whitespace-delimited token of `name` and
/// `lastname`, and computes the blob keys `{eventCode}/{id}/{filename}.pdf`
/// and `.png`.
pub fn format_certificate(mut certificate: Certificate) -> Certificate {
    if certificate.id.trim().is_empty() {
        certificate.id = Uuid::new_v4().to_string();
    }
    certificate.issue_date = long_date_format(&certificate.issue_date);
    certificate.name = first_token(&certificate.name);
    certificate.lastname = first_token(&certificate.lastname);

    let path = format!(
        "{}/{}/{}",
        certificate.event_code,
        certificate.id,
        filename_for(&certificate)
    );
    certificate.certificate_img_url = format!("{}.png", path);
    certificate.certificate_pdf_url = format!("{}.pdf", path);

    certificate
}

/// Deterministic artifact filename: `{name}-{lastname}-{event}` with every
/// whitespace character of the event name replaced by a hyphen. The id is
/// deliberately not part of the filename; it already scopes the blob key.
pub fn filename_for(certificate: &Certificate) -> String {
    let event: String = certificate
        .event_name
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();

    format!("{}-{}-{}", certificate.name, certificate.lastname, event)
}

/// Renders a raw date cell as a long Spanish date, e.g. `2024-03-05` →
/// `5 de marzo de 2024`. Accepts ISO (`%Y-%m-%d`) and day-first
/// (`%d/%m/%Y`) cells; anything unparseable passes through unchanged so a
/// hand-written date is kept rather than destroyed.
pub fn long_date_format(raw: &str) -> String {
    let raw = raw.trim();
    let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"));

    match parsed {
        Ok(date) => format!(
            "{} de {} de {}",
            date.day(),
            MONTHS[date.month0() as usize],
            date.year()
        ),
        Err(_) => raw.to_string(),
    }
}

fn first_token(value: &str) -> String {
    value
        .trim()
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use common::model::Conditional;

    use super::*;

    fn sample() -> Certificate {
        Certificate {
            name: "Ana María".into(),
            lastname: "Ruiz Paz".into(),
            event_name: "Dev Summit 2024".into(),
            event_code: "DS24".into(),
            issue_date: "2024-03-05".into(),
            should_be_generated: "YES".into(),
            template_name: "default".into(),
            ..Certificate::default()
        }
    }

    #[test]
    fn filename_reduces_names_to_first_tokens_and_hyphenates_the_event() {
        let formatted = format_certificate(sample());
        assert_eq!(
            filename_for(&formatted),
            "Ana-Ruiz-Dev-Summit-2024"
        );
    }

    #[test]
    fn filename_is_independent_of_the_generated_id() {
        let a = format_certificate(sample());
        let b = format_certificate(sample());
        assert_ne!(a.id, b.id);
        assert_eq!(filename_for(&a), filename_for(&b));
    }

    #[test]
    fn format_assigns_an_id_only_when_missing() {
        let generated = format_certificate(sample());
        assert!(!generated.id.is_empty());

        let mut with_id = sample();
        with_id.id = "existing".into();
        assert_eq!(format_certificate(with_id).id, "existing");
    }

    #[test]
    fn format_computes_artifact_keys_under_event_and_id() {
        let mut certificate = sample();
        certificate.id = "cert-1".into();
        let formatted = format_certificate(certificate);
        assert_eq!(
            formatted.certificate_pdf_url,
            "DS24/cert-1/Ana-Ruiz-Dev-Summit-2024.pdf"
        );
        assert_eq!(
            formatted.certificate_img_url,
            "DS24/cert-1/Ana-Ruiz-Dev-Summit-2024.png"
        );
    }

    #[test]
    fn format_leaves_the_eligibility_flag_untouched() {
        let formatted = format_certificate(sample());
        assert!(Conditional::Yes.matches(&formatted.should_be_generated));
    }

    #[test]
    fn long_dates_render_in_spanish() {
        assert_eq!(long_date_format("2024-03-05"), "5 de marzo de 2024");
        assert_eq!(long_date_format("31/12/2023"), "31 de diciembre de 2023");
    }

    #[test]
    fn unparseable_dates_pass_through() {
        assert_eq!(long_date_format("next spring"), "next spring");
        assert_eq!(long_date_format(""), "");
    }
}
