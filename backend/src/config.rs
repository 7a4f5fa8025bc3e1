//! Environment-sourced configuration.
//!
//! Everything the service needs from the outside world is loaded exactly once
//! at startup into an immutable [`Environment`] that is then shared by
//! reference (`Arc`) with every component. A missing required variable fails
//! startup with [`ConfigError::MissingEnvVar`]; nothing is read lazily at
//! request time.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

/// Startup-only configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Credentials and addressing for the S3-compatible blob store, parsed from
/// the `STORAGE_CONNECTION` connection string.
///
/// The connection string is a `key=value;` list: `access_key` and
/// `secret_key` are required, `endpoint` and `region` are optional
/// (`region` defaults to `us-east-1`).
#[derive(Debug, Clone, PartialEq)]
pub struct StorageSettings {
    pub access_key: String,
    pub secret_key: String,
    pub endpoint: Option<String>,
    pub region: String,
}

impl StorageSettings {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut access_key = None;
        let mut secret_key = None;
        let mut endpoint = None;
        let mut region = None;

        for part in raw.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (key, value) = part.split_once('=').ok_or_else(|| ConfigError::Invalid {
                var: "STORAGE_CONNECTION".into(),
                reason: format!("segment '{}' is not key=value", part),
            })?;
            // Keys are matched ignoring case and underscores so that both
            // `access_key` and `AccessKey` spellings work.
            match key.trim().to_ascii_lowercase().replace('_', "").as_str() {
                "accesskey" => access_key = Some(value.trim().to_string()),
                "secretkey" => secret_key = Some(value.trim().to_string()),
                "endpoint" => endpoint = Some(value.trim().to_string()),
                "region" => region = Some(value.trim().to_string()),
                _ => {}
            }
        }

        let missing = |key: &str| ConfigError::Invalid {
            var: "STORAGE_CONNECTION".into(),
            reason: format!("missing {} segment", key),
        };

        Ok(Self {
            access_key: access_key.ok_or_else(|| missing("access_key"))?,
            secret_key: secret_key.ok_or_else(|| missing("secret_key"))?,
            endpoint,
            region: region.unwrap_or_else(|| "us-east-1".to_string()),
        })
    }
}

/// Immutable runtime configuration, one instance per process.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Google service account used to read and write the sheet.
    pub service_account_email: String,
    /// RSA private key of the service account, PEM. Escaped `\n` sequences
    /// from env files are normalized to real newlines at load time.
    pub service_account_private_key: String,
    pub spreadsheet_id: String,
    /// Public site encoded into each certificate's QR code.
    pub website_url: String,
    /// Base URL where uploaded certificates are served from; injected into
    /// templates as `certificatesUrl`.
    pub certificates_url: String,
    /// Base URL for static template assets; injected as `assetsUrl`.
    pub assets_url: String,
    pub storage: StorageSettings,
    /// Bucket holding the generated artifacts.
    pub container_name: String,
    /// Local scratch root for intermediate artifacts.
    pub output_root: PathBuf,
    /// Maximum records processed concurrently by one pipeline run.
    pub generator_concurrency: usize,
    /// Per-record wall-clock budget; a timed-out record stays eligible.
    pub record_timeout_secs: u64,
    /// When set, a background task runs the pipeline on this cadence in
    /// addition to the HTTP trigger.
    pub generation_interval_minutes: Option<u64>,
    pub host: String,
    pub port: u16,
}

impl Environment {
    /// Loads configuration from the process environment. Reads `.env` first
    /// if one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let required = |name: &str| {
            env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
        };

        let storage = StorageSettings::parse(&required("STORAGE_CONNECTION")?)?;

        Ok(Self {
            service_account_email: required("SERVICE_ACCOUNT_EMAIL")?,
            service_account_private_key: required("SERVICE_ACCOUNT_PRIVATE_KEY")?
                .replace("\\n", "\n"),
            spreadsheet_id: required("SPREADSHEET_ID")?,
            website_url: required("WEBSITE_URL")?,
            certificates_url: required("CERTIFICATES_URL")?,
            assets_url: required("ASSETS_URL")?,
            storage,
            container_name: required("CONTAINER_NAME")?,
            output_root: env::var("OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("outputs")),
            generator_concurrency: parse_optional("GENERATOR_CONCURRENCY")?.unwrap_or(4),
            record_timeout_secs: parse_optional("RECORD_TIMEOUT_SECONDS")?.unwrap_or(120),
            generation_interval_minutes: require_positive(
                "GENERATION_INTERVAL_MINUTES",
                parse_optional("GENERATION_INTERVAL_MINUTES")?,
            )?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_optional("PORT")?.unwrap_or(8080),
        })
    }
}

/// Rejects an explicit zero. The interval feeds `tokio::time::interval`,
/// which panics on a zero period, so the value must fail startup instead.
fn require_positive(name: &str, value: Option<u64>) -> Result<Option<u64>, ConfigError> {
    match value {
        Some(0) => Err(ConfigError::Invalid {
            var: name.to_string(),
            reason: "must be greater than zero".into(),
        }),
        other => Ok(other),
    }
}

fn parse_optional<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var: name.to_string(),
                reason: format!("'{}' is not a valid number", raw),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_connection_string() {
        let settings = StorageSettings::parse(
            "access_key=AK;secret_key=SK;endpoint=http://localhost:9000;region=eu-west-1",
        )
        .unwrap();
        assert_eq!(settings.access_key, "AK");
        assert_eq!(settings.secret_key, "SK");
        assert_eq!(settings.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(settings.region, "eu-west-1");
    }

    #[test]
    fn region_defaults_and_key_spelling_is_lenient() {
        let settings = StorageSettings::parse("AccessKey=AK;SecretKey=SK;").unwrap();
        assert_eq!(settings.region, "us-east-1");
        assert_eq!(settings.endpoint, None);
    }

    #[test]
    fn zero_generation_interval_fails_at_load_time() {
        assert!(matches!(
            require_positive("GENERATION_INTERVAL_MINUTES", Some(0)),
            Err(ConfigError::Invalid { var, .. }) if var == "GENERATION_INTERVAL_MINUTES"
        ));
        assert_eq!(
            require_positive("GENERATION_INTERVAL_MINUTES", Some(30)).unwrap(),
            Some(30)
        );
        assert_eq!(
            require_positive("GENERATION_INTERVAL_MINUTES", None).unwrap(),
            None
        );
    }

    #[test]
    fn rejects_connection_string_without_credentials() {
        assert!(StorageSettings::parse("endpoint=http://localhost:9000").is_err());
        assert!(StorageSettings::parse("not a connection string").is_err());
    }
}
