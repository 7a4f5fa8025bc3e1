use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::auth::ServiceAccountAuth;
use super::{SheetError, SheetStore};
use crate::config::{ConfigError, Environment};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets/";
/// Full read range; the header row defines which columns are meaningful.
const READ_RANGE: &str = "A:Z";

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ColumnUpdate<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: [&'a [String]; 1],
}

/// Typed client for the Sheets v4 values API, bound to one spreadsheet.
pub struct SheetsClient {
    http: reqwest::Client,
    auth: ServiceAccountAuth,
    base_url: Url,
}

impl SheetsClient {
    /// Builds a client for the configured spreadsheet. Fails startup when the
    /// service-account key cannot be parsed.
    pub fn new(env: &Environment) -> Result<Self, ConfigError> {
        let auth =
            ServiceAccountAuth::new(&env.service_account_email, &env.service_account_private_key)?;

        let base_url = Url::parse(SHEETS_API_BASE)
            .and_then(|base| base.join(&format!("{}/", env.spreadsheet_id)))
            .map_err(|err| ConfigError::Invalid {
                var: "SPREADSHEET_ID".into(),
                reason: err.to_string(),
            })?;

        Ok(Self {
            http: reqwest::Client::new(),
            auth,
            base_url,
        })
    }

    fn values_url(&self, range: &str) -> Result<Url, SheetError> {
        self.base_url
            .join(&format!("values/{}", range))
            .map_err(|source| SheetError::InvalidUrl {
                url: format!("{}values/{}", self.base_url, range),
                source,
            })
    }
}

#[async_trait]
impl SheetStore for SheetsClient {
    async fn fetch_grid(&self) -> Result<Vec<Vec<String>>, SheetError> {
        let token = self.auth.bearer_token().await?;
        let url = self.values_url(READ_RANGE)?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| SheetError::Http(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SheetError::UnexpectedStatus(response.status()));
        }

        let payload: ValueRange = response
            .json()
            .await
            .map_err(|err| SheetError::Decode(err.to_string()))?;

        Ok(payload.values)
    }

    async fn update_column(&self, range: &str, values: &[String]) -> Result<(), SheetError> {
        let token = self.auth.bearer_token().await?;
        let mut url = self.values_url(range)?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW");

        let body = ColumnUpdate {
            range,
            major_dimension: "COLUMNS",
            values: [values],
        };

        let response = self
            .http
            .put(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|err| SheetError::Http(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SheetError::UnexpectedStatus(response.status()));
        }

        Ok(())
    }
}
