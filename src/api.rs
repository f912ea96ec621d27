// API client module: a small blocking HTTP client for the pharmacy's
// price list endpoint. One request per run, no retries; failures are
// classified and handed back to the caller.

use crate::config::{endpoint_url, AppConfig};
use crate::credentials::CredentialBlob;
use crate::error::{ApotekError, Result};
use crate::model::{DrugListPayload, RawDrugEntry};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use reqwest::StatusCode;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How much of an error body is kept in the error message.
const BODY_SNIPPET: usize = 200;

/// What one successful fetch returns: the drug list plus any cookies the
/// server set on the response (a refreshed session, typically).
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    pub drugs: Vec<RawDrugEntry>,
    pub refreshed_cookies: CredentialBlob,
}

/// Anything that can produce the raw drug list for a credential blob. The
/// pipeline talks to this rather than to [`ApiClient`] directly.
pub trait PriceListSource {
    fn fetch_price_list(&self, credential: &CredentialBlob) -> Result<FetchResult>;

    /// Where the list comes from, for messages.
    fn describe(&self) -> String;
}

/// Blocking client for `GET {base_url}/drugs`.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApotekError::Network)?;
        Ok(ApiClient {
            client,
            base_url: base_url.into(),
        })
    }

    /// Create an ApiClient from the config file, with `APOTEK_API_URL`
    /// taking precedence over `api.base_url`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.effective_base_url(), DEFAULT_TIMEOUT)
    }

    pub fn drugs_url(&self) -> String {
        endpoint_url(&self.base_url, "drugs")
    }

    /// Headers for an authenticated request: JSON accept plus the cookie
    /// blob verbatim.
    fn auth_headers(&self, credential: &CredentialBlob) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let cookie = HeaderValue::from_str(&credential.to_cookie_header()).map_err(|_| {
            ApotekError::Config("cookie values contain characters not allowed in a header".into())
        })?;
        headers.insert(COOKIE, cookie);
        Ok(headers)
    }
}

impl PriceListSource for ApiClient {
    fn fetch_price_list(&self, credential: &CredentialBlob) -> Result<FetchResult> {
        if credential.is_empty() {
            return Err(ApotekError::Config("credential blob is empty".into()));
        }

        let url = self.drugs_url();
        tracing::debug!(
            method = "GET",
            %url,
            cookies = ?credential.names().collect::<Vec<_>>(),
            "requesting drug list"
        );

        let res = self
            .client
            .get(&url)
            .headers(self.auth_headers(credential)?)
            .send()
            .map_err(ApotekError::Network)?;

        let status = res.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApotekError::Authentication {
                status: status.as_u16(),
                url,
            });
        }

        let mut refreshed_cookies = CredentialBlob::new();
        for cookie in res.cookies() {
            refreshed_cookies.insert(cookie.name(), cookie.value());
        }

        let body = res.text().map_err(ApotekError::Network)?;
        if !status.is_success() {
            return Err(ApotekError::UnexpectedResponse(format!(
                "server returned {}: {}",
                status,
                snippet(&body)
            )));
        }

        let payload: DrugListPayload = serde_json::from_str(&body).map_err(|e| {
            ApotekError::UnexpectedResponse(format!(
                "drug list is not valid JSON of the expected shape ({}): {}",
                e,
                snippet(&body)
            ))
        })?;
        let drugs = payload.into_entries();

        tracing::debug!(count = drugs.len(), refreshed = refreshed_cookies.len(), "received drug list");
        Ok(FetchResult {
            drugs,
            refreshed_cookies,
        })
    }

    fn describe(&self) -> String {
        self.drugs_url()
    }
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_SNIPPET) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
