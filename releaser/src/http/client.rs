//! HTTP client implementation

use std::time::Duration;

use reqwest::{header, Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};
use url::Url;

use fleet_api_client::models::PineResponse;

use crate::errors::ReleaserError;
use crate::utils::RetryBackoff;

/// HTTP client options
#[derive(Debug, Clone)]
pub struct HttpClientOptions {
    /// Base URL of the pine API, including the version segment
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Attempts made for a GET before giving up on transport errors
    pub get_attempts: u32,

    /// Backoff between GET attempts
    pub backoff: RetryBackoff,
}

impl Default for HttpClientOptions {
    fn default() -> Self {
        Self {
            base_url: "https://api.balena-cloud.com/v6".to_string(),
            timeout: Duration::from_secs(30),
            get_attempts: 3,
            backoff: RetryBackoff::default(),
        }
    }
}

/// HTTP client for the fleet-management API
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: SecretString,
    get_attempts: u32,
    backoff: RetryBackoff,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(options: &HttpClientOptions, token: SecretString) -> Result<Self, ReleaserError> {
        let client = Client::builder().timeout(options.timeout).build()?;

        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            token,
            get_attempts: options.get_attempts.max(1),
            backoff: options.backoff.clone(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the URL of a resource with its query options
    pub fn resource_url(
        &self,
        resource: &str,
        query: &[(&str, String)],
    ) -> Result<Url, ReleaserError> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, resource))
            .map_err(|e| ReleaserError::ConfigError(format!("invalid API URL: {}", e)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Make a GET request, retrying transport failures
    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ReleaserError> {
        let mut attempt = 0;
        loop {
            debug!("GET {}", url);
            let sent = self
                .client
                .get(url.clone())
                .header(header::AUTHORIZATION, self.bearer())
                .send()
                .await;

            match sent {
                Ok(response) => {
                    let response = check_status("GET", response).await?;
                    return Ok(response.json().await?);
                }
                Err(e) if is_transient(&e) && attempt + 1 < self.get_attempts => {
                    let delay = self.backoff.delay(attempt);
                    warn!("GET {} failed ({}), retrying in {:?}", url, e, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// List rows of a pine resource matching `filter`
    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: &str,
        filter: String,
        select: &str,
    ) -> Result<Vec<T>, ReleaserError> {
        let url = self.resource_url(
            resource,
            &[("$filter", filter), ("$select", select.to_string())],
        )?;
        let response: PineResponse<T> = self.get(url).await?;
        Ok(response.d)
    }

    /// First row of a pine resource matching `filter`
    pub async fn first<T: DeserializeOwned>(
        &self,
        resource: &str,
        filter: String,
        select: &str,
    ) -> Result<Option<T>, ReleaserError> {
        let url = self.resource_url(
            resource,
            &[("$filter", filter), ("$select", select.to_string())],
        )?;
        let response: PineResponse<T> = self.get(url).await?;
        Ok(response.into_first())
    }

    /// Make a PATCH request
    pub async fn patch<B: Serialize>(&self, url: Url, body: &B) -> Result<(), ReleaserError> {
        debug!("PATCH {}", url);

        let response = self
            .client
            .patch(url)
            .header(header::AUTHORIZATION, self.bearer())
            .json(body)
            .send()
            .await?;

        check_status("PATCH", response).await?;
        Ok(())
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: Url) -> Result<(), ReleaserError> {
        debug!("DELETE {}", url);

        let response = self
            .client
            .delete(url)
            .header(header::AUTHORIZATION, self.bearer())
            .send()
            .await?;

        check_status("DELETE", response).await?;
        Ok(())
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}

async fn check_status(method: &str, response: Response) -> Result<Response, ReleaserError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error!("HTTP {} failed: {} - {}", method, status, body);
    Err(ReleaserError::ApiError {
        status: status.as_u16(),
        body,
    })
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}
