//! Minimal JSON-over-HTTP plumbing shared by the REST adapters

use gworkspace_retry::Fault;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use super::ApiResult;
use crate::error::{ProviderError, Result};

#[derive(Clone)]
pub(crate) struct RestClient {
    http: reqwest::Client,
    base: Url,
    access_token: Option<String>,
}

impl RestClient {
    pub(crate) fn new(
        http: reqwest::Client,
        base: &str,
        access_token: Option<String>,
    ) -> Result<Self> {
        // Relative joins drop the last segment unless the base ends in '/'.
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        let base = Url::parse(&normalized).map_err(|source| ProviderError::InvalidEndpoint {
            url: base.to_string(),
            source,
        })?;
        Ok(Self {
            http,
            base,
            access_token,
        })
    }

    /// Resolves `path` under the endpoint. Paths that would leave the
    /// endpoint (other host, scheme or parent directory) are rejected so the
    /// bearer token only ever goes to the configured API.
    pub(crate) fn url(&self, path: &str) -> ApiResult<Url> {
        let url = self
            .base
            .join(path)
            .map_err(|e| Fault::generic(format!("invalid request path {path:?}: {e}")))?;
        if url.origin() != self.base.origin() || !url.path().starts_with(self.base.path()) {
            return Err(Fault::generic(format!(
                "request path {path:?} resolves outside {}",
                self.base
            )));
        }
        Ok(url)
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!(%method, %url, "API request");
        let builder = self
            .http
            .request(method, url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = check_status(request.send().await?).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| Fault::generic(format!("failed to decode API response: {e}")))
    }

    pub(crate) async fn send_empty(&self, request: RequestBuilder) -> ApiResult<()> {
        check_status(request.send().await?).await?;
        Ok(())
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base", &self.base.as_str())
            .field("authenticated", &self.access_token.is_some())
            .finish()
    }
}

/// Turns a non-success response into an API fault carrying the raw body.
async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await?;
    tracing::debug!(status = status.as_u16(), "API error response: {body}");
    Err(Fault::api(status.as_u16(), body))
}
