//! HTTP transport for the control-plane API
//!
//! A thin wrapper over `reqwest` that knows the base URL, the bearer token and the
//! content-type conventions of the API. Status checks and JSON decoding happen on
//! [`ApiResponse`] so every failure is reported against the step that issued it.

use reqwest::{Method, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::error::{CoreError, Result, excerpt};
use crate::step::Step;

/// User agent string for dbaasctl HTTP requests
const DBAASCTL_USER_AGENT: &str = concat!("dbaasctl/", env!("CARGO_PKG_VERSION"));

/// Content type sent with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    /// `*/*`, used by cluster deletion
    Any,
}

impl ContentType {
    fn as_str(self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::Any => "*/*",
        }
    }
}

/// Control-plane client
#[derive(Clone)]
pub struct DbaasClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for DbaasClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbaasClient")
            .field("base_url", &self.base_url)
            .field("authorized", &self.token.is_some())
            .finish()
    }
}

/// Raw response: status plus body text
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl DbaasClient {
    /// Create an unauthenticated client for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(DBAASCTL_USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self::with_http_client(http, base_url)
    }

    /// Create a client on top of a preconfigured `reqwest::Client`
    pub fn with_http_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            token: None,
        }
    }

    /// A copy of this client that sends `Authorization: Bearer <token>`
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: Some(token.into()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authorized(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send a request and return the raw response
    ///
    /// Only network and request-construction failures are errors here; status
    /// handling is left to the caller.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        step: Step,
        method: Method,
        path: &str,
        body: Option<&B>,
        content_type: ContentType,
    ) -> Result<ApiResponse> {
        let url = self.url(path);
        debug!("{} {} ({})", method, url, step.name());

        let mut request = self
            .http
            .request(method, &url)
            .header(header::CONTENT_TYPE, content_type.as_str());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            let payload =
                serde_json::to_vec(body).map_err(|source| CoreError::Decode { step, source })?;
            request = request.body(payload);
        }

        let response = request
            .send()
            .await
            .map_err(|source| CoreError::Transport { step, source })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| CoreError::Transport { step, source })?;
        trace!("{} -> {} ({} bytes)", url, status, body.len());

        Ok(ApiResponse { status, body })
    }

    pub async fn get(&self, step: Step, path: &str) -> Result<ApiResponse> {
        self.send::<()>(step, Method::GET, path, None, ContentType::Json)
            .await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        step: Step,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse> {
        self.send(step, Method::POST, path, Some(body), ContentType::Json)
            .await
    }

    pub async fn delete(
        &self,
        step: Step,
        path: &str,
        content_type: ContentType,
    ) -> Result<ApiResponse> {
        self.send::<()>(step, Method::DELETE, path, None, content_type)
            .await
    }

    /// GET and decode, requiring HTTP 200
    pub async fn get_json<T: DeserializeOwned>(&self, step: Step, path: &str) -> Result<T> {
        self.get(step, path)
            .await?
            .expect_status(step, StatusCode::OK)?
            .json(step)
    }
}

impl ApiResponse {
    /// Require an exact status code
    pub fn expect_status(self, step: Step, expected: StatusCode) -> Result<Self> {
        if self.status == expected {
            Ok(self)
        } else {
            Err(self.unexpected(step, expected.as_u16().to_string()))
        }
    }

    /// Require any 2xx status code
    pub fn expect_success(self, step: Step) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(self.unexpected(step, "2xx".to_string()))
        }
    }

    /// Decode the body into a typed model
    pub fn json<T: DeserializeOwned>(&self, step: Step) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|source| CoreError::Decode { step, source })
    }

    fn unexpected(&self, step: Step, expected: String) -> CoreError {
        CoreError::UnexpectedStatus {
            step,
            expected,
            actual: self.status.as_u16(),
            body: excerpt(&self.body),
        }
    }
}
