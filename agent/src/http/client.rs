//! HTTP client implementation

use std::time::Duration;

use http::StatusCode;
use reqwest::{header, Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::errors::AgentError;

/// Outcome of a conditional GET against an ETag-aware endpoint
#[derive(Debug)]
pub enum Conditional<T> {
    /// The resource is unchanged since the presented validation token
    NotModified { etag: Option<String> },

    /// A fresh body, together with the validation token to present next time
    Fresh { etag: Option<String>, body: T },
}

/// Authorization header configuration
#[derive(Clone)]
pub struct Auth {
    /// Header scheme, e.g. "token" for the GitHub API or "Bearer"
    pub scheme: &'static str,

    /// The secret itself; never logged
    pub token: SecretString,
}

/// HTTP client for remote API communication
pub struct HttpClient {
    client: Client,
    base_url: String,
    auth: Option<Auth>,
}

impl HttpClient {
    /// Create a new HTTP client without authentication
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AgentError> {
        if timeout.is_zero() {
            return Err(AgentError::InvalidConfig(
                "http client timeout must be greater than zero".to_string(),
            ));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: None,
        })
    }

    /// Create a new HTTP client that attaches an authorization header
    pub fn with_auth(base_url: &str, timeout: Duration, auth: Auth) -> Result<Self, AgentError> {
        if auth.token.expose_secret().is_empty() {
            return Err(AgentError::InvalidConfig(
                "auth token must not be empty".to_string(),
            ));
        }

        let mut client = Self::new(base_url, timeout)?;
        client.auth = Some(auth);
        Ok(client)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(auth) => request.header(
                header::AUTHORIZATION,
                format!("{} {}", auth.scheme, auth.token.expose_secret()),
            ),
            None => request,
        }
    }

    fn etag_of(response: &Response) -> Option<String> {
        response
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    }

    /// Make a GET request, decoding the response body. A 404 maps to
    /// `NotFound`; any other non-success status maps to `UnexpectedStatus`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AgentError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.authorize(self.client.get(&url)).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(AgentError::NotFound(url));
        }
        if !status.is_success() {
            error!("HTTP GET failed: {} {}", status, url);
            return Err(AgentError::UnexpectedStatus(status.as_u16()));
        }

        let body = response.json().await?;
        Ok(body)
    }

    /// Make a conditional GET request, presenting the previous validation
    /// token via `If-None-Match`. Only 200 and 304 are anticipated; anything
    /// else maps to `UnexpectedStatus`.
    pub async fn get_conditional<T: DeserializeOwned>(
        &self,
        path: &str,
        etag: Option<&str>,
    ) -> Result<Conditional<T>, AgentError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} (conditional)", url);

        let mut request = self.authorize(self.client.get(&url));
        if let Some(etag) = etag {
            request = request.header(header::IF_NONE_MATCH, etag);
        }

        let response = request.send().await?;
        let status = response.status();
        let etag = Self::etag_of(&response);

        match status {
            StatusCode::NOT_MODIFIED => Ok(Conditional::NotModified { etag }),
            StatusCode::OK => {
                let body = response.json().await?;
                Ok(Conditional::Fresh { etag, body })
            }
            _ => {
                error!("HTTP conditional GET failed: {} {}", status, url);
                Err(AgentError::UnexpectedStatus(status.as_u16()))
            }
        }
    }

    /// Make a POST request that the remote must acknowledge with 201 Created
    pub async fn post_created<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), AgentError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self
            .authorize(self.client.post(&url))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::CREATED {
            error!("HTTP POST failed: {} {}", status, url);
            return Err(AgentError::UnexpectedStatus(status.as_u16()));
        }

        Ok(())
    }

    /// Make a POST request, returning the raw status code for the caller to
    /// interpret. Only transport failures error here.
    pub async fn post_raw<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<StatusCode, AgentError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self
            .authorize(self.client.post(&url))
            .json(body)
            .send()
            .await?;

        Ok(response.status())
    }

    /// Make a PUT request, returning the raw status code
    pub async fn put_raw<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<StatusCode, AgentError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("PUT {}", url);

        let response = self
            .authorize(self.client.put(&url))
            .json(body)
            .send()
            .await?;

        Ok(response.status())
    }
}
