//! REST client for seeding fixtures through the application API
//!
//! Every call is a fresh request: no retries, no caching. Transport failures
//! surface as [`Error::Http`]; an unexpected status is only an error once the
//! caller asks for it via [`ApiResponse::expect_success`].

use std::fmt;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{
    AnnotationPayload, CandidatePayload, ClassificationPayload, Envelope, GroupPayload,
    PhotometryPayload, SourcePayload, TaxonomyPayload,
};

/// HTTP methods the API accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Root URL of the application server
    pub server_url: String,

    /// Keyword placed before the token in the `Authorization` header
    pub auth_scheme: String,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            auth_scheme: "token".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Status code and decoded JSON body of one API call
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub method: Method,
    pub path: String,
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    /// `(status_code, body)` pair
    pub fn into_parts(self) -> (u16, Value) {
        (self.status, self.body)
    }

    /// The body as a `{status, data}` envelope, if it has that shape
    pub fn envelope(&self) -> Option<Envelope> {
        Envelope::deserialize(&self.body).ok()
    }

    pub fn is_success(&self) -> bool {
        self.status == 200 && self.envelope().map_or(false, |e| e.is_success())
    }

    /// Return the envelope's `data`, or fail naming the call and what came back
    pub fn expect_success(self) -> Result<Value> {
        match self.envelope() {
            Some(envelope) if self.status == 200 && envelope.is_success() => Ok(envelope.data),
            _ => Err(Error::UnexpectedStatus {
                method: self.method.to_string(),
                path: self.path,
                status: self.status,
                body: self.body,
            }),
        }
    }
}

/// Thin async client over the application's `/api/` surface
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_root: Url,
    auth_scheme: String,
}

impl ApiClient {
    /// Create a new client rooted at `config.server_url`
    pub fn new(config: ApiConfig) -> Result<Self> {
        let mut server = config.server_url.clone();
        if !server.ends_with('/') {
            server.push('/');
        }
        let api_root = Url::parse(&server)
            .and_then(|u| u.join("api/"))
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", config.server_url, e)))?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            api_root,
            auth_scheme: config.auth_scheme,
        })
    }

    /// Resolve an endpoint path against the API root
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.api_root
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// Issue one request and decode the reply
    pub async fn api<T>(
        &self,
        method: Method,
        path: &str,
        data: Option<&T>,
        token: Option<&str>,
    ) -> Result<ApiResponse>
    where
        T: Serialize + ?Sized,
    {
        let url = self.endpoint(path)?;
        debug!("{} {}", method, url);

        let mut request = self.http.request(method.to_reqwest(), url);
        if let Some(body) = data {
            request = request.json(body);
        }
        if let Some(token) = token {
            request = request.header(
                reqwest::header::AUTHORIZATION,
                format!("{} {}", self.auth_scheme, token),
            );
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => value,
                Err(e) if status.is_success() => {
                    return Err(Error::Decode {
                        path: path.to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(_) => {
                    warn!("{} {} returned {} with a non-JSON body", method, path, status);
                    Value::Null
                }
            }
        };

        debug!("{} {} -> {}", method, path, status.as_u16());

        Ok(ApiResponse {
            method,
            path: path.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    /// POST `data` with `token` and return the raw response
    pub async fn post<T>(&self, path: &str, data: &T, token: &str) -> Result<ApiResponse>
    where
        T: Serialize + ?Sized,
    {
        self.api(Method::Post, path, Some(data), Some(token)).await
    }

    async fn post_expecting<T>(&self, path: &str, data: &T, token: &str) -> Result<Value>
    where
        T: Serialize + ?Sized,
    {
        self.post(path, data, token).await?.expect_success()
    }

    pub async fn post_candidate(&self, candidate: &CandidatePayload, token: &str) -> Result<Value> {
        self.post_expecting("candidates", candidate, token).await
    }

    pub async fn post_source(&self, source: &SourcePayload, token: &str) -> Result<Value> {
        self.post_expecting("sources", source, token).await
    }

    /// Create a group and return its id
    pub async fn post_group(&self, group: &GroupPayload, token: &str) -> Result<i64> {
        let data = self.post_expecting("groups", group, token).await?;
        id_field(&data, "groups", "id")
    }

    pub async fn post_photometry(
        &self,
        photometry: &PhotometryPayload,
        token: &str,
    ) -> Result<Value> {
        self.post_expecting("photometry", photometry, token).await
    }

    pub async fn post_annotation(
        &self,
        annotation: &AnnotationPayload,
        token: &str,
    ) -> Result<Value> {
        self.post_expecting("annotation", annotation, token).await
    }

    /// Create a taxonomy and return its id
    pub async fn post_taxonomy(&self, taxonomy: &TaxonomyPayload, token: &str) -> Result<i64> {
        let data = self.post_expecting("taxonomy", taxonomy, token).await?;
        id_field(&data, "taxonomy", "taxonomy_id")
    }

    pub async fn post_classification(
        &self,
        classification: &ClassificationPayload,
        token: &str,
    ) -> Result<Value> {
        self.post_expecting("classification", classification, token).await
    }
}

fn id_field(data: &Value, path: &str, field: &str) -> Result<i64> {
    data.get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::MissingField {
            path: path.to_string(),
            field: field.to_string(),
        })
}
