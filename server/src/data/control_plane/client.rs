use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::config::ControlPlaneConfig;
use crate::core::constants::{API_KEY_HEADER, APP_NAME_LOWER};

use super::error::ControlPlaneError;
use super::request::{ApiRequest, Presented, Shape};

/// Shared, immutable HTTP client bound to one control plane
#[derive(Debug, Clone)]
pub struct ControlPlaneClient {
    http: reqwest::Client,
    base_url: String,
    dashboard_url: String,
}

impl ControlPlaneClient {
    pub fn new(config: &ControlPlaneConfig) -> Result<Self, ControlPlaneError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(token)
                .map_err(|e| ControlPlaneError::Config(format!("invalid token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("{}/{}", APP_NAME_LOWER, env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| ControlPlaneError::Config(format!("failed to build HTTP client: {}", e)))?;

        tracing::debug!(
            address = %config.address,
            timeout_secs = config.timeout.as_secs(),
            "Control plane client initialized"
        );

        Ok(Self {
            http,
            base_url: config.address.clone(),
            dashboard_url: config.dashboard_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Dashboard link for a console page, e.g. `/roles/{id}`
    pub fn console_url(&self, page: &str) -> String {
        format!("{}{}", self.dashboard_url, page)
    }

    /// Decode the raw response body into `T`
    pub async fn fetch<T: DeserializeOwned>(&self, req: &ApiRequest) -> Result<T, ControlPlaneError> {
        let body = self.send(req).await?;
        serde_json::from_value(body).map_err(|e| ControlPlaneError::decode(req.path(), e))
    }

    /// Shape the response body for presentation
    pub async fn present(&self, req: &ApiRequest, shape: Shape) -> Result<Presented, ControlPlaneError> {
        self.present_with(req, shape, |value| value).await
    }

    /// Shape the response body, then post-process it with `handler`
    pub async fn present_with<F>(
        &self,
        req: &ApiRequest,
        shape: Shape,
        handler: F,
    ) -> Result<Presented, ControlPlaneError>
    where
        F: FnOnce(Value) -> Value,
    {
        let body = self.send(req).await?;
        Ok(Presented::new(handler(shape.apply(body))))
    }

    async fn send(&self, req: &ApiRequest) -> Result<Value, ControlPlaneError> {
        let url = format!("{}{}", self.base_url, req.path);
        tracing::debug!(method = %req.method, path = %req.path, "Control plane request");

        let mut builder = self.http.request(req.method.clone(), &url);
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.inspect_err(|e| {
            tracing::warn!(method = %req.method, path = %req.path, error = %e, "Control plane request failed");
        })?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        let body = parse_body(&bytes);

        if !status.is_success() {
            tracing::warn!(
                method = %req.method,
                path = %req.path,
                status = status.as_u16(),
                "Control plane returned an error status"
            );
            return Err(ControlPlaneError::Status {
                method: req.method.clone(),
                path: req.path.clone(),
                status,
                body,
            });
        }

        Ok(body)
    }
}

/// JSON body, the raw text when it is not JSON, or null when empty
fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
