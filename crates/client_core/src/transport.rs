use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, RequestBuilder, Response};
use serde_json::Value;
use shared::error::ApiErrorBody;
use tracing::debug;
use url::Url;

use crate::{
    config::{AuthScheme, EngineSettings},
    credentials::CredentialProvider,
    error::NetworkError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Patch,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Post => "POST",
        }
    }
}

/// REST backend as seen by the engine. Timeouts and connection reuse belong
/// to the implementation.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn get_json(&self, path: &str, query: &[(String, String)]) -> Result<Value, NetworkError>;

    async fn send_json(
        &self,
        method: HttpMethod,
        path: &str,
        body: &Value,
    ) -> Result<Value, NetworkError>;
}

pub struct MissingTransport;

#[async_trait]
impl ApiTransport for MissingTransport {
    async fn get_json(
        &self,
        path: &str,
        _query: &[(String, String)],
    ) -> Result<Value, NetworkError> {
        Err(NetworkError::Transport(format!(
            "no transport configured for GET {path}"
        )))
    }

    async fn send_json(
        &self,
        method: HttpMethod,
        path: &str,
        _body: &Value,
    ) -> Result<Value, NetworkError> {
        Err(NetworkError::Transport(format!(
            "no transport configured for {} {path}",
            method.as_str()
        )))
    }
}

pub struct HttpTransport {
    http: Client,
    base_url: Url,
    auth_scheme: AuthScheme,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpTransport {
    pub fn new(
        http: Client,
        base_url: Url,
        auth_scheme: AuthScheme,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            http,
            base_url: with_trailing_slash(base_url),
            auth_scheme,
            credentials,
        }
    }

    pub fn from_settings(
        settings: &EngineSettings,
        credentials: Arc<dyn CredentialProvider>,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self::new(
            http,
            settings.base_url()?,
            settings.auth_scheme,
            credentials,
        ))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, NetworkError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| NetworkError::Transport(format!("invalid request path {path}: {err}")))
    }

    fn authorize(&self, builder: RequestBuilder) -> Result<RequestBuilder, NetworkError> {
        let token = self
            .credentials
            .token()
            .ok_or(NetworkError::MissingCredential)?;
        Ok(builder.header(
            AUTHORIZATION,
            format!("{} {token}", self.auth_scheme.header_prefix()),
        ))
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn get_json(&self, path: &str, query: &[(String, String)]) -> Result<Value, NetworkError> {
        let url = self.url(path)?;
        let request = self.authorize(self.http.get(url.clone()).query(query))?;
        debug!(method = "GET", %url, params = query.len(), "api request");
        read_json(request.send().await?).await
    }

    async fn send_json(
        &self,
        method: HttpMethod,
        path: &str,
        body: &Value,
    ) -> Result<Value, NetworkError> {
        let url = self.url(path)?;
        let builder = match method {
            HttpMethod::Get => self.http.get(url.clone()),
            HttpMethod::Patch => self.http.patch(url.clone()),
            HttpMethod::Post => self.http.post(url.clone()),
        };
        let request = self.authorize(builder.json(body))?;
        debug!(method = method.as_str(), %url, "api request");
        read_json(request.send().await?).await
    }
}

async fn read_json(response: Response) -> Result<Value, NetworkError> {
    let status = response.status();
    if !status.is_success() {
        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&raw)
            .ok()
            .and_then(|body| ApiErrorBody::from_value(&body).message())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        return Err(NetworkError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
