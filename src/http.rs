//! Request pipeline: auth header injection and envelope normalization.

use crate::response::ApiEnvelope;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Outbound method. Delete is wired as a POST with an empty body upstream
/// (see the controller), so only these two exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// One fully resolved outbound request.
#[derive(Clone, Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

/// Raw reply text plus status. The envelope shape is uniform across
/// statuses, so the status is only logged.
#[derive(Clone, Debug)]
pub struct RawReply {
    pub status: u16,
    pub body: String,
}

/// A failure that produced no response at all.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Send(String),
    #[error("body read failed: {0}")]
    Body(String),
}

/// Transport seam. The production impl speaks reqwest; tests script
/// replies.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<RawReply, TransportError>;
}

/// Token acquisition is an external capability. `None` means the session
/// is unauthenticated and the request goes out without a bearer header.
#[async_trait]
pub trait Identity: Send + Sync {
    async fn access_token(&self) -> Option<String>;
}

/// Identity for unauthenticated sessions.
pub struct Anonymous;

#[async_trait]
impl Identity for Anonymous {
    async fn access_token(&self) -> Option<String> {
        None
    }
}

/// Fixed bearer token, for demos and tests.
pub struct StaticToken(pub String);

#[async_trait]
impl Identity for StaticToken {
    async fn access_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Production transport. No client-side timeout: a hung call hangs the
/// operation.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> ReqwestTransport {
        ReqwestTransport {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> ReqwestTransport {
        ReqwestTransport::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawReply, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        builder = builder
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;
        Ok(RawReply { status, body })
    }
}

/// Wraps outbound calls: resolves the bearer token, issues the request,
/// and normalizes every outcome into `ApiEnvelope<Value>` so callers
/// handle success and failure with one code path.
pub struct RequestPipeline {
    transport: Arc<dyn HttpTransport>,
    identity: Arc<dyn Identity>,
}

impl RequestPipeline {
    pub fn new(transport: Arc<dyn HttpTransport>, identity: Arc<dyn Identity>) -> RequestPipeline {
        RequestPipeline {
            transport,
            identity,
        }
    }

    /// Execute with a bearer header when the identity yields a token.
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> ApiEnvelope<Value> {
        let bearer = self.identity.access_token().await;
        self.dispatch(method, url, body, bearer).await
    }

    /// Execute without auth (the API root discovery fetch).
    pub async fn execute_unauthenticated(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> ApiEnvelope<Value> {
        self.dispatch(method, url, body, None).await
    }

    async fn dispatch(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
        bearer: Option<String>,
    ) -> ApiEnvelope<Value> {
        tracing::debug!(method = method.as_str(), url = %url, authenticated = bearer.is_some(), "request");
        let reply = self
            .transport
            .send(OutboundRequest {
                method,
                url: url.to_string(),
                body,
                bearer,
            })
            .await;
        match reply {
            Err(err) => {
                tracing::warn!(url = %url, error = %err, "transport failure");
                ApiEnvelope::unknown()
            }
            Ok(reply) => match serde_json::from_str::<ApiEnvelope<Value>>(&reply.body) {
                Ok(envelope) => envelope,
                Err(err) => {
                    tracing::warn!(url = %url, status = reply.status, error = %err, "unparseable response body");
                    ApiEnvelope::unknown()
                }
            },
        }
    }
}
