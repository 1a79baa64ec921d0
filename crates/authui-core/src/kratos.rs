//! Kratos admin API client.
//!
//! The UI never talks to Kratos beyond two lookups: fetch a login flow and fetch
//! a registration flow. Both are exposed through [`FlowSource`] so request
//! handling can be exercised against canned responses.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::KratosConfig;
use crate::error::{FlowError, FlowResult};
use crate::flow::{FlowId, FlowKind};

/// Standard User-Agent header for outbound lookups.
pub const USER_AGENT: &str = concat!("authui/", env!("CARGO_PKG_VERSION"));

/// Status and raw body of a flow lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowResponse {
    pub status: u16,
    /// `None` when the provider sent no body at all
    pub body: Option<String>,
}

impl FlowResponse {
    pub fn new(status: u16, body: Option<String>) -> Self {
        Self {
            status,
            body: body.filter(|b| !b.trim().is_empty()),
        }
    }
}

/// Read-only access to self-service flows.
///
/// Any HTTP status is a successful lookup; only failing to get an answer at
/// all is an error.
#[async_trait]
pub trait FlowSource: Send + Sync {
    async fn get_login_flow(&self, id: &FlowId) -> FlowResult<FlowResponse>;

    async fn get_registration_flow(&self, id: &FlowId) -> FlowResult<FlowResponse>;

    /// Dispatches to the lookup for `kind`.
    async fn get_flow(&self, kind: FlowKind, id: &FlowId) -> FlowResult<FlowResponse> {
        match kind {
            FlowKind::Login => self.get_login_flow(id).await,
            FlowKind::Registration => self.get_registration_flow(id).await,
        }
    }
}

/// HTTP client for the Kratos admin API.
#[derive(Debug, Clone)]
pub struct KratosClient {
    http: reqwest::Client,
    admin_url: String,
}

impl KratosClient {
    /// Creates a client against `admin_url` with an optional request timeout.
    pub fn new(admin_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build Kratos HTTP client")?;

        Ok(Self {
            http,
            admin_url: admin_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Creates a client from the `[kratos]` config section.
    pub fn from_config(config: &KratosConfig) -> Result<Self> {
        Self::new(config.effective_admin_url()?, config.timeout())
    }

    async fn fetch(&self, kind: FlowKind, id: &FlowId) -> FlowResult<FlowResponse> {
        let url = format!("{}{}", self.admin_url, kind.lookup_path());
        tracing::debug!(%kind, flow = %id, %url, "looking up flow");

        let response = self
            .http
            .get(&url)
            .query(&[("id", id.as_str())])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FlowError::transport(&e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FlowError::transport(&e))?;

        Ok(FlowResponse::new(status, Some(body)))
    }
}

#[async_trait]
impl FlowSource for KratosClient {
    async fn get_login_flow(&self, id: &FlowId) -> FlowResult<FlowResponse> {
        self.fetch(FlowKind::Login, id).await
    }

    async fn get_registration_flow(&self, id: &FlowId) -> FlowResult<FlowResponse> {
        self.fetch(FlowKind::Registration, id).await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::FlowErrorKind;

    fn flow_id(id: &str) -> FlowId {
        FlowId::from_query_values([id]).unwrap()
    }

    #[tokio::test]
    async fn test_login_lookup_hits_admin_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/self-service/login/flows"))
            .and(query_param("id", "abc"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"methods":{}}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = KratosClient::new(format!("{}/", server.uri()), None).unwrap();
        let response = client.get_login_flow(&flow_id("abc")).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body.as_deref(), Some(r#"{"methods":{}}"#));
    }

    #[tokio::test]
    async fn test_registration_lookup_returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/self-service/registration/flows"))
            .and(query_param("id", "gone"))
            .respond_with(ResponseTemplate::new(410).set_body_string(r#"{"error":{"code":410}}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = KratosClient::new(server.uri(), None).unwrap();
        let response = client
            .get_flow(FlowKind::Registration, &flow_id("gone"))
            .await
            .unwrap();

        assert_eq!(response.status, 410);
        assert_eq!(response.body.as_deref(), Some(r#"{"error":{"code":410}}"#));
    }

    #[tokio::test]
    async fn test_empty_body_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/self-service/login/flows"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = KratosClient::new(server.uri(), None).unwrap();
        let response = client.get_login_flow(&flow_id("x")).await.unwrap();

        assert_eq!(response, FlowResponse::new(200, None));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_transport_error() {
        // Bind and drop to get a port nothing listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = KratosClient::new(format!("http://127.0.0.1:{port}"), None).unwrap();

        let err = client.get_login_flow(&flow_id("x")).await.unwrap_err();
        assert_eq!(err.kind, FlowErrorKind::Transport);
        assert_eq!(err.status, None);
    }
}
