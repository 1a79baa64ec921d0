//! Flow resolution: decide between redirecting to a fresh flow and rendering
//! the one the browser came back with.

use std::sync::Arc;

use crate::error::{FlowError, FlowResult};
use crate::flow::{AuthFlow, FlowId, FlowKind};
use crate::kratos::{FlowResponse, FlowSource};

/// Statuses meaning the flow expired, never existed, or may not be shown.
/// Only Kratos can issue a replacement, so all of them restart the flow.
const RESTART_STATUSES: &[u16] = &[403, 404, 410];

/// Outcome of resolving a flow id.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Send the browser here to start a brand-new flow.
    RedirectToFreshFlow(String),
    Resolved(AuthFlow),
}

pub struct FlowResolver {
    source: Arc<dyn FlowSource>,
    browser_url: String,
}

impl FlowResolver {
    pub fn new(source: Arc<dyn FlowSource>, browser_url: impl Into<String>) -> Self {
        Self {
            source,
            browser_url: browser_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `{browser}/self-service/{kind}/browser`, without query parameters.
    pub fn fresh_flow_url(&self, kind: FlowKind) -> String {
        format!("{}{}", self.browser_url, kind.browser_path())
    }

    /// Resolves `flow_id` for `kind` with at most one lookup and no retries.
    pub async fn resolve(&self, kind: FlowKind, flow_id: Option<&FlowId>) -> FlowResult<Resolution> {
        let Some(flow_id) = flow_id else {
            tracing::info!(%kind, "no flow id found, initializing flow");
            return Ok(Resolution::RedirectToFreshFlow(self.fresh_flow_url(kind)));
        };

        let response = self.source.get_flow(kind, flow_id).await?;
        self.classify(kind, flow_id, response)
    }

    fn classify(
        &self,
        kind: FlowKind,
        flow_id: &FlowId,
        response: FlowResponse,
    ) -> FlowResult<Resolution> {
        let FlowResponse { status, body } = response;

        if RESTART_STATUSES.contains(&status) {
            tracing::info!(%kind, flow = %flow_id, status, "flow unavailable, restarting");
            return Ok(Resolution::RedirectToFreshFlow(self.fresh_flow_url(kind)));
        }

        if status != 200 {
            tracing::warn!(%kind, flow = %flow_id, status, "unexpected flow lookup status");
            return Err(FlowError::upstream(status, body));
        }

        let flow = match body.as_deref() {
            None => None,
            Some(raw) if raw.trim() == "null" => None,
            Some(raw) => Some(
                serde_json::from_str::<AuthFlow>(raw).map_err(|e| FlowError::decode(&e, raw))?,
            ),
        };

        match flow {
            Some(flow) => Ok(Resolution::Resolved(flow)),
            None => {
                tracing::info!(%kind, flow = %flow_id, "flow lookup returned no body, restarting");
                Ok(Resolution::RedirectToFreshFlow(self.fresh_flow_url(kind)))
            }
        }
    }
}
