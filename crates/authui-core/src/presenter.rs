//! Per-request entry point: resolve the flow, then shape it for rendering.

use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::error::FlowResult;
use crate::flow::{FlowId, FlowKind};
use crate::kratos::{FlowSource, KratosClient};
use crate::resolver::{FlowResolver, Resolution};
use crate::view::{ViewModel, ViewModelBuilder};

/// What the HTTP layer should do with a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Presentation {
    Redirect(String),
    Render { template: FlowKind, view: ViewModel },
}

/// Built once at startup and shared read-only across requests.
pub struct FlowPresenter {
    resolver: FlowResolver,
    builder: ViewModelBuilder,
}

impl FlowPresenter {
    pub fn new(resolver: FlowResolver, builder: ViewModelBuilder) -> Self {
        Self { resolver, builder }
    }

    /// Wires a Kratos client and presentation settings from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = KratosClient::from_config(&config.kratos)?;
        Self::with_source(config, Arc::new(client))
    }

    /// Same as [`FlowPresenter::from_config`] with a caller-supplied flow source.
    pub fn with_source(config: &Config, source: Arc<dyn FlowSource>) -> Result<Self> {
        let resolver = FlowResolver::new(source, config.kratos.effective_browser_url()?);
        let builder = ViewModelBuilder::from_config(&config.presentation);
        Ok(Self::new(resolver, builder))
    }

    pub async fn present(
        &self,
        kind: FlowKind,
        flow_id: Option<&FlowId>,
    ) -> FlowResult<Presentation> {
        match self.resolver.resolve(kind, flow_id).await? {
            Resolution::RedirectToFreshFlow(url) => Ok(Presentation::Redirect(url)),
            Resolution::Resolved(flow) => Ok(Presentation::Render {
                template: kind,
                view: self.builder.build(flow),
            }),
        }
    }
}
