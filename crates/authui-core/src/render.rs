//! HTML rendering of flow and error pages.
//!
//! Templates are embedded at compile time. The flow templates are named after
//! the flow kind (`login`, `registration`).

use anyhow::{Context, Result};
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

use crate::flow::FlowKind;
use crate::view::{FieldLabels, ViewModel};

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("macros.html", include_str!("../templates/macros.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("registration.html", include_str!("../templates/registration.html")),
    ("error.html", include_str!("../templates/error.html")),
];

/// Payload of the generic error page.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPage {
    pub status: u16,
    pub message: String,
    pub details: Option<String>,
}

/// Compiled template set shared by every request.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new(labels: FieldLabels) -> Result<Self> {
        let mut env = Environment::new();
        // Provider payloads omit optional attributes freely.
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)
                .with_context(|| format!("Failed to compile template {name}"))?;
        }
        env.add_filter("label", move |name: &str| labels.label(name).to_string());

        Ok(Self { env })
    }

    /// Renders the template named after `kind`.
    pub fn render_flow(&self, kind: FlowKind, view: &ViewModel) -> Result<String> {
        self.render(&format!("{}.html", kind.as_str()), view)
    }

    pub fn render_error(&self, page: &ErrorPage) -> Result<String> {
        self.render("error.html", page)
    }

    fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String> {
        self.env
            .get_template(name)
            .with_context(|| format!("Unknown template {name}"))?
            .render(ctx)
            .with_context(|| format!("Failed to render template {name}"))
    }
}
