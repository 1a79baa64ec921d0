//! HTTP surface: login/registration screens backed by Kratos flows.

use std::sync::Arc;

use anyhow::{Context, Result};
use authui_core::config::Config;
use authui_core::error::FlowError;
use authui_core::flow::{FlowId, FlowKind};
use authui_core::presenter::{FlowPresenter, Presentation};
use authui_core::render::{ErrorPage, Templates};
use authui_core::view::FieldLabels;
use axum::Router;
use axum::extract::{RawQuery, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared, read-only request state.
#[derive(Clone)]
pub struct AppState {
    presenter: Arc<FlowPresenter>,
    templates: Arc<Templates>,
    expose_errors: bool,
}

impl AppState {
    pub fn new(presenter: FlowPresenter, templates: Templates, expose_errors: bool) -> Self {
        Self {
            presenter: Arc::new(presenter),
            templates: Arc::new(templates),
            expose_errors,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let presenter = FlowPresenter::from_config(config).context("set up flow presenter")?;
        let labels = FieldLabels::new(config.presentation.labels.clone());
        let templates = Templates::new(labels).context("compile templates")?;
        Ok(Self::new(presenter, templates, config.server.expose_errors))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { redirect("/auth/login") }))
        .route("/health/alive", get(|| async { "ok" }))
        .route("/auth/login", get(login))
        .route("/auth/registration", get(registration))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves until ctrl-c.
pub async fn serve(config: &Config, addr: &str) -> Result<()> {
    let state = AppState::from_config(config)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    info!(
        addr = %listener.local_addr().context("read bound address")?,
        browser = %config.kratos.effective_browser_url()?,
        admin = %config.kratos.effective_admin_url()?,
        "starting authui"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve http")
}

/// Resolves on ctrl-c. If the handler cannot be installed, the server runs
/// until killed.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(e) => {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}

async fn login(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    show_flow(&state, FlowKind::Login, query.as_deref()).await
}

async fn registration(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    show_flow(&state, FlowKind::Registration, query.as_deref()).await
}

async fn show_flow(state: &AppState, kind: FlowKind, query: Option<&str>) -> Response {
    let flow_id = flow_id_from_query(query);

    match state.presenter.present(kind, flow_id.as_ref()).await {
        Ok(Presentation::Redirect(url)) => redirect(&url),
        Ok(Presentation::Render { template, view }) => {
            match state.templates.render_flow(template, &view) {
                Ok(html) => Html(html).into_response(),
                Err(e) => {
                    error!(%kind, error = %format!("{e:#}"), "failed to render flow");
                    error_page(
                        state,
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "The page could not be rendered.",
                        None,
                    )
                }
            }
        }
        Err(e) => flow_error(state, kind, &e),
    }
}

/// Collects every `flow` value so a repeated parameter is rejected.
fn flow_id_from_query(query: Option<&str>) -> Option<FlowId> {
    let query = query?;
    let values: Vec<String> = url::form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| key == "flow")
        .map(|(_, value)| value.into_owned())
        .collect();
    FlowId::from_query_values(values.iter().map(String::as_str))
}

fn redirect(url: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response()
}

fn flow_error(state: &AppState, kind: FlowKind, e: &FlowError) -> Response {
    error!(
        %kind,
        error_kind = %e.kind,
        status = ?e.status,
        details = e.body().unwrap_or_default(),
        "{e}"
    );
    let details = if state.expose_errors { e.body() } else { None };
    error_page(
        state,
        StatusCode::BAD_GATEWAY,
        "The identity service could not be reached. Please try again.",
        details,
    )
}

fn error_page(
    state: &AppState,
    status: StatusCode,
    message: &str,
    details: Option<&str>,
) -> Response {
    let page = ErrorPage {
        status: status.as_u16(),
        message: message.to_string(),
        details: details.map(str::to_string),
    };
    match state.templates.render_error(&page) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!(error = %format!("{e:#}"), "failed to render error page");
            (status, message.to_string()).into_response()
        }
    }
}
