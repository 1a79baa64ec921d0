//! End-to-end tests for the login and registration routes.
//!
//! Kratos is replaced by a wiremock server; the UI is served on an ephemeral port.

use authui::server::{AppState, router};
use authui_core::config::{Config, KratosConfig, ServerConfig};
use reqwest::StatusCode;
use reqwest::header::LOCATION;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BROWSER: &str = "http://kratos.test:4433";

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

struct Harness {
    kratos: MockServer,
    base: String,
    http: reqwest::Client,
}

impl Harness {
    async fn start(expose_errors: bool) -> Self {
        let kratos = MockServer::start().await;
        let config = Config {
            server: ServerConfig {
                expose_errors,
                ..Default::default()
            },
            kratos: KratosConfig {
                browser_url: Some(BROWSER.to_string()),
                admin_url: Some(kratos.uri()),
                ..Default::default()
            },
            ..Default::default()
        };

        let app = router(AppState::from_config(&config).unwrap());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            kratos,
            base: format!("http://{addr}"),
            http,
        }
    }

    async fn get(&self, path_and_query: &str) -> reqwest::Response {
        self.http
            .get(format!("{}{}", self.base, path_and_query))
            .send()
            .await
            .unwrap()
    }

    async fn mount_flow(&self, kind: &str, id: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(format!("/self-service/{kind}/flows")))
            .and(query_param("id", id))
            .respond_with(response)
            .expect(1)
            .mount(&self.kratos)
            .await;
    }
}

fn location(response: &reqwest::Response) -> &str {
    response.headers()[LOCATION].to_str().unwrap()
}

fn password_flow(active: Option<&str>) -> serde_json::Value {
    let mut flow = json!({
        "id": "f-1",
        "type": "browser",
        "methods": {
            "password": {
                "method": "password",
                "config": {
                    "action": "http://kratos.test:4433/self-service/registration/methods/password?flow=f-1",
                    "method": "POST",
                    "fields": [
                        {"name": "csrf_token", "type": "hidden", "value": "tok"},
                        {"name": "password", "type": "password"},
                        {"name": "traits.email", "type": "email", "value": "a@b.c"}
                    ]
                }
            },
            "oidc": {
                "method": "oidc",
                "config": {
                    "action": "http://kratos.test:4433/self-service/methods/oidc/auth/f-1",
                    "method": "POST",
                    "fields": [{"name": "provider", "type": "submit", "value": "github"}]
                }
            }
        }
    });
    if let Some(active) = active {
        flow["active"] = json!(active);
    }
    flow
}

#[tokio::test]
async fn test_missing_flow_redirects_to_browser_flow() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let harness = Harness::start(false).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&harness.kratos)
        .await;

    for (route, kind) in [("/auth/login", "login"), ("/auth/registration", "registration")] {
        for query in ["", "?flow=", "?flow=a&flow=b"] {
            let response = harness.get(&format!("{route}{query}")).await;
            assert_eq!(response.status(), StatusCode::FOUND, "{route}{query}");
            assert_eq!(
                location(&response),
                format!("{BROWSER}/self-service/{kind}/browser")
            );
        }
    }
}

#[tokio::test]
async fn test_expired_flow_redirects() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let harness = Harness::start(false).await;
    harness
        .mount_flow("login", "old", ResponseTemplate::new(410))
        .await;

    let response = harness.get("/auth/login?flow=old").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("{BROWSER}/self-service/login/browser"));
}

#[tokio::test]
async fn test_resolved_flow_renders_form() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let harness = Harness::start(false).await;
    harness
        .mount_flow(
            "registration",
            "f-1",
            ResponseTemplate::new(200).set_body_json(password_flow(None)),
        )
        .await;

    let response = harness.get("/auth/registration?flow=f-1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.unwrap();

    assert!(html.contains("<h1>Create an account</h1>"));
    assert!(html.contains(r#"value="github""#));
    let email = html.find(r#"name="traits.email""#).unwrap();
    let password = html.find(r#"name="password""#).unwrap();
    let csrf = html.find(r#"name="csrf_token""#).unwrap();
    assert!(email < password && password < csrf);
}

#[tokio::test]
async fn test_active_method_hides_other_forms() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let harness = Harness::start(false).await;
    harness
        .mount_flow(
            "login",
            "f-1",
            ResponseTemplate::new(200).set_body_json(password_flow(Some("password"))),
        )
        .await;

    let html = harness.get("/auth/login?flow=f-1").await.text().await.unwrap();
    assert!(html.contains(r#"name="password""#));
    assert!(!html.contains(r#"value="github""#));
}

#[tokio::test]
async fn test_upstream_failure_renders_error_page() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let harness = Harness::start(false).await;
    harness
        .mount_flow(
            "login",
            "f-1",
            ResponseTemplate::new(500).set_body_string("kratos internal failure"),
        )
        .await;

    let response = harness.get("/auth/login?flow=f-1").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(response.headers().get(LOCATION).is_none());
    let html = response.text().await.unwrap();
    assert!(html.contains("Something went wrong"));
    assert!(!html.contains("kratos internal failure"));
}

#[tokio::test]
async fn test_upstream_body_shown_when_exposed() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let harness = Harness::start(true).await;
    harness
        .mount_flow(
            "registration",
            "f-1",
            ResponseTemplate::new(502).set_body_string("kratos internal failure"),
        )
        .await;

    let response = harness.get("/auth/registration?flow=f-1").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(response.text().await.unwrap().contains("kratos internal failure"));
}

#[tokio::test]
async fn test_root_and_health_routes() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let harness = Harness::start(false).await;

    let root = harness.get("/").await;
    assert_eq!(root.status(), StatusCode::FOUND);
    assert_eq!(location(&root), "/auth/login");

    let health = harness.get("/health/alive").await;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(health.text().await.unwrap(), "ok");
}
