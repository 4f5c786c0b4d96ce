//! Integration tests using mock HTTP servers
//!
//! Tests the full flow: configuration → authenticator → signed requests

use clap::Parser;
use rsapi_auth::auth::{Authenticator, CookieAuthenticator, OAuthAuthenticator};
use rsapi_auth::cli::{Cli, Runner};
use rsapi_auth::{Api, ClientConfig, CredentialConfig, DumpFormat, Error};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn host_of(server: &MockServer) -> String {
    server.address().to_string()
}

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

async fn mount_clouds(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/clouds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "EC2 us-east-1"}])))
        .mount(server)
        .await;
}

// ============================================================================
// Session cookie flows
// ============================================================================

#[tokio::test]
async fn test_password_config_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/sessions"))
        .and(body_json(json!({
            "email": "ops@example.com",
            "password": "s3cret",
            "account_href": "/api/accounts/60073"
        })))
        .respond_with(ResponseTemplate::new(204).insert_header("set-cookie", "rs_gbl=gbl; Path=/"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/clouds"))
        .and(header("cookie", "rs_gbl=gbl"))
        .and(header("x-account", "60073"))
        .and(header("x-api-version", "1.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(3)
        .mount(&mock_server)
        .await;

    let file = write_config(&format!(
        "host: {}\naccount_id: 60073\ncredentials:\n  type: password\n  email: ops@example.com\n  password: s3cret\n",
        host_of(&mock_server)
    ));
    let config = ClientConfig::load(file.path()).unwrap();
    let api = Api::from_config(&config).await.unwrap();

    for _ in 0..3 {
        let response = api.get("/api/clouds").await.unwrap();
        assert_eq!(response.status(), 200);
    }
}

#[tokio::test]
async fn test_login_follows_shard_redirect() {
    let global = MockServer::start().await;
    let shard = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/session/instance"))
        .respond_with(ResponseTemplate::new(301).insert_header(
            "location",
            format!("http://{}/api/session/instance", host_of(&shard)).as_str(),
        ))
        .expect(1)
        .mount(&global)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/session/instance"))
        .respond_with(ResponseTemplate::new(204).insert_header("set-cookie", "rs_gbl=shard"))
        .expect(1)
        .mount(&shard)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/user_data"))
        .and(header("cookie", "rs_gbl=shard"))
        .respond_with(ResponseTemplate::new(200).set_body_string("user data"))
        .expect(1)
        .mount(&shard)
        .await;

    let auth = Arc::new(CookieAuthenticator::instance("inst", 7));
    let api = Api::new(host_of(&global), Some(auth.clone() as Arc<dyn Authenticator>)).await;

    let response = api.get("api/user_data").await.unwrap();
    assert_eq!(response.text().await.unwrap(), "user data");
    assert_eq!(auth.host().await, host_of(&shard));
}

#[tokio::test]
async fn test_rejected_login_surfaces_at_connect() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/sessions"))
        .respond_with(ResponseTemplate::new(403).set_body_string("account disabled"))
        .mount(&mock_server)
        .await;

    let auth = Arc::new(CookieAuthenticator::password("a@b.c", "pw", 1));
    let err = Api::connect(host_of(&mock_server), auth).await.unwrap_err();

    assert_eq!(err.to_string(), "Authentication failed: HTTP 403: account disabled");
}

// ============================================================================
// Token flows
// ============================================================================

#[tokio::test]
async fn test_concurrent_requests_share_token_exchange() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/oauth2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "shared", "expires_in": 7200}))
                .set_delay(std::time::Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/clouds"))
        .and(header("authorization", "Bearer shared"))
        .respond_with(ResponseTemplate::new(200))
        .expect(20)
        .mount(&mock_server)
        .await;

    let auth: Arc<dyn Authenticator> = Arc::new(OAuthAuthenticator::new("rt"));
    let api = Arc::new(Api::new(host_of(&mock_server), Some(auth)).await);

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let api = Arc::clone(&api);
            tokio::spawn(async move { api.get("/api/clouds").await.map(|r| r.status()) })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 200);
    }
}

#[tokio::test]
async fn test_self_service_over_oauth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/oauth2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "at", "expires_in": 3600})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/catalog/new_session"))
        .and(query_param("account_id", "42"))
        .and(header("authorization", "Bearer at"))
        .respond_with(ResponseTemplate::new(302))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/manager/projects/42/executions"))
        .and(header("authorization", "Bearer at"))
        .and(header("x-api-version", "1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut config = ClientConfig::new(
        host_of(&mock_server),
        CredentialConfig::OAuth {
            refresh_token: "rt".into(),
        },
    );
    config.account_id = Some(42);
    config.self_service = true;

    let api = Api::from_config(&config).await.unwrap();
    for _ in 0..2 {
        let response = api.get("/api/manager/projects/42/executions").await.unwrap();
        assert_eq!(response.status(), 200);
    }
}

#[tokio::test]
async fn test_proxy_secret_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/user_data"))
        .and(header("x-rll-secret", "agent-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let file = write_config(&format!(
        "RS_RLL_PORT={}\nRS_RLL_SECRET=agent-secret\n",
        mock_server.address().port()
    ));
    let api = Api::from_rll_config(file.path()).await.unwrap();
    assert_eq!(api.host(), format!("localhost:{}", mock_server.address().port()));

    let response = api.get("/api/user_data").await.unwrap();
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_malformed_proxy_secret_file() {
    let file = write_config("RS_RLL_PORT=eighty\nRS_RLL_SECRET=s\n");
    let err = Api::from_rll_config(file.path()).await.unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

// ============================================================================
// Dumps
// ============================================================================

#[tokio::test]
async fn test_dump_keeps_bodies_and_cookies() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/sessions"))
        .respond_with(ResponseTemplate::new(204).insert_header("set-cookie", "rs_gbl=dumped"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/clouds"))
        .and(header("cookie", "rs_gbl=dumped"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "EC2 us-east-1"}])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth: Arc<dyn Authenticator> = Arc::new(CookieAuthenticator::password("a@b.c", "pw", 1));
    let api = Api::new(host_of(&mock_server), Some(auth)).await;
    api.enable_dump(DumpFormat::Json);

    let body: serde_json::Value = api.get("/api/clouds").await.unwrap().json().await.unwrap();
    assert_eq!(body[0]["name"], "EC2 us-east-1");
}

// ============================================================================
// CLI
// ============================================================================

#[tokio::test]
async fn test_cli_check_and_get() {
    let mock_server = MockServer::start().await;
    mount_clouds(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/sessions"))
        .and(header("authorization", "Bearer cli-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let file = write_config(&format!(
        "host: {}\ncredentials:\n  type: access_token\n  token: cli-token\n",
        host_of(&mock_server)
    ));
    let config = file.path().to_str().unwrap();

    let cli = Cli::try_parse_from(["rsapi-auth", "--config", config, "check"]).unwrap();
    Runner::new(cli).run().await.unwrap();

    let cli = Cli::try_parse_from(["rsapi-auth", "--config", config, "get", "/api/clouds"]).unwrap();
    Runner::new(cli).run().await.unwrap();
}

#[tokio::test]
async fn test_cli_check_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/sessions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let host = host_of(&mock_server);
    let cli = Cli::try_parse_from(["rsapi-auth", "--host", &host, "--access-token", "bad", "check"])
        .unwrap();
    let err = Runner::new(cli).run().await.unwrap_err();
    assert_eq!(err.status(), Some(401));
}
