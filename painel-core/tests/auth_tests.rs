// tests/auth_tests.rs
//
// Credential adapter and API client against a real HTTP server.

use std::sync::Arc;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use painel_core::api::AtendimentoApi;
use painel_core::auth::CredentialAdapter;
use painel_core::config::ConsoleConfig;
use painel_core::http::DefaultHttpClient;
use painel_core::models::Credentials;
use painel_core::Error;

async fn setup() -> (MockServer, Arc<AtendimentoApi>, CredentialAdapter) {
    let server = MockServer::start().await;
    let config = Arc::new(ConsoleConfig {
        api_base_url: Url::parse(&server.uri()).unwrap(),
        session_secret: "segredo".into(),
        ..ConsoleConfig::default()
    });
    let api = Arc::new(AtendimentoApi::new(Arc::new(DefaultHttpClient::new()), config.clone()));
    let adapter = CredentialAdapter::new(api.clone(), &config);
    (server, api, adapter)
}

#[tokio::test]
async fn test_unauthorized_login_yields_no_identity() -> Result<(), Error> {
    let (server, _api, adapter) = setup().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "a@ifce.edu.br", "password": "x"})))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthorized"})))
        .expect(1)
        .mount(&server)
        .await;

    let signed = adapter.sign_in(&Credentials::new("a@ifce.edu.br", "x")).await?;
    assert!(signed.is_none());
    Ok(())
}

#[tokio::test]
async fn test_missing_fields_skip_the_endpoint() {
    let (server, _api, adapter) = setup().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = adapter.authorize(&Credentials::new("  ", "x")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidCredentials(_)));
    let err = adapter.authorize(&Credentials::new("a@ifce.edu.br", "")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidCredentials(_)));
}

#[tokio::test]
async fn test_sign_in_and_restore_round_trip() -> Result<(), Error> {
    let (server, _api, adapter) = setup().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"id": "7", "email": "ana@ifce.edu.br", "name": "Ana", "role": "AVALIADOR"},
            "access_token": "acc",
            "refresh_token": "ref"
        })))
        .mount(&server)
        .await;

    let signed = adapter
        .sign_in(&Credentials::new("ana@ifce.edu.br", "senha"))
        .await?
        .expect("identity");
    assert_eq!(signed.session.access_token, "acc");
    assert_eq!(signed.session.refresh_token, "ref");
    assert_eq!(signed.session.user.email, "ana@ifce.edu.br");

    let restored = adapter.restore(&signed.token)?;
    assert_eq!(restored.session.user, signed.session.user);
    assert_eq!(restored.session.access_token, "acc");

    assert!(adapter.restore("nao.e.jwt").is_err());
    Ok(())
}

#[tokio::test]
async fn test_profile_is_fetched_with_bearer_token() -> Result<(), Error> {
    let (server, api, _adapter) = setup().await;
    Mock::given(method("GET"))
        .and(path("/atendentes/me"))
        .and(header("Authorization", "Bearer acc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "7", "nome": "Ana", "email": "ana@ifce.edu.br", "cargo": "ATENDENTE", "departamento": ""
        })))
        .mount(&server)
        .await;

    let operator = api.fetch_profile("acc").await?;
    assert_eq!(operator.name, "Ana");
    assert_eq!(operator.sector(), "Geral");

    let err = api.fetch_profile("outro").await.unwrap_err();
    assert!(matches!(err, Error::Profile(_)));
    Ok(())
}

#[tokio::test]
async fn test_media_upload_is_multipart_to_the_number() -> Result<(), Error> {
    let (server, api, _adapter) = setup().await;
    Mock::given(method("POST"))
        .and(path("/whatsapp/sendMediaFile/5585999990000"))
        .and(header("Authorization", "Bearer acc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mediaUrl": "https://cdn/x.png"})))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = api
        .send_media_file(
            "acc",
            painel_core::api::MediaUpload {
                number: "5585999990000".into(),
                caption: "Arquivo enviado pelo atendente".into(),
                kind: painel_core::models::MediaKind::Image,
                file_name: "x.png".into(),
                content_type: "image/png".into(),
                bytes: vec![1, 2, 3],
            },
        )
        .await?;
    assert_eq!(receipt.media_url.as_deref(), Some("https://cdn/x.png"));

    let requests = server.received_requests().await.unwrap_or_default();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"number\""));
    assert!(body.contains("5585999990000"));
    assert!(body.contains("name=\"attachment\"; filename=\"x.png\""));
    assert!(body.contains("name=\"presence\""));
    assert!(body.contains("composing"));
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("multipart/form-data"));
    Ok(())
}
