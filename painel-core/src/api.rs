// File: painel-core/src/api.rs
//
// Typed wrapper over the attendance backend endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use painel_common::models::{Credentials, MediaKind, Operator};

use crate::config::ConsoleConfig;
use crate::http::{bearer, FilePart, HttpClient, MultipartBody};
use crate::Error;

/// What the login endpoint answered.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// 2xx with a JSON object (user + tokens).
    Accepted(serde_json::Map<String, Value>),
    /// 401.
    Unauthorized,
    /// Any other status, or a body that is not an object.
    Rejected { status: u16 },
}

/// A media upload addressed to the requester's channel address.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    /// Requester channel address (phone number); never the session id.
    pub number: String,
    pub caption: String,
    pub kind: MediaKind,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MediaReceipt {
    #[serde(rename = "mediaUrl", default)]
    pub media_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InstanceNameResponse {
    #[serde(rename = "instanceName")]
    instance_name: Option<String>,
}

pub struct AtendimentoApi {
    http: Arc<dyn HttpClient>,
    config: Arc<ConsoleConfig>,
}

impl AtendimentoApi {
    pub fn new(http: Arc<dyn HttpClient>, config: Arc<ConsoleConfig>) -> Self {
        Self { http, config }
    }

    /// `POST /auth/login`.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome, Error> {
        let url = self.config.api_url("/auth/login");
        debug!("POST {} (email={})", url, credentials.email);
        let resp = self
            .http
            .post_json(url, json!({ "email": credentials.email, "password": credentials.password }))
            .await?;

        if resp.status == 401 {
            return Ok(LoginOutcome::Unauthorized);
        }
        if !resp.is_success() {
            warn!("login answered with status {}", resp.status);
            return Ok(LoginOutcome::Rejected { status: resp.status });
        }
        match serde_json::from_str::<Value>(&resp.body) {
            Ok(Value::Object(map)) if !map.is_empty() => Ok(LoginOutcome::Accepted(map)),
            _ => Ok(LoginOutcome::Rejected { status: resp.status }),
        }
    }

    /// `GET /atendentes/me` with the bearer token. A refused token is
    /// [`Error::Unauthorized`]; anything else non-OK is a profile error.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<Operator, Error> {
        let url = self.config.api_url("/atendentes/me");
        let mut headers = bearer(access_token);
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        let resp = self.http.get(url, headers).await?;
        if resp.status == 401 {
            return Err(Error::Unauthorized);
        }
        if !resp.is_success() {
            return Err(Error::Profile("Falha ao buscar perfil do usuário".into()));
        }
        resp.json::<Operator>()
            .map_err(|e| Error::Profile(format!("perfil inválido: {}", e)))
    }

    /// `GET /whatsapp/getInstanceName`.
    pub async fn instance_name(&self) -> Result<Option<String>, Error> {
        let url = self.config.api_url("/whatsapp/getInstanceName");
        let resp = self.http.get(url, HashMap::new()).await?;
        if !resp.is_success() {
            return Err(Error::Upload(format!("getInstanceName => status {}", resp.status)));
        }
        let parsed: InstanceNameResponse = resp.json()?;
        Ok(parsed.instance_name)
    }

    /// `POST /whatsapp/sendMediaFile/{number}` as multipart.
    pub async fn send_media_file(
        &self,
        access_token: &str,
        upload: MediaUpload,
    ) -> Result<MediaReceipt, Error> {
        let url = self.config.api_url(&format!(
            "/whatsapp/sendMediaFile/{}",
            urlencoding::encode(&upload.number)
        ));
        let body = MultipartBody::default()
            .text("number", upload.number.clone())
            .text("caption", upload.caption)
            .file(FilePart {
                field: "attachment".into(),
                file_name: upload.file_name,
                content_type: upload.content_type,
                bytes: upload.bytes,
            })
            .text("mediatype", upload.kind.as_str())
            .text("presence", "composing");

        let resp = self.http.post_multipart(url, bearer(access_token), body).await?;
        if !resp.is_success() {
            return Err(Error::Upload("Falha ao enviar arquivo".into()));
        }
        if resp.body.trim().is_empty() {
            return Ok(MediaReceipt::default());
        }
        Ok(resp.json::<MediaReceipt>().unwrap_or_default())
    }
}
