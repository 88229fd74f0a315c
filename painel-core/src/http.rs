//! HTTP Client abstraction layer for the attendance backend
//!
//! This module provides a generic interface for the few HTTP calls the console makes
//! (login, profile, instance name and media upload). The abstraction serves two purposes:
//!
//! - Enables mocking of HTTP calls during testing without requiring real network requests
//! - Keeps status handling in one place: callers get the status code and raw body back
//!   and decide for themselves what a 401 or a non-OK answer means
//!
//! The default implementation wraps reqwest.
//!
//! # Example Usage:
//! ``
//! use crate::http::{HttpClient, DefaultHttpClient};
//!
//! let api = AtendimentoApi::new(Arc::new(DefaultHttpClient::new()), config);
//! ``

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest;
use serde::de::DeserializeOwned;

use crate::Error;

/// Status code and body of a finished request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// File part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Multipart body kept as plain data so it can be inspected by mocks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultipartBody {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

impl MultipartBody {
    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    pub fn file(mut self, part: FilePart) -> Self {
        self.files.push(part);
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn into_form(self) -> Result<reqwest::multipart::Form, Error> {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        for part in self.files {
            let p = reqwest::multipart::Part::bytes(part.bytes)
                .file_name(part.file_name)
                .mime_str(&part.content_type)?;
            form = form.part(part.field, p);
        }
        Ok(form)
    }
}

/// A generic trait for making HTTP requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn post_json(&self, url: String, body: serde_json::Value) -> Result<HttpResponse, Error>;
    async fn get(&self, url: String, headers: HashMap<String, String>) -> Result<HttpResponse, Error>;
    async fn post_multipart(
        &self,
        url: String,
        headers: HashMap<String, String>,
        body: MultipartBody,
    ) -> Result<HttpResponse, Error>;
}

#[derive(Clone)]
pub struct DefaultHttpClient {
    client: reqwest::Client,
}

impl DefaultHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for DefaultHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for DefaultHttpClient {
    async fn post_json(&self, url: String, body: serde_json::Value) -> Result<HttpResponse, Error> {
        let response = self.client
            .post(&url)
            .json(&body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }

    async fn get(&self, url: String, headers: HashMap<String, String>) -> Result<HttpResponse, Error> {
        let mut request = self.client.get(&url);
        for (key, value) in headers {
            request = request.header(&key, value);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }

    async fn post_multipart(
        &self,
        url: String,
        headers: HashMap<String, String>,
        body: MultipartBody,
    ) -> Result<HttpResponse, Error> {
        let mut request = self.client.post(&url).multipart(body.into_form()?);
        for (key, value) in headers {
            request = request.header(&key, value);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

/// `Authorization: Bearer <token>` header map.
pub fn bearer(token: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("Authorization".to_string(), format!("Bearer {}", token));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(401, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }

    #[test]
    fn multipart_field_lookup() {
        let body = MultipartBody::default()
            .text("number", "5585")
            .text("presence", "composing");
        assert_eq!(body.field("number"), Some("5585"));
        assert_eq!(body.field("caption"), None);
    }
}
