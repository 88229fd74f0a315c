// src/lib.rs

pub mod api;
pub mod auth;
pub mod config;
pub mod console;
pub mod eventbus;
pub mod http;
pub mod realtime;
pub mod storage;
pub mod tasks;

pub use painel_common::error::Error;
pub use painel_common::models;

pub use api::AtendimentoApi;
pub use config::ConsoleConfig;
pub use console::{Console, ConsoleHandle};
pub use http::{DefaultHttpClient, HttpClient};
