// File: painel-core/tests/test_utils/helpers.rs
//
// Scripted HTTP client, in-memory channel connector and a console builder for
// the integration tests. Nothing here touches the network.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use painel_core::api::AtendimentoApi;
use painel_core::config::ConsoleConfig;
use painel_core::console::{Console, ConsoleHandle};
use painel_core::eventbus::EventBus;
use painel_core::http::{HttpClient, HttpResponse, MultipartBody};
use painel_core::models::{Operator, QueueEntry, Requester};
use painel_core::realtime::{
    ChannelCommand, ChannelEvent, ChannelHandle, EventSink, HandshakeAuth, OutgoingEvent, RealtimeConnector,
};
use painel_core::storage::MemoryStore;
use painel_core::Error;

// -----------------------------------------------------------------------------
// HTTP
// -----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub json: Option<Value>,
    pub multipart: Option<MultipartBody>,
}

/// Answers by URL suffix, in the order responses were queued. Unscripted
/// URLs get a 404.
#[derive(Default)]
pub struct ScriptedHttp {
    responses: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedHttp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, status: u16, body: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(HttpResponse::new(status, body));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.url.ends_with(path)).collect()
    }

    fn answer(&self, call: RecordedCall) -> Result<HttpResponse, Error> {
        let url = call.url.clone();
        self.calls.lock().unwrap().push(call);
        let mut responses = self.responses.lock().unwrap();
        let queued = responses
            .iter_mut()
            .filter(|(path, _)| url.ends_with(path.as_str()))
            .max_by_key(|(path, _)| path.len())
            .and_then(|(_, queue)| queue.pop_front());
        Ok(queued.unwrap_or_else(|| HttpResponse::new(404, "")))
    }
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    async fn post_json(&self, url: String, body: Value) -> Result<HttpResponse, Error> {
        self.answer(RecordedCall { method: "POST", url, headers: HashMap::new(), json: Some(body), multipart: None })
    }

    async fn get(&self, url: String, headers: HashMap<String, String>) -> Result<HttpResponse, Error> {
        self.answer(RecordedCall { method: "GET", url, headers, json: None, multipart: None })
    }

    async fn post_multipart(
        &self,
        url: String,
        headers: HashMap<String, String>,
        body: MultipartBody,
    ) -> Result<HttpResponse, Error> {
        self.answer(RecordedCall { method: "POST", url, headers, json: None, multipart: Some(body) })
    }
}

// -----------------------------------------------------------------------------
// channel
// -----------------------------------------------------------------------------

pub struct MockConnection {
    pub auth: HandshakeAuth,
    pub sink: EventSink,
    pub outgoing: mpsc::UnboundedReceiver<ChannelCommand>,
}

impl MockConnection {
    pub fn push(&self, event: ChannelEvent) {
        assert!(self.sink.send(event), "console went away");
    }

    /// Everything the console sent so far.
    pub fn drain(&mut self) -> Vec<ChannelCommand> {
        let mut out = Vec::new();
        while let Ok(cmd) = self.outgoing.try_recv() {
            out.push(cmd);
        }
        out
    }

    pub fn drain_emits(&mut self) -> Vec<OutgoingEvent> {
        self.drain()
            .into_iter()
            .filter_map(|cmd| match cmd {
                ChannelCommand::Emit(evt) => Some(evt),
                ChannelCommand::Disconnect => None,
            })
            .collect()
    }
}

#[derive(Default)]
pub struct MockConnector {
    opened: Mutex<Vec<MockConnection>>,
    count: Mutex<usize>,
}

impl MockConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn opened(&self) -> usize {
        *self.count.lock().unwrap()
    }

    /// Hands the most recent connection to the test.
    pub fn take_last(&self) -> MockConnection {
        self.opened.lock().unwrap().pop().expect("no connection was opened")
    }
}

impl RealtimeConnector for MockConnector {
    fn connect(&self, auth: HandshakeAuth, sink: EventSink) -> ChannelHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        self.opened.lock().unwrap().push(MockConnection { auth, sink, outgoing: rx });
        *self.count.lock().unwrap() += 1;
        ChannelHandle::new(tx, None)
    }
}

// -----------------------------------------------------------------------------
// fixtures
// -----------------------------------------------------------------------------

pub fn operator() -> Operator {
    Operator {
        id: "7".into(),
        name: "Ana".into(),
        email: "ana@ifce.edu.br".into(),
        role: "ATENDENTE".into(),
        department: "Protocolo".into(),
    }
}

pub fn operator_json() -> String {
    json!({
        "id": "7",
        "nome": "Ana",
        "email": "ana@ifce.edu.br",
        "cargo": "ATENDENTE",
        "departamento": "Protocolo"
    })
    .to_string()
}

pub fn login_payload(access_token: &str) -> String {
    json!({
        "user": {"id": "7", "email": "ana@ifce.edu.br", "name": "Ana", "role": "ADMIN"},
        "access_token": access_token,
        "refresh_token": "refresh-1"
    })
    .to_string()
}

pub fn queue_entry(session_id: &str, number: &str, subject: &str) -> QueueEntry {
    QueueEntry {
        session_id: session_id.into(),
        number: number.into(),
        sector: "Protocolo".into(),
        subject: Some(subject.into()),
        requester: Some(Requester { name: "Beatriz".into() }),
    }
}

pub struct Harness {
    pub console: Console,
    pub handle: ConsoleHandle,
    pub http: Arc<ScriptedHttp>,
    pub connector: Arc<MockConnector>,
    pub store: Arc<MemoryStore>,
    pub bus: Arc<EventBus>,
    pub config: Arc<ConsoleConfig>,
}

pub fn test_config() -> ConsoleConfig {
    ConsoleConfig {
        session_secret: "segredo-de-teste".into(),
        ..ConsoleConfig::default()
    }
}

pub fn harness() -> Harness {
    harness_with(test_config(), ScriptedHttp::new())
}

pub fn harness_with(config: ConsoleConfig, http: Arc<ScriptedHttp>) -> Harness {
    let config = Arc::new(config);
    let api = Arc::new(AtendimentoApi::new(http.clone(), config.clone()));
    let connector = MockConnector::new();
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(EventBus::new());
    let (console, handle) = Console::new(config.clone(), api, connector.clone(), store.clone(), bus.clone());
    Harness { console, handle, http, connector, store, bus, config }
}

impl Harness {
    /// Logs in with an access token and completes the channel handshake.
    /// Returns the live connection with its outgoing queue drained.
    pub async fn connected(&mut self) -> MockConnection {
        self.http.respond("/atendentes/me", 200, operator_json());
        self.console.login_with_token("tok-1".into()).await;
        let mut conn = self.connector.take_last();
        conn.push(ChannelEvent::Connected);
        assert!(self.console.drain().await);
        conn.drain();
        conn
    }

    /// Connected, with one queued entry, joined.
    pub async fn in_session(&mut self, entry: QueueEntry) -> MockConnection {
        let mut conn = self.connected().await;
        conn.push(ChannelEvent::QueueSnapshot(vec![entry.clone()]));
        assert!(self.console.drain().await);
        self.console.enter_session(&entry.session_id).await;
        conn.drain();
        conn
    }
}
