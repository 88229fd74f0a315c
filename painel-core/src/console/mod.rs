// =============================================================================
// painel-core/src/console/mod.rs
//   The attendant console: one owner task holding all session state, fed by
//   operator commands, channel events, timers and upload results.
// =============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use painel_common::models::{
    ActiveSession, ChatMessage, ConnectionStatus, Credentials, OAuthCallbackQuery, Operator, QueueEntry,
    Sender, Session,
};

use crate::api::{AtendimentoApi, MediaReceipt, MediaUpload};
use crate::auth::{CredentialAdapter, SignedSession};
use crate::config::ConsoleConfig;
use crate::eventbus::{ConsoleEvent, EventBus};
use crate::realtime::{ChannelEvent, ChannelHandle, EventSink, HandshakeAuth, OutgoingEvent, RealtimeConnector};
use crate::storage::{self, LocalStore};
use crate::tasks::{spawn_deadline_task, spawn_queue_refresh_task};
use crate::Error;

pub mod attachment;
pub mod input;
pub mod notices;
pub mod state;
pub mod transcript;

pub use attachment::PendingAttachment;
pub use input::{ConsoleInput, OperatorCommand};
pub use notices::NoticeKind;
pub use state::{ConsolePhase, ConsoleSnapshot, PendingSummary};
pub use transcript::Transcript;

pub const DRAFT_MAX_CHARS: usize = 1000;

pub const MSG_INVALID_CREDENTIALS: &str = "Credenciais inválidas";
pub const MSG_MISSING_CREDENTIALS: &str = "Informe email e senha";
pub const MSG_NOT_CONNECTED: &str = "Sem conexão com o servidor";
pub const MSG_NO_ACTIVE_SESSION: &str = "Nenhum atendimento ativo";
pub const MSG_NO_FILE: &str = "Nenhum arquivo selecionado";
pub const MSG_UPLOAD_OK: &str = "Arquivo enviado com sucesso!";
pub const MSG_SESSION_ENDED_BY_OPERATOR: &str = "Você encerrou este atendimento.";
pub const MSG_SESSION_ENDED_REMOTELY: &str = "Este atendimento foi encerrado.";

/// Upload running outside the actor.
struct InFlightUpload {
    id: u64,
    epoch: u64,
    session_id: String,
    attachment: PendingAttachment,
    draft: String,
}

pub struct Console {
    config: Arc<ConsoleConfig>,
    api: Arc<AtendimentoApi>,
    credentials: CredentialAdapter,
    connector: Arc<dyn RealtimeConnector>,
    store: Arc<dyn LocalStore>,
    bus: Arc<EventBus>,

    tx: mpsc::UnboundedSender<ConsoleInput>,
    rx: mpsc::UnboundedReceiver<ConsoleInput>,
    snapshot_tx: watch::Sender<ConsoleSnapshot>,

    // identity
    authenticating: bool,
    operator: Option<Operator>,
    session: Option<Session>,
    access_token: Option<String>,
    /// Bumped on every login and logout.
    epoch: u64,

    // channel
    status: ConnectionStatus,
    channel: Option<ChannelHandle>,
    connection_id: u64,
    refresh_task: Option<JoinHandle<()>>,

    // work
    queue: Vec<QueueEntry>,
    active: Option<ActiveSession>,
    transcript: Transcript,
    draft: String,
    pending: Option<PendingAttachment>,
    upload: Option<InFlightUpload>,
    upload_seq: u64,
    confirm_end: Option<String>,
    close_task: Option<JoinHandle<()>>,

    notices: notices::Notices,
}

/// Cloneable front door to a running console.
#[derive(Clone)]
pub struct ConsoleHandle {
    tx: mpsc::UnboundedSender<ConsoleInput>,
    snapshot: watch::Receiver<ConsoleSnapshot>,
}

impl ConsoleHandle {
    fn send(&self, cmd: OperatorCommand) -> Result<(), Error> {
        self.tx
            .send(ConsoleInput::Command(cmd))
            .map_err(|_| Error::State("console is not running".into()))
    }

    pub fn login(&self, credentials: Credentials) -> Result<(), Error> {
        self.send(OperatorCommand::Login(credentials))
    }

    pub fn login_with_token(&self, access_token: impl Into<String>) -> Result<(), Error> {
        self.send(OperatorCommand::LoginWithToken(access_token.into()))
    }

    pub fn oauth_callback(&self, query: OAuthCallbackQuery) -> Result<(), Error> {
        self.send(OperatorCommand::OAuthCallback(query))
    }

    pub fn restore(&self) -> Result<(), Error> {
        self.send(OperatorCommand::Restore)
    }

    pub fn logout(&self) -> Result<(), Error> {
        self.send(OperatorCommand::Logout)
    }

    pub fn refresh_queue(&self) -> Result<(), Error> {
        self.send(OperatorCommand::RefreshQueue)
    }

    pub fn enter_session(&self, session_id: impl Into<String>) -> Result<(), Error> {
        self.send(OperatorCommand::EnterSession(session_id.into()))
    }

    pub fn set_draft(&self, text: impl Into<String>) -> Result<(), Error> {
        self.send(OperatorCommand::SetDraft(text.into()))
    }

    pub fn send_message(&self) -> Result<(), Error> {
        self.send(OperatorCommand::SendMessage)
    }

    pub fn select_file(&self, path: impl Into<PathBuf>) -> Result<(), Error> {
        self.send(OperatorCommand::SelectFile(path.into()))
    }

    pub fn stage_attachment(&self, attachment: PendingAttachment) -> Result<(), Error> {
        self.send(OperatorCommand::StageAttachment(attachment))
    }

    pub fn cancel_attachment(&self) -> Result<(), Error> {
        self.send(OperatorCommand::CancelAttachment)
    }

    pub fn send_attachment(&self) -> Result<(), Error> {
        self.send(OperatorCommand::SendAttachment)
    }

    pub fn request_end(&self) -> Result<(), Error> {
        self.send(OperatorCommand::RequestEnd)
    }

    pub fn confirm_end(&self, confirmed: bool) -> Result<(), Error> {
        self.send(OperatorCommand::ConfirmEnd(confirmed))
    }

    pub fn notify_error(&self, text: impl Into<String>) -> Result<(), Error> {
        self.send(OperatorCommand::Notify { kind: NoticeKind::Error, text: text.into() })
    }

    pub fn notify_success(&self, text: impl Into<String>) -> Result<(), Error> {
        self.send(OperatorCommand::Notify { kind: NoticeKind::Success, text: text.into() })
    }

    pub fn shutdown(&self) -> Result<(), Error> {
        self.send(OperatorCommand::Shutdown)
    }

    pub fn snapshot(&self) -> ConsoleSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Waits for the next published snapshot.
    pub async fn changed(&mut self) -> Result<ConsoleSnapshot, Error> {
        self.snapshot
            .changed()
            .await
            .map_err(|_| Error::State("console is not running".into()))?;
        Ok(self.snapshot.borrow_and_update().clone())
    }
}

impl Console {
    pub fn new(
        config: Arc<ConsoleConfig>,
        api: Arc<AtendimentoApi>,
        connector: Arc<dyn RealtimeConnector>,
        store: Arc<dyn LocalStore>,
        bus: Arc<EventBus>,
    ) -> (Self, ConsoleHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(ConsoleSnapshot::default());
        let credentials = CredentialAdapter::new(api.clone(), &config);

        let console = Self {
            config,
            api,
            credentials,
            connector,
            store,
            bus,
            tx: tx.clone(),
            rx,
            snapshot_tx,
            authenticating: false,
            operator: None,
            session: None,
            access_token: None,
            epoch: 0,
            status: ConnectionStatus::Disconnected,
            channel: None,
            connection_id: 0,
            refresh_task: None,
            queue: Vec::new(),
            active: None,
            transcript: Transcript::new(),
            draft: String::new(),
            pending: None,
            upload: None,
            upload_seq: 0,
            confirm_end: None,
            close_task: None,
            notices: notices::Notices::new(),
        };
        let handle = ConsoleHandle { tx, snapshot: snapshot_rx };
        (console, handle)
    }

    // -------------------------------------------------------------------------
    // actor loop
    // -------------------------------------------------------------------------

    /// Processes inputs until a shutdown command.
    pub async fn run(mut self) {
        info!("console started");
        while self.step().await {}
        self.teardown_connection();
        self.cancel_close_timer();
        self.notices.clear_all();
        info!("console stopped");
    }

    /// Waits for one input and handles it. Returns false after `Shutdown`.
    pub async fn step(&mut self) -> bool {
        match self.rx.recv().await {
            Some(input) => self.handle_input(input).await,
            None => false,
        }
    }

    /// Handles whatever is already queued, without waiting.
    pub async fn drain(&mut self) -> bool {
        while let Ok(input) = self.rx.try_recv() {
            if !self.handle_input(input).await {
                return false;
            }
        }
        true
    }

    pub async fn handle_input(&mut self, input: ConsoleInput) -> bool {
        let keep_going = match input {
            ConsoleInput::Command(cmd) => self.handle_command(cmd).await,
            ConsoleInput::Channel { connection_id, event } => {
                self.on_channel_event(connection_id, event).await;
                true
            }
            ConsoleInput::QueueRefreshDue => {
                if self.status.is_connected() {
                    self.emit(OutgoingEvent::ListSessions);
                }
                true
            }
            ConsoleInput::NoticeExpired { kind, generation } => {
                if self.notices.expire(kind, generation) {
                    self.bus.publish(ConsoleEvent::Notice { kind, text: None }).await;
                }
                true
            }
            ConsoleInput::SessionCloseDue { session_id } => {
                self.on_session_close_due(&session_id).await;
                true
            }
            ConsoleInput::UploadFinished { upload_id, result } => {
                self.on_upload_finished(upload_id, result).await;
                true
            }
        };
        self.publish_snapshot();
        keep_going
    }

    async fn handle_command(&mut self, cmd: OperatorCommand) -> bool {
        match cmd {
            OperatorCommand::Login(credentials) => self.login(credentials).await,
            OperatorCommand::LoginWithToken(token) => self.login_with_token(token).await,
            OperatorCommand::OAuthCallback(query) => self.oauth_callback(query).await,
            OperatorCommand::Restore => self.restore().await,
            OperatorCommand::Logout => self.logout().await,
            OperatorCommand::RefreshQueue => self.refresh_queue(),
            OperatorCommand::EnterSession(session_id) => self.enter_session(&session_id).await,
            OperatorCommand::SetDraft(text) => self.set_draft(&text),
            OperatorCommand::SendMessage => self.send_message().await,
            OperatorCommand::SelectFile(path) => self.select_file(path).await,
            OperatorCommand::StageAttachment(attachment) => self.stage_attachment(attachment).await,
            OperatorCommand::CancelAttachment => self.cancel_attachment().await,
            OperatorCommand::SendAttachment => self.send_attachment().await,
            OperatorCommand::RequestEnd => self.request_end().await,
            OperatorCommand::ConfirmEnd(confirmed) => self.confirm_end(confirmed).await,
            OperatorCommand::Notify { kind, text } => self.notify(kind, text).await,
            OperatorCommand::Shutdown => return false,
        }
        true
    }

    // -------------------------------------------------------------------------
    // view
    // -------------------------------------------------------------------------

    pub fn phase(&self) -> ConsolePhase {
        ConsolePhase::derive(
            self.operator.is_some() && self.access_token.is_some(),
            self.authenticating,
            &self.status,
            self.active.is_some(),
        )
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn operator(&self) -> Option<&Operator> {
        self.operator.as_ref()
    }

    pub fn queue(&self) -> &[QueueEntry] {
        &self.queue
    }

    pub fn active_session(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        self.transcript.messages()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn pending_attachment(&self) -> Option<&PendingAttachment> {
        self.pending.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        self.upload.is_some()
    }

    pub fn notice(&self, kind: NoticeKind) -> Option<&str> {
        self.notices.get(kind)
    }

    pub fn snapshot(&self) -> ConsoleSnapshot {
        ConsoleSnapshot {
            phase: self.phase(),
            status: self.status.clone(),
            operator: self.operator.clone(),
            session: self.session.clone(),
            has_token: self.access_token.is_some(),
            queue: self.queue.clone(),
            active: self.active.clone(),
            transcript: self.transcript.messages().to_vec(),
            draft: self.draft.clone(),
            pending: self.pending.as_ref().map(|p| PendingSummary {
                file_name: p.file_name.clone(),
                kind: p.kind,
                size: p.size(),
                preview: p.preview.clone(),
            }),
            uploading: self.upload.is_some(),
            error_notice: self.notices.get(NoticeKind::Error).map(String::from),
            success_notice: self.notices.get(NoticeKind::Success).map(String::from),
            confirm_end: self.confirm_end.clone(),
        }
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }

    // -------------------------------------------------------------------------
    // notices
    // -------------------------------------------------------------------------

    pub async fn notify(&mut self, kind: NoticeKind, text: String) {
        let ttl = match kind {
            NoticeKind::Error => self.config.error_notice_ttl,
            NoticeKind::Success => self.config.success_notice_ttl,
        };
        match kind {
            NoticeKind::Error => warn!("notice: {}", text),
            NoticeKind::Success => info!("notice: {}", text),
        }
        self.notices.show(kind, text.clone(), ttl, &self.tx);
        self.bus.publish(ConsoleEvent::Notice { kind, text: Some(text) }).await;
    }

    pub async fn notify_error(&mut self, text: impl Into<String>) {
        self.notify(NoticeKind::Error, text.into()).await;
    }

    pub async fn notify_success(&mut self, text: impl Into<String>) {
        self.notify(NoticeKind::Success, text.into()).await;
    }

    // -------------------------------------------------------------------------
    // authentication
    // -------------------------------------------------------------------------

    /// Email/password login through the credential adapter.
    pub async fn login(&mut self, credentials: Credentials) {
        if !credentials.is_complete() {
            self.notify_error(MSG_MISSING_CREDENTIALS).await;
            return;
        }

        self.authenticating = true;
        self.publish_snapshot();

        match self.credentials.sign_in(&credentials).await {
            Ok(Some(signed)) => {
                if !signed.session.has_access_token() {
                    self.authenticating = false;
                    self.notify_error("Resposta de login sem token de acesso").await;
                    return;
                }
                let SignedSession { token, session } = signed;
                let access_token = session.access_token.clone();
                self.session = Some(session);
                self.complete_login(access_token).await;
                // a failed profile fetch logs out and drops the session
                if self.session.is_some() {
                    if let Err(e) = storage::save_session_token(self.store.as_ref(), &token) {
                        warn!("could not persist session token: {}", e);
                    }
                }
            }
            Ok(None) => {
                self.authenticating = false;
                self.notify_error(MSG_INVALID_CREDENTIALS).await;
            }
            Err(e) => {
                error!("login failed: {}", e);
                self.authenticating = false;
                self.notify_error(format!("Erro no login: {}", e)).await;
            }
        }
    }

    /// Login with an access token obtained elsewhere (OAuth callback).
    pub async fn login_with_token(&mut self, access_token: String) {
        let access_token = access_token.trim().to_string();
        if access_token.is_empty() {
            self.notify_error("Token de acesso vazio").await;
            return;
        }
        self.authenticating = true;
        self.publish_snapshot();
        self.complete_login(access_token).await;
    }

    pub async fn oauth_callback(&mut self, query: OAuthCallbackQuery) {
        if let Some(err) = query.error {
            let decoded = urlencoding::decode(&err)
                .map(|c| c.into_owned())
                .unwrap_or(err);
            self.notify_error(format!("Erro na autenticação: {}", decoded)).await;
            return;
        }
        match query.token {
            Some(token) => self.login_with_token(token).await,
            None => self.notify_error("Erro na autenticação: token ausente").await,
        }
    }

    /// Picks up a login persisted by a previous run. No profile fetch.
    pub async fn restore(&mut self) {
        match storage::load_login(self.store.as_ref()) {
            Ok(Some((token, operator))) => {
                info!("restoring stored login for operator id={}", operator.id);
                self.restore_session();
                self.establish(token, operator).await;
            }
            Ok(None) => debug!("no stored login"),
            Err(e) => warn!("could not read stored login: {}", e),
        }
    }

    /// Rebuilds the signed session of a credential login. Token logins have
    /// none; a token that no longer verifies is forgotten.
    fn restore_session(&mut self) {
        let token = match storage::load_session_token(self.store.as_ref()) {
            Ok(Some(token)) => token,
            Ok(None) => return,
            Err(e) => {
                warn!("could not read stored session token: {}", e);
                return;
            }
        };
        match self.credentials.restore(&token) {
            Ok(signed) => {
                debug!("session restored for user id='{}'", signed.session.user.id);
                self.session = Some(signed.session);
            }
            Err(e) => {
                warn!("stored session token rejected: {}", e);
                if let Err(e) = self.store.remove(storage::SESSION_TOKEN_KEY) {
                    warn!("could not drop session token: {}", e);
                }
            }
        }
    }

    /// 1) profile fetch, 2) persist token + profile, 3) connect.
    async fn complete_login(&mut self, access_token: String) {
        let operator = match self.api.fetch_profile(&access_token).await {
            Ok(op) => op,
            Err(e) => {
                let reason = match e {
                    Error::Profile(msg) => msg,
                    Error::Unauthorized => "token recusado pelo servidor".to_string(),
                    other => other.to_string(),
                };
                error!("profile fetch failed: {}", reason);
                self.notify_error(format!("Erro ao carregar perfil do usuário: {}", reason)).await;
                self.logout().await;
                return;
            }
        };

        if let Err(e) = storage::save_login(self.store.as_ref(), &access_token, &operator) {
            warn!("could not persist login: {}", e);
        }
        self.establish(access_token, operator).await;
    }

    async fn establish(&mut self, access_token: String, operator: Operator) {
        self.authenticating = false;
        self.epoch += 1;
        self.access_token = Some(access_token);
        self.operator = Some(operator.clone());
        info!("operator '{}' logged in (sector={})", operator.name, operator.sector());
        self.bus.publish(ConsoleEvent::LoggedIn(operator)).await;
        self.connect().await;
    }

    /// Tears everything down and forgets the login, locally and on disk.
    pub async fn logout(&mut self) {
        info!("logging out");
        self.teardown_connection();
        self.cancel_close_timer();

        self.authenticating = false;
        self.epoch += 1;
        self.operator = None;
        self.session = None;
        self.access_token = None;
        self.queue.clear();
        self.active = None;
        self.transcript.clear();
        self.draft.clear();
        self.pending = None;
        self.upload = None;
        self.confirm_end = None;

        if let Err(e) = storage::clear_login(self.store.as_ref()) {
            warn!("could not clear stored login: {}", e);
        }
        self.set_status(ConnectionStatus::Disconnected).await;
        self.bus.publish(ConsoleEvent::LoggedOut).await;
    }

    // -------------------------------------------------------------------------
    // channel
    // -------------------------------------------------------------------------

    async fn connect(&mut self) {
        self.teardown_connection();
        let (Some(token), Some(operator)) = (self.access_token.clone(), self.operator.clone()) else {
            return;
        };

        self.connection_id += 1;
        let auth = HandshakeAuth {
            token,
            operator_id: operator.id.clone(),
            name: operator.name.clone(),
            sector: operator.sector().to_string(),
        };
        let sink = EventSink::new(self.connection_id, self.tx.clone());
        info!("opening channel #{}", self.connection_id);
        self.channel = Some(self.connector.connect(auth, sink));
        self.set_status(ConnectionStatus::Connecting).await;
    }

    fn teardown_connection(&mut self) {
        self.stop_refresh();
        if let Some(channel) = self.channel.take() {
            channel.disconnect();
        }
    }

    fn arm_refresh(&mut self) {
        self.stop_refresh();
        self.refresh_task = Some(spawn_queue_refresh_task(
            self.tx.clone(),
            self.config.queue_refresh_interval,
        ));
    }

    fn stop_refresh(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }
    }

    async fn set_status(&mut self, status: ConnectionStatus) {
        if self.status == status {
            return;
        }
        self.status = status.clone();
        self.bus.publish(ConsoleEvent::StatusChanged(status)).await;
    }

    /// Fire-and-forget. Dropped when there is no live connection.
    fn emit(&self, event: OutgoingEvent) -> bool {
        match &self.channel {
            Some(channel) if self.status.is_connected() => channel.emit(event),
            _ => {
                warn!("not connected; dropping '{}'", event.name());
                false
            }
        }
    }

    async fn on_channel_event(&mut self, connection_id: u64, event: ChannelEvent) {
        if self.channel.is_none() || connection_id != self.connection_id {
            debug!("ignoring event from stale channel #{}: {:?}", connection_id, event);
            return;
        }

        match event {
            ChannelEvent::Connected => {
                self.set_status(ConnectionStatus::Connected).await;
                self.emit(OutgoingEvent::ListSessions);
                self.arm_refresh();
            }
            ChannelEvent::Disconnected { reason } => {
                warn!("channel dropped: {}", reason);
                self.stop_refresh();
                self.set_status(ConnectionStatus::Disconnected).await;
            }
            ChannelEvent::ConnectError { message } => {
                error!("channel error: {}", message);
                self.stop_refresh();
                self.set_status(ConnectionStatus::Error(message)).await;
            }
            ChannelEvent::QueueSnapshot(entries) => {
                debug!("queue snapshot with {} entries", entries.len());
                self.queue = entries;
                self.bus.publish(ConsoleEvent::QueueUpdated(self.queue.clone())).await;
            }
            ChannelEvent::NewMessage(wire) => {
                if wire.sender != Sender::Requester {
                    return;
                }
                let Some(active) = &self.active else {
                    return;
                };
                if let Some(sid) = &wire.session_id {
                    if sid != &active.session_id {
                        debug!("message for another session ({}) ignored", sid);
                        return;
                    }
                }
                self.append(ChatMessage::from(wire)).await;
            }
            ChannelEvent::OperatorJoined(joined) => {
                if self.active.is_some() {
                    let text = format!("Atendente {} do setor {} entrou no atendimento.", joined.name, joined.sector);
                    self.append(ChatMessage::system(&text)).await;
                }
            }
            ChannelEvent::SessionEnded { session_id } => {
                let Some(active) = self.active.clone() else {
                    return;
                };
                if session_id.as_deref().is_some_and(|sid| sid != active.session_id) {
                    return;
                }
                info!("session {} ended remotely", active.session_id);
                self.append(ChatMessage::system(MSG_SESSION_ENDED_REMOTELY)).await;
                self.schedule_close(active.session_id);
            }
        }
    }

    async fn append(&mut self, message: ChatMessage) {
        self.transcript.push(message.clone());
        self.bus.publish(ConsoleEvent::MessageAppended(message)).await;
    }

    // -------------------------------------------------------------------------
    // queue & session
    // -------------------------------------------------------------------------

    pub fn refresh_queue(&mut self) {
        self.emit(OutgoingEvent::ListSessions);
    }

    pub async fn enter_session(&mut self, session_id: &str) {
        let Some(operator) = self.operator.clone() else {
            self.notify_error("Faça login para entrar em um atendimento").await;
            return;
        };
        if !self.status.is_connected() {
            self.notify_error(MSG_NOT_CONNECTED).await;
            return;
        }
        let Some(entry) = self.queue.iter().find(|e| e.session_id == session_id).cloned() else {
            self.notify_error(format!("Atendimento {} não encontrado", session_id)).await;
            return;
        };

        self.cancel_close_timer();
        self.confirm_end = None;
        let active = ActiveSession::from_entry(&entry);
        self.emit(OutgoingEvent::JoinSession {
            session_id: active.session_id.clone(),
            name: operator.name.clone(),
            sector: operator.sector().to_string(),
            operator_id: operator.id.clone(),
        });

        let notice = ChatMessage::system(&format!(
            "Você entrou no atendimento. Origem: {}. Suas mensagens serão enviadas diretamente para o usuário.",
            active.origin
        ));
        self.transcript.reset_with(notice.clone());
        info!("entered session {} (protocolo {})", active.session_id, active.protocol);
        self.active = Some(active.clone());
        self.bus.publish(ConsoleEvent::SessionEntered(active)).await;
        self.bus.publish(ConsoleEvent::MessageAppended(notice)).await;
    }

    pub fn set_draft(&mut self, text: &str) {
        self.draft = text.chars().take(DRAFT_MAX_CHARS).collect();
    }

    pub async fn send_message(&mut self) {
        let body = self.draft.trim().to_string();
        if body.is_empty() {
            return;
        }
        let Some(active) = self.active.clone() else {
            debug!("send without active session ignored");
            return;
        };
        if !self.emit(OutgoingEvent::operator_text(&active.session_id, &body)) {
            self.notify_error(MSG_NOT_CONNECTED).await;
            return;
        }
        self.append(ChatMessage::from_operator(body)).await;
        self.draft.clear();
    }

    pub async fn request_end(&mut self) {
        let Some(active) = &self.active else {
            self.notify_error(MSG_NO_ACTIVE_SESSION).await;
            return;
        };
        let session_id = active.session_id.clone();
        self.confirm_end = Some(session_id.clone());
        self.bus.publish(ConsoleEvent::ConfirmEndRequested { session_id }).await;
    }

    pub async fn confirm_end(&mut self, confirmed: bool) {
        let Some(session_id) = self.confirm_end.take() else {
            return;
        };
        if !confirmed {
            debug!("end of session {} cancelled", session_id);
            return;
        }
        if self.active.as_ref().map(|a| a.session_id.as_str()) != Some(session_id.as_str()) {
            return;
        }
        if !self.emit(OutgoingEvent::EndSession { session_id: session_id.clone() }) {
            self.notify_error(MSG_NOT_CONNECTED).await;
            return;
        }
        info!("ending session {}", session_id);
        self.append(ChatMessage::system(MSG_SESSION_ENDED_BY_OPERATOR)).await;
        self.schedule_close(session_id);
    }

    fn schedule_close(&mut self, session_id: String) {
        self.cancel_close_timer();
        self.close_task = Some(spawn_deadline_task(
            Instant::now() + self.config.session_close_delay,
            self.tx.clone(),
            ConsoleInput::SessionCloseDue { session_id },
        ));
    }

    fn cancel_close_timer(&mut self) {
        if let Some(task) = self.close_task.take() {
            task.abort();
        }
    }

    async fn on_session_close_due(&mut self, session_id: &str) {
        if self.active.as_ref().map(|a| a.session_id.as_str()) != Some(session_id) {
            debug!("stale close for {} ignored", session_id);
            return;
        }
        self.close_task = None;
        self.active = None;
        self.confirm_end = None;
        self.transcript.clear();
        self.bus
            .publish(ConsoleEvent::SessionClosed { session_id: session_id.to_string() })
            .await;
        self.emit(OutgoingEvent::ListSessions);
    }

    // -------------------------------------------------------------------------
    // attachments
    // -------------------------------------------------------------------------

    pub async fn select_file(&mut self, path: PathBuf) {
        match PendingAttachment::from_path(&path).await {
            Ok(attachment) => self.stage_attachment(attachment).await,
            Err(e) => self.notify_error(format!("Erro ao ler arquivo: {}", e)).await,
        }
    }

    pub async fn stage_attachment(&mut self, attachment: PendingAttachment) {
        debug!("staged {:?}", attachment);
        let event = ConsoleEvent::AttachmentStaged {
            file_name: attachment.file_name.clone(),
            kind: attachment.kind,
            size: attachment.size(),
        };
        self.pending = Some(attachment);
        self.bus.publish(event).await;
    }

    pub async fn cancel_attachment(&mut self) {
        if self.pending.take().is_some() {
            self.bus.publish(ConsoleEvent::AttachmentCleared).await;
        }
    }

    /// Starts the upload in the background. The result comes back as
    /// `ConsoleInput::UploadFinished`.
    pub async fn send_attachment(&mut self) {
        if self.upload.is_some() {
            debug!("upload already in flight");
            return;
        }
        let Some(attachment) = self.pending.clone() else {
            self.notify_error(MSG_NO_FILE).await;
            return;
        };
        let Some(active) = self.active.clone() else {
            self.notify_error(MSG_NO_ACTIVE_SESSION).await;
            return;
        };
        let Some(token) = self.access_token.clone() else {
            self.notify_error("Sessão expirada; faça login novamente").await;
            return;
        };

        let number = self
            .queue
            .iter()
            .find(|e| e.session_id == active.session_id)
            .map(|e| e.number.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| active.number.clone());
        let caption = if self.draft.trim().is_empty() {
            self.config.default_caption.clone()
        } else {
            self.draft.clone()
        };

        self.upload_seq += 1;
        let upload_id = self.upload_seq;
        self.upload = Some(InFlightUpload {
            id: upload_id,
            epoch: self.epoch,
            session_id: active.session_id.clone(),
            attachment: attachment.clone(),
            draft: self.draft.clone(),
        });
        self.bus.publish(ConsoleEvent::UploadBusy(true)).await;

        let request = MediaUpload {
            number,
            caption,
            kind: attachment.kind,
            file_name: attachment.file_name,
            content_type: attachment.content_type,
            bytes: attachment.bytes,
        };
        info!("uploading '{}' to {}", request.file_name, request.number);

        let api = self.api.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = async {
                let instance = api.instance_name().await?;
                debug!("whatsapp instance: {:?}", instance);
                api.send_media_file(&token, request).await
            }
            .await;
            let _ = tx.send(ConsoleInput::UploadFinished { upload_id, result });
        });
    }

    async fn on_upload_finished(&mut self, upload_id: u64, result: Result<MediaReceipt, Error>) {
        let Some(upload) = self.upload.take_if(|u| u.id == upload_id) else {
            debug!("result of abandoned upload #{} ignored", upload_id);
            return;
        };
        self.bus.publish(ConsoleEvent::UploadBusy(false)).await;

        let still_current = upload.epoch == self.epoch
            && self.active.as_ref().map(|a| a.session_id.as_str()) == Some(upload.session_id.as_str());
        if !still_current {
            debug!("upload #{} finished after the console moved on", upload_id);
            return;
        }

        match result {
            Ok(receipt) => {
                let attachment = upload.attachment;
                // The file marker only goes on the wire; locally the attachment renders itself.
                let caption = upload.draft.trim().to_string();
                let wire_body = format!("[Arquivo: {}] {}", attachment.file_name, caption)
                    .trim_end()
                    .to_string();
                let media_url = receipt.media_url.unwrap_or_else(|| attachment.preview.clone());

                self.append(ChatMessage::from_operator(caption).with_attachment(attachment.local_attachment()))
                    .await;
                self.emit(OutgoingEvent::operator_media(
                    &upload.session_id,
                    &wire_body,
                    &media_url,
                    attachment.kind,
                    &attachment.file_name,
                ));
                self.draft.clear();
                if self.pending.as_ref().is_some_and(|p| p.preview == attachment.preview) {
                    self.pending = None;
                    self.bus.publish(ConsoleEvent::AttachmentCleared).await;
                }
                self.notify_success(MSG_UPLOAD_OK).await;
            }
            Err(e) => {
                let reason = match e {
                    Error::Upload(msg) => msg,
                    other => other.to_string(),
                };
                error!("upload failed: {}", reason);
                self.notify_error(format!("Erro ao enviar arquivo: {}", reason)).await;
            }
        }
    }
}
