// Terminal attendant console
use std::io::{stdout, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

use painel_core::eventbus::EventBus;
use painel_core::realtime::{RealtimeConnector, SocketIoConnector};
use painel_core::storage::{FileStore, LocalStore, MemoryStore};
use painel_core::{AtendimentoApi, Console, ConsoleConfig, DefaultHttpClient, HttpClient};
use painel_tui::{commands::dispatch, render, TuiModule};

#[derive(Parser, Debug, Clone)]
#[command(name = "painel")]
#[command(author, version, about = "Painel de atendimento - console do atendente")]
struct Args {
    /// Base URL of the REST API (overrides PAINEL_API_URL)
    #[arg(long)]
    api_url: Option<Url>,

    /// URL of the attendance namespace (overrides PAINEL_SOCKET_URL)
    #[arg(long)]
    socket_url: Option<Url>,

    /// Secret used to sign the local session token (overrides PAINEL_SESSION_SECRET)
    #[arg(long)]
    session_secret: Option<String>,

    /// Path of the local storage file
    #[arg(long)]
    store: Option<PathBuf>,

    /// Keep the login only in memory for this run
    #[arg(long, default_value = "false")]
    memory_store: bool,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("painel_core=info".parse().unwrap_or_default())
        .add_directive("painel_tui=info".parse().unwrap_or_default());
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(args: &Args) -> anyhow::Result<ConsoleConfig> {
    let mut config = ConsoleConfig::from_env().context("reading PAINEL_* configuration")?;
    if let Some(url) = &args.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(url) = &args.socket_url {
        config.socket_url = url.clone();
    }
    if let Some(secret) = &args.session_secret {
        config.session_secret = secret.clone();
    }
    Ok(config)
}

fn build_store(args: &Args) -> anyhow::Result<Arc<dyn LocalStore>> {
    if args.memory_store {
        return Ok(Arc::new(MemoryStore::new()));
    }
    let path = match &args.store {
        Some(p) => p.clone(),
        None => FileStore::default_path().context("no data directory for the local store; use --store")?,
    };
    info!("local store at {}", path.display());
    Ok(Arc::new(FileStore::new(path)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = Arc::new(build_config(&args)?);
    info!(
        "painel starting. api={}, socket={}",
        config.api_base_url, config.socket_url
    );

    let http: Arc<dyn HttpClient> = Arc::new(DefaultHttpClient::new());
    let api = Arc::new(AtendimentoApi::new(http, config.clone()));
    let connector: Arc<dyn RealtimeConnector> = Arc::new(SocketIoConnector::from_config(&config)?);
    let store = build_store(&args)?;
    let bus = Arc::new(EventBus::new());

    let (console, handle) = Console::new(config.clone(), api, connector, store, bus.clone());
    let renderer = render::spawn_renderer(bus.clone()).await;
    let console_task = tokio::spawn(console.run());

    handle.restore()?;

    let tui_module = Arc::new(TuiModule::new());
    println!("Painel de Atendimento");
    println!("Digite 'help' para ver os comandos.\n");

    let mut reader = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{}", tui_module.prompt_string(&handle.snapshot()));
        stdout().flush()?;

        let line = match reader.next_line().await? {
            Some(line) => line.trim().to_string(),
            None => break, // EOF
        };

        // an empty answer still declines a pending confirmation
        if tui_module.handle_confirmation_line(&line, &handle) {
            continue;
        }

        if line.is_empty() {
            continue;
        }

        if tui_module.is_in_chat_mode() && tui_module.handle_chat_line(&line, &handle) {
            continue;
        }

        let (quit_requested, output) = dispatch(&line, &handle, &tui_module);

        if let Some(msg) = output {
            println!("{}", msg);
        }

        if quit_requested {
            break;
        }
    }

    tui_module.stop_tui();
    if let Err(e) = handle.shutdown() {
        warn!("console already stopped: {}", e);
    }
    if tokio::time::timeout(Duration::from_secs(2), console_task).await.is_err() {
        warn!("console did not stop in time");
    }
    bus.shutdown();
    let _ = renderer.await;

    println!("Até logo!");
    Ok(())
}
