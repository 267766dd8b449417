//! Hallchat entrypoint.
use anyhow::{Context, Result};
use clap::Parser;
use core_config::Config;
use core_events::{EVENT_CHANNEL_CAP, Event, EventSourceRegistry, TickEventSource};
use core_model::ChatModel;
use core_terminal::{CrosstermBackend, TerminalBackend};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use tokio::sync::mpsc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod effects;
mod runtime;

use effects::EffectExecutor;
use runtime::ChatRuntime;

const LOG_FILE: &str = "hallchat.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "hallchat", version, about = "Terminal chat for the hall")]
struct Args {
    /// Configuration file path (overrides discovery of `hallchat.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Room slug to join.
    #[arg(long = "room")]
    pub room: Option<String>,
    /// API base URL.
    #[arg(long = "base-url")]
    pub base_url: Option<String>,
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join(LOG_FILE);
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        if tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(nb_writer)
            .try_init()
            .is_ok()
        {
            self.log_guard = Some(guard);
        }
        Ok(())
    }

    /// Restore the terminal before the default hook prints, so the report is readable.
    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                let _ = core_terminal::restore();
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }

    fn load_config(args: &Args) -> Result<Config> {
        let mut config = core_config::load_from(args.config.clone())?;
        config.apply_overrides(args.room.clone(), args.base_url.clone());
        info!(
            target: "runtime.startup",
            room = config.file.chat.room.as_str(),
            base_url = config.file.server.base_url.as_str(),
            signed_in = config.token().is_some(),
            config_source = config.source.as_ref().map(|p| p.display().to_string()),
            "config_loaded"
        );
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut startup = AppStartup::new();
    startup.configure_logging()?;
    AppStartup::install_panic_hook();
    info!(target: "runtime", "startup");

    let config = AppStartup::load_config(&args)?;
    let backend = core_client::HttpBackend::new(core_client::HttpBackendConfig {
        base_url: config.file.server.base_url.clone(),
        token: config.token(),
        timeout: config.request_timeout(),
    })
    .context("building chat backend")?;

    let mut terminal = CrosstermBackend::new();
    terminal.set_title("hallchat")?;
    let mut guard = terminal.enter_guard()?;
    let size = guard.backend().size()?;

    let (tx, rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let (input_task, input_shutdown) = core_input::spawn_async_input(tx.clone());
    let mut registry = EventSourceRegistry::new();
    registry.register(TickEventSource::new(config.anim_interval()));
    let source_handles = registry.spawn_all(&tx);

    let executor = EffectExecutor::new(
        Arc::new(backend),
        config.file.chat.room.clone(),
        config.file.chat.page_size,
        config.poll_interval(),
        tx,
    );
    let model = ChatModel::new(config.status_ttl());
    let mut runtime = ChatRuntime::new(model, executor, rx, size);
    runtime.attach_tasks(input_task, input_shutdown, source_handles);
    let result = runtime.run().await;

    drop(guard);
    info!(target: "runtime", "exit");
    result
}
