use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use formchat_application::prompt::validate_templates;
use formchat_infrastructure::{ConfigService, FormChatPaths, LoadedConfig};
use formchat_interaction::OpenAIApiAgent;
use formchat_web::{AppState, create_router};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "formchat-web")]
#[command(about = "Conversational form filling server")]
#[command(version)]
struct Cli {
    /// Path to formchat.toml (default: ~/.config/formchat/formchat.toml)
    #[arg(long, env = "FORMCHAT_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Address to listen on, overrides [server].bind
    #[arg(long, global = true)]
    bind: Option<String>,

    /// Data directory, overrides [storage].data_dir
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Also write a daily log file to the data directory
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server (default)
    Serve,
    /// Validate the configuration and print the forms
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigService::new()
        .load(cli.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(dir) = &cli.data_dir {
        config.root.storage.data_dir = Some(dir.display().to_string());
    }
    if let Some(bind) = &cli.bind {
        config.root.server.bind = bind.clone();
    }
    let paths = config.paths()?;

    let _guard = init_tracing(cli.log_file.then_some(&paths))?;
    validate_templates(&config.catalog)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Check => {
            check(&config, &paths);
            Ok(())
        }
    }
}

fn init_tracing(log_paths: Option<&FormChatPaths>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,formchat=debug"));

    let (file_layer, guard) = match log_paths {
        Some(paths) => {
            let logs_dir = paths.logs_dir();
            std::fs::create_dir_all(&logs_dir)
                .with_context(|| format!("failed to create {}", logs_dir.display()))?;
            let appender = tracing_appender::rolling::daily(logs_dir, "formchat-web.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn serve(config: LoadedConfig) -> Result<()> {
    let agent = Arc::new(OpenAIApiAgent::try_from_env(&config.root.llm)?);
    info!(model = %agent.model(), "Using OpenAI-compatible completion agent");

    let state = AppState::from_config(&config, agent)?;
    spawn_sweeper(
        state.clone(),
        Duration::from_secs(config.root.sessions.sweep_interval_secs.max(1)),
    );

    let addr: SocketAddr = config
        .root
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", config.root.server.bind))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, forms = config.catalog.forms().len(), "FormChat listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("FormChat stopped");
    Ok(())
}

fn spawn_sweeper(state: AppState, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            state.service.evict_idle_sessions().await;
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

fn check(config: &LoadedConfig, paths: &FormChatPaths) {
    println!("config: {}", config.path.display());
    println!("records: {}", paths.records_dir().display());
    for form in config.catalog.forms() {
        println!();
        println!("[{}] {}", form.name(), form.title());
        for field in form.fields() {
            println!("  {} ({})", field.label, field.name);
        }
        if form.primary_key().is_empty() {
            println!("  primary key: none");
        } else {
            println!("  primary key: {}", form.primary_key().fields().join(" + "));
        }
        if let Some(context) = form.context_form() {
            println!("  context form: {}", context);
        }
    }
}
