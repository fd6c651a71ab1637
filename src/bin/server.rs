//! Qwen MCP Server
//!
//! Run with: qwen-mcp-server

use std::io::Write;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qwen_mcp::completion::create_client;
use qwen_mcp::config::{
    Backend, CompletionConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
    DEFAULT_TIMEOUT_SECS,
};
use qwen_mcp::mcp::{McpServer, QwenHandler};

#[derive(Parser, Debug)]
#[command(name = "qwen-mcp-server")]
#[command(about = "MCP server exposing Qwen chat and code generation tools")]
#[command(version)]
struct Args {
    /// OpenRouter API key
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "QWEN_MCP_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Model identifier sent to the API
    #[arg(long, env = "QWEN_MCP_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature
    #[arg(long, env = "QWEN_MCP_TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f64,

    /// Completion request timeout in seconds
    #[arg(long, env = "QWEN_MCP_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Completion backend (openrouter, offline)
    #[arg(long, env = "QWEN_MCP_BACKEND", default_value = "openrouter")]
    backend: Backend,

    /// Log output format
    #[arg(long, env = "QWEN_MCP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl Args {
    fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            backend: self.backend,
            api_key: self.api_key.clone().filter(|k| !k.trim().is_empty()),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Logs go to stderr; stdout carries nothing but protocol responses
fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Exit cleanly on Ctrl-C instead of dying mid-line
///
/// The main thread blocks on stdin, so the signal is awaited on a helper
/// thread with its own runtime. Returns once the handler is installed.
fn spawn_interrupt_watcher() -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create signal runtime")?;
    let (ready_tx, ready_rx) = std::sync::mpsc::channel();

    std::thread::Builder::new()
        .name("interrupt-watcher".to_string())
        .spawn(move || {
            rt.block_on(async move {
                let interrupt = tokio::signal::ctrl_c();
                tokio::pin!(interrupt);

                // The first poll registers the handler
                let early = tokio::select! {
                    biased;
                    result = &mut interrupt => Some(result),
                    _ = std::future::ready(()) => None,
                };
                let _ = ready_tx.send(());

                let result = match early {
                    Some(result) => result,
                    None => interrupt.await,
                };
                match result {
                    Ok(()) => shut_down(),
                    Err(e) => tracing::error!("Unable to listen for interrupt: {}", e),
                }
            });
        })
        .context("Failed to spawn interrupt watcher")?;

    ready_rx
        .recv()
        .context("Interrupt watcher stopped before installing its handler")?;
    Ok(())
}

/// Exit with status 0 once the response line being written, if any, is out
fn shut_down() -> ! {
    tracing::info!("Qwen MCP server shutting down...");
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.flush();
    std::process::exit(0)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_format);

    let config = args.completion_config();
    if config.backend == Backend::OpenRouter && config.api_key.is_none() {
        tracing::warn!("OPENROUTER_API_KEY is not set; tool calls will return an error message");
    }

    let client = create_client(&config).context("Failed to create completion client")?;
    tracing::debug!(model = client.model_name(), "Completion backend ready");

    spawn_interrupt_watcher()?;

    let server = McpServer::new(QwenHandler::new(client));

    tracing::info!("Qwen MCP server starting...");
    server.run().context("MCP transport failed")?;
    tracing::info!("Qwen MCP server shutting down...");

    Ok(())
}
