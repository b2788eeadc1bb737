//! Prospero MCP server: entry point.

use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tokio_util::sync::CancellationToken;

use prospero_mcp::config::{load_prompt_registry, resolve_prompts_path};
use prospero_mcp::protocol::ProtocolHandler;
#[cfg(feature = "sse")]
use prospero_mcp::session::store::DEFAULT_MAX_SESSIONS;
use prospero_mcp::transport::StdioTransport;
use prospero_mcp::types::{Implementation, InitializeResult, SERVER_NAME, SERVER_VERSION};

#[derive(Parser)]
#[command(
    name = "prospero-mcp",
    about = "MCP server for Prospero: parameterised prompts for agent clients",
    version
)]
struct Cli {
    /// Prompt definitions: a .json file or a directory of them.
    #[arg(short, long, global = true)]
    prompts: Option<String>,

    /// Server name reported in serverInfo.
    #[arg(long, global = true, default_value = SERVER_NAME)]
    name: String,

    /// Server version reported in serverInfo.
    #[arg(long, global = true, default_value = SERVER_VERSION)]
    server_version: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Start MCP server over Streamable HTTP (POST + SSE).
    #[cfg(feature = "sse")]
    ServeHttp {
        /// Listen address (host:port).
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: String,

        /// Route the MCP endpoint is mounted on.
        #[arg(long, default_value = "/mcp")]
        path: String,

        /// Identified sessions kept before the oldest idle ones are evicted.
        #[arg(long, default_value_t = DEFAULT_MAX_SESSIONS)]
        max_sessions: usize,
    },

    /// Load and check prompt definitions.
    Validate,

    /// Print server capabilities as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   prospero-mcp completions bash > ~/.local/share/bash-completion/completions/prospero-mcp
    ///   prospero-mcp completions zsh > ~/.zfunc/_prospero-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

/// How long shutdown waits for blocking tasks. Tokio reads stdin on a
/// blocking thread that only returns once a line or EOF arrives.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(cli));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    // stdout carries protocol messages; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let server_info = Implementation::new(&cli.name, &cli.server_version);
    let prompts_path = resolve_prompts_path(cli.prompts.as_deref());

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let registry = load_prompt_registry(&prompts_path)?;
            let handler = ProtocolHandler::with_server_info(Arc::new(registry), server_info);
            let transport =
                StdioTransport::new(Arc::new(handler)).with_cancellation(shutdown_token());
            transport.run().await?;
        }

        #[cfg(feature = "sse")]
        Commands::ServeHttp {
            addr,
            path,
            max_sessions,
        } => {
            use prospero_mcp::transport::SseTransport;

            let registry = load_prompt_registry(&prompts_path)?;
            tracing::info!("Prospero MCP server ({} prompts)", registry.len());
            let handler = ProtocolHandler::with_server_info(Arc::new(registry), server_info);
            let transport = SseTransport::new(Arc::new(handler), shutdown_token())
                .with_path(path)
                .with_max_sessions(max_sessions);
            transport.run(&addr).await?;
        }

        Commands::Validate => match prospero_prompts::load_definitions(&prompts_path) {
            Ok(definitions) => {
                println!("Valid prompt definitions: {}", prompts_path.display());
                println!("  Prompts: {}", definitions.len());
                for def in &definitions {
                    let required = def.required_arguments().count();
                    println!(
                        "  - {} ({} arguments, {required} required{})",
                        def.name,
                        def.arguments.len(),
                        if def.has_content() { "" } else { ", no content" }
                    );
                }
            }
            Err(e) => {
                eprintln!("Invalid prompt definitions: {e}");
                std::process::exit(1);
            }
        },

        Commands::Info => {
            let registry = load_prompt_registry(&prompts_path)?;
            let init = InitializeResult::for_server(&server_info);
            let prompts = registry.list();
            let info = serde_json::json!({
                "server": init.server_info,
                "protocol_version": init.protocol_version,
                "capabilities": init.capabilities,
                "prompts": prompts.iter().map(|p| &p.name).collect::<Vec<_>>(),
                "prompt_count": prompts.len(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "prospero-mcp", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// A token cancelled on Ctrl+C / SIGINT.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                trigger.cancel();
            }
            Err(e) => tracing::error!("Failed to listen for shutdown signal: {e}"),
        }
    });
    token
}
