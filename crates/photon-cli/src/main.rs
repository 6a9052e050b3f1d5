//! Photon agent runtime core - demonstration CLI.
//!
//! This binary is a thin consumer of `photon-core`: it loads config, wires
//! up the symbol index, skill manager and (optionally) LSP session
//! manager, registers the concrete tools from `photon-tools` onto a
//! `ToolGateway`, and exposes one-shot subcommands for driving all of it
//! from a shell. The model-facing chat loop lives outside this crate.

mod args;

use std::sync::Arc;

use anyhow::{Context, Result};
use args::{Cli, Commands, IndexAction};
use clap::Parser;
use colored::Colorize;
use photon_core::config::PhotonConfig;
use photon_core::lsp::{protocol::path_to_uri, LspSessionManager};
use photon_core::skills::SkillManager;
use photon_core::symbols::{
    py_provider::PySymbolProvider, rust_provider::RustSymbolProvider,
    tsjs_provider::TsJsSymbolProvider, SymbolIndex,
};
use photon_core::tools::{ToolCall, ToolGateway};
use photon_core::workspace::ScanIgnoreRules;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let working_dir = match cli.working_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("resolving current directory")?,
    };

    let config = PhotonConfig::load(&cli.config_file)
        .with_context(|| format!("loading config file {}", cli.config_file))?;

    init_tracing(config.agent.enable_debug);

    photon_core::config::ensure_photon_rules(&working_dir)
        .context("writing .photon/rules")?;

    let mut skills = SkillManager::new(&working_dir);
    skills
        .sync_and_load(&config.agent.skill_roots)
        .context("syncing skills")?;

    let ignore = ScanIgnoreRules::new(&config.agent.symbol_ignore_patterns);
    let mut index = SymbolIndex::new(
        working_dir.clone(),
        ignore,
        config.agent.symbol_fallback_on_empty,
    );
    index.register_provider(Box::new(RustSymbolProvider));
    index.register_provider(Box::new(TsJsSymbolProvider));
    index.register_provider(Box::new(PySymbolProvider));
    index.load_persisted();
    index.start_async_scan();
    index.start_watching(30);
    let index = Arc::new(index);

    let lsp = if config.agent.enable_lsp && !config.agent.lsp_servers.is_empty() {
        let root_uri = if config.agent.lsp_root_uri.is_empty() {
            path_to_uri(&working_dir.to_string_lossy())
        } else {
            config.agent.lsp_root_uri.clone()
        };
        Some(Arc::new(LspSessionManager::new(root_uri, &config.agent.lsp_servers)))
    } else {
        None
    };

    let mut gateway = ToolGateway::new(working_dir.clone());
    photon_tools::register_all(&mut gateway, index.clone(), Arc::new(skills), lsp.clone());

    let exit = run_command(cli.command, &mut gateway, &index).await;

    if let Some(lsp) = lsp {
        lsp.shutdown_all().await;
    }
    index.stop_watching();

    exit
}

async fn run_command(
    command: Commands,
    gateway: &mut ToolGateway,
    index: &SymbolIndex,
) -> Result<()> {
    match command {
        Commands::Call { tool, args } => {
            let arguments: serde_json::Value =
                serde_json::from_str(&args).context("parsing tool arguments as JSON")?;
            let result = gateway.call(&ToolCall { name: tool, arguments }).await;
            for item in &result.content {
                println!("{}", item.text);
            }
            if let Some(status) = &result.status {
                println!("{}", format!("[{status}]").yellow());
            }
        }
        Commands::Tools => {
            for schema in gateway.schemas() {
                println!("{}", schema.name.bold());
                println!("  {}", schema.description);
                for param in &schema.parameters {
                    let marker = if param.required { "required" } else { "optional" };
                    println!("  - {} ({marker}): {}", param.name, param.description);
                }
            }
        }
        Commands::Index { action } => match action {
            IndexAction::Scan => {
                while index.is_scanning() {
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                }
                println!("{} symbols indexed", index.get_symbol_count());
            }
            IndexAction::Search { query } => {
                for symbol in index.search(&query) {
                    println!("{}:{} {:?} {}", symbol.path, symbol.line, symbol.kind, symbol.name);
                }
            }
        },
    }
    Ok(())
}

fn init_tracing(enable_debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if enable_debug { "debug" } else { "info" })
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
