use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, AppealsAdapter, DonationsAdapter, EngineSettings, EnvCredentialProvider,
    HttpTransport, MutationAction, QueryEngine, ResourceAdapter, UsersAdapter, WalletAdapter,
};
use serde::Serialize;
use serde_json::{Map, Value};
use shared::domain::{ResourceId, ResourceKind};
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Console driver for the admin dashboard resource screens")]
struct Cli {
    /// appeals, donations, users or wallet
    #[arg(long, default_value = "appeals")]
    resource: ResourceKind,
    /// Settings file; defaults to ./dashboard.toml when present.
    #[arg(long)]
    settings: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one page and print the rendered view.
    List {
        #[arg(long)]
        search: Option<String>,
        /// Categorical filter as key=value, repeatable.
        #[arg(long = "filter")]
        filters: Vec<String>,
        /// Boolean filter as key=true|false, repeatable.
        #[arg(long = "flag")]
        flags: Vec<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Print the stat cards with global and filtered values.
    Stats,
    /// Apply a stat card's filters and print the view.
    Card { key: String },
    /// Send a mutation and print the updated record.
    Mutate {
        id: i64,
        action: String,
        /// JSON object sent as the action payload.
        #[arg(long)]
        payload: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let settings = load_settings(cli.settings.as_deref())?;
    info!(
        resource = %cli.resource,
        api_base_url = %settings.api_base_url,
        "dashboard starting"
    );

    match cli.resource {
        ResourceKind::Appeals => run(AppealsAdapter, &settings, cli.command).await,
        ResourceKind::Donations => run(DonationsAdapter, &settings, cli.command).await,
        ResourceKind::Users => run(UsersAdapter, &settings, cli.command).await,
        ResourceKind::WalletTransactions => run(WalletAdapter, &settings, cli.command).await,
    }
}

async fn run<A: ResourceAdapter>(
    adapter: A,
    settings: &EngineSettings,
    command: Command,
) -> Result<()> {
    let credentials = Arc::new(EnvCredentialProvider::new(settings.token_env.clone()));
    let transport = HttpTransport::from_settings(settings, credentials)?;
    let engine = QueryEngine::new(adapter, Arc::new(transport), settings);

    match command {
        Command::List {
            search,
            filters,
            flags,
            page,
            page_size,
        } => {
            engine.mount().await;
            for filter in &filters {
                let (key, value) = split_pair(filter)?;
                engine.set_category(key, value).await;
            }
            for flag in &flags {
                let (key, value) = split_pair(flag)?;
                let value: bool = value
                    .parse()
                    .with_context(|| format!("flag {key} must be true or false"))?;
                engine.set_flag(key, value).await;
            }
            if let Some(search) = search {
                let ticket = engine.set_search_input(search).await;
                engine.commit_search(ticket).await;
            }
            if let Some(page_size) = page_size {
                engine.set_page_size(page_size).await;
            }
            if page > 1 {
                engine.go_to_page(page).await;
            }
            print_json(&engine.snapshot().await)
        }
        Command::Stats => {
            engine.mount().await;
            let snapshot = engine.snapshot().await;
            for card in &snapshot.cards {
                println!(
                    "{:<20} global={:>12} filtered={:>12}",
                    card.label,
                    card.global.render(),
                    card.filtered.render()
                );
            }
            Ok(())
        }
        Command::Card { key } => {
            engine.mount().await;
            engine.select_stat_card(&key).await?;
            print_json(&engine.snapshot().await)
        }
        Command::Mutate {
            id,
            action,
            payload,
        } => {
            let action = MutationAction::parse(&action)
                .ok_or_else(|| anyhow!("unknown action '{action}'"))?;
            let payload = payload.as_deref().map(parse_payload).transpose()?;
            let outcome = engine.mutate(ResourceId(id), action, payload).await?;
            match outcome.updated {
                Some(updated) => print_json(&updated),
                None => {
                    println!("{action} applied to {id}");
                    Ok(())
                }
            }
        }
    }
}

fn split_pair(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => bail!("expected key=value, got '{raw}'"),
    }
}

fn parse_payload(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str(raw).context("payload is not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("payload must be a JSON object, got {other}"),
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
