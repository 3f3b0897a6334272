mod browse;
mod render;

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, load_settings_from, wait_for_detail, wait_for_list, ClientSettings,
    DirectoryClient, DirectoryService, FailureReporting, HttpDirectoryService, ResponseOrdering,
    Settlement, UnavailableDirectoryService,
};
use shared::domain::{EmployeeId, FilterField, ResultLimit};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::render::{render_dialog, render_table};

#[derive(Parser, Debug)]
#[command(name = "employee-directory", about = "Browse the employee directory")]
struct Cli {
    /// Settings file (defaults to ./directory.toml).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    /// latest_request or last_response
    #[arg(long)]
    response_ordering: Option<ResponseOrdering>,
    /// Report failed queries instead of silently keeping the previous data.
    #[arg(long)]
    surface_errors: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one page of employees.
    List {
        #[arg(long, value_parser = parse_limit)]
        limit: Option<ResultLimit>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
    },
    /// Print one employee's details.
    Show { id: String },
    /// Interactive session.
    Browse,
}

fn parse_limit(raw: &str) -> Result<ResultLimit, String> {
    let value = raw
        .parse::<u32>()
        .map_err(|_| format!("`{raw}` is not a number"))?;
    ResultLimit::try_from(value).map_err(|err| err.to_string())
}

fn settings_for(cli: &Cli) -> ClientSettings {
    let mut settings = match &cli.config {
        Some(path) => load_settings_from(path, |name| std::env::var(name).ok()),
        None => load_settings(),
    };
    if let Some(server_url) = &cli.server_url {
        settings.server_url = server_url.clone();
    }
    if let Some(ordering) = cli.response_ordering {
        settings.response_ordering = ordering;
    }
    if cli.surface_errors {
        settings.failure_reporting = FailureReporting::Surface;
    }
    settings
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = settings_for(&cli);
    if let Command::List {
        limit: Some(limit), ..
    } = &cli.command
    {
        settings.default_limit = *limit;
    }

    let service: Arc<dyn DirectoryService> = if settings.server_url.trim().is_empty() {
        warn!("no directory server configured; every query will fail");
        Arc::new(UnavailableDirectoryService)
    } else {
        Arc::new(
            HttpDirectoryService::new(&settings)
                .with_context(|| format!("cannot use directory at {}", settings.server_url))?,
        )
    };
    let client = DirectoryClient::new(service, &settings);
    let mut events = client.subscribe_events();

    match cli.command {
        Command::List {
            last_name,
            first_name,
            ..
        } => {
            client
                .stage_edit(FilterField::LastName, last_name.as_deref().unwrap_or_default())
                .await;
            client
                .stage_edit(FilterField::FirstName, first_name.as_deref().unwrap_or_default())
                .await;
            let ticket = client.confirm_search().await;
            let settlement = wait_for_list(&mut events, ticket.generation).await?;
            report(&settings, settlement)?;
            print!("{}", render_table(&client.snapshot().await));
        }
        Command::Show { id } => {
            let ticket = client.activate_row(EmployeeId::new(id)).await;
            let settlement = wait_for_detail(&mut events, ticket.generation).await?;
            report(&settings, settlement)?;
            print!("{}", render_dialog(&client.snapshot().await.modal));
        }
        Command::Browse => browse::run(Arc::new(client)).await?,
    }

    Ok(())
}

fn report(settings: &ClientSettings, settlement: Settlement) -> Result<()> {
    match settlement {
        Settlement::Failed(error) if settings.failure_reporting == FailureReporting::Surface => {
            bail!("query failed ({:?}): {}", error.code, error.message)
        }
        _ => Ok(()),
    }
}
