use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    load_settings, ListEvent, ListProjection, LoadOutcome, LoadState, PaginatedListController,
    RemoteCatalogClient,
};
use shared::domain::CatalogEntry;
use tracing::{debug, info};

/// Pages through a remote catalog the way a scrolling list would.
#[derive(Parser, Debug)]
struct Args {
    /// Catalog base url; overrides catalog.toml and CATALOG_URL.
    #[arg(long)]
    server_url: Option<String>,
    /// Bearer token sent with every page request.
    #[arg(long)]
    api_token: Option<String>,
    /// Stop after this many pages even if more are available.
    #[arg(long, default_value_t = 5)]
    max_pages: u32,
    /// Case-insensitive title filter applied to the loaded entries.
    #[arg(long, default_value = "")]
    filter: String,
    /// Sort the visible entries A–Z by title.
    #[arg(long)]
    sort: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings()?;
    if let Some(server_url) = args.server_url {
        settings.base_url = server_url;
    }
    if args.api_token.is_some() {
        settings.api_token = args.api_token;
    }

    let client = RemoteCatalogClient::from_settings(&settings)
        .with_context(|| format!("failed to set up catalog client for {}", settings.base_url))?;
    info!(endpoint = %client.endpoint(), "browsing catalog");
    let controller =
        PaginatedListController::new_with_empty_page_limit(Arc::new(client), settings.max_empty_pages);

    let mut events = controller.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ListEvent::EntriesAppended { appended, total } => {
                    debug!(appended, total, "list grew");
                }
                ListEvent::ErrorChanged(Some(message)) => debug!(%message, "list error"),
                _ => {}
            }
        }
    });

    let mut pages = 0;
    if controller.load_initial().await == LoadOutcome::Applied {
        pages += 1;
    }
    while pages < args.max_pages && controller.load_state().await == LoadState::Loaded {
        let Some(last) = controller.entries().await.last().cloned() else {
            break;
        };
        match controller.load_next_if_needed(&last).await {
            LoadOutcome::Applied => pages += 1,
            _ => break,
        }
    }

    let snapshot = controller.snapshot().await;
    let projection = ListProjection::new()
        .with_filter(args.filter)
        .with_sort(args.sort);
    let visible = projection.apply(&snapshot.entries);

    if visible.is_empty() {
        println!("No entries found.");
    }
    for entry in &visible {
        println!("{}", render_entry(entry));
    }
    println!(
        "-- {} shown / {} loaded over {pages} page(s); state: {}",
        visible.len(),
        snapshot.entries.len(),
        describe_state(&snapshot.load_state)
    );
    if let Some(message) = snapshot.error {
        eprintln!("error: {message}");
    }

    Ok(())
}

fn render_entry(entry: &CatalogEntry) -> String {
    match entry.release_date {
        Some(date) => format!("{:>6}  {} ({})", entry.id, entry.title, date.format("%Y")),
        None => format!("{:>6}  {}", entry.id, entry.title),
    }
}

fn describe_state(state: &LoadState) -> String {
    match state {
        LoadState::Idle => "idle".to_string(),
        LoadState::Loading => "loading".to_string(),
        LoadState::Loaded => "more available".to_string(),
        LoadState::Exhausted => "end of catalog".to_string(),
        LoadState::Failed(error) => format!("failed ({error})"),
    }
}
