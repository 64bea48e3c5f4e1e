//! Command line front end for the review scraping pipeline.

mod store;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use revradar_core::{load_app_config, AppConfig, Credential};
use revradar_scraper::{
    acquire_credential, scrape_all, ApiReviewSource, ConcurrencyGuard, DomReviewSource,
    RenderedClient, RenderedResolver, Resolution, ReviewClient, ReviewSource, StaticResolver,
};

use crate::store::JsonFileStore;

#[derive(Debug, Parser)]
#[command(name = "revradar")]
#[command(about = "Company review aggregation for the 2GIS directory")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve a company name to its branches.
    Resolve {
        company: String,
        /// Drive a rendered page instead of static HTTP.
        #[arg(long)]
        rendered: bool,
    },
    /// Fetch reviews for one branch via the public review API.
    Reviews {
        branch_id: String,
        /// Session API key; omit to try the keyless degraded mode.
        #[arg(long, default_value = "")]
        key: String,
    },
    /// Resolve a company and scrape every branch's reviews to disk.
    Scrape {
        company: String,
        /// Output directory for the JSON store.
        #[arg(long, default_value = "./out")]
        out: PathBuf,
        /// Skip the API and extract reviews from rendered pages.
        #[arg(long)]
        dom: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_app_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    match Cli::parse().command {
        Commands::Resolve { company, rendered } => resolve(&config, &company, rendered).await,
        Commands::Reviews { branch_id, key } => reviews(&config, &branch_id, key).await,
        Commands::Scrape { company, out, dom } => scrape(&config, &company, out, dom).await,
    }
}

async fn resolve(config: &AppConfig, company: &str, rendered: bool) -> anyhow::Result<()> {
    let resolution = if rendered {
        let client = RenderedClient::launch(config).await?;
        let resolution = RenderedResolver::new(&client, config).resolve(company).await;
        client.shutdown().await?;
        resolution?
    } else {
        StaticResolver::from_config(config)?.resolve(company).await?
    };

    println!("{}", serde_json::to_string_pretty(&resolution)?);
    Ok(())
}

async fn reviews(config: &AppConfig, branch_id: &str, key: String) -> anyhow::Result<()> {
    let client = ReviewClient::from_config(config)?;
    let reviews = client
        .fetch_reviews(branch_id, &Credential(key), config.review_page_size)
        .await;
    println!("{}", serde_json::to_string_pretty(&reviews)?);
    Ok(())
}

async fn scrape(
    config: &AppConfig,
    company: &str,
    out: PathBuf,
    dom: bool,
) -> anyhow::Result<()> {
    let resolution = StaticResolver::from_config(config)?.resolve(company).await?;
    if resolution.branches.is_empty() {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
        tracing::info!(company, "nothing to scrape: no branches resolved");
        return Ok(());
    }

    let source = pick_source(config, &resolution, dom).await?;
    let store = Arc::new(JsonFileStore::new(&out)?);
    let guard = ConcurrencyGuard::new(config.max_concurrent_scrapes)?;

    let outcome = scrape_all(&resolution, source, store, &guard).await?;
    println!(
        "{}",
        serde_json::json!({
            "company": resolution.company.name,
            "branches": outcome.branches,
            "failed": outcome.failed,
            "reviews_stored": outcome.reviews_stored,
            "out": out,
        })
    );
    Ok(())
}

/// The API source when a credential can be intercepted, the DOM source when
/// it cannot (or when forced).
async fn pick_source(
    config: &AppConfig,
    resolution: &Resolution,
    dom: bool,
) -> anyhow::Result<Arc<dyn ReviewSource>> {
    let rendered = RenderedClient::launch(config).await?;

    if dom {
        return Ok(Arc::new(DomReviewSource::new(Arc::new(rendered), config)));
    }

    // Any branch carries the session credential; take the first.
    match acquire_credential(&rendered, config, &resolution.branches[0]).await {
        Ok(key) => {
            rendered.shutdown().await?;
            let client = ReviewClient::from_config(config)?;
            Ok(Arc::new(ApiReviewSource::new(
                client,
                key,
                config.review_page_size,
            )))
        }
        Err(err) => {
            tracing::warn!(error = %err, "credential capture failed, falling back to DOM extraction");
            Ok(Arc::new(DomReviewSource::new(Arc::new(rendered), config)))
        }
    }
}
