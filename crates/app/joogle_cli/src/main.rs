// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands};
use joogle_core::Console;
use joogle_core::auth::AccessTokenSession;
use joogle_core::config::ConsoleConfig;
use joogle_core::domain::{ClaimPhase, DomainStore, MemoryDomainStore, RestDomainStore};
use joogle_core::transport::{HttpTransport, Transport};
use tokio_util::sync::CancellationToken;

mod cli;
mod logging;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = run().await {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init()?;

    let args = Cli::parse();

    match &args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
        Commands::Status { ticks } => {
            let console = build_console(&args)?;
            status(&console, *ticks).await?;
        }
        Commands::Domains => {
            let console = build_console(&args)?;
            let domains = console.owned_domains().await?;
            if domains.is_empty() {
                log::info!("no owned domains");
            }
            for record in domains {
                println!("{}\t{}", record.domain, record.created_at.to_rfc3339());
            }
        }
        Commands::Claim { domain } => {
            let console = build_console(&args)?;
            let claim = console.request_verification_key(domain).await?;
            let Some(token) = claim.verification_token else {
                return Err(Error::Custom(format!(
                    "no verification key issued for {domain}"
                )));
            };
            println!("Add this TXT record to {}:", claim.domain_name);
            println!("{token}");
        }
        Commands::Verify { domain } => {
            let console = build_console(&args)?;
            // Each invocation starts a fresh claim; the key is stable per
            // domain and user, so request it again before checking.
            console.request_verification_key(domain).await?;
            let claim = console.check_verification(domain).await?;
            match (claim.phase, claim.error) {
                (ClaimPhase::Verified, _) => println!(
                    "{} verified, crawl queue position {}",
                    claim.domain_name, claim.queue_position
                ),
                (_, Some(message)) => return Err(Error::Custom(message)),
                (phase, None) => {
                    return Err(Error::Custom(format!("claim stuck in {phase:?}")));
                }
            }
        }
        Commands::Analytics { domain } => {
            let console = build_console(&args)?;
            let Some(overview) = console.domain_overview(domain).await? else {
                return Err(Error::Custom(format!(
                    "{domain} is not one of your domains"
                )));
            };
            println!(
                "{} (since {})",
                overview.record.domain,
                overview.record.created_at.to_rfc3339()
            );
            match overview.analytics {
                None => println!("analytics unavailable"),
                Some(analytics) => {
                    println!("{} indexed pages", analytics.indexed_pages.len());
                    for page in analytics.indexed_pages {
                        println!("{:.3}\t{}\t{}", page.ttr, page.url, page.title);
                    }
                }
            }
        }
        Commands::Index { urls } => {
            let console = build_console(&args)?;
            console.queue_urls(urls).await?;
            println!("queued {} url(s)", urls.len());
        }
    }

    Ok(())
}

fn build_console(args: &Cli) -> Result<Console> {
    let mut config = ConsoleConfig::from_env()?;
    if let Some(api_url) = &args.api_url {
        config = config.with_api_url(api_url)?;
    }

    let session = match &args.access_token {
        Some(token) => AccessTokenSession::from_access_token(token)?,
        None => AccessTokenSession::anonymous(),
    };

    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new());
    let domains: Arc<dyn DomainStore> = match &config.domain_store {
        Some(store) => Arc::new(RestDomainStore::new(store, transport.clone())?),
        None => {
            log::warn!("SUPABASE_URL/SUPABASE_KEY not set, owned domains are not persisted");
            Arc::new(MemoryDomainStore::new())
        }
    };

    log::debug!("api at {}", config.api_url);
    Ok(Console::new(config, Arc::new(session), domains, transport))
}

async fn status(console: &Console, ticks: u64) -> Result<()> {
    let cancel = CancellationToken::new();
    let (handle, mut rx) = console.telemetry_sampler().spawn(cancel.clone());

    let mut seen = 0;
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = *rx.borrow_and_update();
                println!(
                    "queue {}\tindexed {}\ttendency {:+.4} links/s",
                    snapshot.queue_length, snapshot.indexed_urls, snapshot.tendency
                );
                seen += 1;
                if ticks != 0 && seen >= ticks {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    cancel.cancel();
    if let Err(e) = handle.await {
        return Err(Error::Custom(format!("telemetry sampler failed: {e}")));
    }
    Ok(())
}
