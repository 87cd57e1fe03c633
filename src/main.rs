mod config;
mod search;
mod xdcc;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::search::packlist::PacklistProvider;
use crate::search::ProviderAggregator;
use crate::xdcc::event::TransferEvent;
use crate::xdcc::locator::IrcFile;
use crate::xdcc::transfer::{Transfer, TransferConfig, TransferSettings};

/// Search and fetch files shared over IRC via XDCC.
#[derive(Parser)]
#[command(name = "xgrab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path (default: ~/.config/xgrab/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search registered providers for packs matching the keywords
    Search {
        /// Free-text keywords; all must match
        keywords: Vec<String>,

        /// Local pack-list file to search (repeatable)
        #[arg(long = "packlist", value_name = "FILE")]
        packlists: Vec<PathBuf>,
    },

    /// Download one or more packs by locator
    Fetch {
        /// Locators like irc://irc.rizon.net/#chan/Bot/831
        locators: Vec<String>,

        /// Read additional locators from a file, one per line
        #[arg(long, value_name = "FILE")]
        from_file: Option<PathBuf>,

        /// Directory downloads land in
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Only connect to IRC networks over TLS
        #[arg(long)]
        tls_only: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(if cli.verbose { "xgrab=debug" } else { "xgrab=warn" })
        .with_writer(io::stderr)
        .init();

    let cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Search {
            keywords,
            packlists,
        } => run_search(&cfg, &keywords, &packlists).await,
        Commands::Fetch {
            locators,
            from_file,
            output_dir,
            tls_only,
        } => {
            let any_failed = run_fetch(&cfg, locators, from_file, output_dir, tls_only).await?;
            if any_failed {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

async fn run_search(cfg: &AppConfig, keywords: &[String], packlists: &[PathBuf]) -> Result<()> {
    let mut aggregator =
        ProviderAggregator::with_timeout(Duration::from_secs(cfg.search.timeout_secs));
    for path in packlists {
        match PacklistProvider::open(path) {
            Ok(provider) => aggregator.add_provider(Arc::new(provider)),
            // A broken pack list contributes nothing; the others still run.
            Err(e) => eprintln!("skipping {}: {:#}", path.display(), e),
        }
    }

    let results = aggregator.search(keywords).await?;
    for record in &results {
        if record.size >= 0 {
            print!("{:>14}", record.size);
        } else {
            print!("{:>14}", "?");
        }
        println!("  {}  {}", record.name, record.file);
    }
    eprintln!("{} result(s)", results.len());
    Ok(())
}

async fn run_fetch(
    cfg: &AppConfig,
    locators: Vec<String>,
    from_file: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    tls_only: bool,
) -> Result<bool> {
    let mut raw_locators = locators;
    if let Some(path) = from_file {
        let listing = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read locator list {}", path.display()))?;
        raw_locators.extend(
            listing
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_string),
        );
    }
    if raw_locators.is_empty() {
        bail!("no locators given; pass them as arguments or via --from-file");
    }

    let out_dir = output_dir.unwrap_or_else(|| cfg.dcc.download_dir.clone());
    let settings = TransferSettings {
        registration_timeout: Duration::from_secs(cfg.transfer.registration_timeout_secs),
        request_timeout: Duration::from_secs(cfg.transfer.request_timeout_secs),
        allow_private_ips: !cfg.dcc.reject_private_ips,
        max_file_size: cfg.dcc.max_file_size,
        nickname: cfg.nickname.clone(),
    };

    let mut any_failed = false;
    for raw in raw_locators {
        let file = match IrcFile::parse(&raw) {
            Ok(file) => file,
            Err(e) => {
                eprintln!("{raw}: {e}");
                any_failed = true;
                continue;
            }
        };

        println!("{file}: requesting pack {} from {}", file.pack, file.bot);
        let mut transfer = Transfer::with_settings(
            TransferConfig {
                file: file.clone(),
                out_dir: out_dir.clone(),
                tls_only: tls_only || cfg.transfer.tls_only,
            },
            settings.clone(),
        );

        // Ctrl-C aborts the transfer in flight instead of killing the
        // process mid-write.
        let abort = transfer.abort_handle();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                abort.abort();
            }
        });

        if let Err(reason) = transfer.start().await {
            eprintln!("{file}: {reason}");
            any_failed = true;
            ctrl_c.abort();
            continue;
        }

        let mut events = transfer.events();
        let mut total: u64 = 0;
        while let Some(event) = events.recv().await {
            match event {
                TransferEvent::Started { file_size } => {
                    if file_size > 0 {
                        println!("{file}: downloading {file_size} bytes");
                    } else {
                        println!("{file}: downloading (size unknown)");
                    }
                }
                TransferEvent::Progress { bytes, rate } => {
                    total += bytes;
                    print!("\r  {total} bytes received ({rate} B/s)        ");
                    let _ = io::stdout().flush();
                }
                TransferEvent::Completed => {
                    println!("\r{file}: completed                          ");
                }
                TransferEvent::Aborted { reason } => {
                    eprintln!("\r{file}: aborted: {reason}");
                    any_failed = true;
                }
            }
        }
        ctrl_c.abort();
    }

    Ok(any_failed)
}
