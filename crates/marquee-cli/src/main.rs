use std::net::SocketAddr;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use marquee_core::{AppConfig, MovieRecord, load_snapshot};
use marquee_enrich::{FileListing, RepertoireService};
use marquee_server::{AppState, run_server};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "marquee",
    about = "Cinema repertoire ranked by IMDb and Filmweb ratings",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format. Also enabled by setting MARQUEE_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the listing, enrich and rank it.
    Fetch {
        /// Read a saved listing page instead of the live one.
        #[arg(long)]
        listing_file: Option<String>,
        /// Ignore a fresh snapshot.
        #[arg(long)]
        force: bool,
    },

    /// Print the last saved ranking.
    Show,

    /// Serve the ranking over HTTP.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Write a default config file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let json_output = cli.json || std::env::var("MARQUEE_JSON").as_deref() == Ok("1");

    let config_path = AppConfig::config_path();
    let config = AppConfig::load()
        .with_context(|| format!("cannot load config from {}", config_path.display()))?;
    tracing::debug!("config loaded from {}", config_path.display());

    match cli.command {
        Commands::Fetch {
            listing_file,
            force,
        } => {
            config.validate()?;
            let service = match listing_file {
                Some(path) => RepertoireService::with_listing(&config, Box::new(FileListing::new(path)))?,
                None => RepertoireService::from_config(&config)?,
            };

            let (movies, reports) = if force {
                let refreshed = service.refresh().await?;
                (refreshed.movies, refreshed.reports)
            } else {
                (service.movies(false).await?, Vec::new())
            };
            let dur = start.elapsed().as_millis() as u64;

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": movies,
                    "meta": {"duration_ms": dur, "reports": reports},
                }))?;
            } else {
                print_movies(&movies);
                for report in &reports {
                    println!(
                        "{}: {} enriched, {} without match, {} failed",
                        report.source,
                        report.enriched.len(),
                        report.unmatched.len(),
                        report.errors.len()
                    );
                }
            }
        }

        Commands::Show => {
            let path = config.snapshot_path();
            let movies = load_snapshot(&path)
                .with_context(|| "no saved ranking yet, run `marquee fetch` first".to_string())?;
            let dur = start.elapsed().as_millis() as u64;

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":movies,"meta":{"duration_ms":dur}}))?;
            } else {
                print_movies(&movies);
            }
        }

        Commands::Serve { host, port } => {
            config.validate()?;
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .with_context(|| format!("invalid listen address {host}:{port}"))?;

            let service = RepertoireService::from_config(&config)?;
            run_server(addr, AppState::new(service)).await?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":config,"meta":{"path":config_path}}))?;
                } else {
                    println!("# {}", config_path.display());
                    print!("{}", toml::to_string_pretty(&config)?);
                }
            }
            ConfigAction::Init { force } => {
                if config_path.exists() && !force {
                    eprintln!(
                        "Config already exists at {}. Use --force to overwrite.",
                        config_path.display()
                    );
                    std::process::exit(1);
                }
                AppConfig::default().save_to(&config_path)?;
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":{"path":config_path}}))?;
                } else {
                    println!("Wrote default config to {}", config_path.display());
                    println!("Set omdb.api_key there or export OMDB_API_KEY.");
                }
            }
        },
    }

    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn print_movies(movies: &[MovieRecord]) {
    if movies.is_empty() {
        println!("No movies found.");
        return;
    }
    for (i, movie) in movies.iter().enumerate() {
        let eng = movie
            .title_eng
            .as_deref()
            .map(|t| format!(" ({t})"))
            .unwrap_or_default();
        println!(
            "{:>2}. {}{eng}  IMDb {:.1}  Filmweb {:.1}",
            i + 1,
            movie.title,
            movie.rating.imdb(),
            movie.rating.fweb()
        );
        let mut facts = vec![movie.genres.clone()];
        if let Some(runtime) = movie.pretty_runtime() {
            facts.push(runtime);
        }
        if !movie.released {
            facts.push(format!("premiere {}", movie.date.as_deref().unwrap_or("soon")));
        }
        println!("    {}", facts.join(" | "));
    }
}
