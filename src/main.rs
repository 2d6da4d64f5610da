use clap::{Parser, Subcommand};
use feedpost::config::{self, AppConfig, HostKind};
use feedpost::feed::RedditFeed;
use feedpost::host::{ImageHost, ImgurHost, LocalDirHost};
use feedpost::http::HttpClient;
use feedpost::imaging::{ImageBuffer, RustBackend, normalize, resolve_format};
use feedpost::ledger::FileLedger;
use feedpost::pipeline::{Collaborators, Pipeline, PipelineSettings};
use feedpost::publish::{GraphPublisher, LogPublisher, Publisher, load_hashtags};
use feedpost::{logging, output, schedule};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "feedpost")]
#[command(about = "Repost the top feed image on a daily schedule")]
#[command(long_about = "\
Repost the top feed image on a daily schedule

Each run takes the highest-ranked post from the feed that is not marked
adult, is not a video, and has not been handled before. Its id is recorded
in the ledger first, then the image is downloaded, padded onto a white
canvas if its aspect ratio falls outside 0.8-1.9, hosted if it was padded,
and published with a caption and an attribution comment.

Files (paths configurable):
  feedpost.toml   configuration (optional, stock defaults otherwise)
  posts           ledger of handled ids, one per line
  hashtags        hashtag pool, one per line
  logs/           dated log files

Run 'feedpost gen-config' to generate a documented feedpost.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = config::CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Post on the daily schedule until interrupted
    Run,
    /// Run the pipeline now
    Once {
        /// Number of invocations
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
    /// Pad a local image file into the accepted aspect ratio band
    Normalize {
        input: PathBuf,
        #[arg(value_name = "OUTPUT")]
        dest: PathBuf,
    },
    /// Validate configuration and ledger without posting
    Check,
    /// Print a stock feedpost.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run => {
            let config = config::load_config(&cli.config)?;
            logging::init(&config.logging.dir, &config.logging.filter)?;
            let slots = config.slots()?;
            let mut pipeline = build_pipeline(&config)?;
            schedule::run_forever(&mut pipeline, &slots, config.schedule.poll_interval());
        }
        Command::Once { count } => {
            let config = config::load_config(&cli.config)?;
            logging::init(&config.logging.dir, &config.logging.filter)?;
            let mut pipeline = build_pipeline(&config)?;
            let outcomes = pipeline.run(count)?;
            output::print_run_outcomes(&outcomes);
        }
        Command::Normalize { input, dest } => {
            let config = config::load_config(&cli.config)?;
            normalize_file(&input, &dest, &config)?;
        }
        Command::Check => {
            let config = config::load_config(&cli.config)?;
            let ledger = FileLedger::open(&config.ledger.path)?;
            let slots = config.slots()?;
            let missing = if config.publishes() {
                config.missing_credentials()
            } else {
                Vec::new()
            };
            output::print_check(
                &cli.config,
                cli.config.exists(),
                ledger.path(),
                ledger.len(),
                schedule::daily_posts(&slots),
                &missing,
            );
            if !missing.is_empty() {
                return Err(format!("{} setting(s) missing", missing.len()).into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Assemble the production collaborators described by `config`.
fn build_pipeline(config: &AppConfig) -> Result<Pipeline, Box<dyn std::error::Error>> {
    if config.publishes() {
        let missing = config.missing_credentials();
        if !missing.is_empty() {
            return Err(format!("missing settings: {}", missing.join(", ")).into());
        }
    }

    let http = HttpClient::new(&config.feed.user_agent, config.http.timeout())?;
    let ledger = FileLedger::open(&config.ledger.path)?;
    tracing::info!(
        ledger = %ledger.path().display(),
        seen = ledger.len(),
        "ledger loaded"
    );

    let host: Box<dyn ImageHost> = match config.host.kind {
        HostKind::Imgur => Box::new(ImgurHost::new(
            http.clone(),
            &config.host.endpoint,
            &config.host.client_id,
        )),
        HostKind::Local => Box::new(LocalDirHost::new(&config.host.output_dir)),
    };

    let publisher: Box<dyn Publisher> = if config.publishes() {
        let hashtags = load_hashtags(&config.publisher.hashtags_file)?;
        Box::new(GraphPublisher::new(
            http.clone(),
            &config.publisher.graph_url,
            &config.publisher.account_id,
            &config.publisher.access_token,
            hashtags,
            config.publisher.hashtag_count,
        ))
    } else {
        tracing::warn!("dry run: posts will only be logged");
        Box::new(LogPublisher)
    };

    let parts = Collaborators {
        feed: Box::new(RedditFeed::new(http.clone(), &config.feed.base_url)),
        ledger: Box::new(ledger),
        fetcher: Box::new(http),
        backend: Box::new(RustBackend::new()),
        host,
        publisher,
    };
    let settings = PipelineSettings {
        feed_limit: config.feed.limit,
        quality: config.images.quality(),
    };
    Ok(Pipeline::new(parts, settings))
}

fn normalize_file(
    input: &Path,
    dest: &Path,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = RustBackend::new();
    let bytes = std::fs::read(input)?;
    let format = resolve_format(&backend, &input.to_string_lossy(), &bytes)?;
    let image = ImageBuffer::load(&backend, bytes, &format)?;
    let original = image.dimensions();
    let decision = image.decision();
    let result = normalize(&backend, image, config.images.quality())?;
    std::fs::write(dest, &result.bytes)?;
    output::print_normalize(input, dest, original, decision);
    Ok(())
}
