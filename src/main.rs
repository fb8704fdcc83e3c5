use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use llm_interface::{rank_stage, OpenRouterProvider};
use reddit_client::{RedditClient, RedditOAuth2Config};
use reelrank_core::render::{fetch_stage, StageReport};
use reelrank_core::{
    AppConfig, CoreError, ErrorExt, ErrorReporter, LlmCredentials, RedditCredentials,
    TopicConfig, TopicSource,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "reelrank=info,reddit_client=info,llm_interface=info,reelrank_core=info";

#[derive(Parser)]
#[command(name = "reelrank")]
#[command(about = "Rank movies recommended in Reddit discussions")]
#[command(version)]
struct Cli {
    /// TOML file with topics and endpoints (built-in topics when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for content and ranking artifacts
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch threads and write one content artifact per topic
    Fetch {
        #[arg(short, long = "topic")]
        topics: Vec<String>,
    },

    /// Rank previously fetched content artifacts
    Rank {
        #[arg(short, long = "topic")]
        topics: Vec<String>,
    },

    /// Fetch, then rank
    Run {
        #[arg(short, long = "topic")]
        topics: Vec<String>,
    },

    /// List configured topics
    Topics,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Fetch { topics } => {
            let selected = select(&config, &topics)?;
            let credentials = RedditCredentials::from_env().map_err(CoreError::from)?;
            cmd_fetch(&config, &selected, credentials).await
        }
        Commands::Rank { topics } => {
            let selected = select(&config, &topics)?;
            let credentials = LlmCredentials::from_env().map_err(CoreError::from)?;
            cmd_rank(&config, &selected, credentials).await
        }
        Commands::Run { topics } => {
            let selected = select(&config, &topics)?;
            // Both secrets are checked before any network traffic.
            let reddit = RedditCredentials::from_env().map_err(CoreError::from)?;
            let llm = LlmCredentials::from_env().map_err(CoreError::from)?;
            cmd_fetch(&config, &selected, reddit).await?;
            cmd_rank(&config, &selected, llm).await
        }
        Commands::Topics => {
            cmd_topics(&config);
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    Ok(config)
}

fn select<'a>(config: &'a AppConfig, names: &[String]) -> Result<Vec<&'a TopicConfig>> {
    Ok(config.select_topics(names).map_err(CoreError::from)?)
}

async fn cmd_fetch(
    config: &AppConfig,
    topics: &[&TopicConfig],
    credentials: RedditCredentials,
) -> Result<()> {
    let reporter = ErrorReporter::new();
    let mut client =
        RedditClient::new(RedditOAuth2Config::new(credentials, config.user_agent.clone()))?;

    if let Err(e) = client.authenticate().await {
        reporter.report_error(&e);
        return Err(e).context("Reddit authentication failed");
    }

    let report = fetch_stage(&client, config, topics).await;
    summarize("fetch", &report);
    Ok(())
}

async fn cmd_rank(
    config: &AppConfig,
    topics: &[&TopicConfig],
    credentials: LlmCredentials,
) -> Result<()> {
    let provider = OpenRouterProvider::new(credentials, &config.llm);
    info!("Ranking {} topics with {}", topics.len(), provider.model());

    let report = rank_stage(&provider, config, topics).await;
    summarize("rank", &report);

    // A rejected key fails every topic the same way.
    if let Some((_, e)) = report.failed.iter().find(|(_, e)| e.is_fatal()) {
        anyhow::bail!("{}", e.user_friendly_message());
    }
    Ok(())
}

fn summarize(stage: &str, report: &StageReport) {
    info!(
        "{} finished: {} written, {} failed",
        stage,
        report.written.len(),
        report.failed.len()
    );
    for (topic, e) in &report.failed {
        warn!("{} failed for '{}' [{}]", stage, topic, e.error_code());
    }
}

fn cmd_topics(config: &AppConfig) {
    for topic in &config.topics {
        let source = match topic.source() {
            TopicSource::Search(query) => format!("search \"{}\"", query),
            TopicSource::Subreddits(subs) => format!("r/{}", subs.join(", r/")),
        };
        println!(
            "{:<10} {} ({}, {} posts, {} comments, depth {}) -> {} -> {}",
            topic.name,
            source,
            topic.timeframe,
            topic.post_limit,
            topic.comment_limit,
            topic.max_depth,
            config.output_path(&topic.output).display(),
            config.output_path(&topic.ranked_output).display(),
        );
    }
}
