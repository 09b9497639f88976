use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use barrage::{
    ConsoleReporter, FileReporter, JsonReporter, LoadConfig, LoadDriver, MeanPolicy, Reporter,
    ReqwestTransport, input,
};
use clap::{Parser, ValueEnum};
use reqwest::Method;
use tracing_subscriber::EnvFilter;

/// Fire a fixed number of HTTP requests at a target, a batch at a time, and
/// summarize how it went.
#[derive(Debug, Parser)]
#[command(name = "barrage", version, about)]
struct Args {
    /// Full url to test
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Requests launched per batch
    #[arg(short, long, default_value_t = 1)]
    concurrency: usize,

    /// Total number of requests to run
    #[arg(short = 'n', long, default_value_t = 25)]
    requests: usize,

    /// Pause between batches
    #[arg(short, long, default_value = "100ms", value_parser = humantime::parse_duration)]
    delay: Duration,

    /// Deadline for each request, body included
    #[arg(short, long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Runtime worker threads, capped at the number of CPUs
    #[arg(short = 'p', long, default_value_t = 1)]
    cores: usize,

    /// HTTP method when no POST data is given
    #[arg(short = 'X', long, default_value = "GET")]
    method: Method,

    /// Default User-Agent
    #[arg(short = 'A', long, default_value = barrage::config::DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Extra header as "Name: value", repeatable
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// File of `key = value` lines sent as a url-encoded POST form
    #[arg(long)]
    post_data: Option<PathBuf>,

    /// File of target urls, one per line, picked at random per request
    #[arg(long)]
    url_file: Option<PathBuf>,

    /// File of cookies, one per line as `name=..~value=..~path=..`
    #[arg(long)]
    cookie_file: Option<PathBuf>,

    /// File of user agents, one per line, picked at random per request
    #[arg(long)]
    user_agent_file: Option<PathBuf>,

    /// Attempts the mean latency is taken over
    #[arg(long, value_enum, default_value_t = MeanArg::All)]
    mean: MeanArg,

    /// Prefix of the report file names
    #[arg(long, default_value = "barrage")]
    report_prefix: String,

    /// Directory the report files are written to
    #[arg(long, default_value = ".")]
    report_dir: PathBuf,

    /// Skip writing report files
    #[arg(long)]
    no_report: bool,

    /// Print the summary as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MeanArg {
    /// Every attempt, failures counting as zero
    All,
    /// Passed attempts only
    Passed,
}

impl From<MeanArg> for MeanPolicy {
    fn from(value: MeanArg) -> Self {
        match value {
            MeanArg::All => MeanPolicy::AllAttempts,
            MeanArg::Passed => MeanPolicy::PassedOnly,
        }
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected \"Name: value\", got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in {raw:?}"));
    }
    Ok((name.to_owned(), value.trim().to_owned()))
}

/// Loads an optional auxiliary file. A missing or unreadable file is logged
/// and treated as absent.
async fn load_or_default<T, F, Fut>(path: Option<&PathBuf>, load: F) -> T
where
    T: Default,
    F: FnOnce(PathBuf) -> Fut,
    Fut: Future<Output = Result<T, barrage::InputError>>,
{
    let Some(path) = path else {
        return T::default();
    };
    match load(path.clone()).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("{e}, falling back to defaults");
            T::default()
        }
    }
}

async fn build_config(args: &Args) -> LoadConfig {
    let post_data =
        load_or_default(args.post_data.as_ref(), |p| async move { input::load_post_data(&p).await })
            .await;
    let urls = load_or_default(args.url_file.as_ref(), |p| async move { input::load_lines(&p).await })
        .await;
    let cookies =
        load_or_default(args.cookie_file.as_ref(), |p| async move { input::load_cookies(&p).await })
            .await;
    let user_agents = load_or_default(args.user_agent_file.as_ref(), |p| async move {
        input::load_lines(&p).await
    })
    .await;

    let mut config = LoadConfig::builder()
        .url(args.url.clone())
        .urls(urls)
        .method(args.method.clone())
        .user_agent(args.user_agent.clone())
        .user_agents(user_agents)
        .headers(args.headers.clone())
        .cookies(cookies)
        .concurrency(args.concurrency)
        .requests(args.requests)
        .delay(args.delay)
        .mean_policy(args.mean.into())
        .build();
    config.timeout = args.timeout;
    if !post_data.is_empty() {
        config.post_data = Some(post_data);
    }
    config
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = build_config(&args).await;
    let target = if config.urls.is_empty() {
        config.url.clone()
    } else {
        format!("{} urls", config.urls.len())
    };
    tracing::info!("Requesting {target} a max of {} times", config.requests);

    let transport = ReqwestTransport::new().context("failed to build the http client")?;
    let summary = LoadDriver::new(config, transport).run().await?;

    if args.json {
        JsonReporter.report(&summary).await?;
    } else {
        ConsoleReporter.report(&summary).await?;
    }
    if !args.no_report {
        FileReporter::new(&args.report_dir, &args.report_prefix)
            .report(&summary)
            .await
            .context("failed to persist the run reports")?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cores = args.cores.clamp(1, num_cpus::get());
    tracing::info!("Using {cores} cores");

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(cores)
        .enable_all()
        .build()
        .context("failed to start the runtime")?
        .block_on(run(args))
}
