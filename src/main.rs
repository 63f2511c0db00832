// src/main.rs
use clap::Parser;
use humaneval_dashboard::banner;
use humaneval_dashboard::client::ApiClient;
use humaneval_dashboard::config::DashboardConfig;
use humaneval_dashboard::errors::Result;
use humaneval_dashboard::models::{EvalOption, Phase, Problem};
use humaneval_dashboard::shell::{DraftOverrides, Route, Shell, WatchExit};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Terminal dashboard for the HumanEvalComm evaluation API.
///
/// Opens one route, optionally submits the form on it, and for `/async` follows the
/// task until it finishes (type `r` + Enter to refresh, `q` + Enter to leave).
#[derive(Parser, Debug)]
#[command(name = "humaneval-dashboard", version, about)]
struct Args {
    /// Route to open: /, /single, /async, /batch or /info
    #[arg(default_value = "/")]
    route: String,

    /// API origin (overrides config file and HUMANEVAL_API_BASE)
    #[arg(long)]
    base_url: Option<String>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Task poll interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    #[arg(long)]
    dataset: Option<String>,

    #[arg(long)]
    model: Option<String>,

    /// Evaluation phase, 0-6
    #[arg(long, value_parser = parse_phase)]
    phase: Option<Phase>,

    #[arg(long)]
    temperature: Option<f64>,

    #[arg(long)]
    topn: Option<u32>,

    /// original or manualRemove
    #[arg(long)]
    option: Option<EvalOption>,

    /// Problem description for /single and /async
    #[arg(long, conflicts_with = "problem_file")]
    problem_text: Option<String>,

    /// Read the problem description from a file
    #[arg(long)]
    problem_file: Option<PathBuf>,

    /// Fill the problem description with built-in sample N (1-4)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4), conflicts_with_all = ["problem_text", "problem_file"])]
    sample: Option<u8>,

    /// Batch problem as NAME=TEXT; repeat for more
    #[arg(long = "problem", value_parser = parse_problem)]
    problems: Vec<Problem>,

    /// Load the built-in sample problems into the batch form
    #[arg(long)]
    samples: bool,

    /// Skip the startup banner
    #[arg(long)]
    no_banner: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_phase(raw: &str) -> std::result::Result<Phase, String> {
    let id: u8 = raw.parse().map_err(|_| format!("'{}' is not a phase number", raw))?;
    Phase::try_from(id)
}

fn parse_problem(raw: &str) -> std::result::Result<Problem, String> {
    raw.split_once('=')
        .map(|(name, text)| Problem::new(name.trim(), text.trim()))
        .ok_or_else(|| format!("expected NAME=TEXT, got '{}'", raw))
}

impl Args {
    fn overrides(&self) -> Result<DraftOverrides> {
        let problem_text = match &self.problem_file {
            Some(path) => Some(std::fs::read_to_string(path)?),
            None => self.problem_text.clone(),
        };
        Ok(DraftOverrides {
            dataset: self.dataset.clone(),
            model: self.model.clone(),
            phase: self.phase,
            temperature: self.temperature,
            topn: self.topn,
            option: self.option,
            problem_text,
            problems: self.problems.clone(),
            samples: self.samples,
            sample: self.sample.map(usize::from),
        })
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Load .env first so a RUST_LOG set there reaches the logger.
    let dotenv = dotenvy::dotenv();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_filter));

    if let Err(e) = dotenv {
        log::debug!("No .env file loaded: {}", e);
    }

    let code = match run(args).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("❌ {}", e);
            1
        }
    };
    // A blocked stdin read would otherwise hold up runtime shutdown.
    std::process::exit(code);
}

async fn run(args: Args) -> Result<()> {
    let mut config = DashboardConfig::load(args.config.as_deref())?;
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(interval) = args.interval_ms {
        config.poll_interval_ms = interval;
    }
    config.validate()?;

    if !args.no_banner {
        banner::print_banner(&config.base_url);
    }

    let client = ApiClient::from_config(&config)?;
    let overrides = args.overrides()?;
    let route = Route::resolve(&args.route);

    let mut shell = Shell::new(config, client);
    shell.navigate(route, &overrides).await;

    if !overrides.submits() {
        println!("{}", shell.render());
        return Ok(());
    }

    let submitted = shell.submit_current().await;
    println!("{}", shell.render());

    if submitted && route == Route::Async {
        let shutdown = CancellationToken::new();
        let on_ctrl_c = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_ctrl_c.cancel();
            }
        });

        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();
        match shell.watch_current(stdin, &mut stdout, shutdown).await? {
            Some(WatchExit::Finished) => println!("🏁 Task finished."),
            Some(WatchExit::Left) => println!("👋 Left {}; polling stopped.", route.path()),
            None => {}
        }
    }

    shell.leave();
    Ok(())
}
