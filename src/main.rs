//! lexicon-bot — entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Resolve effective log level (CLI `-v` flags > env > config)
//!   4. Init logger once
//!   5. Open the database (creates the schema if absent)
//!   6. Build the LLM provider, word resolver and service
//!   7. `--once`: run one broadcast and exit
//!   8. Otherwise run the telegram channel + scheduler until Ctrl-C

use std::sync::Arc;

use teloxide::Bot;
use tokio_util::sync::CancellationToken;
use tracing::info;

use lexicon_bot::config;
use lexicon_bot::error::AppError;
use lexicon_bot::llm::{LlmProvider, providers};
use lexicon_bot::logger;
use lexicon_bot::store::Database;
use lexicon_bot::subsystems::comms::telegram::TelegramChannel;
use lexicon_bot::subsystems::cron::BroadcastScheduler;
use lexicon_bot::subsystems::lexicon::LexiconService;
use lexicon_bot::subsystems::runtime::{Component, run_components};
use lexicon_bot::words::{WordGenerator, WordResolver};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let config = config::load(args.config_path.as_deref())?;

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    logger::init(effective_log_level, args.log_level.is_some())?;

    info!(
        bot_name = %config.bot_name,
        effective_log_level = %effective_log_level,
        once = args.once,
        "config loaded"
    );

    let db = Database::open(&config.database_url)?;
    info!(path = %db.path().display(), words = db.content().count()?, "database ready");

    let provider = providers::build(&config.llm, config.llm_api_key.clone())?;
    match &provider {
        LlmProvider::OpenAiCompatible(_) => info!(
            provider = provider.name(),
            model = %config.llm.openai.model,
            url = %config.llm.openai.api_base_url,
            "llm provider ready"
        ),
        LlmProvider::Dummy(_) => info!(provider = provider.name(), "llm provider ready (offline sample words)"),
    }

    let resolver = WordResolver::new(WordGenerator::new(provider), db.content())
        .with_max_attempts(config.words.max_attempts);
    info!(max_attempts = resolver.max_attempts(), "word resolver ready");
    let service = Arc::new(LexiconService::new(resolver, db.subscribers()));
    let bot = Bot::new(config.telegram_bot_token.clone());

    if args.once {
        if let Some(report) = service.daily_broadcast(&bot).await? {
            println!("✓ Broadcast sent: delivered={} failed={}", report.delivered, report.failed.len());
        }
        return Ok(());
    }

    // Shared shutdown token — Ctrl-C cancels it, all components watch it.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received — initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    let mut components: Vec<Box<dyn Component>> =
        vec![Box::new(TelegramChannel::new(bot.clone(), service.clone()))];

    if config.schedule.enabled {
        let scheduler = BroadcastScheduler::new(config.schedule.spec, service.clone(), Arc::new(bot))
            .run_on_start(config.schedule.run_on_start);
        components.push(Box::new(scheduler));
    } else {
        info!("scheduler disabled — broadcasts only via --once");
    }

    run_components(components, shutdown).await?;
    info!("shutdown complete");
    Ok(())
}

struct CliArgs {
    log_level: Option<&'static str>,
    once: bool,
    config_path: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut once = false;
    let mut config_path = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: lexicon-bot [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("      --once                 Send one Word of the Day broadcast and exit");
                println!("  -f, --config <PATH>        Path to configuration file (default: {})", config::DEFAULT_CONFIG_PATH);
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "--once" => once = true,
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            other => eprintln!("warning: ignoring unknown argument '{other}'"),
        }
    }

    //   -v → warn, -vv → info, -vvv → debug, -vvvv+ → trace
    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs { log_level, once, config_path }
}
