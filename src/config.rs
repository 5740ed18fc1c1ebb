//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` (or the `-f` path), then layers the
//! environment on top: secrets (`TELEGRAM_BOT_TOKEN`, `LLM_API_KEY`) only ever
//! come from env, `DATABASE_URL` and `LEXICON_LOG_LEVEL` override the TOML.

use std::{env, fs, path::Path};

use serde::Deserialize;

use crate::error::AppError;
use crate::subsystems::cron::ScheduleSpec;
use crate::words::resolver::MAX_ATTEMPTS;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// OpenAI / OpenAI-compatible provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"openai"` or `"dummy"`).
    /// Maps to `default` in `[llm]` TOML.
    pub provider: String,
    pub openai: OpenAiConfig,
}

/// Word generation settings (`[words]`).
#[derive(Debug, Clone)]
pub struct WordsConfig {
    /// Generation attempts per resolve before giving up.
    pub max_attempts: usize,
}

/// Daily broadcast scheduling (`[schedule]`).
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub enabled: bool,
    pub spec: ScheduleSpec,
    /// Fire one broadcast immediately when the scheduler starts.
    pub run_on_start: bool,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_name: String,
    pub log_level: String,
    /// SQLite location, `sqlite://path`, `sqlite:path` or a bare path.
    pub database_url: String,
    /// From `TELEGRAM_BOT_TOKEN`. Never sourced from TOML.
    pub telegram_bot_token: String,
    pub llm: LlmConfig,
    /// From `LLM_API_KEY`. Never sourced from TOML.
    pub llm_api_key: Option<String>,
    pub words: WordsConfig,
    pub schedule: ScheduleConfig,
}

/// Values taken from the process environment.
///
/// Collected once by [`EnvOverrides::from_env`]; tests build it directly
/// instead of mutating env vars.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub log_level: Option<String>,
    pub database_url: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub llm_api_key: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            log_level: var("LEXICON_LOG_LEVEL"),
            database_url: var("DATABASE_URL"),
            telegram_bot_token: var("TELEGRAM_BOT_TOKEN"),
            llm_api_key: var("LLM_API_KEY"),
        }
    }
}

/// Raw TOML shape — `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    bot: RawBot,
    #[serde(default)]
    database: RawDatabase,
    #[serde(default)]
    llm: RawLlm,
    #[serde(default)]
    words: RawWords,
    #[serde(default)]
    schedule: RawSchedule,
}

#[derive(Deserialize)]
struct RawBot {
    #[serde(default = "default_bot_name")]
    name: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

#[derive(Deserialize, Default)]
struct RawDatabase {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize)]
struct RawLlm {
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), openai: RawOpenAiConfig::default() }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default = "default_openai_temperature")]
    temperature: f32,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawWords {
    #[serde(default = "default_max_attempts")]
    max_attempts: usize,
}

impl Default for RawWords {
    fn default() -> Self {
        Self { max_attempts: default_max_attempts() }
    }
}

#[derive(Deserialize)]
struct RawSchedule {
    #[serde(default = "default_true")]
    enabled: bool,
    /// `"HH:MM"`, UTC.
    #[serde(default)]
    daily_at: Option<String>,
    #[serde(default)]
    every_secs: Option<u64>,
    #[serde(default)]
    run_on_start: bool,
}

impl Default for RawSchedule {
    fn default() -> Self {
        Self { enabled: true, daily_at: None, every_secs: None, run_on_start: false }
    }
}

fn default_bot_name() -> String { "lexicon".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_llm_provider() -> String { "openai".to_string() }
fn default_openai_api_base_url() -> String { "https://openrouter.ai/api/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "google/gemma-3n-e4b-it:free".to_string() }
fn default_openai_temperature() -> f32 { 0.9 }
fn default_openai_timeout_seconds() -> u64 { 60 }
fn default_max_attempts() -> usize { MAX_ATTEMPTS }
fn default_daily_at() -> &'static str { "09:00" }
fn default_true() -> bool { true }

/// Load config from `path` (default `config/default.toml`) with the process
/// environment layered on top.
pub fn load(path: Option<&str>) -> Result<Config, AppError> {
    let path = Path::new(path.unwrap_or(DEFAULT_CONFIG_PATH));
    load_from(path, &EnvOverrides::from_env())
}

/// Internal loader — accepts an explicit path and env values.
pub fn load_from(path: &Path, env: &EnvOverrides) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let database_url = env
        .database_url
        .clone()
        .or(parsed.database.url)
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::Config("DATABASE_URL is not set".into()))?;

    let telegram_bot_token = env
        .telegram_bot_token
        .clone()
        .ok_or_else(|| AppError::Config("TELEGRAM_BOT_TOKEN is not set".into()))?;

    if parsed.llm.provider != "dummy" && env.llm_api_key.is_none() {
        return Err(AppError::Config(format!(
            "LLM_API_KEY is not set (required by provider '{}')",
            parsed.llm.provider
        )));
    }

    crate::logger::parse_level(&parsed.bot.log_level)
        .map_err(|e| AppError::Config(format!("bot.log_level: {e}")))?;

    if parsed.words.max_attempts == 0 {
        return Err(AppError::Config("words.max_attempts must be > 0".into()));
    }

    let schedule = resolve_schedule(parsed.schedule)?;

    Ok(Config {
        bot_name: parsed.bot.name,
        log_level: env.log_level.clone().unwrap_or(parsed.bot.log_level),
        database_url,
        telegram_bot_token,
        llm: LlmConfig {
            provider: parsed.llm.provider,
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        llm_api_key: env.llm_api_key.clone(),
        words: WordsConfig { max_attempts: parsed.words.max_attempts },
        schedule,
    })
}

fn resolve_schedule(raw: RawSchedule) -> Result<ScheduleConfig, AppError> {
    let spec = match (raw.daily_at.as_deref(), raw.every_secs) {
        (Some(_), Some(_)) => {
            return Err(AppError::Config(
                "schedule: set either daily_at or every_secs, not both".into(),
            ));
        }
        (_, Some(0)) => {
            return Err(AppError::Config("schedule.every_secs must be > 0".into()));
        }
        (None, Some(every_secs)) => ScheduleSpec::Interval { every_secs },
        (daily_at, None) => parse_daily_at(daily_at.unwrap_or(default_daily_at()))?,
    };
    Ok(ScheduleConfig { enabled: raw.enabled, spec, run_on_start: raw.run_on_start })
}

/// Parse `"HH:MM"` (24-hour, UTC) into a daily schedule.
pub fn parse_daily_at(s: &str) -> Result<ScheduleSpec, AppError> {
    let bad = || AppError::Config(format!("schedule.daily_at must be HH:MM, got '{s}'"));
    let (h, m) = s.trim().split_once(':').ok_or_else(bad)?;
    let hour: u32 = h.parse().map_err(|_| bad())?;
    let minute: u32 = m.parse().map_err(|_| bad())?;
    if hour > 23 || minute > 59 {
        return Err(bad());
    }
    Ok(ScheduleSpec::Daily { hour, minute })
}
