use anyhow::{Context, Result};
use dotenvy::dotenv;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_DATASET_PATH: &str = "dataset/building_413_data.csv";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL_NAME: &str = "llama3.1";
const DEFAULT_LLM_TIMEOUT_SECONDS: u64 = 60;
const DEFAULT_CHAT_TIMEOUT_SECONDS: u64 = 30;
const MAX_TIMEOUT_SECONDS: u64 = 600;

/// Optional JSON file whose values sit between the environment and the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
struct SetupConfigOverrides {
    #[serde(default)]
    dataset_path: Option<String>,
    #[serde(default)]
    ollama_url: Option<String>,
    #[serde(default)]
    model_name: Option<String>,
    #[serde(default)]
    llm_timeout_seconds: Option<u64>,
    #[serde(default)]
    chat_timeout_seconds: Option<u64>,
}

fn load_setup_config_overrides(path: &Path) -> Option<SetupConfigOverrides> {
    if !path.exists() {
        return None;
    }
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to read setup config; using env defaults"
            );
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to parse setup config; using env defaults"
            );
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct InsightsConfig {
    pub dataset_path: PathBuf,
    pub ollama_url: String,
    pub model_name: String,
    pub llm_timeout: Duration,
    pub chat_timeout: Duration,
    pub setup_config_path: Option<PathBuf>,
}

impl InsightsConfig {
    pub fn from_env(cli_dataset: Option<PathBuf>) -> Result<Self> {
        dotenv().ok();
        Self::resolve(|key| std::env::var(key).ok(), cli_dataset)
    }

    /// Resolves every setting through `lookup` (normally the process environment).
    /// Precedence: CLI flag, environment, setup file, default.
    pub fn resolve<F>(lookup: F, cli_dataset: Option<PathBuf>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let setup_config_path = env.optional_path("INSIGHTS_SETUP_CONFIG_PATH");
        let overrides = setup_config_path
            .as_deref()
            .and_then(load_setup_config_overrides)
            .unwrap_or_default();

        let dataset_path = cli_dataset
            .filter(|path| !path.as_os_str().is_empty())
            .or_else(|| env.optional_path("INSIGHTS_DATASET_PATH"))
            .or_else(|| non_blank(overrides.dataset_path.as_deref()).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET_PATH));

        let ollama_url = env
            .optional_string("OLLAMA_URL")
            .or_else(|| non_blank(overrides.ollama_url.as_deref()).map(str::to_string))
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
        let ollama_url = normalize_base_url(&ollama_url)
            .with_context(|| format!("OLLAMA_URL '{ollama_url}' is not an http(s) URL"))?;

        let model_name = env
            .optional_string("MODEL_NAME")
            .or_else(|| non_blank(overrides.model_name.as_deref()).map(str::to_string))
            .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());

        let llm_timeout_seconds = env
            .optional_u64("INSIGHTS_LLM_TIMEOUT_SECONDS")
            .or(overrides.llm_timeout_seconds)
            .unwrap_or(DEFAULT_LLM_TIMEOUT_SECONDS)
            .clamp(1, MAX_TIMEOUT_SECONDS);
        let chat_timeout_seconds = env
            .optional_u64("INSIGHTS_CHAT_TIMEOUT_SECONDS")
            .or(overrides.chat_timeout_seconds)
            .unwrap_or(DEFAULT_CHAT_TIMEOUT_SECONDS)
            .clamp(1, MAX_TIMEOUT_SECONDS);

        Ok(Self {
            dataset_path,
            ollama_url,
            model_name,
            llm_timeout: Duration::from_secs(llm_timeout_seconds),
            chat_timeout: Duration::from_secs(chat_timeout_seconds),
            setup_config_path,
        })
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional_string(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn optional_u64(&self, key: &str) -> Option<u64> {
        self.optional_string(key)
            .and_then(|value| value.parse::<u64>().ok())
    }

    fn optional_path(&self, key: &str) -> Option<PathBuf> {
        self.optional_string(key).map(PathBuf::from)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let rest = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))?;
    if rest.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}
