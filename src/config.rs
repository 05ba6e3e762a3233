//! Application-level configuration loading, including the question generator
//! settings and an optional custom fallback bank.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{services::question_bank::FallbackBank, state::room::Question};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BRAINBUZZ_BACK_CONFIG_PATH";
/// Environment variable holding the question service API key. Kept out of the
/// config file so credentials never land on disk.
const API_KEY_ENV: &str = "QUESTION_API_KEY";

const DEFAULT_API_URL: &str = "https://api.mistral.ai/v1/chat/completions";
const DEFAULT_MODEL: &str = "mistral-large-2411";
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// External question generator settings.
    pub generator: GeneratorConfig,
    /// Built-in or user-supplied fallback question bank.
    pub fallback_bank: FallbackBank,
}

/// Settings for the external question generation call.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub api_url: String,
    pub model: String,
    /// Bound on the whole generation round trip; a timeout is treated like
    /// any other generator failure and recovered via the fallback bank.
    pub timeout: Duration,
    pub api_key: Option<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// built-in defaults when the file is absent or unreadable.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration file");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            fallback_bank: FallbackBank::default(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            api_key: env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty()),
        }
    }
}

/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    generator: Option<RawGenerator>,
    #[serde(default)]
    fallback_questions: Option<Vec<RawBankQuestion>>,
}

/// JSON representation of the generator settings.
#[derive(Debug, Deserialize)]
struct RawGenerator {
    api_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

/// JSON representation of one fallback bank entry.
#[derive(Debug, Deserialize)]
struct RawBankQuestion {
    difficulty: RawDifficulty,
    question: String,
    options: Vec<String>,
    correct_answer: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawDifficulty {
    Easy,
    Medium,
    Hard,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = GeneratorConfig::default();
        let generator = match value.generator {
            Some(raw) => GeneratorConfig {
                api_url: raw.api_url.unwrap_or(defaults.api_url),
                model: raw.model.unwrap_or(defaults.model),
                timeout: raw
                    .timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.timeout),
                api_key: defaults.api_key,
            },
            None => defaults,
        };

        let fallback_bank = match value.fallback_questions {
            Some(entries) => bank_from_entries(entries),
            None => FallbackBank::default(),
        };

        Self {
            generator,
            fallback_bank,
        }
    }
}

fn bank_from_entries(entries: Vec<RawBankQuestion>) -> FallbackBank {
    let mut easy = Vec::new();
    let mut medium = Vec::new();
    let mut hard = Vec::new();

    for entry in entries {
        if !entry.options.contains(&entry.correct_answer) {
            warn!(
                question = %entry.question,
                "skipping fallback question whose correct answer is not among its options"
            );
            continue;
        }

        let question = Question {
            text: entry.question,
            options: entry.options,
            correct_option: entry.correct_answer,
        };
        match entry.difficulty {
            RawDifficulty::Easy => easy.push(question),
            RawDifficulty::Medium => medium.push(question),
            RawDifficulty::Hard => hard.push(question),
        }
    }

    FallbackBank::new(easy, medium, hard)
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use crate::state::room::Difficulty;

    use super::*;

    #[test]
    fn raw_config_overrides_generator_fields_individually() {
        let raw: RawConfig = serde_json::from_str(
            r#"{"generator": {"model": "mistral-small-2503", "timeout_secs": 5}}"#,
        )
        .unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.generator.model, "mistral-small-2503");
        assert_eq!(config.generator.timeout, Duration::from_secs(5));
        assert_eq!(config.generator.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn custom_fallback_questions_are_grouped_by_difficulty() {
        let raw: RawConfig = serde_json::from_str(
            r#"{"fallback_questions": [
                {"difficulty": "easy", "question": "1+1?", "options": ["2", "3"], "correct_answer": "2"},
                {"difficulty": "hard", "question": "e^0?", "options": ["0", "1"], "correct_answer": "1"}
            ]}"#,
        )
        .unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.fallback_bank.bucket(Difficulty::Easy).len(), 1);
        assert_eq!(config.fallback_bank.bucket(Difficulty::Medium).len(), 0);
        assert_eq!(config.fallback_bank.bucket(Difficulty::Hard).len(), 1);
    }

    #[test]
    fn inconsistent_fallback_entries_are_skipped() {
        let raw: RawConfig = serde_json::from_str(
            r#"{"fallback_questions": [
                {"difficulty": "easy", "question": "1+1?", "options": ["3", "4"], "correct_answer": "2"}
            ]}"#,
        )
        .unwrap();
        let config: AppConfig = raw.into();
        assert!(config.fallback_bank.bucket(Difficulty::Easy).is_empty());
    }
}
