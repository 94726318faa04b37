use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable is optional; CLI flags may override individual fields.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub output_dir: PathBuf,
    pub anthropic_api_key: Option<String>,
    pub enable_llm_refinement: bool,
    pub rules_path: Option<PathBuf>,
    pub tesseract_cmd: String,
    pub ocr_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            output_dir: PathBuf::from("refined_prompts"),
            anthropic_api_key: None,
            enable_llm_refinement: false,
            rules_path: None,
            tesseract_cmd: "tesseract".to_string(),
            ocr_timeout_secs: 60,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();

        Ok(Config {
            port: match optional_env("PORT") {
                Some(p) => p.parse::<u16>().context("PORT must be a valid port number")?,
                None => defaults.port,
            },
            rust_log: optional_env("RUST_LOG").unwrap_or(defaults.rust_log),
            output_dir: optional_env("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            enable_llm_refinement: match optional_env("ENABLE_LLM_REFINEMENT") {
                Some(v) => parse_bool(&v)
                    .with_context(|| {
                        format!("ENABLE_LLM_REFINEMENT must be a boolean, got '{v}'")
                    })?,
                None => defaults.enable_llm_refinement,
            },
            rules_path: optional_env("RULES_PATH").map(PathBuf::from),
            tesseract_cmd: optional_env("TESSERACT_CMD").unwrap_or(defaults.tesseract_cmd),
            ocr_timeout_secs: match optional_env("OCR_TIMEOUT_SECS") {
                Some(v) => v
                    .parse::<u64>()
                    .context("OCR_TIMEOUT_SECS must be a whole number of seconds")?,
                None => defaults.ocr_timeout_secs,
            },
        })
    }

    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_secs(self.ocr_timeout_secs)
    }

    /// The remote backend is used only when explicitly enabled and a key is present.
    pub fn use_llm_backend(&self) -> bool {
        self.enable_llm_refinement && self.anthropic_api_key.is_some()
    }
}

/// Treats unset and blank variables the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_llm_backend_requires_key_and_flag() {
        let mut config = Config {
            enable_llm_refinement: true,
            ..Config::default()
        };
        assert!(!config.use_llm_backend());
        config.anthropic_api_key = Some("sk-test".to_string());
        assert!(config.use_llm_backend());
        config.enable_llm_refinement = false;
        assert!(!config.use_llm_backend());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.output_dir, PathBuf::from("refined_prompts"));
        assert_eq!(config.ocr_timeout(), Duration::from_secs(60));
    }
}
