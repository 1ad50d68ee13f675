//! Typed, env-sourced configuration with startup validation.
//!
//! Every knob is read from an environment variable, range-checked, and
//! bundled into a single immutable [`Settings`]. Construction is the only
//! place validation happens; once built, a `Settings` is known-good.

use std::env;
use std::time::Duration;

use crate::error::{ConfigurationError, Result};

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    /// Local development.
    Development,
    /// Pre-production staging.
    Staging,
    /// Production.
    Production,
}

impl AppEnv {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" => Ok(Self::Production),
            other => Err(ConfigurationError::InvalidValue {
                key: "app_env".to_string(),
                value: other.to_string(),
            }
            .into()),
        }
    }

    /// The value as exposed over `/health`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

/// Full, validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Top-k for the retrieval port's similarity search.
    pub retrieval_k: usize,
    /// Per-document character cap applied before the grader prompt.
    pub grader_doc_truncation: usize,
    /// Minimum relevant-document count before the data-heavy safety net kicks in.
    pub safety_net_min_docs: usize,
    /// Number of top documents used as the safety-net fallback.
    pub safety_net_fallback_docs: usize,
    /// Upper bound on `refine` <-> `risk_sentinel` cycles.
    pub max_audit_revisions: u32,
    /// Character cap on context text sent to the risk sentinel.
    pub context_max_chars: usize,
    /// Character cap on answer text sent to the risk sentinel.
    pub answer_max_chars: usize,
    /// Router LLM call temperature.
    pub router_temperature: f32,
    /// Grader LLM call temperature.
    pub grader_temperature: f32,
    /// Refine LLM call temperature.
    pub refine_temperature: f32,
    /// Quant-extract LLM call temperature.
    pub quant_extract_temperature: f32,
    /// Quant-strategy LLM call temperature.
    pub quant_strategy_temperature: f32,
    /// Quant-insight LLM call temperature.
    pub quant_insight_temperature: f32,
    /// Risk-audit LLM call temperature.
    pub risk_temperature: f32,
    /// Response cache entry lifetime.
    pub cache_ttl: Duration,
    /// Response cache maximum entry count.
    pub cache_max_size: usize,
    /// Base URL of the OpenAI-compatible chat endpoint.
    pub llm_base_url: String,
    /// Model name passed to the chat endpoint.
    pub llm_model: String,
    /// `tracing` env-filter directive.
    pub log_level: String,
    /// Deployment environment.
    pub app_env: AppEnv,
    /// Path to the SQLite retrieval index.
    pub index_db_path: String,
    /// HTTP bind host.
    pub http_host: String,
    /// HTTP bind port.
    pub http_port: u16,
}

impl Settings {
    /// Builds settings from environment variables, applying defaults for any
    /// unset key and range-validating every numeric/temperature field.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Configuration`] if any recognized key
    /// holds a value outside its documented range.
    pub fn from_env() -> Result<Self> {
        let retrieval_k = parse_ranged("RETRIEVAL_K", 8, 1, 50)?;
        let grader_doc_truncation = parse_ranged("GRADER_DOC_TRUNCATION", 1000, 200, 10_000)?;
        let safety_net_min_docs = parse_min("SAFETY_NET_MIN_DOCS", 1, 1)?;
        let safety_net_fallback_docs = parse_min("SAFETY_NET_FALLBACK_DOCS", 3, 1)?;
        let max_audit_revisions = parse_ranged_u32("MAX_AUDIT_REVISIONS", 2, 0, 10)?;
        let context_max_chars = parse_min("CONTEXT_MAX_CHARS", 6000, 1)?;
        let answer_max_chars = parse_min("ANSWER_MAX_CHARS", 4000, 1)?;

        let router_temperature = parse_temperature("ROUTER_TEMPERATURE", 0.0)?;
        let grader_temperature = parse_temperature("GRADER_TEMPERATURE", 0.0)?;
        let refine_temperature = parse_temperature("REFINE_TEMPERATURE", 0.2)?;
        let quant_extract_temperature = parse_temperature("QUANT_EXTRACT_TEMPERATURE", 0.0)?;
        let quant_strategy_temperature = parse_temperature("QUANT_STRATEGY_TEMPERATURE", 0.0)?;
        let quant_insight_temperature = parse_temperature("QUANT_INSIGHT_TEMPERATURE", 0.2)?;
        let risk_temperature = parse_temperature("RISK_TEMPERATURE", 0.0)?;

        let cache_ttl_seconds = parse_min("CACHE_TTL_SECONDS", 3600, 0)?;
        let cache_max_size = parse_min("CACHE_MAX_SIZE", 256, 1)?;

        let llm_base_url = env::var("LLM_BASE_URL").unwrap_or_else(|_| "http://localhost:11434".to_string());
        let llm_model = env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let log_level = parse_log_level()?;
        let app_env = match env::var("APP_ENV") {
            Ok(raw) => AppEnv::parse(&raw)?,
            Err(_) => AppEnv::Development,
        };

        let index_db_path = env::var("INDEX_DB_PATH").unwrap_or_else(|_| "./rfp-index.sqlite3".to_string());
        let http_host = env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let http_port = parse_ranged_u32("HTTP_PORT", 8080, 1, 65535)? as u16;

        Ok(Self {
            retrieval_k,
            grader_doc_truncation,
            safety_net_min_docs,
            safety_net_fallback_docs,
            max_audit_revisions,
            context_max_chars,
            answer_max_chars,
            router_temperature,
            grader_temperature,
            refine_temperature,
            quant_extract_temperature,
            quant_strategy_temperature,
            quant_insight_temperature,
            risk_temperature,
            cache_ttl: Duration::from_secs(cache_ttl_seconds as u64),
            cache_max_size,
            llm_base_url,
            llm_model,
            log_level,
            app_env,
            index_db_path,
            http_host,
            http_port,
        })
    }
}

fn parse_ranged(key: &str, default: usize, min: usize, max: usize) -> Result<usize> {
    let value = match env::var(key) {
        Ok(raw) => raw.parse::<usize>().map_err(|_| ConfigurationError::InvalidValue {
            key: key.to_string(),
            value: raw,
        })?,
        Err(_) => default,
    };
    if value < min || value > max {
        return Err(ConfigurationError::OutOfRange {
            key: key.to_string(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
        .into());
    }
    Ok(value)
}

fn parse_ranged_u32(key: &str, default: u32, min: u32, max: u32) -> Result<u32> {
    let value = match env::var(key) {
        Ok(raw) => raw.parse::<u32>().map_err(|_| ConfigurationError::InvalidValue {
            key: key.to_string(),
            value: raw,
        })?,
        Err(_) => default,
    };
    if value < min || value > max {
        return Err(ConfigurationError::OutOfRange {
            key: key.to_string(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
        .into());
    }
    Ok(value)
}

fn parse_min(key: &str, default: usize, min: usize) -> Result<usize> {
    let value = match env::var(key) {
        Ok(raw) => raw.parse::<usize>().map_err(|_| ConfigurationError::InvalidValue {
            key: key.to_string(),
            value: raw,
        })?,
        Err(_) => default,
    };
    if value < min {
        return Err(ConfigurationError::OutOfRange {
            key: key.to_string(),
            value: value.to_string(),
            min: min.to_string(),
            max: "unbounded".to_string(),
        }
        .into());
    }
    Ok(value)
}

fn parse_temperature(key: &str, default: f32) -> Result<f32> {
    let value = match env::var(key) {
        Ok(raw) => raw.parse::<f32>().map_err(|_| ConfigurationError::InvalidValue {
            key: key.to_string(),
            value: raw,
        })?,
        Err(_) => default,
    };
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigurationError::OutOfRange {
            key: key.to_string(),
            value: value.to_string(),
            min: "0.0".to_string(),
            max: "1.0".to_string(),
        }
        .into());
    }
    Ok(value)
}

fn parse_log_level() -> Result<String> {
    let raw = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let normalized = raw.trim().to_lowercase();
    match normalized.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(normalized),
        _ => Err(ConfigurationError::InvalidValue {
            key: "log_level".to_string(),
            value: raw,
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn with_clean_env<F: FnOnce()>(f: F) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for key in [
            "RETRIEVAL_K",
            "MAX_AUDIT_REVISIONS",
            "ROUTER_TEMPERATURE",
            "LOG_LEVEL",
            "APP_ENV",
        ] {
            unsafe { env::remove_var(key) };
        }
        f();
    }

    #[test]
    fn test_defaults_are_valid() {
        with_clean_env(|| {
            let settings = Settings::from_env().unwrap();
            assert_eq!(settings.retrieval_k, 8);
            assert_eq!(settings.app_env.as_str(), "development");
        });
    }

    #[test]
    fn test_out_of_range_retrieval_k_fails() {
        with_clean_env(|| {
            unsafe { env::set_var("RETRIEVAL_K", "500") };
            assert!(Settings::from_env().is_err());
            unsafe { env::remove_var("RETRIEVAL_K") };
        });
    }

    #[test]
    fn test_invalid_temperature_fails() {
        with_clean_env(|| {
            unsafe { env::set_var("ROUTER_TEMPERATURE", "3.5") };
            assert!(Settings::from_env().is_err());
            unsafe { env::remove_var("ROUTER_TEMPERATURE") };
        });
    }

    #[test]
    fn test_invalid_log_level_fails() {
        with_clean_env(|| {
            unsafe { env::set_var("LOG_LEVEL", "verbose") };
            assert!(Settings::from_env().is_err());
            unsafe { env::remove_var("LOG_LEVEL") };
        });
    }

    #[test]
    fn test_app_env_parse() {
        assert_eq!(AppEnv::parse("Production").unwrap(), AppEnv::Production);
        assert!(AppEnv::parse("nonexistent").is_err());
    }
}
