use interview_core::{
    llm_client::Provider,
    session::{DEFAULT_MAX_QUESTIONS, DEFAULT_MIN_QUESTIONS, FeedbackTiming, SessionOptions},
};
use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};
use tracing::Level;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Service settings, read once from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub provider: Provider,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub chat_model: String,
    pub log_level: Level,
    /// Directory of `<template>.md` prompt overrides.
    pub prompts_path: PathBuf,
    /// Directory of `<domain>.json` files.
    pub domains_path: PathBuf,
    pub generation_timeout: Duration,
    /// Interviews untouched for this long are dropped from the store.
    pub session_idle_timeout: Duration,
    /// Applied to every interview started through the API.
    pub session_options: SessionOptions,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn invalid(name: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidValue(name.to_string(), reason.to_string())
}

/// Parses `name` when set, otherwise returns `default`.
fn parse_or<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| invalid(name, format!("'{}'", raw))),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // A developer's .env would leak into the env-driven tests.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address = env_or("BIND_ADDRESS", "0.0.0.0:3000")
            .parse::<SocketAddr>()
            .map_err(|e| invalid("BIND_ADDRESS", e))?;

        let provider = Provider::from_name(&env_or("LLM_PROVIDER", "openai"));
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();
        let key_present = match provider {
            Provider::OpenAI => openai_api_key.is_some(),
            Provider::Gemini => gemini_api_key.is_some(),
        };
        if !key_present {
            return Err(ConfigError::MissingVar(format!(
                "{} is required for the {:?} provider",
                provider.api_key_var(),
                provider
            )));
        }

        let chat_model = env_or("CHAT_MODEL", provider.default_model());

        let raw_level = env_or("RUST_LOG", "INFO");
        let log_level = raw_level
            .parse::<Level>()
            .map_err(|_| invalid("RUST_LOG", format!("unknown log level '{}'", raw_level)))?;

        let timeout_secs: u64 = parse_or("GENERATION_TIMEOUT_SECS", 30)?;
        if timeout_secs == 0 {
            return Err(invalid("GENERATION_TIMEOUT_SECS", "must be at least 1"));
        }

        let idle_secs: u64 = parse_or("SESSION_IDLE_TIMEOUT_SECS", 1800)?;
        if idle_secs == 0 {
            return Err(invalid("SESSION_IDLE_TIMEOUT_SECS", "must be at least 1"));
        }

        let feedback_timing = match std::env::var("FEEDBACK_TIMING") {
            Ok(raw) => raw
                .parse::<FeedbackTiming>()
                .map_err(|e| invalid("FEEDBACK_TIMING", e))?,
            Err(_) => FeedbackTiming::Immediate,
        };
        let session_options = SessionOptions {
            min_questions: parse_or("MIN_QUESTIONS", DEFAULT_MIN_QUESTIONS)?,
            max_questions: parse_or("MAX_QUESTIONS", DEFAULT_MAX_QUESTIONS)?,
            feedback_timing,
        };
        session_options
            .validate()
            .map_err(|e| invalid("MIN_QUESTIONS/MAX_QUESTIONS", e))?;

        Ok(Self {
            bind_address,
            provider,
            openai_api_key,
            gemini_api_key,
            chat_model,
            log_level,
            prompts_path: PathBuf::from(env_or("PROMPTS_PATH", "./prompts")),
            domains_path: PathBuf::from(env_or("DOMAINS_PATH", "./configurations")),
            generation_timeout: Duration::from_secs(timeout_secs),
            session_idle_timeout: Duration::from_secs(idle_secs),
            session_options,
        })
    }

    /// The API key for the configured provider.
    pub fn api_key(&self) -> Option<&str> {
        match self.provider {
            Provider::OpenAI => self.openai_api_key.as_deref(),
            Provider::Gemini => self.gemini_api_key.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: [&str; 13] = [
        "BIND_ADDRESS",
        "LLM_PROVIDER",
        "OPENAI_API_KEY",
        "GEMINI_API_KEY",
        "CHAT_MODEL",
        "RUST_LOG",
        "PROMPTS_PATH",
        "DOMAINS_PATH",
        "GENERATION_TIMEOUT_SECS",
        "SESSION_IDLE_TIMEOUT_SECS",
        "FEEDBACK_TIMING",
        "MIN_QUESTIONS",
        "MAX_QUESTIONS",
    ];

    /// Resets every variable `Config` reads, then applies `vars`.
    fn load_with(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        unsafe {
            for var in VARS {
                env::remove_var(var);
            }
            for (key, value) in vars {
                env::set_var(key, value);
            }
        }
        Config::from_env()
    }

    fn invalid_var(result: Result<Config, ConfigError>) -> String {
        match result {
            Err(ConfigError::InvalidValue(var, _)) => var,
            other => panic!("expected InvalidValue, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ConfigError::MissingVar("X".to_string()).to_string(),
            "Missing environment variable: X"
        );
        assert_eq!(
            invalid("X", "nope").to_string(),
            "Invalid value for environment variable X: nope"
        );
    }

    #[test]
    #[serial]
    fn test_defaults_with_only_an_openai_key() {
        let config = load_with(&[("OPENAI_API_KEY", "sk-test")]).unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.provider, Provider::OpenAI);
        assert_eq!(config.api_key(), Some("sk-test"));
        assert_eq!(config.chat_model, "gpt-4o");
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.prompts_path, PathBuf::from("./prompts"));
        assert_eq!(config.domains_path, PathBuf::from("./configurations"));
        assert_eq!(config.generation_timeout, Duration::from_secs(30));
        assert_eq!(config.session_idle_timeout, Duration::from_secs(1800));
        assert_eq!(
            config.session_options,
            SessionOptions {
                min_questions: 5,
                max_questions: 10,
                feedback_timing: FeedbackTiming::Immediate,
            }
        );
    }

    #[test]
    #[serial]
    fn test_gemini_uses_its_own_key_and_model() {
        let config = load_with(&[
            ("LLM_PROVIDER", "Gemini"),
            ("GEMINI_API_KEY", "g-test"),
            ("OPENAI_API_KEY", "sk-unused"),
        ])
        .unwrap();

        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.api_key(), Some("g-test"));
        assert_eq!(config.chat_model, "gemini-1.5-pro");
    }

    #[test]
    #[serial]
    fn test_every_setting_can_be_overridden() {
        let config = load_with(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("CHAT_MODEL", "gpt-4o-mini"),
            ("RUST_LOG", "debug"),
            ("PROMPTS_PATH", "/srv/prompts"),
            ("DOMAINS_PATH", "/srv/domains"),
            ("GENERATION_TIMEOUT_SECS", "12"),
            ("SESSION_IDLE_TIMEOUT_SECS", "600"),
            ("FEEDBACK_TIMING", "deferred"),
            ("MIN_QUESTIONS", "6"),
            ("MAX_QUESTIONS", "6"),
        ])
        .unwrap();

        assert_eq!(config.bind_address.port(), 8080);
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.prompts_path, PathBuf::from("/srv/prompts"));
        assert_eq!(config.domains_path, PathBuf::from("/srv/domains"));
        assert_eq!(config.generation_timeout, Duration::from_secs(12));
        assert_eq!(config.session_idle_timeout, Duration::from_secs(600));
        assert_eq!(
            config.session_options,
            SessionOptions::fixed_length(6).with_feedback_timing(FeedbackTiming::Deferred)
        );
    }

    #[test]
    #[serial]
    fn test_missing_provider_key() {
        for (provider, key_var) in [("openai", "OPENAI_API_KEY"), ("gemini", "GEMINI_API_KEY")] {
            match load_with(&[("LLM_PROVIDER", provider)]) {
                Err(ConfigError::MissingVar(msg)) => assert!(msg.contains(key_var)),
                other => panic!("expected MissingVar, got {:?}", other.map(|_| ())),
            }
        }
    }

    #[test]
    #[serial]
    fn test_malformed_values_name_their_variable() {
        let key = ("OPENAI_API_KEY", "sk-test");
        let cases: [(&str, &str, &str); 8] = [
            ("BIND_ADDRESS", "nowhere", "BIND_ADDRESS"),
            ("RUST_LOG", "loud", "RUST_LOG"),
            ("GENERATION_TIMEOUT_SECS", "0", "GENERATION_TIMEOUT_SECS"),
            ("SESSION_IDLE_TIMEOUT_SECS", "0", "SESSION_IDLE_TIMEOUT_SECS"),
            ("SESSION_IDLE_TIMEOUT_SECS", "soon", "SESSION_IDLE_TIMEOUT_SECS"),
            ("FEEDBACK_TIMING", "eventually", "FEEDBACK_TIMING"),
            ("MIN_QUESTIONS", "five", "MIN_QUESTIONS"),
            ("MAX_QUESTIONS", "-1", "MAX_QUESTIONS"),
        ];
        for (var, value, expected) in cases {
            assert_eq!(invalid_var(load_with(&[key, (var, value)])), expected);
        }

        let inverted = load_with(&[key, ("MIN_QUESTIONS", "9"), ("MAX_QUESTIONS", "4")]);
        assert!(invalid_var(inverted).contains("MIN_QUESTIONS"));
    }
}
