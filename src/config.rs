use clap::Parser;
use url::Url;

use crate::prompt::DEFAULT_PREAMBLE;

/// # Relay Configuration
///
/// Configuration from command-line arguments, environment variables, and an
/// optional `.env` file. Every request reads this as an immutable value; the
/// credential pool in particular is plain data handed to the selector at
/// construction time, not process-global state.
#[derive(Debug, Clone, Parser)]
#[command(name = "report-relay")]
#[command(about = "A streaming relay that turns pasted work notes into weekly reports via an OpenAI-compatible backend")]
#[command(version)]
pub struct Config {
    /// Server port to listen on
    #[arg(short, long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// Server host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Base URL of the OpenAI-compatible backend
    #[arg(long, env = "UPSTREAM_URL", default_value = "https://api.openai.com")]
    pub upstream_url: String,

    /// Model identifier sent with every completion request
    #[arg(long, env = "MODEL", default_value = "gpt-3.5-turbo")]
    pub model: String,

    /// Comma-separated credential pool for pool-selection mode
    #[arg(long, env = "OPENAI_API_KEY", value_delimiter = ',', hide_env_values = true)]
    pub api_keys: Vec<String>,

    /// Require each request to carry its own api_key instead of using the pool
    #[arg(long, env = "USE_USER_KEY", default_value = "false")]
    pub require_user_key: bool,

    /// Instruction prepended to the pasted notes (defaults to the built-in
    /// weekly-report preamble)
    #[arg(long, env = "PREAMBLE")]
    pub preamble: Option<String>,

    /// Sampling temperature (0.0 to 2.0)
    #[arg(long, env = "TEMPERATURE", default_value = "0.7")]
    pub temperature: f32,

    /// Nucleus sampling parameter (0.0 to 1.0)
    #[arg(long, env = "TOP_P", default_value = "1.0")]
    pub top_p: f32,

    /// Frequency penalty (-2.0 to 2.0)
    #[arg(long, env = "FREQUENCY_PENALTY", default_value = "0.0")]
    pub frequency_penalty: f32,

    /// Presence penalty (-2.0 to 2.0)
    #[arg(long, env = "PRESENCE_PENALTY", default_value = "0.0")]
    pub presence_penalty: f32,

    /// Maximum tokens to generate per report
    #[arg(long, env = "MAX_TOKENS", default_value = "1000")]
    pub max_tokens: u32,

    /// Number of completions to request
    #[arg(long, env = "SAMPLE_COUNT", default_value = "1")]
    pub sample_count: u32,

    /// Upstream connect timeout in seconds
    #[arg(long, env = "CONNECT_TIMEOUT_SECS", default_value = "10")]
    pub connect_timeout_secs: u64,

    /// Abort a request when the upstream stream is silent this long
    #[arg(long, env = "STREAM_IDLE_TIMEOUT_SECS", default_value = "60")]
    pub stream_idle_timeout_secs: u64,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Parse configuration from command line arguments and environment.
    ///
    /// Loads `.env` if present, parses arguments, initializes logging, and
    /// validates the result, exiting with a message on invalid configuration.
    pub fn parse_args() -> Self {
        let _ = dotenv::dotenv();

        let config = Self::parse();

        config.setup_logging();

        if let Err(err) = config.validate() {
            eprintln!("Configuration validation failed: {}", err);
            std::process::exit(1);
        }

        config
    }

    /// The preamble to prepend to pasted notes.
    pub fn effective_preamble(&self) -> &str {
        self.preamble.as_deref().unwrap_or(DEFAULT_PREAMBLE)
    }

    /// Create a test configuration with minimal required fields.
    pub fn for_test() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            upstream_url: "http://localhost:8000".to_string(),
            model: "test-model".to_string(),
            api_keys: Vec::new(),
            require_user_key: false,
            preamble: None,
            temperature: 0.7,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            max_tokens: 1000,
            sample_count: 1,
            connect_timeout_secs: 10,
            stream_idle_timeout_secs: 60,
            log_level: "info".to_string(),
        }
    }

    fn setup_logging(&self) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(self.log_level.as_str())
            .with_target(false)
            .try_init();
    }

    /// Validate configuration values and provide helpful error messages.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be 0. Please specify a valid port number (1-65535).".to_string());
        }

        if self.host.is_empty() {
            return Err("Host cannot be empty. Please specify a valid host (e.g., '0.0.0.0' or '127.0.0.1').".to_string());
        }

        match Url::parse(&self.upstream_url) {
            Ok(url) => {
                if !["http", "https"].contains(&url.scheme()) {
                    return Err(format!(
                        "Invalid upstream URL scheme '{}'. Only 'http' and 'https' are supported.",
                        url.scheme()
                    ));
                }
                if url.host().is_none() {
                    return Err(
                        "Upstream URL must include a host (e.g., 'https://api.openai.com').".to_string(),
                    );
                }
            }
            Err(err) => {
                return Err(format!(
                    "Invalid upstream URL '{}': {}.",
                    self.upstream_url, err
                ));
            }
        }

        if self.model.is_empty() {
            return Err("Model cannot be empty. Please specify a model identifier.".to_string());
        }

        // Pool mode needs at least one key up front; user-key mode takes the
        // credential per request instead.
        if !self.require_user_key && self.api_keys.iter().all(|k| k.trim().is_empty()) {
            return Err(
                "No credentials configured. Set OPENAI_API_KEY (comma-separated for a pool) \
                or enable USE_USER_KEY to accept per-request keys."
                    .to_string(),
            );
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "Temperature {} is out of range. Valid range is 0.0 to 2.0.",
                self.temperature
            ));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(format!(
                "top_p {} is out of range. Valid range is 0.0 to 1.0.",
                self.top_p
            ));
        }

        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than 0.".to_string());
        }
        if self.sample_count == 0 {
            return Err("sample_count must be greater than 0.".to_string());
        }

        if self.connect_timeout_secs == 0 {
            return Err("Connect timeout must be greater than 0 seconds.".to_string());
        }
        if self.stream_idle_timeout_secs == 0 {
            return Err("Stream idle timeout must be greater than 0 seconds.".to_string());
        }

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log level '{}'. Valid options are: {}",
                self.log_level,
                valid_log_levels.join(", ")
            ));
        }

        Ok(())
    }
}
