//! Gateway configuration.

use std::time::Duration;

use smallbank_ledger::LedgerConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable lines.
    Pretty,
}

impl LogFormat {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" | "text" => Some(LogFormat::Pretty),
            _ => None,
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret.
    pub jwt_secret: String,
    /// Lifetime of issued tokens.
    pub token_ttl: Duration,
    /// Accepted login username.
    pub username: String,
    /// Accepted login password.
    pub password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "smallbank-development-secret".to_string(),
            token_ttl: Duration::from_secs(24 * 60 * 60),
            username: "admin".to_string(),
            password: "admin".to_string(),
        }
    }
}

/// Main gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub listen_port: u16,
    /// Authentication.
    pub auth: AuthConfig,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
    /// Ledger and storage configuration.
    pub ledger: LedgerConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 3000,
            auth: AuthConfig::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            ledger: LedgerConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            ledger: LedgerConfig::from_lookup(&lookup),
            ..Self::default()
        };

        if let Some(addr) = lookup("GATEWAY_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(port) = lookup("GATEWAY_LISTEN_PORT") {
            if let Ok(port) = port.parse() {
                config.listen_port = port;
            }
        }

        if let Some(secret) = lookup("JWT_SECRET") {
            config.auth.jwt_secret = secret;
        }

        if let Some(hours) = lookup("TOKEN_TTL_HOURS") {
            if let Ok(hours) = hours.parse::<u64>() {
                config.auth.token_ttl = Duration::from_secs(hours.saturating_mul(60 * 60));
            }
        }

        if let Some(username) = lookup("VALID_USERNAME") {
            config.auth.username = username;
        }

        if let Some(password) = lookup("VALID_PASSWORD") {
            config.auth.password = password;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        if let Some(format) = lookup("LOG_FORMAT").as_deref().and_then(LogFormat::parse) {
            config.log_format = format;
        }

        config
    }

    /// Socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_port == 0 {
            return Err("Listen port cannot be 0".to_string());
        }

        if self.auth.jwt_secret.is_empty() {
            return Err("JWT secret cannot be empty".to_string());
        }

        if self.auth.token_ttl.is_zero() {
            return Err("Token TTL cannot be 0".to_string());
        }

        if self.auth.username.is_empty() {
            return Err("Login username cannot be empty".to_string());
        }

        self.ledger.validate()
    }
}
