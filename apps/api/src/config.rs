use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,

    // Document rendering
    pub latex_bin: String,
    pub latex_timeout_secs: u64,

    // Sessions
    pub session_ttl_secs: u64,
    pub cookie_secure: bool,

    // Payment gateways; a gateway without credentials is disabled.
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub razorpay_key_id: Option<String>,
    pub razorpay_key_secret: Option<String>,
    pub razorpay_webhook_secret: Option<String>,
    pub paypal_client_id: Option<String>,
    pub paypal_client_secret: Option<String>,
    pub paypal_live: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            non_empty(lookup(key))
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let optional = |key: &str| non_empty(lookup(key));

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            redis_url: require("REDIS_URL")?,
            s3_bucket: require("S3_BUCKET")?,
            s3_endpoint: require("S3_ENDPOINT")?,
            aws_access_key_id: require("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require("ANTHROPIC_API_KEY")?,
            port: parse_or("PORT", optional("PORT"), 8080)?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),

            latex_bin: optional("LATEX_BIN").unwrap_or_else(|| "pdflatex".to_string()),
            latex_timeout_secs: parse_or("LATEX_TIMEOUT_SECS", optional("LATEX_TIMEOUT_SECS"), 30)?,

            session_ttl_secs: parse_or("SESSION_TTL_SECS", optional("SESSION_TTL_SECS"), 604_800)?,
            cookie_secure: parse_or("COOKIE_SECURE", optional("COOKIE_SECURE"), false)?,

            stripe_secret_key: optional("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: optional("STRIPE_WEBHOOK_SECRET"),
            razorpay_key_id: optional("RAZORPAY_KEY_ID"),
            razorpay_key_secret: optional("RAZORPAY_KEY_SECRET"),
            razorpay_webhook_secret: optional("RAZORPAY_WEBHOOK_SECRET"),
            paypal_client_id: optional("PAYPAL_CLIENT_ID"),
            paypal_client_secret: optional("PAYPAL_CLIENT_SECRET"),
            paypal_live: paypal_live(optional("PAYPAL_MODE").as_deref())?,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

fn paypal_live(mode: Option<&str>) -> Result<bool> {
    match mode.map(str::to_ascii_lowercase).as_deref() {
        None | Some("sandbox") => Ok(false),
        Some("live") => Ok(true),
        Some(other) => anyhow::bail!("PAYPAL_MODE must be 'sandbox' or 'live', got '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/vitae"),
            ("REDIS_URL", "redis://localhost"),
            ("S3_BUCKET", "vitae"),
            ("S3_ENDPOINT", "http://localhost:9000"),
            ("AWS_ACCESS_KEY_ID", "minio"),
            ("AWS_SECRET_ACCESS_KEY", "minio123"),
            ("ANTHROPIC_API_KEY", "sk-test"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<Config> {
        Config::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults_apply() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.latex_bin, "pdflatex");
        assert_eq!(config.session_ttl_secs, 604_800);
        assert!(!config.cookie_secure);
        assert!(!config.paypal_live);
        assert!(config.stripe_secret_key.is_none());
    }

    #[test]
    fn test_missing_required_variable_fails() {
        let mut env = base_env();
        env.remove("REDIS_URL");
        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("REDIS_URL"));
    }

    #[test]
    fn test_blank_optional_counts_as_unset() {
        let mut env = base_env();
        env.insert("STRIPE_SECRET_KEY", "  ");
        assert!(load(&env).unwrap().stripe_secret_key.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut env = base_env();
        env.insert("PORT", "eighty");
        assert!(load(&env).is_err());

        let mut env = base_env();
        env.insert("PAYPAL_MODE", "production");
        assert!(load(&env).is_err());
    }

    #[test]
    fn test_gateway_settings_are_read() {
        let mut env = base_env();
        env.insert("PAYPAL_MODE", "LIVE");
        env.insert("COOKIE_SECURE", "true");
        env.insert("RAZORPAY_KEY_ID", "rzp_test_1");
        let config = load(&env).unwrap();
        assert!(config.paypal_live);
        assert!(config.cookie_secure);
        assert_eq!(config.razorpay_key_id.as_deref(), Some("rzp_test_1"));
    }
}
