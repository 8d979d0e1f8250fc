//! Environment configuration for the API binary

use anyhow::{Context, bail};
use iam::IamConfig;
use iam::application::config::DEFAULT_OTP_LENGTH;
use platform::mailer::{SmtpConfig, SmtpEncryption};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

pub struct ApiConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    pub iam: IamConfig,
    /// `None` when `SMTP_HOST` is unset
    pub smtp: Option<SmtpConfig>,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

        let bind_addr = var_or("BIND_ADDR", DEFAULT_BIND_ADDR)
            .parse()
            .context("BIND_ADDR must be a socket address")?;

        let frontend_origins = var_or("FRONTEND_ORIGINS", DEFAULT_FRONTEND_ORIGINS)
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            database_url,
            bind_addr,
            frontend_origins,
            iam: iam_config()?,
            smtp: smtp_config()?,
        })
    }
}

fn iam_config() -> anyhow::Result<IamConfig> {
    let access = env::var("JWT_ACCESS_SECRET").ok().filter(|s| !s.is_empty());
    let refresh = env::var("JWT_REFRESH_SECRET").ok().filter(|s| !s.is_empty());

    let mut config = match (access, refresh) {
        (Some(access), Some(refresh)) => IamConfig {
            jwt_access_secret: access,
            jwt_refresh_secret: refresh,
            ..IamConfig::default()
        },
        _ if cfg!(debug_assertions) => {
            tracing::warn!("JWT secrets not set, using random development secrets");
            IamConfig::development()?
        }
        _ => bail!("JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must be set in production"),
    };

    if let Ok(issuer) = env::var("JWT_ISSUER") {
        config.jwt_issuer = issuer;
    }
    let minutes: u64 = parse_or("JWT_ACCESS_EXPIRY_MINUTES", 60)?;
    config.access_token_ttl = Duration::from_secs(minutes * 60);
    config.otp_length = parse_or("OTP_LENGTH", DEFAULT_OTP_LENGTH)?;
    config.log_queue_capacity = parse_or("LOG_QUEUE_CAPACITY", config.log_queue_capacity)?;
    config.password_pepper = env::var("PASSWORD_PEPPER")
        .ok()
        .filter(|p| !p.is_empty())
        .map(String::into_bytes);

    config.validate()?;
    Ok(config)
}

fn smtp_config() -> anyhow::Result<Option<SmtpConfig>> {
    let Some(host) = env::var("SMTP_HOST").ok().filter(|h| !h.trim().is_empty()) else {
        return Ok(None);
    };

    let encryption = SmtpEncryption::from_str(&var_or("SMTP_ENCRYPTION", "starttls"))?;
    Ok(Some(SmtpConfig {
        host,
        port: parse_or("SMTP_PORT", 587)?,
        username: var_or("SMTP_USERNAME", ""),
        password: var_or("SMTP_PASSWORD", ""),
        encryption,
        from: env::var("SMTP_FROM").context("SMTP_FROM must be set when SMTP_HOST is")?,
    }))
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
