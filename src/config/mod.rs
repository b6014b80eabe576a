use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct OrderConfig {
    pub common: CommonConfig,
    pub mongodb: MongoConfig,
    pub smtp: SmtpConfig,
    pub redis: RedisConfig,
    pub security: SecurityConfig,
    pub verification: VerificationConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommonConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl CommonConfig {
    /// Layered load: an optional `configuration` file overridden by
    /// `APP`-prefixed environment variables (e.g. `APP_PORT`).
    pub fn load() -> Result<Self, AppError> {
        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// When set, verification codes live in Redis so multiple instances
    /// share one code space. Unset means the in-process store.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub admin_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationConfig {
    /// Optional TTL for issued codes. Unset keeps codes valid until
    /// redeemed or overwritten, matching the historical contract.
    pub code_ttl_seconds: Option<u64>,
    /// When true, confirm-checkout rejects orders whose email has not
    /// redeemed a verification code.
    pub require_verified_email: bool,
    /// When true, the send-code response echoes the issued code.
    /// For tests and local debugging only; never enable in production.
    pub expose_code: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub upload_dir: String,
    pub invoice_dir: String,
}

impl OrderConfig {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(OrderConfig {
            common: CommonConfig::load()?,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("order_db"), is_prod)?,
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("smtp.gmail.com"), is_prod)?,
                port: get_env("SMTP_PORT", Some("587"), is_prod)?
                    .parse()
                    .unwrap_or(587),
                user: get_env("SMTP_USER", Some(""), is_prod)?,
                password: get_env("SMTP_PASSWORD", Some(""), is_prod)?,
                from_email: get_env("SMTP_FROM_EMAIL", Some("noreply@example.com"), is_prod)?,
                from_name: get_env("SMTP_FROM_NAME", Some("Order Service"), is_prod)?,
                enabled: env::var("SMTP_ENABLED")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .unwrap_or(false),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").ok(),
            },
            security: SecurityConfig {
                admin_api_key: get_env("ADMIN_API_KEY", Some("dev-admin-key"), is_prod)?,
            },
            verification: VerificationConfig {
                code_ttl_seconds: env::var("VERIFICATION_CODE_TTL_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok()),
                require_verified_email: env::var("REQUIRE_VERIFIED_EMAIL")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .unwrap_or(false),
                expose_code: env::var("EXPOSE_VERIFICATION_CODE")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .unwrap_or(false),
            },
            storage: StorageConfig {
                upload_dir: get_env("UPLOAD_DIR", Some("data/uploads"), is_prod)?,
                invoice_dir: get_env("INVOICE_DIR", Some("data/invoices"), is_prod)?,
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_config_defaults_the_port() {
        let config = CommonConfig::load().unwrap();
        assert_eq!(config.port, 8080);
    }
}
