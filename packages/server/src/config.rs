use std::path::PathBuf;

use common::storage::s3::S3Settings;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
    /// Public URL of the website, used to build links in emails.
    pub public_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    /// Log every SQL statement at debug level.
    #[serde(default)]
    pub log_statements: bool,
}

fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    2
}
fn default_acquire_timeout_secs() -> u64 {
    8
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of issued bearer tokens.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default = "default_verification_ttl_hours")]
    pub verification_ttl_hours: i64,
    #[serde(default = "default_reset_ttl_minutes")]
    pub reset_ttl_minutes: i64,
}

fn default_token_ttl_hours() -> i64 {
    24 * 7
}
fn default_verification_ttl_hours() -> i64 {
    48
}
fn default_reset_ttl_minutes() -> i64 {
    60
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Filesystem,
    S3,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend.
    pub path: PathBuf,
    /// Largest accepted upload in bytes.
    pub max_upload_size: u64,
    pub s3: Option<S3Settings>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    /// When disabled, outgoing mail is only logged.
    pub enabled: bool,
    pub from_email: String,
    pub from_name: String,
    /// Inbox that receives contact-form messages.
    pub contact_inbox: String,
    pub smtp: Option<SmtpConfig>,
}

/// A purchasable bundle of points.
#[derive(Debug, Deserialize, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct PointsPackage {
    #[schema(example = "starter")]
    pub id: String,
    #[schema(example = "Starter pack")]
    pub name: String,
    #[schema(example = 500)]
    pub points: i64,
    #[schema(example = 499)]
    pub price_cents: i64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SubscriptionPrices {
    pub creator: Option<String>,
    pub pro: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    /// Payment endpoints answer 503 unless this is set.
    pub enabled: bool,
    pub secret_key: Option<String>,
    pub webhook_secret: Option<String>,
    pub currency: String,
    #[serde(default)]
    pub packages: Vec<PointsPackage>,
    #[serde(default)]
    pub subscription_prices: SubscriptionPrices,
}

impl PaymentsConfig {
    pub fn package(&self, id: &str) -> Option<&PointsPackage> {
        self.packages.iter().find(|p| p.id == id)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RewardsConfig {
    /// Points credited once the email address is verified.
    pub signup_bonus: i64,
    /// Points credited to a contest winner.
    pub contest_winner_bonus: i64,
    /// Days a giveaway winner has to claim the prize.
    pub claim_window_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub mail: MailConfig,
    pub payments: PaymentsConfig,
    pub rewards: RewardsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("server.public_url", "http://localhost:5173")?
            .set_default("storage.backend", "filesystem")?
            .set_default("storage.path", "./data/media")?
            .set_default("storage.max_upload_size", 512 * 1024 * 1024)?
            .set_default("mail.enabled", false)?
            .set_default("mail.from_email", "no-reply@localhost")?
            .set_default("mail.from_name", "Studio")?
            .set_default("mail.contact_inbox", "hello@localhost")?
            .set_default("payments.enabled", false)?
            .set_default("payments.currency", "usd")?
            .set_default("rewards.signup_bonus", 0)?
            .set_default("rewards.contest_winner_bonus", 0)?
            .set_default(
                "rewards.claim_window_days",
                common::giveaway::DEFAULT_CLAIM_WINDOW_DAYS,
            )?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., STUDIO__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("STUDIO").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
