/// Configuration management
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub database_url: String,

    #[serde(default = "default_db_max_connections")]
    pub database_max_connections: u32,

    /// HMAC secret for access tokens. Must differ from the refresh secret.
    pub access_token_secret: String,

    /// HMAC secret for refresh tokens.
    pub refresh_token_secret: String,

    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_secs: i64,

    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl_secs: i64,

    /// Lifetime of the temporary token issued mid-login while a
    /// second-factor challenge is pending.
    #[serde(default = "default_temp_token_ttl")]
    pub temp_token_ttl_secs: u64,

    #[serde(default = "default_totp_issuer")]
    pub totp_issuer: String,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_access_token_ttl() -> i64 {
    900 // 15 minutes
}

fn default_refresh_token_ttl() -> i64 {
    7 * 24 * 3600 // 7 days
}

fn default_temp_token_ttl() -> u64 {
    180
}

fn default_totp_issuer() -> String {
    "auth-api".to_string()
}
