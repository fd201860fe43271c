use std::str::FromStr;

use anyhow::Context;
use jsonwebtoken::Algorithm;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    /// Shared secret that elevates a registration to the admin role.
    pub admin_registration_token: String,
    /// Allowed CORS origins; empty means permissive.
    pub cors_origins: Vec<String>,
    /// Base URL of the document-QA collaborator; QA routes answer 503 when unset.
    pub qa_service_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let jwt = JwtConfig {
            secret: std::env::var("SECRET_KEY").context("SECRET_KEY is required")?,
            algorithm: match std::env::var("ALGORITHM") {
                Ok(v) => Algorithm::from_str(&v)
                    .with_context(|| format!("unsupported token algorithm {v:?}"))?,
                Err(_) => Algorithm::HS256,
            },
            ttl_minutes: std::env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(30),
        };
        let admin_registration_token = std::env::var("ADMIN_REGISTRATION_TOKEN")
            .context("ADMIN_REGISTRATION_TOKEN is required")?;
        let cors_origins = std::env::var("BACKEND_CORS_ORIGINS")
            .map(|v| parse_cors_origins(&v))
            .unwrap_or_default();
        let qa_service_url = std::env::var("QA_SERVICE_URL").ok().filter(|v| !v.is_empty());

        Ok(Self {
            database_url,
            jwt,
            admin_registration_token,
            cors_origins,
            qa_service_url,
        })
    }
}

fn parse_cors_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
