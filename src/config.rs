use std::env;

use anyhow::Context;
use chrono::{Duration, FixedOffset, Offset, Utc};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub cors_origin: String,
    /// How long a "now" pickup is expected to take.
    pub pickup_now_window_minutes: i64,
    /// Extra time after the pickup time before a ready order expires.
    pub pickup_grace_minutes: i64,
    pub expiration_sweep_secs: u64,
    /// Offset used to decide what "today" means on the canteen dashboard.
    pub business_utc_offset_minutes: i32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let cors_origin =
            env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());
        Ok(Self {
            database_url,
            host,
            port: parse_or("APP_PORT", 3000),
            jwt_secret,
            jwt_ttl_hours: parse_or("JWT_TTL_HOURS", 24),
            cors_origin,
            pickup_now_window_minutes: parse_or("PICKUP_NOW_WINDOW_MINUTES", 10),
            pickup_grace_minutes: parse_or("PICKUP_GRACE_MINUTES", 30),
            expiration_sweep_secs: parse_or("EXPIRATION_SWEEP_SECS", 60),
            business_utc_offset_minutes: parse_or("BUSINESS_UTC_OFFSET_MINUTES", 480),
        })
    }

    pub fn pickup_now_window(&self) -> Duration {
        Duration::minutes(self.pickup_now_window_minutes)
    }

    pub fn pickup_grace(&self) -> Duration {
        Duration::minutes(self.pickup_grace_minutes)
    }

    pub fn jwt_ttl(&self) -> Duration {
        Duration::hours(self.jwt_ttl_hours)
    }

    pub fn business_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.business_utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
