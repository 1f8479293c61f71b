// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;

const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_TELEBIRR_CHECKOUT_URL: &str = "https://checkout.telebirr.example";
const DEFAULT_CBE_CHECKOUT_URL: &str = "https://checkout.cbe.example";
const DEFAULT_CATALOG_PATH: &str = "data/catalog.json";
const DEFAULT_OFFLINE_LIMIT: usize = 20;
const DEFAULT_PAYMENT_TTL_MINUTES: i64 = 30;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL for CORS and checkout return links
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Path to the JSON catalog used to seed the store
    pub catalog_path: String,
    /// Base URL of the Telebirr checkout page
    pub telebirr_checkout_url: String,
    /// Base URL of the CBE checkout page
    pub cbe_checkout_url: String,
    /// Maximum number of items a user may keep offline
    pub offline_limit: usize,
    /// Minutes before a pending payment can no longer be confirmed
    pub payment_ttl_minutes: i64,

    // --- Secrets ---
    /// HMAC key shared with the payment gateway (raw bytes)
    pub payment_signing_key: Vec<u8>,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            port: 8080,
            catalog_path: DEFAULT_CATALOG_PATH.to_string(),
            telebirr_checkout_url: DEFAULT_TELEBIRR_CHECKOUT_URL.to_string(),
            cbe_checkout_url: DEFAULT_CBE_CHECKOUT_URL.to_string(),
            offline_limit: 3,
            payment_ttl_minutes: DEFAULT_PAYMENT_TTL_MINUTES,
            payment_signing_key: b"test_payment_key_32_bytes_min!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| DEFAULT_FRONTEND_URL.to_string()),
            port: parse_or("PORT", 8080)?,
            catalog_path: env::var("CATALOG_PATH")
                .unwrap_or_else(|_| DEFAULT_CATALOG_PATH.to_string()),
            telebirr_checkout_url: env::var("TELEBIRR_CHECKOUT_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_TELEBIRR_CHECKOUT_URL.to_string()),
            cbe_checkout_url: env::var("CBE_CHECKOUT_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_CBE_CHECKOUT_URL.to_string()),
            offline_limit: parse_or("OFFLINE_LIMIT", DEFAULT_OFFLINE_LIMIT)?,
            payment_ttl_minutes: parse_or("PAYMENT_TTL_MINUTES", DEFAULT_PAYMENT_TTL_MINUTES)?,

            payment_signing_key: env::var("PAYMENT_SIGNING_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("PAYMENT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }
}

/// Parse an optional numeric variable, falling back to `default` when unset.
fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
