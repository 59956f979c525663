// SPDX-License-Identifier: MIT

//! Environment configuration
//!
//! Variable names follow the web app's `NEXT_PUBLIC_*` settings so the same
//! `.env` file can be shared. Only the backend URL is required.

use std::env;

use crate::error::SunaError;

pub const BACKEND_URL_VAR: &str = "NEXT_PUBLIC_BACKEND_URL";
pub const ACCESS_TOKEN_VAR: &str = "SUNA_ACCESS_TOKEN";

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Base URL of the backend API
    pub backend_url: String,
    /// Supabase session JWT sent as a bearer token
    pub access_token: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub sentry_dsn: Option<String>,
    /// Public URL of the web app
    pub app_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, SunaError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SunaError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend_url = get(BACKEND_URL_VAR)
            .ok_or_else(|| SunaError::config(format!("{} must be set", BACKEND_URL_VAR)))?;

        Ok(Self {
            backend_url,
            access_token: get(ACCESS_TOKEN_VAR),
            supabase_url: get("NEXT_PUBLIC_SUPABASE_URL"),
            supabase_anon_key: get("NEXT_PUBLIC_SUPABASE_ANON_KEY"),
            sentry_dsn: get("NEXT_PUBLIC_SENTRY_DSN"),
            app_url: get("NEXT_PUBLIC_URL"),
        })
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, backend_url: Option<String>, access_token: Option<String>) -> Self {
        if let Some(url) = backend_url {
            self.backend_url = url;
        }
        if access_token.is_some() {
            self.access_token = access_token;
        }
        self
    }
}
