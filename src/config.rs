//! Credentials bundle for the Cloud Manager log endpoint.
//!
//! Token issuance and refresh happen elsewhere; the file read here carries a
//! ready-to-use bearer token alongside the org and client identifiers the
//! endpoint headers require.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub org_id: String,
    pub client_id: String,
    pub access_token: String,
}

impl Credentials {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file {}", path.display()))?;
        let credentials: Credentials = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse credentials file {}", path.display()))?;
        Ok(credentials)
    }
}
