use std::{env, fs, time::Duration};

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub host: String,
    pub port: u16,
    pub backend_url: String,
    pub api_prefix: String,
    pub upstream_timeout_secs: u64,
    /// Largest request body the proxy will buffer before relaying it.
    pub max_body_bytes: usize,
    pub gate_password: String,
}

impl EdgeConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = env::var("VAULT_EDGE_CONFIG").unwrap_or_else(|_| "vault-edge.json".to_string());
        let file_cfg: Option<EdgeConfig> = fs::read_to_string(&path)
            .ok()
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .with_context(|| format!("failed to parse {path}"))?;

        let mut cfg = file_cfg.unwrap_or_default();
        cfg.apply_overrides(|key| env::var(key).ok());
        Ok(cfg)
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("VE_HOST") {
            self.host = v;
        }
        if let Some(v) = var("VE_PORT") {
            self.port = v.parse().unwrap_or(self.port);
        }
        if let Some(v) = var("BACKEND_URL") {
            self.backend_url = v;
        }
        if let Some(v) = var("VE_API_PREFIX") {
            self.api_prefix = v;
        }
        if let Some(v) = var("VE_UPSTREAM_TIMEOUT_SECS") {
            self.upstream_timeout_secs = v.parse().unwrap_or(self.upstream_timeout_secs);
        }
        if let Some(v) = var("VE_MAX_BODY_BYTES") {
            self.max_body_bytes = v.parse().unwrap_or(self.max_body_bytes);
        }
        if let Some(v) = var("VE_GATE_PASSWORD") {
            self.gate_password = v;
        }
        self.backend_url = self.backend_url.trim_end_matches('/').to_string();
    }

    /// `None` when the timeout is disabled (`0`).
    pub fn upstream_timeout(&self) -> Option<Duration> {
        (self.upstream_timeout_secs > 0).then(|| Duration::from_secs(self.upstream_timeout_secs))
    }
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            backend_url: "http://localhost:8000".to_string(),
            api_prefix: "/api".to_string(),
            upstream_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024,
            gate_password: "protoType2@25".to_string(),
        }
    }
}
