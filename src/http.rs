// src/http.rs
//! Shared outbound HTTP client. Certificates are always verified unless a
//! test explicitly opts out.

use anyhow::{bail, Context, Result};
use reqwest::Client;
use std::time::Duration;

use crate::config::HttpConfig;

/// Caller-side allowance for the insecure TLS setting. Only tests construct
/// `AllowInsecure`; the binary always passes `VerifiedOnly`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsPolicy {
    VerifiedOnly,
    AllowInsecure,
}

pub fn build_client(cfg: &HttpConfig, policy: TlsPolicy) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(cfg.user_agent.clone())
        .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
        .use_rustls_tls();

    if cfg.insecure_tls_for_tests {
        if policy != TlsPolicy::AllowInsecure {
            bail!("insecure_tls_for_tests is set but this caller only allows verified TLS");
        }
        tracing::warn!(target: "http", "certificate verification DISABLED (test configuration)");
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder.build().context("building http client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verified_client_builds_by_default() {
        let cfg = HttpConfig::default();
        assert!(!cfg.insecure_tls_for_tests);
        assert!(build_client(&cfg, TlsPolicy::VerifiedOnly).is_ok());
    }

    #[test]
    fn insecure_requires_explicit_allowance() {
        let cfg = HttpConfig {
            insecure_tls_for_tests: true,
            ..HttpConfig::default()
        };
        assert!(build_client(&cfg, TlsPolicy::VerifiedOnly).is_err());
        assert!(build_client(&cfg, TlsPolicy::AllowInsecure).is_ok());
    }
}
