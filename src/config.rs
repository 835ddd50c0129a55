//! Environment-driven server configuration.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Server configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on.
    pub port: u16,
    /// Origin allowed to make credentialed cross-origin requests.
    pub client_origin: String,
    /// Secret used to sign session cookies.
    pub session_secret: SecretString,
    /// Whether session cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
    /// Idle time after which a session's collection is dropped.
    pub session_ttl_secs: u64,
    /// Number of reverse-proxy hops to trust when resolving the client IP.
    pub trusted_proxy_hops: usize,
}

impl ServerConfig {
    /// Load configuration from the environment.
    ///
    /// Only `SESSION_SECRET` is required; everything else has a default.
    /// Values are validated for presence, not content.
    pub fn from_env() -> Result<Self, ConfigError> {
        let session_secret = std::env::var("SESSION_SECRET")
            .map(SecretString::from)
            .map_err(|_| ConfigError::MissingEnvVar("SESSION_SECRET".to_string()))?;

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let client_origin = std::env::var("CLIENT_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        let cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|v| matches!(v.trim(), "1" | "true" | "TRUE"))
            .unwrap_or(false);

        let session_ttl_secs: u64 = std::env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400);

        let trusted_proxy_hops: usize = std::env::var("TRUSTED_PROXY_HOPS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        Ok(Self {
            port,
            client_origin,
            session_secret,
            cookie_secure,
            session_ttl_secs,
            trusted_proxy_hops,
        })
    }
}
