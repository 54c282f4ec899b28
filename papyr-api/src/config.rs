//! API Configuration Module
//!
//! This module provides configuration for the HTTP listener, CORS, and
//! cookie hardening. Configuration is loaded from environment variables
//! with sensible defaults for development.

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for the listener, CORS, and cookie settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address and port to bind the HTTP listener to.
    pub bind_addr: String,

    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    /// Example: "https://papyr.app,https://www.papyr.app"
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Cookie Configuration
    // ========================================================================
    /// Whether refresh cookies carry the Secure attribute.
    /// Off by default so plain-HTTP local development still works.
    pub secure_cookies: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            // CORS defaults: permissive for development
            cors_origins: Vec::new(), // Empty = allow all
            cors_max_age_secs: 86400, // 24 hours
            secure_cookies: false,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `PAPYR_BIND_ADDR`: Listener address (default: "0.0.0.0:3000")
    /// - `PAPYR_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `PAPYR_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `PAPYR_SECURE_COOKIES`: "true" or "false" (default: false)
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("PAPYR_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let cors_origins = std::env::var("PAPYR_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_max_age_secs = std::env::var("PAPYR_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400);

        let secure_cookies = std::env::var("PAPYR_SECURE_COOKIES")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        Self {
            bind_addr,
            cors_origins,
            cors_max_age_secs,
            secure_cookies,
        }
    }

    /// Check if running with strict CORS (explicit origin list).
    pub fn is_strict_cors(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            // Dev mode: allow all
            return true;
        }

        self.cors_origins.iter().any(|allowed| allowed == origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.cors_max_age_secs, 86400);
        assert!(!config.secure_cookies);
    }

    #[test]
    fn test_origin_allowed_dev_mode() {
        let config = ApiConfig::default();
        assert!(config.is_origin_allowed("https://anything.com"));
        assert!(config.is_origin_allowed("http://localhost:3000"));
    }

    #[test]
    fn test_origin_allowed_strict() {
        let mut config = ApiConfig::default();
        config.cors_origins = vec![
            "https://papyr.app".to_string(),
            "https://www.papyr.app".to_string(),
        ];

        assert!(config.is_strict_cors());
        assert!(config.is_origin_allowed("https://papyr.app"));
        assert!(config.is_origin_allowed("https://www.papyr.app"));
        assert!(!config.is_origin_allowed("https://evil.com"));
    }
}
