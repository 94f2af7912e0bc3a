use std::fmt;

/// Default access-token lifetime: one hour.
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 3600;

/// Runtime configuration for HS256 token signing and verification.
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared secret used for both signing and verification.
    pub secret: String,
    /// Allowable clock skew in seconds when validating exp.
    pub leeway_seconds: u32,
    /// Lifetime of issued tokens.
    pub token_ttl_seconds: i64,
}

impl JwtConfig {
    /// Construct config with strict expiry (no leeway) and a one hour lifetime.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            leeway_seconds: 0,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        }
    }

    /// Adjust the allowed leeway.
    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    pub fn with_token_ttl(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("leeway_seconds", &self.leeway_seconds)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_secret() {
        let config = JwtConfig::new("super-secret").with_leeway(5);
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("leeway_seconds: 5"));
    }
}
