use std::env;
use std::time::Duration;

use crate::core::error::{ReportingError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub identity: IdentityConfig,
    pub reporting: ReportingConfig,
}

/// Configuration for the access-control identity endpoint
/// Used for the password-grant exchange that yields the bearer token
#[derive(Clone)]
pub struct IdentityConfig {
    pub ac_url: String,
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub scope: String,
    /// Lifetime assumed for every freshly issued token
    pub token_lifetime: Duration,
    /// Refresh the token when less than this remains
    pub refresh_margin: Duration,
}

#[derive(Debug, Clone)]
pub struct ReportingConfig {
    pub server_url: String,
    /// Delay between two report status checks
    pub polling_interval: Duration,
    /// Upper bound on polling; `None` polls until the job is terminal
    pub poll_timeout: Option<Duration>,
    /// Reject filters whose kind does not apply to the requested template
    pub strict_filters: bool,
}

impl Config {
    /// Build a configuration from explicit values, using defaults for everything else
    pub fn new(server_url: &str, ac_url: &str, username: &str, password: &str) -> Result<Self> {
        require_base_url("server_url", server_url)?;
        require_base_url("ac_url", ac_url)?;
        require_non_empty("username", username)?;
        require_non_empty("password", password)?;

        Ok(Self {
            identity: IdentityConfig::new(ac_url, username, password),
            reporting: ReportingConfig::new(server_url),
        })
    }

    pub fn from_env() -> std::result::Result<Self, String> {
        // Load .env file if exists, ignore if not found
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            identity: IdentityConfig::from_env()?,
            reporting: ReportingConfig::from_env()?,
        })
    }
}

fn require_non_empty(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ReportingError::Argument(format!("{} must not be empty", name)));
    }
    Ok(())
}

/// Base URLs must be absolute so endpoint paths can be joined onto them
fn require_base_url(name: &str, value: &str) -> Result<()> {
    require_non_empty(name, value)?;

    let url = reqwest::Url::parse(value).map_err(|e| {
        ReportingError::Argument(format!("{} '{}' is not a valid URL: {}", name, value, e))
    })?;

    if url.cannot_be_a_base() {
        return Err(ReportingError::Argument(format!(
            "{} '{}' cannot be used as a base URL",
            name, value
        )));
    }
    Ok(())
}

impl IdentityConfig {
    pub const CLIENT_ID: &'static str = "reporting_service_api";
    pub const SCOPE: &'static str = "reporting_api";
    const TOKEN_PATH: &'static str = "CxRestAPI/auth/identity/connect/token";
    const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600; // 1 hour
    const DEFAULT_REFRESH_MARGIN_SECS: u64 = 300; // 5 minutes

    pub fn new(ac_url: &str, username: &str, password: &str) -> Self {
        Self {
            ac_url: ac_url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            client_id: Self::CLIENT_ID.to_string(),
            scope: Self::SCOPE.to_string(),
            token_lifetime: Duration::from_secs(Self::DEFAULT_TOKEN_LIFETIME_SECS),
            refresh_margin: Duration::from_secs(Self::DEFAULT_REFRESH_MARGIN_SECS),
        }
    }

    pub fn from_env() -> std::result::Result<Self, String> {
        let ac_url = env::var("REPORTING_AC_URL")
            .map_err(|_| "REPORTING_AC_URL environment variable is required".to_string())?;
        require_base_url("REPORTING_AC_URL", &ac_url).map_err(|e| e.to_string())?;

        let username = env::var("REPORTING_USERNAME")
            .map_err(|_| "REPORTING_USERNAME environment variable is required".to_string())?;

        let password = env::var("REPORTING_PASSWORD")
            .map_err(|_| "REPORTING_PASSWORD environment variable is required".to_string())?;

        let token_lifetime_secs = env::var("REPORTING_TOKEN_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TOKEN_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "REPORTING_TOKEN_LIFETIME_SECS must be a valid number".to_string())?;

        let refresh_margin_secs = env::var("REPORTING_TOKEN_REFRESH_MARGIN_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_REFRESH_MARGIN_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| {
                "REPORTING_TOKEN_REFRESH_MARGIN_SECS must be a valid number".to_string()
            })?;

        Ok(Self {
            token_lifetime: Duration::from_secs(token_lifetime_secs),
            refresh_margin: Duration::from_secs(refresh_margin_secs),
            ..Self::new(&ac_url, &username, &password)
        })
    }

    /// Full URL of the password-grant token endpoint
    pub fn token_url(&self) -> String {
        format!("{}/{}", self.ac_url.trim_end_matches('/'), Self::TOKEN_PATH)
    }
}

// Hand-written so the password never reaches the logs
impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("ac_url", &self.ac_url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("client_id", &self.client_id)
            .field("scope", &self.scope)
            .field("token_lifetime", &self.token_lifetime)
            .field("refresh_margin", &self.refresh_margin)
            .finish()
    }
}

impl ReportingConfig {
    const DEFAULT_POLLING_INTERVAL_SECS: u64 = 2;

    pub fn new(server_url: &str) -> Self {
        Self {
            server_url: server_url.to_string(),
            polling_interval: Duration::from_secs(Self::DEFAULT_POLLING_INTERVAL_SECS),
            poll_timeout: None,
            strict_filters: false,
        }
    }

    pub fn from_env() -> std::result::Result<Self, String> {
        let server_url = env::var("REPORTING_SERVER_URL")
            .map_err(|_| "REPORTING_SERVER_URL environment variable is required".to_string())?;
        require_base_url("REPORTING_SERVER_URL", &server_url).map_err(|e| e.to_string())?;

        let polling_interval_secs = env::var("REPORTING_POLLING_INTERVAL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_POLLING_INTERVAL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "REPORTING_POLLING_INTERVAL_SECS must be a valid number".to_string())?;

        let poll_timeout = match env::var("REPORTING_POLL_TIMEOUT_SECS")
            .ok()
            .filter(|s| !s.is_empty())
        {
            Some(raw) => Some(Duration::from_secs(raw.parse::<u64>().map_err(|_| {
                "REPORTING_POLL_TIMEOUT_SECS must be a valid number".to_string()
            })?)),
            None => None,
        };

        let strict_filters = env::var("REPORTING_STRICT_FILTERS")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            server_url,
            polling_interval: Duration::from_secs(polling_interval_secs),
            poll_timeout,
            strict_filters,
        })
    }

    /// Build an endpoint URL relative to the reporting server
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.server_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_inputs() {
        assert!(matches!(
            Config::new("", "http://ac", "user", "pass"),
            Err(ReportingError::Argument(_))
        ));
        assert!(matches!(
            Config::new("http://rs", "http://ac", "user", "  "),
            Err(ReportingError::Argument(_))
        ));
    }

    #[test]
    fn test_new_rejects_malformed_urls() {
        assert!(matches!(
            Config::new("not a url", "http://ac", "user", "pass"),
            Err(ReportingError::Argument(_))
        ));
        assert!(matches!(
            Config::new("http://rs", "also not a url", "user", "pass"),
            Err(ReportingError::Argument(_))
        ));
        assert!(matches!(
            Config::new("mailto:ops@example.com", "http://ac", "user", "pass"),
            Err(ReportingError::Argument(_))
        ));
        assert!(Config::new("https://rs.example.com:8080", "http://ac", "user", "pass").is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = Config::new("http://rs/", "http://ac/", "user", "pass").unwrap();
        assert_eq!(config.reporting.polling_interval, Duration::from_secs(2));
        assert_eq!(config.reporting.poll_timeout, None);
        assert!(!config.reporting.strict_filters);
        assert_eq!(config.identity.token_lifetime, Duration::from_secs(3600));
        assert_eq!(config.identity.refresh_margin, Duration::from_secs(300));
        assert_eq!(config.identity.client_id, "reporting_service_api");
        assert_eq!(config.identity.scope, "reporting_api");
    }

    #[test]
    fn test_urls_are_joined_without_double_slashes() {
        let config = Config::new("http://rs/", "http://ac/", "user", "pass").unwrap();
        assert_eq!(
            config.identity.token_url(),
            "http://ac/CxRestAPI/auth/identity/connect/token"
        );
        assert_eq!(
            config.reporting.endpoint("/api/reports"),
            "http://rs/api/reports"
        );
    }

    #[test]
    fn test_identity_debug_hides_password() {
        let identity = IdentityConfig::new("http://ac", "user", "s3cret");
        let rendered = format!("{:?}", identity);
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("***"));
    }
}
