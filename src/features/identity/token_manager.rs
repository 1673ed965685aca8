use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::core::config::IdentityConfig;
use crate::core::error::{ReportingError, Result};
use crate::shared::time::{to_chrono, Clock, SystemClock};

/// Cached bearer token with its expiry instant
struct AuthSession {
    token: String,
    expires_at: DateTime<Utc>,
}

impl AuthSession {
    fn is_fresh(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        self.expires_at - now >= margin
    }
}

/// Exchanges the configured credentials for a bearer token and keeps it fresh
pub struct IdentityTokenManager {
    config: IdentityConfig,
    client: reqwest::Client,
    clock: Arc<dyn Clock>,
    cache: RwLock<Option<AuthSession>>,
    /// Serialises refreshes so concurrent callers share one exchange
    refresh_lock: Mutex<()>,
}

impl IdentityTokenManager {
    pub fn new(config: IdentityConfig, client: reqwest::Client) -> Self {
        Self {
            config,
            client,
            clock: Arc::new(SystemClock),
            cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get a valid bearer token, exchanging credentials if the cached one is stale
    pub async fn ensure_valid_token(&self) -> Result<String> {
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let token = self.fetch_token().await?;
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(to_chrono(self.config.token_lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        tracing::info!(
            "Fetched new reporting service token for {}, valid until {}",
            self.config.username,
            expires_at
        );

        let mut cache = self.cache.write().await;
        *cache = Some(AuthSession {
            token: token.clone(),
            expires_at,
        });

        Ok(token)
    }

    /// Drop the cached token so the next call re-authenticates
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }

    async fn cached_token(&self) -> Option<String> {
        let cache = self.cache.read().await;
        let session = cache.as_ref()?;
        let now = self.clock.now();

        if session.is_fresh(now, to_chrono(self.config.refresh_margin)) {
            tracing::debug!(
                "Using cached reporting service token (expires in {} seconds)",
                (session.expires_at - now).num_seconds()
            );
            return Some(session.token.clone());
        }

        None
    }

    async fn fetch_token(&self) -> Result<String> {
        let token_url = self.config.token_url();
        tracing::debug!("Requesting reporting service token from {}", token_url);

        let response = self
            .client
            .post(&token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", "password"),
                ("client_id", self.config.client_id.as_str()),
                ("scope", self.config.scope.as_str()),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != reqwest::StatusCode::OK {
            tracing::error!("Token request failed: HTTP {} - {}", status, body);
            return Err(ReportingError::Authentication(body));
        }

        let parsed: Value = serde_json::from_str(&body).map_err(|e| {
            ReportingError::Authentication(format!("Failed to parse token response: {}", e))
        })?;

        extract_token(&parsed)
    }
}

/// Read the bearer token out of an identity response
///
/// `access_token` wins when present; otherwise the value of the first
/// property is used, which is what older identity services relied on.
fn extract_token(response: &Value) -> Result<String> {
    let object = response.as_object().ok_or_else(|| {
        ReportingError::Authentication(format!(
            "Token response is not a JSON object: {}",
            response
        ))
    })?;

    let value = object
        .get("access_token")
        .or_else(|| object.values().next())
        .ok_or_else(|| ReportingError::Authentication("Token response is empty".to_string()))?;

    let token = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    if token.is_empty() {
        return Err(ReportingError::Authentication(
            "Token response carries an empty token".to_string(),
        ));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_named_access_token() {
        let response = json!({
            "token_type": "Bearer",
            "expires_in": 3600,
            "access_token": "abc"
        });
        assert_eq!(extract_token(&response).unwrap(), "abc");
    }

    #[test]
    fn test_extract_first_property_in_document_order() {
        // Requires serde_json's preserve_order; sorted maps would yield "a_first"
        let response: Value =
            serde_json::from_str(r#"{"token": "xyz", "a_first": "nope"}"#).unwrap();
        assert_eq!(extract_token(&response).unwrap(), "xyz");
    }

    #[test]
    fn test_extract_rejects_non_objects_and_empty() {
        assert!(matches!(
            extract_token(&json!(["abc"])),
            Err(ReportingError::Authentication(_))
        ));
        assert!(matches!(
            extract_token(&json!({})),
            Err(ReportingError::Authentication(_))
        ));
        assert!(matches!(
            extract_token(&json!({"access_token": ""})),
            Err(ReportingError::Authentication(_))
        ));
    }

    #[test]
    fn test_session_freshness_margin() {
        let now = Utc::now();
        let margin = chrono::Duration::minutes(5);

        let session = AuthSession {
            token: "t".to_string(),
            expires_at: now + chrono::Duration::minutes(5),
        };
        assert!(session.is_fresh(now, margin));

        let session = AuthSession {
            token: "t".to_string(),
            expires_at: now + chrono::Duration::minutes(4),
        };
        assert!(!session.is_fresh(now, margin));
    }
}
