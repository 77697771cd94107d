//! Client configuration with builder pattern.
//!
//! Type-safe configuration for the ledger client: RPC endpoint, deployed
//! contract object identifiers, timeouts, and the retry policy applied to
//! read-only calls.

use std::time::Duration;

use snafu::ensure;

use result_registry_types::{error::MalformedArgumentsSnafu, Result};

/// Default request timeout (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection establishment timeout (5 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for [`LedgerClient`](crate::LedgerClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Ledger JSON-RPC endpoint URL.
    pub(crate) rpc_url: String,

    /// Identifier of the deployed registry package.
    pub(crate) package_id: String,

    /// Identifier of the shared registry object.
    pub(crate) registry_id: String,

    /// Identifier of the institution capability object.
    pub(crate) institution_cap: String,

    /// Request timeout.
    pub(crate) timeout: Duration,

    /// Connection establishment timeout.
    pub(crate) connect_timeout: Duration,

    /// Retry policy for read-only calls.
    pub(crate) retry_policy: RetryPolicy,
}

impl ClientConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Returns the RPC endpoint URL.
    #[must_use]
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Returns the registry package identifier.
    #[must_use]
    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    /// Returns the registry object identifier.
    #[must_use]
    pub fn registry_id(&self) -> &str {
        &self.registry_id
    }

    /// Returns the institution capability object identifier.
    #[must_use]
    pub fn institution_cap(&self) -> &str {
        &self.institution_cap
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the connection timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the retry policy for read-only calls.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}

/// Retry policy for read-only ledger calls.
///
/// State-changing calls are never retried automatically; this policy applies
/// to `inspect` only.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the initial one.
    pub max_attempts: u32,
    /// Backoff before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on the backoff between attempts.
    pub max_backoff: Duration,
    /// Multiplier applied to the backoff after each attempt.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that performs a single attempt and no retries.
    #[must_use]
    pub fn no_retries() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    rpc_url: Option<String>,
    package_id: Option<String>,
    registry_id: Option<String>,
    institution_cap: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    retry_policy: Option<RetryPolicy>,
}

impl ClientConfigBuilder {
    /// Sets the ledger JSON-RPC endpoint URL.
    #[must_use]
    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    /// Sets the deployed registry package identifier.
    #[must_use]
    pub fn with_package_id(mut self, id: impl Into<String>) -> Self {
        self.package_id = Some(id.into());
        self
    }

    /// Sets the shared registry object identifier.
    #[must_use]
    pub fn with_registry_id(mut self, id: impl Into<String>) -> Self {
        self.registry_id = Some(id.into());
        self
    }

    /// Sets the institution capability object identifier.
    #[must_use]
    pub fn with_institution_cap(mut self, id: impl Into<String>) -> Self {
        self.institution_cap = Some(id.into());
        self
    }

    /// Sets the request timeout. Default: 30 seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection establishment timeout. Default: 5 seconds.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the retry policy for read-only calls. Default:
    /// [`RetryPolicy::default()`].
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Builds the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns `MalformedArguments` if the RPC URL is missing or not HTTP(S),
    /// any object identifier is missing or empty, or a timeout is zero.
    pub fn build(self) -> Result<ClientConfig> {
        let rpc_url = self
            .rpc_url
            .unwrap_or_default();
        ensure!(
            rpc_url.starts_with("http://") || rpc_url.starts_with("https://"),
            MalformedArgumentsSnafu {
                message: format!("rpc_url must be an http(s) URL, got {rpc_url:?}")
            }
        );

        let package_id = required("package_id", self.package_id)?;
        let registry_id = required("registry_id", self.registry_id)?;
        let institution_cap = required("institution_cap", self.institution_cap)?;

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let connect_timeout = self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        ensure!(
            !timeout.is_zero() && !connect_timeout.is_zero(),
            MalformedArgumentsSnafu { message: "timeouts must be non-zero" }
        );

        Ok(ClientConfig {
            rpc_url,
            package_id,
            registry_id,
            institution_cap,
            timeout,
            connect_timeout,
            retry_policy: self.retry_policy.unwrap_or_default(),
        })
    }
}

fn required(name: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => MalformedArgumentsSnafu { message: format!("{name} is required") }.fail(),
    }
}

#[cfg(test)]
mod tests {
    use result_registry_types::ErrorKind;

    use super::*;

    fn complete_builder() -> ClientConfigBuilder {
        ClientConfig::builder()
            .with_rpc_url("http://localhost:9000")
            .with_package_id("0xpkg")
            .with_registry_id("0xreg")
            .with_institution_cap("0xcap")
    }

    #[test]
    fn builds_with_defaults() {
        let config = complete_builder().build().unwrap();
        assert_eq!(config.rpc_url(), "http://localhost:9000");
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.connect_timeout(), DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.retry_policy().max_attempts, 3);
    }

    #[test]
    fn rejects_missing_or_non_http_url() {
        let err = ClientConfig::builder()
            .with_package_id("0xpkg")
            .with_registry_id("0xreg")
            .with_institution_cap("0xcap")
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedArguments);

        let err = complete_builder().with_rpc_url("ftp://x").build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedArguments);
    }

    #[test]
    fn rejects_missing_object_ids() {
        let err = ClientConfig::builder()
            .with_rpc_url("http://localhost:9000")
            .with_registry_id("0xreg")
            .with_institution_cap("0xcap")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("package_id"));

        let err = complete_builder().with_institution_cap("  ").build().unwrap_err();
        assert!(err.to_string().contains("institution_cap"));
    }

    #[test]
    fn rejects_zero_timeouts() {
        let err = complete_builder()
            .with_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedArguments);
    }

    #[test]
    fn no_retries_policy_is_single_attempt() {
        assert_eq!(RetryPolicy::no_retries().max_attempts, 1);
    }
}
