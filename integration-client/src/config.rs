//! Client configuration.

use std::time::Duration;

use hyper::Uri;

use crate::error::{ApiError, ApiResult};

/// Default request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default lifetime of an idle pooled connection.
pub const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Configuration for [`ApiClient`](crate::ApiClient).
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub(crate) base_url: String,
    pub(crate) timeout: Duration,
    pub(crate) default_headers: Vec<(String, String)>,
    pub(crate) pool_idle_timeout: Duration,
    pub(crate) max_idle_per_host: usize,
    pub(crate) https_only: bool,
}

impl ClientConfig {
    /// Creates a configuration targeting the supplied base URL.
    ///
    /// # Errors
    ///
    /// Returns an `invalid_request` [`ApiError`] if the URL has no
    /// `http://`/`https://` scheme or cannot be parsed.
    pub fn new(base_url: impl AsRef<str>) -> ApiResult<Self> {
        Ok(Self {
            base_url: sanitize_base_url(base_url.as_ref())?,
            timeout: DEFAULT_TIMEOUT,
            default_headers: Vec::new(),
            pool_idle_timeout: DEFAULT_POOL_IDLE_TIMEOUT,
            max_idle_per_host: usize::MAX,
            https_only: false,
        })
    }

    /// Sets the timeout for each request and stream handshake; it also bounds
    /// TCP connection setup.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Sets how long an idle pooled connection is kept before being closed.
    #[must_use]
    pub fn with_pool_idle_timeout(mut self, idle: Duration) -> Self {
        self.pool_idle_timeout = idle;
        self
    }

    /// Caps the idle connections kept per host; `0` disables reuse.
    #[must_use]
    pub fn with_max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = max;
        self
    }

    /// Refuses plain `http://` connections when enabled.
    #[must_use]
    pub fn with_https_only(mut self, https_only: bool) -> Self {
        self.https_only = https_only;
        self
    }

    /// Returns the sanitized base URL (always ending in `/`).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the configured timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the idle pooled connection lifetime.
    #[must_use]
    pub const fn pool_idle_timeout(&self) -> Duration {
        self.pool_idle_timeout
    }

    /// Returns the per-host idle connection cap.
    #[must_use]
    pub const fn max_idle_per_host(&self) -> usize {
        self.max_idle_per_host
    }

    /// Returns `true` when plain HTTP is refused.
    #[must_use]
    pub const fn https_only(&self) -> bool {
        self.https_only
    }
}

fn sanitize_base_url(input: &str) -> ApiResult<String> {
    let mut base = input.trim().to_owned();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(ApiError::invalid_request(
            "base URL must start with http:// or https://",
        ));
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    base.parse::<Uri>()
        .map_err(|err| ApiError::invalid_request(format!("invalid base URL: {err}")))?;
    Ok(base)
}
