//! Upstream client configuration.
//!
//! Holds endpoint URLs, login credentials, and the fixed identity headers the
//! upstream requires on login. The identity headers have production defaults
//! so only URLs and credentials need to be configured; any header can be
//! overridden through the environment block's `extra_headers`.

use std::time::Duration;

use scrip_core::config::EndpointConfig;

/// Identity headers sent with the login request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub source_id: String,
    pub platform: String,
    pub device_id: String,
    pub user_type: String,
    pub operating_system: String,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            source_id: default_source_id(),
            platform: default_platform(),
            device_id: default_device_id(),
            user_type: default_user_type(),
            operating_system: default_operating_system(),
        }
    }
}

impl ClientIdentity {
    /// Header name/value pairs in the order upstream documents them.
    pub fn headers(&self) -> [(&'static str, &str); 5] {
        [
            ("X-SourceID", self.source_id.as_str()),
            ("X-Platform", self.platform.as_str()),
            ("X-DeviceID", self.device_id.as_str()),
            ("X-UserType", self.user_type.as_str()),
            ("X-OperatingSystem", self.operating_system.as_str()),
        ]
    }

    /// Apply `extra_headers` overrides by header name (case-insensitive).
    fn with_overrides(mut self, endpoints: &EndpointConfig) -> Self {
        for (name, value) in &endpoints.extra_headers {
            let slot = match name.to_ascii_lowercase().as_str() {
                "x-sourceid" => &mut self.source_id,
                "x-platform" => &mut self.platform,
                "x-deviceid" => &mut self.device_id,
                "x-usertype" => &mut self.user_type,
                "x-operatingsystem" => &mut self.operating_system,
                _ => continue,
            };
            *slot = value.clone();
        }
        self
    }
}

/// Everything the upstream clients need, resolved for one environment.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub login_url: String,
    pub sec_info_url: String,
    pub stock_master_url: String,
    pub user_id: String,
    pub password: String,
    pub identity: ClientIdentity,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl UpstreamConfig {
    pub fn from_endpoints(endpoints: &EndpointConfig, timeout_secs: u64) -> Self {
        Self {
            login_url: endpoints.login_url.clone(),
            sec_info_url: endpoints.sec_info_url.clone(),
            stock_master_url: endpoints.stock_master_url.clone(),
            user_id: endpoints.user_id.clone(),
            password: endpoints.password.clone(),
            identity: ClientIdentity::default().with_overrides(endpoints),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Identity defaults
// ---------------------------------------------------------------------------

fn default_source_id() -> String {
    "2".into()
}

fn default_platform() -> String {
    "MSIL".into()
}

fn default_device_id() -> String {
    "MSIL-MW".into()
}

fn default_user_type() -> String {
    "1".into()
}

fn default_operating_system() -> String {
    "Linux".into()
}
