//! Configuration parsing for the scrip master synchronizer.
//!
//! Everything is read from a single JSON file at startup, validated, and then
//! handed to each component by reference. Nothing mutates it afterwards.
//!
//! # Example config
//!
//! ```json
//! {
//!   "app": {
//!     "env": "uat",
//!     "segments_allowed": ["nse_cm", "bse_cm", "nse_fo", "mcx_fo"],
//!     "nse_series": "EQ,BE,BZ",
//!     "bse_series": ["A", "B", "T"],
//!     "index_instruments": ["INDEX", "UNDIND"],
//!     "reconnect_attempts": 3
//!   },
//!   "database": { "server": "db.local", "port": 5432, "database": "scrip",
//!                 "user": "sync", "password": "..." },
//!   "statements": { "eq_insert": "CALL insert_equity($1, ...)", ... },
//!   "environments": {
//!     "uat": { "login_url": "...", "sec_info_url": "...", "stock_master_url": "...",
//!              "user_id": "...", "password": "..." }
//!   }
//! }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

use crate::error::{SyncError, SyncResult};
use crate::types::Segment;

/// Top-level application config, deserialized from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseConfig,
    pub statements: Statements,
    /// Endpoint and credential blocks keyed by environment name.
    pub environments: HashMap<String, EndpointConfig>,
}

/// Run-wide behaviour settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    /// Selects the block in [`AppConfig::environments`].
    pub env: String,

    /// Segments to synchronize, in fetch order.
    #[serde(deserialize_with = "string_list")]
    pub segments_allowed: Vec<String>,

    /// Series admitted on `nse_cm`.
    #[serde(default, deserialize_with = "string_list")]
    pub nse_series: Vec<String>,

    /// Series admitted on `bse_cm` (tokens prefixed 5/7/8 are always admitted).
    #[serde(default, deserialize_with = "string_list")]
    pub bse_series: Vec<String>,

    /// Derivative instrument types treated as indices.
    #[serde(default, deserialize_with = "string_list")]
    pub index_instruments: Vec<String>,

    /// Open+ping attempts in one reconnect cycle.
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,

    /// Upper bound on the whole run, in seconds.
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,

    /// Per-request HTTP timeout, in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// UTC offset used when rendering expiry/maturity dates (default IST).
    #[serde(default = "default_display_offset")]
    pub display_utc_offset_secs: i32,

    /// Directory for rolling log files.
    #[serde(default)]
    pub log_dir: Option<String>,
}

impl AppSettings {
    pub fn segments(&self) -> Vec<Segment> {
        self.segments_allowed.iter().map(Segment::new).collect()
    }
}

/// Sink connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub server: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// Named sink statements. Values use positional placeholders (`$1..$n`).
#[derive(Debug, Clone, Deserialize)]
pub struct Statements {
    pub eq_insert: String,
    pub derv_insert: String,
    pub backup_proc: String,
    pub delete_derv_proc: String,
    pub delete_eq_proc: String,
    pub market_cap_proc: String,
    pub stock_id_update: String,
}

impl Statements {
    fn named(&self) -> [(&'static str, &str); 7] {
        [
            ("eq_insert", self.eq_insert.as_str()),
            ("derv_insert", self.derv_insert.as_str()),
            ("backup_proc", self.backup_proc.as_str()),
            ("delete_derv_proc", self.delete_derv_proc.as_str()),
            ("delete_eq_proc", self.delete_eq_proc.as_str()),
            ("market_cap_proc", self.market_cap_proc.as_str()),
            ("stock_id_update", self.stock_id_update.as_str()),
        ]
    }
}

/// Upstream endpoints and credentials for one environment.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub login_url: String,
    pub sec_info_url: String,
    pub stock_master_url: String,
    pub user_id: String,
    pub password: String,
    /// Overrides for the fixed login identity headers (e.g. `X-Platform`).
    #[serde(default)]
    pub extra_headers: HashMap<String, String>,
}

impl AppConfig {
    /// Endpoint block for the configured environment.
    pub fn endpoints(&self) -> SyncResult<&EndpointConfig> {
        self.environments
            .get(&self.app.env)
            .ok_or_else(|| {
                SyncError::Config(format!("no environment block for env '{}'", self.app.env))
            })
    }

    /// Reject configs that would fail later in a less obvious place.
    pub fn validate(&self) -> SyncResult<()> {
        self.endpoints()?;
        if self.app.segments_allowed.is_empty() {
            return Err(SyncError::Config("segments_allowed is empty".into()));
        }
        if self.app.reconnect_attempts == 0 {
            return Err(SyncError::Config("reconnect_attempts must be at least 1".into()));
        }
        let empty = self.statements.named().into_iter().find(|(_, sql)| sql.trim().is_empty());
        if let Some((name, _)) = empty {
            return Err(SyncError::Config(format!("statement '{name}' is empty")));
        }
        Ok(())
    }
}

/// Accept either a JSON array of strings or one comma-separated string.
fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Csv(String),
    }

    let items = match Raw::deserialize(d)? {
        Raw::List(v) => v,
        Raw::Csv(s) => s.split(',').map(str::to_string).collect(),
    };
    Ok(items.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
}

fn default_reconnect_attempts() -> u32 {
    3
}

fn default_run_timeout() -> u64 {
    1800
}

fn default_http_timeout() -> u64 {
    60
}

fn default_display_offset() -> i32 {
    19_800 // IST, UTC+05:30
}

fn default_connect_timeout() -> u64 {
    15
}

/// Load, parse, and validate a JSON config file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn sample_json() -> serde_json::Value {
        serde_json::json!({
            "app": {
                "env": "uat",
                "segments_allowed": "nse_cm, bse_cm,nse_fo",
                "nse_series": ["EQ", "BE"],
                "bse_series": "A,B",
                "index_instruments": ["INDEX"]
            },
            "database": {
                "server": "localhost", "port": 5432, "database": "scrip",
                "user": "sync", "password": "secret"
            },
            "statements": {
                "eq_insert": "CALL eq_insert($1)",
                "derv_insert": "CALL derv_insert($1)",
                "backup_proc": "CALL backup_scripmaster()",
                "delete_derv_proc": "CALL delete_derivatives()",
                "delete_eq_proc": "CALL delete_equities()",
                "market_cap_proc": "CALL update_market_cap()",
                "stock_id_update": "CALL update_stock_id($1, $2)"
            },
            "environments": {
                "uat": {
                    "login_url": "http://upstream/login",
                    "sec_info_url": "http://upstream/secinfo",
                    "stock_master_url": "http://feed/stock-master",
                    "user_id": "U1", "password": "P1"
                }
            }
        })
    }

    pub fn sample() -> AppConfig {
        serde_json::from_value(sample_json()).unwrap()
    }
}
