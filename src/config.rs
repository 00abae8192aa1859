//! Configuration loading.
//!
//! Every setting resolves through the same two-step chain: the process
//! environment first, then a local secret store (a flat JSON object of
//! string values, by default `./secrets.json`). Resolution happens exactly
//! once, at process start, and fails closed: if any of the three required
//! settings is missing, [`Settings::load`] returns a descriptive error and
//! the binary exits without serving.
//!
//! Required settings:
//! - `SHEET_ID` - identifier of the spreadsheet acting as the results store
//! - `WEBHOOK_URL` - the automation webhook that performs the scraping
//! - `WEBHOOK_API_KEY` - credential sent with every dispatch
//!
//! Everything else is optional with pinned defaults, including the two knobs
//! that pin the (historically ambiguous) webhook contract: `DISPATCH_AUTH`
//! and `DISPATCH_PAYLOAD`.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::dispatch::{AuthScheme, PayloadShape};

/// Environment variable naming the secrets file. Not itself a secret, so it
/// is read from the environment only.
const KEY_SECRETS_FILE: &str = "SECRETS_FILE";
/// Default secrets file path.
const DEFAULT_SECRETS_FILE: &str = "secrets.json";

const KEY_SHEET_ID: &str = "SHEET_ID";
const KEY_WEBHOOK_URL: &str = "WEBHOOK_URL";
const KEY_WEBHOOK_API_KEY: &str = "WEBHOOK_API_KEY";
const KEY_SHEETS_API_KEY: &str = "SHEETS_API_KEY";
const KEY_SHEET_RANGE: &str = "SHEET_RANGE";
const KEY_DISPATCH_AUTH: &str = "DISPATCH_AUTH";
const KEY_DISPATCH_PAYLOAD: &str = "DISPATCH_PAYLOAD";
const KEY_DISPATCH_TIMEOUT: &str = "DISPATCH_TIMEOUT_SECS";
const KEY_POLL_INTERVAL: &str = "POLL_INTERVAL_SECS";
const KEY_WAIT_TIMEOUT: &str = "WAIT_TIMEOUT_SECS";
const KEY_SNAPSHOT_TTL: &str = "SNAPSHOT_TTL_SECS";
const KEY_BIND_ADDR: &str = "BIND_ADDR";

/// Default range read from the results sheet.
const DEFAULT_SHEET_RANGE: &str = "Sheet1";
/// Default timeout for a single dispatch request (seconds).
const DEFAULT_DISPATCH_TIMEOUT_SECS: u64 = 60;
/// Default delay between completion checks (seconds).
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
/// Default wall-clock budget for waiting on new rows (seconds).
const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 180;
/// Default freshness window for a cached snapshot (seconds).
const DEFAULT_SNAPSHOT_TTL_SECS: u64 = 120;
/// Default listen address.
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting was absent from both sources.
    #[error(
        "missing required setting {0}: set the environment variable or add it to the secrets file"
    )]
    Missing(&'static str),

    /// The secrets file exists but could not be read.
    #[error("failed to read secrets file {path}: {source}")]
    SecretsRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The secrets file is not a flat JSON object of strings.
    #[error("secrets file {path} is not a JSON object of strings: {source}")]
    SecretsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A setting was present but unparseable.
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// The local secret store: a flat JSON object of string values.
///
/// An absent file is an empty store (environment-only deployments are
/// normal); a present-but-malformed file is a fatal configuration error.
#[derive(Debug, Default)]
pub struct SecretStore {
    values: HashMap<String, String>,
}

impl SecretStore {
    /// Loads the store from `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::SecretsRead {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        let values: HashMap<String, String> =
            serde_json::from_str(&contents).map_err(|e| ConfigError::SecretsParse {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(SecretStore { values })
    }

    /// Returns the stored value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    #[cfg(test)]
    fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        SecretStore {
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Fully resolved, typed application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Identifier of the results spreadsheet.
    pub sheet_id: String,
    /// Range read from the results spreadsheet.
    pub sheet_range: String,
    /// Optional credential for the spreadsheet read; absent means the sheet
    /// is readable without one.
    pub sheets_api_key: Option<String>,

    /// The automation webhook endpoint.
    pub webhook_url: String,
    /// Credential sent with every dispatch.
    pub webhook_api_key: String,
    /// How the credential is attached to the request.
    pub auth_scheme: AuthScheme,
    /// Shape of the dispatch body.
    pub payload_shape: PayloadShape,
    /// Timeout for a single dispatch request.
    pub dispatch_timeout: Duration,

    /// Delay between completion checks.
    pub poll_interval: Duration,
    /// Wall-clock budget for waiting on new rows.
    pub wait_timeout: Duration,
    /// Freshness window for a cached snapshot.
    pub snapshot_ttl: Duration,

    /// Listen address for the HTTP server.
    pub bind_addr: SocketAddr,
}

impl Settings {
    /// Loads settings from the process environment and the secrets file.
    pub fn load() -> Result<Self, ConfigError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        let secrets_path = env
            .get(KEY_SECRETS_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SECRETS_FILE));
        let store = SecretStore::load(&secrets_path)?;
        Self::from_sources(&env, &store)
    }

    /// Resolves settings against explicit sources.
    ///
    /// Split out from [`Settings::load`] so tests can exercise the
    /// resolution chain without touching the real process environment.
    pub fn from_sources(
        env: &HashMap<String, String>,
        store: &SecretStore,
    ) -> Result<Self, ConfigError> {
        let resolve = |key: &'static str| -> Option<String> {
            env.get(key)
                .map(String::clone)
                .or_else(|| store.get(key).map(str::to_string))
        };
        let require = |key: &'static str| -> Result<String, ConfigError> {
            resolve(key).ok_or(ConfigError::Missing(key))
        };

        let sheet_id = require(KEY_SHEET_ID)?;
        let webhook_url = require(KEY_WEBHOOK_URL)?;
        let webhook_api_key = require(KEY_WEBHOOK_API_KEY)?;

        let auth_scheme = match resolve(KEY_DISPATCH_AUTH) {
            Some(raw) => AuthScheme::parse(&raw).ok_or(ConfigError::Invalid {
                key: KEY_DISPATCH_AUTH,
                value: raw,
                reason: "expected x-api-key, bearer, or raw",
            })?,
            None => AuthScheme::default(),
        };
        let payload_shape = match resolve(KEY_DISPATCH_PAYLOAD) {
            Some(raw) => PayloadShape::parse(&raw).ok_or(ConfigError::Invalid {
                key: KEY_DISPATCH_PAYLOAD,
                value: raw,
                reason: "expected single or batch",
            })?,
            None => PayloadShape::default(),
        };

        let seconds = |key: &'static str, default: u64| -> Result<Duration, ConfigError> {
            match resolve(key) {
                Some(raw) => {
                    let secs: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
                        key,
                        value: raw.clone(),
                        reason: "expected a whole number of seconds",
                    })?;
                    if secs == 0 {
                        return Err(ConfigError::Invalid {
                            key,
                            value: raw,
                            reason: "must be greater than zero",
                        });
                    }
                    Ok(Duration::from_secs(secs))
                }
                None => Ok(Duration::from_secs(default)),
            }
        };

        let bind_raw = resolve(KEY_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            key: KEY_BIND_ADDR,
            value: bind_raw.clone(),
            reason: "expected host:port",
        })?;

        Ok(Settings {
            sheet_id,
            sheet_range: resolve(KEY_SHEET_RANGE)
                .unwrap_or_else(|| DEFAULT_SHEET_RANGE.to_string()),
            sheets_api_key: resolve(KEY_SHEETS_API_KEY),
            webhook_url,
            webhook_api_key,
            auth_scheme,
            payload_shape,
            dispatch_timeout: seconds(KEY_DISPATCH_TIMEOUT, DEFAULT_DISPATCH_TIMEOUT_SECS)?,
            poll_interval: seconds(KEY_POLL_INTERVAL, DEFAULT_POLL_INTERVAL_SECS)?,
            wait_timeout: seconds(KEY_WAIT_TIMEOUT, DEFAULT_WAIT_TIMEOUT_SECS)?,
            snapshot_ttl: seconds(KEY_SNAPSHOT_TTL, DEFAULT_SNAPSHOT_TTL_SECS)?,
            bind_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env_with(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn required_env() -> HashMap<String, String> {
        env_with(&[
            (KEY_SHEET_ID, "sheet-123"),
            (KEY_WEBHOOK_URL, "https://hooks.example/run"),
            (KEY_WEBHOOK_API_KEY, "top-secret"),
        ])
    }

    #[test]
    fn loads_with_defaults() {
        let settings = Settings::from_sources(&required_env(), &SecretStore::default()).unwrap();

        assert_eq!(settings.sheet_id, "sheet-123");
        assert_eq!(settings.sheet_range, "Sheet1");
        assert_eq!(settings.sheets_api_key, None);
        assert_eq!(settings.auth_scheme, AuthScheme::XApiKey);
        assert_eq!(settings.payload_shape, PayloadShape::Single);
        assert_eq!(settings.dispatch_timeout, Duration::from_secs(60));
        assert_eq!(settings.poll_interval, Duration::from_secs(5));
        assert_eq!(settings.wait_timeout, Duration::from_secs(180));
        assert_eq!(settings.snapshot_ttl, Duration::from_secs(120));
        assert_eq!(settings.bind_addr, "0.0.0.0:3000".parse().unwrap());
    }

    #[test]
    fn missing_required_setting_fails_closed() {
        let mut env = required_env();
        env.remove(KEY_WEBHOOK_API_KEY);

        let err = Settings::from_sources(&env, &SecretStore::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(KEY_WEBHOOK_API_KEY)));
        assert!(err.to_string().contains("WEBHOOK_API_KEY"));
    }

    #[test]
    fn secret_store_fills_gaps() {
        let mut env = required_env();
        env.remove(KEY_WEBHOOK_API_KEY);
        let store = SecretStore::from_pairs(&[(KEY_WEBHOOK_API_KEY, "from-store")]);

        let settings = Settings::from_sources(&env, &store).unwrap();
        assert_eq!(settings.webhook_api_key, "from-store");
    }

    #[test]
    fn environment_wins_over_secret_store() {
        let env = required_env();
        let store = SecretStore::from_pairs(&[(KEY_SHEET_ID, "shadowed")]);

        let settings = Settings::from_sources(&env, &store).unwrap();
        assert_eq!(settings.sheet_id, "sheet-123");
    }

    #[test]
    fn tunables_resolve_from_either_source() {
        let mut env = required_env();
        env.insert(KEY_POLL_INTERVAL.to_string(), "7".to_string());
        let store = SecretStore::from_pairs(&[(KEY_WAIT_TIMEOUT, "90")]);

        let settings = Settings::from_sources(&env, &store).unwrap();
        assert_eq!(settings.poll_interval, Duration::from_secs(7));
        assert_eq!(settings.wait_timeout, Duration::from_secs(90));
    }

    #[test]
    fn malformed_duration_is_rejected() {
        let mut env = required_env();
        env.insert(KEY_WAIT_TIMEOUT.to_string(), "soon".to_string());

        let err = Settings::from_sources(&env, &SecretStore::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: KEY_WAIT_TIMEOUT,
                ..
            }
        ));
    }

    #[test]
    fn zero_duration_is_rejected() {
        let mut env = required_env();
        env.insert(KEY_POLL_INTERVAL.to_string(), "0".to_string());

        let err = Settings::from_sources(&env, &SecretStore::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn contract_knobs_parse() {
        let mut env = required_env();
        env.insert(KEY_DISPATCH_AUTH.to_string(), "bearer".to_string());
        env.insert(KEY_DISPATCH_PAYLOAD.to_string(), "batch".to_string());

        let settings = Settings::from_sources(&env, &SecretStore::default()).unwrap();
        assert_eq!(settings.auth_scheme, AuthScheme::Bearer);
        assert_eq!(settings.payload_shape, PayloadShape::Batch);
    }

    #[test]
    fn unknown_auth_scheme_is_rejected() {
        let mut env = required_env();
        env.insert(KEY_DISPATCH_AUTH.to_string(), "hmac".to_string());

        let err = Settings::from_sources(&env, &SecretStore::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: KEY_DISPATCH_AUTH,
                ..
            }
        ));
    }

    #[test]
    fn secret_store_loads_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"SHEET_ID": "from-file", "WEBHOOK_URL": "u"}}"#).unwrap();

        let store = SecretStore::load(file.path()).unwrap();
        assert_eq!(store.get("SHEET_ID"), Some("from-file"));
        assert_eq!(store.get("MISSING"), None);
    }

    #[test]
    fn absent_secrets_file_is_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = SecretStore::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(store.get("SHEET_ID"), None);
    }

    #[test]
    fn malformed_secrets_file_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = SecretStore::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::SecretsParse { .. }));
    }
}
