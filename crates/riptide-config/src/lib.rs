//! Configuration for riptide hosts.
//!
//! TOML server profiles, engine timing, credential resolution
//! (env var + keyring + plaintext), and translation to `riptide_core`
//! endpoints. The core never reads files; hosts build it from here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use riptide_core::{
    CoreError, Endpoint, EndpointSource, EngineConfig, SecretRef, SecretResolver, TlsMode,
    TransportConfig,
};

const KEYRING_SERVICE: &str = "riptide";
const DEFAULT_RPC_PATH: &str = "/transmission/rpc";

/// Floors for `[engine]` timings; lower values would hammer the daemon.
const MIN_UPDATE_INTERVAL_MS: u64 = 500;
const MIN_RELOCATE_RETRY_MS: u64 = 50;
const MIN_TIMEOUT_SECS: u64 = 1;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no server named '{name}' is configured")]
    UnknownServer { name: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Server to connect to first.
    pub default_server: Option<String>,

    #[serde(default)]
    pub engine: EngineSettings,

    /// Named daemon profiles.
    #[serde(default)]
    pub servers: HashMap<String, ServerProfile>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineSettings {
    #[serde(default = "default_update_interval")]
    pub update_interval_ms: u64,

    #[serde(default = "default_relocate_retry")]
    pub relocate_retry_ms: u64,

    #[serde(default = "default_relocate_attempts")]
    pub relocate_max_attempts: u32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            update_interval_ms: default_update_interval(),
            relocate_retry_ms: default_relocate_retry(),
            relocate_max_attempts: default_relocate_attempts(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_update_interval() -> u64 {
    5000
}
fn default_relocate_retry() -> u64 {
    500
}
fn default_relocate_attempts() -> u32 {
    120
}
fn default_timeout() -> u64 {
    30
}

/// A named daemon profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerProfile {
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// RPC path; defaults to `/transmission/rpc`.
    pub rpc_path: Option<String>,

    #[serde(default)]
    pub ssl: bool,

    pub username: Option<String>,

    /// Password (plaintext, prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// Prompt on every connect instead of using a stored password.
    #[serde(default)]
    pub ask_for_password: bool,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip certificate verification.
    #[serde(default)]
    pub insecure: bool,
}

fn default_port() -> u16 {
    9091
}

impl ServerProfile {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            rpc_path: None,
            ssl: false,
            username: None,
            password: None,
            password_env: None,
            ask_for_password: false,
            ca_cert: None,
            insecure: false,
        }
    }

    /// Full RPC URL, e.g. `http://nas:9091/transmission/rpc`.
    pub fn url(&self) -> Result<Url, ConfigError> {
        let scheme = if self.ssl { "https" } else { "http" };
        let path = self.rpc_path.as_deref().unwrap_or(DEFAULT_RPC_PATH);
        let path = if path.starts_with('/') {
            path.to_owned()
        } else {
            format!("/{path}")
        };
        format!("{scheme}://{}:{}{path}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Validation {
                field: "host".into(),
                reason: format!("'{}' does not form a valid URL: {e}", self.host),
            })
    }

    /// Translate into an engine endpoint named `name`.
    ///
    /// The password stays here; the endpoint only carries a [`SecretRef`].
    pub fn to_endpoint(&self, name: &str) -> Result<Endpoint, ConfigError> {
        let mut endpoint = Endpoint::new(name, self.url()?);
        if let Some(username) = &self.username {
            endpoint = endpoint.with_username(username.clone());
        }
        if self.ask_for_password {
            endpoint = endpoint.asking_for_password();
        } else {
            endpoint = endpoint.with_secret(SecretRef::new(name));
        }
        Ok(endpoint)
    }

    fn tls(&self) -> TlsMode {
        if self.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ca) = &self.ca_cert {
            TlsMode::CustomCa(ca.clone())
        } else {
            TlsMode::System
        }
    }
}

impl Config {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            poll_interval: Duration::from_millis(at_least(
                "engine.update_interval_ms",
                self.engine.update_interval_ms,
                MIN_UPDATE_INTERVAL_MS,
            )),
            relocate_retry: Duration::from_millis(at_least(
                "engine.relocate_retry_ms",
                self.engine.relocate_retry_ms,
                MIN_RELOCATE_RETRY_MS,
            )),
            relocate_max_attempts: self.engine.relocate_max_attempts.max(1),
            ..EngineConfig::default()
        }
    }

    /// Transport settings for `server`, or the defaults if it is unknown.
    pub fn transport_config(&self, server: Option<&str>) -> TransportConfig {
        let transport = TransportConfig::default()
            .with_timeout(Duration::from_secs(at_least(
                "engine.timeout_secs",
                self.engine.timeout_secs,
                MIN_TIMEOUT_SECS,
            )));
        match server.and_then(|name| self.servers.get(name)) {
            Some(profile) => transport.with_tls(profile.tls()),
            None => transport,
        }
    }

    /// Server names, default server first, the rest alphabetically.
    pub fn server_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.servers.keys().map(String::as_str).collect();
        names.sort_unstable();
        if let Some(default) = self.default_server.as_deref() {
            if let Some(idx) = names.iter().position(|n| *n == default) {
                let name = names.remove(idx);
                names.insert(0, name);
            }
        }
        names
    }

    /// Every profile as an endpoint. Invalid profiles are skipped with a warning.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.server_names()
            .into_iter()
            .filter_map(|name| {
                let profile = self.servers.get(name)?;
                match profile.to_endpoint(name) {
                    Ok(endpoint) => Some(endpoint),
                    Err(e) => {
                        warn!(server = name, error = %e, "skipping server profile");
                        None
                    }
                }
            })
            .collect()
    }

    pub fn endpoint(&self, name: &str) -> Result<Endpoint, ConfigError> {
        self.servers
            .get(name)
            .ok_or_else(|| ConfigError::UnknownServer { name: name.into() })?
            .to_endpoint(name)
    }
}

/// Raise `value` to `floor`, warning when the configured value was lower.
fn at_least(field: &str, value: u64, floor: u64) -> u64 {
    if value < floor {
        warn!(field, value, floor, "value below minimum, using minimum");
        floor
    } else {
        value
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "riptide", "riptide").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("riptide");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the default path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
///
/// Environment variables use a `RIPTIDE_` prefix and `__` as the nesting
/// separator, e.g. `RIPTIDE_ENGINE__UPDATE_INTERVAL_MS=2000`.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("RIPTIDE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the password for profile `name`.
///
/// Order: the profile's `password_env` variable, the system keyring
/// (service `riptide`, account `<name>/password`), the plaintext value.
pub fn resolve_password(
    profile: &ServerProfile,
    name: &str,
    use_keyring: bool,
) -> Option<SecretString> {
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    if use_keyring {
        if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{name}/password")) {
            if let Ok(pw) = entry.get_password() {
                return Some(SecretString::from(pw));
            }
        }
    }

    profile
        .password
        .as_ref()
        .map(|pw| SecretString::from(pw.clone()))
}

// ── ProfileStore ────────────────────────────────────────────────────

/// Loaded configuration shared with the engine as its endpoint source
/// and secret resolver. [`EndpointSource::load`] re-reads the file.
pub struct ProfileStore {
    path: PathBuf,
    config: RwLock<Config>,
    use_keyring: bool,
}

impl ProfileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = load_from(&path)?;
        Ok(Self {
            path,
            config: RwLock::new(config),
            use_keyring: true,
        })
    }

    /// Skip the system keyring during resolution.
    #[must_use]
    pub fn without_keyring(mut self) -> Self {
        self.use_keyring = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current configuration.
    pub fn config(&self) -> Config {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EndpointSource for ProfileStore {
    fn load(&self) -> Result<Vec<Endpoint>, CoreError> {
        let config = load_from(&self.path)?;
        let endpoints = config.endpoints();
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        Ok(endpoints)
    }
}

impl SecretResolver for ProfileStore {
    fn resolve(&self, secret: &SecretRef) -> Option<SecretString> {
        let config = self.config.read().unwrap_or_else(PoisonError::into_inner);
        let profile = config.servers.get(secret.key())?;
        resolve_password(profile, secret.key(), self.use_keyring)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    const SAMPLE: &str = r#"
default_server = "nas"

[engine]
update_interval_ms = 2000

[servers.nas]
host = "nas.local"
username = "admin"
password = "hunter2"

[servers.seedbox]
host = "seed.example.com"
port = 443
ssl = true
rpc_path = "transmission/rpc"
ask_for_password = true

[servers.broken]
host = "has space"
"#;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join("absent.toml")).unwrap();

        assert!(config.servers.is_empty());
        assert_eq!(config.engine_config(), EngineConfig::default());
    }

    #[test]
    fn engine_section_overrides_defaults() {
        let file = write_config(SAMPLE);
        let config = load_from(file.path()).unwrap();
        let engine = config.engine_config();

        assert_eq!(engine.poll_interval, Duration::from_millis(2000));
        assert_eq!(engine.relocate_retry, Duration::from_millis(500));
        assert_eq!(engine.relocate_max_attempts, 120);
    }

    #[test]
    fn zero_timings_are_raised_to_floors() {
        let file = write_config(
            r#"
[engine]
update_interval_ms = 0
relocate_retry_ms = 0
relocate_max_attempts = 0
timeout_secs = 0
"#,
        );
        let config = load_from(file.path()).unwrap();
        let engine = config.engine_config();

        assert_eq!(engine.poll_interval, Duration::from_millis(500));
        assert_eq!(engine.relocate_retry, Duration::from_millis(50));
        assert_eq!(engine.relocate_max_attempts, 1);
        assert_eq!(
            config.transport_config(None).timeout,
            Duration::from_secs(1)
        );
    }

    #[test]
    fn profiles_become_endpoints() {
        let file = write_config(SAMPLE);
        let config = load_from(file.path()).unwrap();

        let nas = config.endpoint("nas").unwrap();
        assert_eq!(nas.url.as_str(), "http://nas.local:9091/transmission/rpc");
        assert_eq!(nas.username.as_deref(), Some("admin"));
        assert_eq!(nas.secret, Some(SecretRef::new("nas")));
        assert!(!nas.ask_for_password);

        let seedbox = config.endpoint("seedbox").unwrap();
        assert_eq!(
            seedbox.url.as_str(),
            "https://seed.example.com/transmission/rpc"
        );
        assert!(seedbox.ask_for_password);
        assert_eq!(seedbox.secret, None);
    }

    #[test]
    fn endpoints_list_default_first_and_skip_invalid() {
        let file = write_config(SAMPLE);
        let config = load_from(file.path()).unwrap();

        let names: Vec<String> = config.endpoints().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["nas".to_owned(), "seedbox".to_owned()]);
    }

    #[test]
    fn unknown_server_is_an_error() {
        let config = Config::default();
        assert!(matches!(
            config.endpoint("nope"),
            Err(ConfigError::UnknownServer { .. })
        ));
    }

    #[test]
    fn store_resolves_plaintext_password() {
        let file = write_config(SAMPLE);
        let store = ProfileStore::open(file.path()).unwrap().without_keyring();

        let password = store.resolve(&SecretRef::new("nas")).unwrap();
        assert_eq!(password.expose_secret(), "hunter2");
        assert!(store.resolve(&SecretRef::new("seedbox")).is_none());
        assert!(store.resolve(&SecretRef::new("unknown")).is_none());
    }

    #[test]
    fn unset_password_env_falls_back_to_plaintext() {
        let mut profile = ServerProfile::new("nas.local");
        profile.password_env = Some("RIPTIDE_TEST_SURELY_UNSET_PASSWORD".into());
        profile.password = Some("fallback".into());

        let password = resolve_password(&profile, "nas", false).unwrap();
        assert_eq!(password.expose_secret(), "fallback");
    }

    #[test]
    fn reload_picks_up_new_servers() {
        let mut file = write_config(SAMPLE);
        let store = ProfileStore::open(file.path()).unwrap().without_keyring();
        assert_eq!(store.config().servers.len(), 3);

        file.write_all(b"\n[servers.extra]\nhost = \"extra.local\"\n")
            .unwrap();
        let endpoints = store.load().unwrap();

        assert!(endpoints.iter().any(|e| e.name == "extra"));
        assert_eq!(store.config().servers.len(), 4);
    }

    #[test]
    fn insecure_profile_selects_tls_mode() {
        let mut config = Config::default();
        let mut profile = ServerProfile::new("nas.local");
        profile.insecure = true;
        config.servers.insert("nas".into(), profile);

        let transport = config.transport_config(Some("nas"));
        assert!(matches!(transport.tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(transport.timeout, Duration::from_secs(30));
    }
}
