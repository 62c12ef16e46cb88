//! Settings resolution.
//!
//! `HttpSettings` is the typed view of the settings hash a script passes at
//! construction. Unknown keys are ignored. Each recognized key has its own
//! accessor and an explicit default.
//!
//! `HostConfig` is the demo host's TOML file; it never reaches scripts.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::object::{Hash, Object};

pub const DEFAULT_PORT: &str = "8080";
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";
pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Listening port as text. Not validated here; bad values fail at bind.
    pub port: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
        }
    }
}

impl HttpSettings {
    pub fn from_hash(settings: &Hash) -> Self {
        Self {
            port: resolve_port(settings),
        }
    }
}

/// `port` 키 해석: 정수 또는 문자열 수용, 그 외 타입은 무시하고 기본값 사용
pub fn resolve_port(settings: &Hash) -> String {
    match settings.get_str("port") {
        None => DEFAULT_PORT.to_string(),
        Some(Object::Integer(port)) => port.to_string(),
        Some(Object::String(port)) => port.clone(),
        Some(other) => {
            tracing::debug!(
                "Ignoring 'port' setting of type {}, using default {}",
                other.object_type(),
                DEFAULT_PORT
            );
            DEFAULT_PORT.to_string()
        }
    }
}

/// Host-side server options. Not settable from scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    pub bind_host: String,
    /// Bounded wait for in-flight requests after an interrupt.
    pub grace_period: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            bind_host: DEFAULT_BIND_HOST.to_string(),
            grace_period: Duration::from_secs(DEFAULT_GRACE_PERIOD_SECS),
        }
    }
}

/// `port` in the TOML file, number or string like in scripts.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum PortValue {
    Number(i64),
    Text(String),
}

impl PortValue {
    pub fn to_object(&self) -> Object {
        match self {
            Self::Number(n) => Object::Integer(*n),
            Self::Text(s) => Object::String(s.clone()),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    pub path: String,
    /// Handler body source, passed to the evaluator as-is.
    pub body: String,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct HostConfig {
    pub port: Option<PortValue>,
    pub bind_host: Option<String>,
    pub grace_period_secs: Option<u64>,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

impl HostConfig {
    /// 파일이 없으면 기본값을 사용합니다.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let s = std::fs::read_to_string(path)?;
        let cfg: Self = toml::from_str(&s)?;
        Ok(cfg)
    }

    /// Settings hash as a script would have written it.
    pub fn settings(&self) -> Hash {
        let mut hash = Hash::new();
        if let Some(port) = &self.port {
            hash.insert(Object::from("port"), port.to_object());
        }
        hash
    }

    pub fn server_options(&self) -> ServerOptions {
        let defaults = ServerOptions::default();
        ServerOptions {
            bind_host: self.bind_host.clone().unwrap_or(defaults.bind_host),
            grace_period: self
                .grace_period_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.grace_period),
        }
    }
}
