//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `CARDSCAN_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_BIT_LENGTH, DEFAULT_QUERY_MEMO_CAPACITY, DEFAULT_SESSION_TTL, DEFAULT_TOP_N,
    default_tolerance,
};
use crate::index::IndexKind;

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `CARDSCAN_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// JSON-lines reference catalog. Default: `./data/catalog_{bit_length}bit.jsonl`.
    pub catalog_path: PathBuf,

    /// Catalog-wide hash width. Default: `256`.
    pub bit_length: usize,

    /// Index implementation. Default: trie.
    pub index_kind: IndexKind,

    /// Tolerance for queries that carry none. Default: `floor(bit_length * 0.375)`.
    pub tolerance: Option<u32>,

    /// Session cache time-to-live. Default: `750ms`.
    pub session_ttl: Duration,

    /// Index results kept per miss. Default: `1`.
    pub top_n: usize,

    /// Recent queries remembered in front of the index; `0` disables. Default: `1024`.
    pub query_memo_capacity: u64,
}

/// Catalog file for `bit_length` under `./data`.
pub fn default_catalog_path(bit_length: usize) -> PathBuf {
    PathBuf::from(format!("./data/catalog_{}bit.jsonl", bit_length))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            catalog_path: default_catalog_path(DEFAULT_BIT_LENGTH),
            bit_length: DEFAULT_BIT_LENGTH,
            index_kind: IndexKind::default(),
            tolerance: None,
            session_ttl: DEFAULT_SESSION_TTL,
            top_n: DEFAULT_TOP_N,
            query_memo_capacity: DEFAULT_QUERY_MEMO_CAPACITY,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "CARDSCAN_PORT";
    const ENV_BIND_ADDR: &'static str = "CARDSCAN_BIND_ADDR";
    const ENV_CATALOG_PATH: &'static str = "CARDSCAN_CATALOG_PATH";
    const ENV_BIT_LENGTH: &'static str = "CARDSCAN_BIT_LENGTH";
    const ENV_INDEX: &'static str = "CARDSCAN_INDEX";
    const ENV_TOLERANCE: &'static str = "CARDSCAN_TOLERANCE";
    const ENV_SESSION_TTL_MS: &'static str = "CARDSCAN_SESSION_TTL_MS";
    const ENV_TOP_N: &'static str = "CARDSCAN_TOP_N";
    const ENV_QUERY_MEMO: &'static str = "CARDSCAN_QUERY_MEMO";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let bit_length = Self::parse_number_from_env(Self::ENV_BIT_LENGTH)?
            .unwrap_or(defaults.bit_length);
        let catalog_path = Self::parse_optional_path_from_env(Self::ENV_CATALOG_PATH)
            .unwrap_or_else(|| default_catalog_path(bit_length));
        let index_kind = Self::parse_index_kind_from_env(defaults.index_kind)?;
        let tolerance = Self::parse_number_from_env(Self::ENV_TOLERANCE)?;
        let session_ttl = Self::parse_number_from_env(Self::ENV_SESSION_TTL_MS)?
            .map(Duration::from_millis)
            .unwrap_or(defaults.session_ttl);
        let top_n = Self::parse_number_from_env(Self::ENV_TOP_N)?.unwrap_or(defaults.top_n);
        let query_memo_capacity = Self::parse_number_from_env(Self::ENV_QUERY_MEMO)?
            .unwrap_or(defaults.query_memo_capacity);

        Ok(Self {
            port,
            bind_addr,
            catalog_path,
            bit_length,
            index_kind,
            tolerance,
            session_ttl,
            top_n,
            query_memo_capacity,
        })
    }

    /// Validates the catalog path and basic invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bit_length == 0 {
            return Err(ConfigError::InvalidBitLength {
                bit_length: self.bit_length,
            });
        }

        if self.top_n == 0 {
            return Err(ConfigError::InvalidTopN);
        }

        if !self.catalog_path.exists() {
            return Err(ConfigError::PathNotFound {
                path: self.catalog_path.clone(),
            });
        }
        if !self.catalog_path.is_file() {
            return Err(ConfigError::NotAFile {
                path: self.catalog_path.clone(),
            });
        }

        Ok(())
    }

    /// The configured tolerance, or the bit-length default.
    pub fn effective_tolerance(&self) -> u32 {
        self.tolerance
            .unwrap_or_else(|| default_tolerance(self.bit_length))
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// `/healthz` on the configured port, reached over loopback when the server binds a
    /// wildcard address.
    pub fn health_check_url(&self) -> String {
        let host = match self.bind_addr {
            IpAddr::V4(addr) if addr.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(addr) if addr.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
            addr => addr,
        };
        format!("http://{}/healthz", SocketAddr::new(host, self.port))
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_index_kind_from_env(default: IndexKind) -> Result<IndexKind, ConfigError> {
        match env::var(Self::ENV_INDEX) {
            Ok(value) => IndexKind::from_str(&value)
                .map_err(|_| ConfigError::InvalidIndexKind { value }),
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    /// Unset or blank yields `None`; anything else must parse.
    fn parse_number_from_env<T>(var_name: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr<Err = std::num::ParseIntError>,
    {
        let Some(value) = env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        else {
            return Ok(None);
        };

        value
            .parse()
            .map(Some)
            .map_err(|source| ConfigError::InvalidNumber {
                name: var_name,
                value,
                source,
            })
    }
}
