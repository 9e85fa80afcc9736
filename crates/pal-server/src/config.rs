//! Server configuration from environment variables.
//!
//! | Variable                  | Default   |
//! |---------------------------|-----------|
//! | `PAL_BIND`                | `0.0.0.0` |
//! | `PAL_PORT`                | `3000`    |
//! | `PAL_MAX_HOLD_SECS`       | `120`     |
//! | `PAL_SWEEP_INTERVAL_SECS` | `5`       |
//! | `PAL_SESSION_TIMEOUT_SECS`| `60`      |
//! | `PAL_EVENT_BUFFER`        | `256`     |

use std::str::FromStr;
use std::time::Duration;

/// Errors from reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings for the server and its sweeper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Longest a participant may hold a floor before it is reclaimed.
    pub max_hold: Duration,
    /// How often the sweeper runs.
    pub sweep_interval: Duration,
    /// Participants silent for longer than this are disconnected.
    pub session_timeout: Duration,
    /// Capacity of each room's event channel.
    pub event_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "0.0.0.0".to_string(),
            port: 3000,
            max_hold: Duration::from_secs(120),
            sweep_interval: Duration::from_secs(5),
            session_timeout: Duration::from_secs(60),
            event_buffer: 256,
        }
    }
}

impl ServerConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults for
    /// unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerConfig::default();

        let bind = lookup("PAL_BIND").unwrap_or(defaults.bind);
        let port = parse(&lookup, "PAL_PORT")?.unwrap_or(defaults.port);
        let max_hold = seconds(&lookup, "PAL_MAX_HOLD_SECS")?.unwrap_or(defaults.max_hold);
        let sweep_interval =
            seconds(&lookup, "PAL_SWEEP_INTERVAL_SECS")?.unwrap_or(defaults.sweep_interval);
        let session_timeout =
            seconds(&lookup, "PAL_SESSION_TIMEOUT_SECS")?.unwrap_or(defaults.session_timeout);
        let event_buffer = parse(&lookup, "PAL_EVENT_BUFFER")?.unwrap_or(defaults.event_buffer);

        if event_buffer == 0 {
            return Err(ConfigError::Invalid {
                key: "PAL_EVENT_BUFFER",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(ServerConfig {
            bind,
            port,
            max_hold,
            sweep_interval,
            session_timeout,
            event_buffer,
        })
    }

    /// `host:port` to listen on.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}

fn seconds<F>(lookup: &F, key: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse::<u64, F>(lookup, key)? {
        Some(0) => Err(ConfigError::Invalid {
            key,
            value: "0".to_string(),
            reason: "duration must be positive".to_string(),
        }),
        other => Ok(other.map(Duration::from_secs)),
    }
}
