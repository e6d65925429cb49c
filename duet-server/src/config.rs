use ::config::{Config, ConfigError, Environment, Map};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::debug;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_ROOM_COMMAND_BUFFER: i64 = 100;

/// Configuration of the signaling relay.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Capacity of each room's command queue.
    pub room_command_buffer: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            room_command_buffer: DEFAULT_ROOM_COMMAND_BUFFER as usize,
        }
    }
}

impl RelayConfig {
    /// Defaults, then a `.env` file if present, then the process environment.
    ///
    /// `DUET_HOST`, `DUET_PORT` and `DUET_ROOM_COMMAND_BUFFER` set the matching
    /// fields. A bare `PORT` is honoured when `DUET_PORT` is absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_vars(None)
    }

    /// Build from an explicit variable map instead of the process environment.
    pub fn from_vars(vars: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        let port = match &vars {
            Some(vars) => vars.get("PORT").cloned(),
            None => dotenvy::var("PORT").ok(),
        };

        let mut config: Self = Config::builder()
            .set_default("host", Ipv4Addr::UNSPECIFIED.to_string())?
            .set_default("port", port.unwrap_or_else(|| DEFAULT_PORT.to_string()))?
            .set_default("room_command_buffer", DEFAULT_ROOM_COMMAND_BUFFER)?
            .add_source(
                Environment::with_prefix("DUET")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?
            .try_deserialize()?;

        config.room_command_buffer = config.room_command_buffer.max(1);
        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
