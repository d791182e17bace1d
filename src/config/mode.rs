use std::fmt;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_PERSISTENT_FILENAME;
use crate::constants::DEFAULT_PORT;
use crate::constants::DEFAULT_UPDATE_RATE_SECS;
use crate::constants::MAX_UPDATE_RATE_SECS;
use crate::constants::MIN_UPDATE_RATE_SECS;
use crate::Error;
use crate::Result;

/// Whether this process hosts the table or connects to one
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Server,
    Client,
}

impl fmt::Display for Role {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Role::Server => write!(f, "server"),
            Role::Client => write!(f, "client"),
        }
    }
}

/// Process-wide engine settings, fixed once the engine starts
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModeConfig {
    #[serde(default)]
    pub role: Role,

    /// Address a client connects to; unused by a server
    #[serde(default)]
    pub address: String,

    /// Port to connect to (client) or listen on (server)
    #[serde(default = "default_port")]
    pub port: u16,

    /// File the server loads and saves persistent entries from
    #[serde(default = "default_persistent_filename")]
    pub persistent_filename: String,

    /// Periodic update interval in seconds (0.1 to 1.0)
    #[serde(default = "default_update_rate_secs")]
    pub update_rate_secs: f64,

    /// Identity reported to remote peers
    #[serde(default)]
    pub network_identity: String,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            role: Role::default(),
            address: String::new(),
            port: default_port(),
            persistent_filename: default_persistent_filename(),
            update_rate_secs: default_update_rate_secs(),
            network_identity: String::new(),
        }
    }
}

impl ModeConfig {
    /// Validates mode configuration
    /// # Errors
    /// Returns `Error::Config` when:
    /// - port is 0
    /// - update rate is outside 0.1..=1.0 seconds
    /// - the role is missing its address (client) or persistent file (server)
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config(ConfigError::Message("port cannot be 0".into())));
        }

        if !update_rate_in_range(self.update_rate_secs) {
            return Err(Error::Config(ConfigError::Message(format!(
                "update_rate_secs {} must be between {} and {}",
                self.update_rate_secs, MIN_UPDATE_RATE_SECS, MAX_UPDATE_RATE_SECS
            ))));
        }

        match self.role {
            Role::Client if self.address.trim().is_empty() => Err(Error::Config(
                ConfigError::Message("client role requires a non-empty address".into()),
            )),
            Role::Server if self.persistent_filename.trim().is_empty() => {
                Err(Error::Config(ConfigError::Message(
                    "server role requires a persistent_filename".into(),
                )))
            }
            _ => Ok(()),
        }
    }
}

pub(crate) fn update_rate_in_range(secs: f64) -> bool {
    (MIN_UPDATE_RATE_SECS..=MAX_UPDATE_RATE_SECS).contains(&secs)
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_persistent_filename() -> String {
    DEFAULT_PERSISTENT_FILENAME.to_string()
}
fn default_update_rate_secs() -> f64 {
    DEFAULT_UPDATE_RATE_SECS
}
