//! Process lifecycle: mode configuration and engine start/stop.
//!
//! ## Key Responsibilities
//! - Holds the [`ModeConfig`] that decides how the engine starts
//! - Rejects configuration changes once the engine runs, unless the value is
//!   unchanged
//! - Starts (`initialize`) and stops (`shutdown`) the engine
//! - Hands out [`Table`] handles, starting the engine on first use
//!
//! ## Example Usage
//! ```rust,ignore
//! let instance = TableInstance::new(Arc::new(MemoryEngine::new()), TablesConfig::default());
//! instance.set_client_mode()?;
//! instance.set_team(1234)?;
//! let table = instance.table("SmartDashboard")?;
//! ```


use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::update_rate_in_range;
use crate::config::ModeConfig;
use crate::config::Role;
use crate::config::TablesConfig;
use crate::constants::team_address;
use crate::constants::MAX_UPDATE_RATE_SECS;
use crate::constants::MIN_UPDATE_RATE_SECS;
use crate::engine::Engine;
use crate::ConnectionInfo;
use crate::Error;
use crate::Result;
use crate::Table;

#[derive(Debug)]
struct ModeState {
    config: ModeConfig,
    running: bool,
}

pub struct TableInstance {
    engine: Arc<dyn Engine>,
    state: Mutex<ModeState>,
    /// Serializes initialize/shutdown; never held by setters
    lifecycle: Mutex<()>,
}

impl std::fmt::Debug for TableInstance {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("TableInstance")
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl TableInstance {
    pub fn new(
        engine: Arc<dyn Engine>,
        config: TablesConfig,
    ) -> Self {
        Self {
            engine,
            state: Mutex::new(ModeState {
                config: config.mode,
                running: false,
            }),
            lifecycle: Mutex::new(()),
        }
    }

    /// Current mode configuration
    pub fn config(&self) -> ModeConfig {
        self.state.lock().config.clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    pub fn is_server(&self) -> bool {
        self.state.lock().config.role == Role::Server
    }

    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    // -
    // Mode settings

    pub fn set_server_mode(&self) -> Result<()> {
        self.update("role", |mode| &mut mode.role, Role::Server)
    }

    pub fn set_client_mode(&self) -> Result<()> {
        self.update("role", |mode| &mut mode.role, Role::Client)
    }

    /// Points a client at the robot controller of `team`.
    pub fn set_team(
        &self,
        team: u32,
    ) -> Result<()> {
        self.set_ip_address(&team_address(team))
    }

    pub fn set_ip_address(
        &self,
        address: &str,
    ) -> Result<()> {
        self.update("address", |mode| &mut mode.address, address.to_string())
    }

    pub fn set_port(
        &self,
        port: u16,
    ) -> Result<()> {
        self.update("port", |mode| &mut mode.port, port)
    }

    pub fn set_persistent_filename(
        &self,
        filename: &str,
    ) -> Result<()> {
        self.update(
            "persistent_filename",
            |mode| &mut mode.persistent_filename,
            filename.to_string(),
        )
    }

    /// # Errors
    /// `InvalidArgument` outside 0.1 to 1.0 seconds.
    pub fn set_update_rate(
        &self,
        interval_secs: f64,
    ) -> Result<()> {
        if !update_rate_in_range(interval_secs) {
            return Err(Error::invalid_argument(
                "update_rate_secs",
                format!(
                    "{} is outside {} to {} seconds",
                    interval_secs, MIN_UPDATE_RATE_SECS, MAX_UPDATE_RATE_SECS
                ),
            ));
        }
        self.update("update_rate_secs", |mode| &mut mode.update_rate_secs, interval_secs)
    }

    /// Identity reported to peers. Takes effect immediately.
    pub fn set_network_identity(
        &self,
        name: &str,
    ) {
        self.state.lock().config.network_identity = name.to_string();
        self.engine.set_network_identity(name);
    }

    /// Writes `value` into the field chosen by `field`.
    ///
    /// An unchanged value is always accepted; a changed one only while the
    /// engine is stopped.
    fn update<T: PartialEq>(
        &self,
        setting: &'static str,
        field: impl FnOnce(&mut ModeConfig) -> &mut T,
        value: T,
    ) -> Result<()> {
        let mut state = self.state.lock();
        let running = state.running;
        let slot = field(&mut state.config);
        if *slot == value {
            return Ok(());
        }
        if running {
            warn!(setting, "rejected change after initialization");
            return Err(Error::already_initialized(setting));
        }
        *slot = value;
        debug!(setting, "mode setting changed");
        Ok(())
    }

    // -
    // Lifecycle

    /// Starts the engine with the current configuration, restarting it if it
    /// is already running.
    ///
    /// # Errors
    /// `Config` if the mode configuration is incomplete for its role.
    pub fn initialize(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock();
        if self.is_running() {
            self.stop_engine();
        }
        self.start_engine()
    }

    /// Starts the engine unless it is already running. Unlike `initialize`,
    /// a running engine is left alone.
    fn ensure_running(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock();
        if self.is_running() {
            return Ok(());
        }
        self.start_engine()
    }

    // Caller holds `lifecycle`.
    fn start_engine(&self) -> Result<()> {
        let mode = {
            let mut state = self.state.lock();
            state.config.validate()?;
            state.running = true;
            state.config.clone()
        };

        match mode.role {
            Role::Client => self.engine.start_client(&mode.address, mode.port),
            Role::Server => self.engine.start_server(&mode.persistent_filename, "", mode.port),
        }
        if !mode.network_identity.is_empty() {
            self.engine.set_network_identity(&mode.network_identity);
        }
        self.engine.set_update_rate(mode.update_rate_secs);

        info!(role = %mode.role, address = %mode.address, port = mode.port, "tables initialized");
        Ok(())
    }

    /// Stops the engine. Does nothing when it is not running.
    pub fn shutdown(&self) {
        let _lifecycle = self.lifecycle.lock();
        if self.is_running() {
            self.stop_engine();
        }
    }

    fn stop_engine(&self) {
        let role = self.state.lock().config.role;
        match role {
            Role::Client => self.engine.stop_client(),
            Role::Server => self.engine.stop_server(),
        }
        self.state.lock().running = false;
        info!(%role, "tables shut down");
    }

    /// Looks up a root-level table, starting the engine first if needed.
    pub fn table(
        &self,
        name: &str,
    ) -> Result<Table> {
        self.ensure_running()?;
        Ok(Table::new(self.engine.clone(), name))
    }

    // -
    // Engine-wide operations

    pub fn connections(&self) -> Vec<ConnectionInfo> {
        self.engine.connections()
    }

    pub fn flush(&self) {
        self.engine.flush();
    }

    /// Deletes every entry not flagged persistent.
    pub fn delete_all(&self) {
        self.engine.delete_all_entries();
    }

    pub fn save_persistent(
        &self,
        filename: &str,
    ) -> Result<()> {
        self.engine.save_persistent(filename)?;
        Ok(())
    }

    /// Returns one warning per skipped entry.
    pub fn load_persistent(
        &self,
        filename: &str,
    ) -> Result<Vec<String>> {
        Ok(self.engine.load_persistent(filename)?)
    }
}
