// -
// Namespace

/// Separator between table path segments and keys.
pub const PATH_SEPARATOR: char = '/';

// -
// Lifecycle defaults

/// Port the engine listens on (server) or connects to (client) by default.
pub const DEFAULT_PORT: u16 = 1735;

/// File the server loads persistent entries from on start.
pub const DEFAULT_PERSISTENT_FILENAME: &str = "networktables.ini";

/// Default periodic update interval, in seconds.
pub const DEFAULT_UPDATE_RATE_SECS: f64 = 0.1;

pub const MIN_UPDATE_RATE_SECS: f64 = 0.1;
pub const MAX_UPDATE_RATE_SECS: f64 = 1.0;

// -
// Entry flags

/// Entry flag bit marking a value to be saved by the server.
pub const PERSISTENT: u32 = 0x01;

/// mDNS name of a team's robot controller.
pub(crate) fn team_address(team: u32) -> String {
    format!("roboRIO-{}-FRC.local", team)
}
