//! Hierarchical table namespace over a flat key/value engine.
//!
//! A [`Table`] is a path-scoped view of the engine's key space. Tables compose
//! absolute keys, read and write typed values, and turn the engine's raw
//! prefix subscriptions into table, key, subtable and connection scoped
//! listener callbacks. [`TableInstance`] owns the process lifecycle: it
//! collects the mode configuration and starts the engine as a server or a
//! client.
//!
//! ```rust,ignore
//! let engine = Arc::new(MemoryEngine::new());
//! let instance = TableInstance::new(engine, TablesConfig::new()?.validate()?);
//! let table = instance.table("SmartDashboard")?;
//! table.put_number("speed", 0.5);
//! ```

pub mod config;
pub mod constants;
pub mod engine;
mod errors;
mod instance;
mod listener;
pub mod path;
mod table;
mod value;

pub use crate::config::ModeConfig;
pub use crate::config::Role;
pub use crate::config::TablesConfig;
pub use engine::Engine;
pub use engine::MemoryEngine;
pub use engine::SubscriptionId;
pub use errors::*;
pub use instance::*;
pub use listener::ConnectionListener;
pub use listener::TableListener;
pub use table::*;
pub use value::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub(crate) mod test_utils;
