//! Boundary with the key/value engine.
//!
//! The engine owns the flat key space, peer synchronization, persistence and
//! the raw subscription primitive. Everything above this trait only composes
//! keys and filters the events the engine hands back.
//!
//! Contract assumed of every implementation:
//! - a raw subscription callback fires at least once per matching mutation;
//! - callbacks may run concurrently with each other and with caller threads;
//! - after `unsubscribe_*` returns, delivery for that id eventually stops.

mod memory;


pub use memory::*;

use std::fmt;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::ConnectionInfo;
use crate::EntryInfo;
use crate::NotifyFlags;
use crate::PersistentError;
use crate::Value;

/// Opaque handle returned by the engine for each raw subscription
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Debug for SubscriptionId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// One raw change event for a key matching a subscription
#[derive(Debug, Clone, PartialEq)]
pub struct EntryNotification {
    pub subscription: SubscriptionId,
    /// Absolute key of the affected entry
    pub name: String,
    /// New value; the last known value for deletions
    pub value: Value,
    pub flags: NotifyFlags,
}

/// Peer connected or disconnected
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionNotification {
    pub subscription: SubscriptionId,
    pub connected: bool,
    pub info: ConnectionInfo,
}

pub type EntryCallback = Arc<dyn Fn(&EntryNotification) + Send + Sync>;
pub type ConnectionCallback = Arc<dyn Fn(&ConnectionNotification) + Send + Sync>;

#[cfg_attr(test, automock)]
pub trait Engine: Send + Sync + 'static {
    /// Registers `callback` for every key starting with `prefix`.
    ///
    /// `flags` selects the mutation kinds (NEW, UPDATE, DELETE, FLAGS) and
    /// modifiers: LOCAL to also receive this process's own mutations,
    /// IMMEDIATE to receive current entries synchronously on registration.
    fn subscribe_entries(
        &self,
        prefix: &str,
        flags: NotifyFlags,
        callback: EntryCallback,
    ) -> SubscriptionId;

    fn unsubscribe_entries(
        &self,
        id: SubscriptionId,
    );

    fn subscribe_connections(
        &self,
        callback: ConnectionCallback,
        immediate_notify: bool,
    ) -> SubscriptionId;

    fn unsubscribe_connections(
        &self,
        id: SubscriptionId,
    );

    fn connections(&self) -> Vec<ConnectionInfo>;

    fn entry_value(
        &self,
        key: &str,
    ) -> Option<Value>;

    /// Returns false if the entry exists with a different type.
    fn set_entry_value(
        &self,
        key: &str,
        value: Value,
    ) -> bool;

    /// Entries whose absolute key starts with `prefix`; a `type_mask` of 0
    /// matches every type.
    fn entries(
        &self,
        prefix: &str,
        type_mask: u32,
    ) -> Vec<EntryInfo>;

    fn set_entry_flags(
        &self,
        key: &str,
        flags: u32,
    );

    fn entry_flags(
        &self,
        key: &str,
    ) -> u32;

    fn delete_entry(
        &self,
        key: &str,
    );

    fn delete_all_entries(&self);

    fn start_server(
        &self,
        persist_filename: &str,
        listen_address: &str,
        port: u16,
    );

    fn start_client(
        &self,
        server_name: &str,
        port: u16,
    );

    fn stop_server(&self);

    fn stop_client(&self);

    fn set_network_identity(
        &self,
        name: &str,
    );

    fn flush(&self);

    fn set_update_rate(
        &self,
        interval_secs: f64,
    );

    fn save_persistent(
        &self,
        filename: &str,
    ) -> std::result::Result<(), PersistentError>;

    /// Returns warnings for entries that were skipped.
    fn load_persistent(
        &self,
        filename: &str,
    ) -> std::result::Result<Vec<String>, PersistentError>;
}
