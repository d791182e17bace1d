//! In-process engine keeping the whole key space in memory.
//!
//! There is no transport: peer-originated mutations and peer connections are
//! fed in through the `ingest_remote_*` and `peer_*` methods. Callbacks are
//! always invoked with no engine lock held.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use dashmap::DashMap;
use parking_lot::Mutex;
use parking_lot::RwLock;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::ConnectionCallback;
use super::ConnectionNotification;
use super::Engine;
use super::EntryCallback;
use super::EntryNotification;
use super::SubscriptionId;
use crate::config::Role;
use crate::constants::DEFAULT_UPDATE_RATE_SECS;
use crate::constants::PERSISTENT;
use crate::ConnectionInfo;
use crate::EntryInfo;
use crate::NotifyFlags;
use crate::PersistentError;
use crate::Value;

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    flags: u32,
}

struct EntrySubscription {
    prefix: String,
    flags: NotifyFlags,
    callback: EntryCallback,
}

#[derive(Debug)]
struct EngineState {
    running: Option<Role>,
    network_identity: String,
    update_rate_secs: f64,
    /// Server name (client) or persistent file (server) of the current run
    endpoint: String,
    port: u16,
}

/// On-disk record of one persistent entry
#[derive(Serialize, Deserialize)]
struct PersistentRecord {
    name: String,
    value: Value,
}

/// Unified in-memory engine
pub struct MemoryEngine {
    entries: RwLock<BTreeMap<String, Entry>>,
    entry_subscriptions: DashMap<SubscriptionId, EntrySubscription>,
    connection_subscriptions: DashMap<SubscriptionId, ConnectionCallback>,
    peers: RwLock<Vec<ConnectionInfo>>,
    next_id: AtomicU64,
    state: Mutex<EngineState>,
}

impl std::fmt::Debug for MemoryEngine {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("MemoryEngine")
            .field("entries", &self.entries.read().len())
            .field("entry_subscriptions", &self.entry_subscriptions.len())
            .field("connection_subscriptions", &self.connection_subscriptions.len())
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            entry_subscriptions: DashMap::new(),
            connection_subscriptions: DashMap::new(),
            peers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            state: Mutex::new(EngineState {
                running: None,
                network_identity: String::new(),
                update_rate_secs: DEFAULT_UPDATE_RATE_SECS,
                endpoint: String::new(),
                port: 0,
            }),
        }
    }

    /// Applies a value received from a peer. Unlike local puts, a remote
    /// assignment replaces an entry of a different type.
    pub fn ingest_remote_update(
        &self,
        key: &str,
        value: Value,
    ) {
        if let Some(kind) = self.store_value(key, value.clone(), true) {
            self.notify_entry(key, &value, kind);
        }
    }

    /// Applies a deletion received from a peer.
    pub fn ingest_remote_delete(
        &self,
        key: &str,
    ) {
        let removed = self.entries.write().remove(key);
        if let Some(entry) = removed {
            self.notify_entry(key, &entry.value, NotifyFlags::DELETE);
        }
    }

    /// Applies a flags change received from a peer.
    pub fn ingest_remote_flags(
        &self,
        key: &str,
        flags: u32,
    ) {
        if let Some(value) = self.store_flags(key, flags) {
            self.notify_entry(key, &value, NotifyFlags::FLAGS);
        }
    }

    /// Records a new peer and notifies connection subscribers.
    pub fn peer_connected(
        &self,
        info: ConnectionInfo,
    ) {
        {
            let mut peers = self.peers.write();
            peers.retain(|p| p.remote_id != info.remote_id);
            peers.push(info.clone());
        }
        info!(remote_id = %info.remote_id, "peer connected");
        self.notify_connection(true, &info);
    }

    /// Drops a peer and notifies connection subscribers. Unknown ids are ignored.
    pub fn peer_disconnected(
        &self,
        remote_id: &str,
    ) {
        let removed = {
            let mut peers = self.peers.write();
            peers.iter().position(|p| p.remote_id == remote_id).map(|i| peers.remove(i))
        };
        if let Some(info) = removed {
            info!(remote_id = %info.remote_id, "peer disconnected");
            self.notify_connection(false, &info);
        }
    }

    pub fn running_role(&self) -> Option<Role> {
        self.state.lock().running
    }

    pub fn network_identity(&self) -> String {
        self.state.lock().network_identity.clone()
    }

    pub fn update_rate(&self) -> f64 {
        self.state.lock().update_rate_secs
    }

    /// Server name (client role) or persistent file (server role) and port of
    /// the current run.
    pub fn endpoint(&self) -> Option<(String, u16)> {
        let state = self.state.lock();
        state.running.map(|_| (state.endpoint.clone(), state.port))
    }

    pub fn entry_subscription_count(&self) -> usize {
        self.entry_subscriptions.len()
    }

    pub fn connection_subscription_count(&self) -> usize {
        self.connection_subscriptions.len()
    }

    fn next_subscription_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Writes `value` and reports which mutation happened, if any.
    ///
    /// Returns `None` when nothing changed or when a local put hits an entry of
    /// another type.
    fn store_value(
        &self,
        key: &str,
        value: Value,
        remote: bool,
    ) -> Option<NotifyFlags> {
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            None => {
                entries.insert(key.to_string(), Entry { value, flags: 0 });
                Some(NotifyFlags::NEW)
            }
            Some(entry) if entry.value == value => None,
            Some(entry) if !remote && entry.value.entry_type() != value.entry_type() => {
                debug!(
                    key,
                    existing = ?entry.value.entry_type(),
                    requested = ?value.entry_type(),
                    "type mismatch on put"
                );
                None
            }
            Some(entry) => {
                entry.value = value;
                Some(NotifyFlags::UPDATE)
            }
        }
    }

    /// Returns the entry value when the flags actually changed.
    fn store_flags(
        &self,
        key: &str,
        flags: u32,
    ) -> Option<Value> {
        let mut entries = self.entries.write();
        let entry = entries.get_mut(key)?;
        if entry.flags == flags {
            return None;
        }
        entry.flags = flags;
        Some(entry.value.clone())
    }

    fn notify_entry(
        &self,
        key: &str,
        value: &Value,
        flags: NotifyFlags,
    ) {
        let local = flags.contains(NotifyFlags::LOCAL);
        let kind = flags.difference(NotifyFlags::LOCAL);

        let targets: Vec<(SubscriptionId, EntryCallback)> = self
            .entry_subscriptions
            .iter()
            .filter(|sub| key.starts_with(sub.prefix.as_str()))
            .filter(|sub| !local || sub.flags.contains(NotifyFlags::LOCAL))
            .filter(|sub| sub.flags.intersects(kind))
            .map(|sub| (*sub.key(), sub.callback.clone()))
            .collect();

        trace!(key, ?flags, targets = targets.len(), "dispatching entry event");

        for (id, callback) in targets {
            callback(&EntryNotification {
                subscription: id,
                name: key.to_string(),
                value: value.clone(),
                flags,
            });
        }
    }

    fn notify_connection(
        &self,
        connected: bool,
        info: &ConnectionInfo,
    ) {
        let targets: Vec<(SubscriptionId, ConnectionCallback)> = self
            .connection_subscriptions
            .iter()
            .map(|sub| (*sub.key(), sub.value().clone()))
            .collect();

        for (id, callback) in targets {
            callback(&ConnectionNotification {
                subscription: id,
                connected,
                info: info.clone(),
            });
        }
    }

    fn start(
        &self,
        role: Role,
        endpoint: &str,
        port: u16,
    ) {
        let mut state = self.state.lock();
        state.running = Some(role);
        state.endpoint = endpoint.to_string();
        state.port = port;
        info!(%role, endpoint, port, "engine started");
    }

    fn stop(
        &self,
        role: Role,
    ) {
        {
            let mut state = self.state.lock();
            if state.running != Some(role) {
                return;
            }
            state.running = None;
        }
        let peers: Vec<ConnectionInfo> = std::mem::take(&mut *self.peers.write());
        for info in &peers {
            self.notify_connection(false, info);
        }
        info!(%role, dropped_peers = peers.len(), "engine stopped");
    }
}

impl Engine for MemoryEngine {
    fn subscribe_entries(
        &self,
        prefix: &str,
        flags: NotifyFlags,
        callback: EntryCallback,
    ) -> SubscriptionId {
        let id = self.next_subscription_id();
        self.entry_subscriptions.insert(
            id,
            EntrySubscription {
                prefix: prefix.to_string(),
                flags,
                callback: callback.clone(),
            },
        );
        trace!(?id, prefix, ?flags, "entry subscription added");

        if flags.contains(NotifyFlags::IMMEDIATE) {
            let current: Vec<(String, Value)> = self
                .entries
                .read()
                .range(prefix.to_string()..)
                .take_while(|(name, _)| name.starts_with(prefix))
                .map(|(name, entry)| (name.clone(), entry.value.clone()))
                .collect();
            for (name, value) in current {
                callback(&EntryNotification {
                    subscription: id,
                    name,
                    value,
                    flags: NotifyFlags::IMMEDIATE | NotifyFlags::NEW,
                });
            }
        }
        id
    }

    fn unsubscribe_entries(
        &self,
        id: SubscriptionId,
    ) {
        if self.entry_subscriptions.remove(&id).is_some() {
            trace!(?id, "entry subscription removed");
        }
    }

    fn subscribe_connections(
        &self,
        callback: ConnectionCallback,
        immediate_notify: bool,
    ) -> SubscriptionId {
        let id = self.next_subscription_id();
        self.connection_subscriptions.insert(id, callback.clone());

        if immediate_notify {
            let peers = self.peers.read().clone();
            for info in peers {
                callback(&ConnectionNotification {
                    subscription: id,
                    connected: true,
                    info,
                });
            }
        }
        id
    }

    fn unsubscribe_connections(
        &self,
        id: SubscriptionId,
    ) {
        self.connection_subscriptions.remove(&id);
    }

    fn connections(&self) -> Vec<ConnectionInfo> {
        self.peers.read().clone()
    }

    fn entry_value(
        &self,
        key: &str,
    ) -> Option<Value> {
        self.entries.read().get(key).map(|e| e.value.clone())
    }

    fn set_entry_value(
        &self,
        key: &str,
        value: Value,
    ) -> bool {
        let requested = value.entry_type();
        match self.store_value(key, value.clone(), false) {
            Some(kind) => {
                self.notify_entry(key, &value, kind | NotifyFlags::LOCAL);
                true
            }
            // unchanged value is still a successful put
            None => self.entries.read().get(key).map(|e| e.value.entry_type()) == Some(requested),
        }
    }

    fn entries(
        &self,
        prefix: &str,
        type_mask: u32,
    ) -> Vec<EntryInfo> {
        self.entries
            .read()
            .range(prefix.to_string()..)
            .take_while(|(name, _)| name.starts_with(prefix))
            .filter(|(_, entry)| entry.value.entry_type().matches(type_mask))
            .map(|(name, entry)| EntryInfo {
                name: name.clone(),
                entry_type: entry.value.entry_type(),
                flags: entry.flags,
            })
            .collect()
    }

    fn set_entry_flags(
        &self,
        key: &str,
        flags: u32,
    ) {
        if let Some(value) = self.store_flags(key, flags) {
            self.notify_entry(key, &value, NotifyFlags::FLAGS | NotifyFlags::LOCAL);
        }
    }

    fn entry_flags(
        &self,
        key: &str,
    ) -> u32 {
        self.entries.read().get(key).map(|e| e.flags).unwrap_or(0)
    }

    fn delete_entry(
        &self,
        key: &str,
    ) {
        let removed = self.entries.write().remove(key);
        if let Some(entry) = removed {
            self.notify_entry(key, &entry.value, NotifyFlags::DELETE | NotifyFlags::LOCAL);
        }
    }

    /// Deletes every entry not flagged PERSISTENT.
    fn delete_all_entries(&self) {
        let removed: Vec<(String, Entry)> = {
            let mut entries = self.entries.write();
            let doomed: Vec<String> = entries
                .iter()
                .filter(|(_, e)| e.flags & PERSISTENT == 0)
                .map(|(name, _)| name.clone())
                .collect();
            doomed
                .into_iter()
                .filter_map(|name| entries.remove(&name).map(|e| (name, e)))
                .collect()
        };
        debug!(removed = removed.len(), "deleted all non-persistent entries");
        for (name, entry) in removed {
            self.notify_entry(&name, &entry.value, NotifyFlags::DELETE | NotifyFlags::LOCAL);
        }
    }

    fn start_server(
        &self,
        persist_filename: &str,
        listen_address: &str,
        port: u16,
    ) {
        if Path::new(persist_filename).exists() {
            match self.load_persistent(persist_filename) {
                Ok(warnings) => {
                    for warning in warnings {
                        warn!(file = persist_filename, "{}", warning);
                    }
                }
                Err(e) => warn!(file = persist_filename, "could not load persistent file: {}", e),
            }
        } else {
            debug!(file = persist_filename, "no persistent file to load");
        }
        debug!(listen_address, "server listen address");
        self.start(Role::Server, persist_filename, port);
    }

    fn start_client(
        &self,
        server_name: &str,
        port: u16,
    ) {
        self.start(Role::Client, server_name, port);
    }

    fn stop_server(&self) {
        self.stop(Role::Server);
    }

    fn stop_client(&self) {
        self.stop(Role::Client);
    }

    fn set_network_identity(
        &self,
        name: &str,
    ) {
        self.state.lock().network_identity = name.to_string();
    }

    fn flush(&self) {
        trace!("MemoryEngine flush (no-op)");
    }

    fn set_update_rate(
        &self,
        interval_secs: f64,
    ) {
        self.state.lock().update_rate_secs = interval_secs;
    }

    fn save_persistent(
        &self,
        filename: &str,
    ) -> std::result::Result<(), PersistentError> {
        let records: Vec<PersistentRecord> = self
            .entries
            .read()
            .iter()
            .filter(|(_, e)| e.flags & PERSISTENT != 0)
            .map(|(name, e)| PersistentRecord {
                name: name.clone(),
                value: e.value.clone(),
            })
            .collect();

        let bytes = bincode::serialize(&records)?;
        fs::write(filename, bytes)?;
        debug!(file = filename, entries = records.len(), "saved persistent entries");
        Ok(())
    }

    fn load_persistent(
        &self,
        filename: &str,
    ) -> std::result::Result<Vec<String>, PersistentError> {
        let bytes = fs::read(filename)?;
        let records: Vec<PersistentRecord> = bincode::deserialize(&bytes)?;

        let mut warnings = Vec::new();
        for (line, record) in records.into_iter().enumerate() {
            if record.name.is_empty() {
                warnings.push(format!("record {}: ignoring entry with empty name", line));
                continue;
            }
            if !self.set_entry_value(&record.name, record.value) {
                warnings.push(format!(
                    "record {}: type mismatch for existing entry {:?}",
                    line, record.name
                ));
                continue;
            }
            let flags = self.entry_flags(&record.name) | PERSISTENT;
            self.set_entry_flags(&record.name, flags);
        }
        debug!(file = filename, warnings = warnings.len(), "loaded persistent entries");
        Ok(warnings)
    }
}
