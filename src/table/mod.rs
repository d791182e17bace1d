//! Named views over the flat key space.
//!
//! A [`Table`] is an immutable path handle. Every operation translates a
//! relative key into an absolute key and delegates to the engine. Clones share
//! one listener registry; tables obtained by separate lookups of the same path
//! compare equal but keep separate registries.

mod values;


use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

use crate::constants::PERSISTENT;
use crate::engine::Engine;
use crate::listener::ConnectionListener;
use crate::listener::ListenerDispatcher;
use crate::listener::TableListener;
use crate::path;
use crate::NotifyFlags;
use crate::Result;

#[derive(Clone)]
pub struct Table {
    path: Arc<str>,
    engine: Arc<dyn Engine>,
    listeners: Arc<ListenerDispatcher>,
}

impl Table {
    /// Looks up a root-level table by name.
    ///
    /// `""` is the root itself; names without a leading separator get one.
    pub fn new(
        engine: Arc<dyn Engine>,
        name: &str,
    ) -> Self {
        Self::with_path(engine, path::root_path(name))
    }

    fn with_path(
        engine: Arc<dyn Engine>,
        path: String,
    ) -> Self {
        Self {
            path: path.into(),
            engine,
            listeners: Arc::new(ListenerDispatcher::new()),
        }
    }

    /// Absolute path of this table: empty for the root, otherwise
    /// `/`-prefixed without a trailing separator.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    #[inline]
    fn key(
        &self,
        key: &str,
    ) -> String {
        path::absolute(&self.path, key)
    }

    pub fn sub_table(
        &self,
        key: &str,
    ) -> Table {
        Table::with_path(self.engine.clone(), path::child(&self.path, key))
    }

    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        self.engine.entry_value(&self.key(key)).is_some()
    }

    pub fn contains_sub_table(
        &self,
        key: &str,
    ) -> bool {
        !self.engine.entries(&path::prefix(&self.key(key)), 0).is_empty()
    }

    /// Direct child keys whose type is in `types`; 0 means any type.
    pub fn keys(
        &self,
        types: u32,
    ) -> BTreeSet<String> {
        let prefix_len = path::prefix_len(&self.path);
        self.engine
            .entries(&path::prefix(&self.path), types)
            .into_iter()
            .filter_map(|entry| {
                let relative = path::relative(&entry.name, prefix_len)?;
                match path::first_segment(relative) {
                    (_, true) => None,
                    (key, false) => Some(key.to_string()),
                }
            })
            .collect()
    }

    /// Names of the direct child subtables.
    pub fn sub_tables(&self) -> BTreeSet<String> {
        let prefix_len = path::prefix_len(&self.path);
        self.engine
            .entries(&path::prefix(&self.path), 0)
            .into_iter()
            .filter_map(|entry| {
                let relative = path::relative(&entry.name, prefix_len)?;
                match path::first_segment(relative) {
                    (name, true) => Some(name.to_string()),
                    (_, false) => None,
                }
            })
            .collect()
    }

    pub fn delete(
        &self,
        key: &str,
    ) {
        self.engine.delete_entry(&self.key(key));
    }

    // -
    // Entry flags

    pub fn flags(
        &self,
        key: &str,
    ) -> u32 {
        self.engine.entry_flags(&self.key(key))
    }

    pub fn set_flags(
        &self,
        key: &str,
        flags: u32,
    ) {
        let full_key = self.key(key);
        let current = self.engine.entry_flags(&full_key);
        self.engine.set_entry_flags(&full_key, current | flags);
    }

    pub fn clear_flags(
        &self,
        key: &str,
        flags: u32,
    ) {
        let full_key = self.key(key);
        let current = self.engine.entry_flags(&full_key);
        self.engine.set_entry_flags(&full_key, current & !flags);
    }

    pub fn set_persistent(
        &self,
        key: &str,
    ) {
        self.set_flags(key, PERSISTENT);
    }

    pub fn clear_persistent(
        &self,
        key: &str,
    ) {
        self.clear_flags(key, PERSISTENT);
    }

    pub fn is_persistent(
        &self,
        key: &str,
    ) -> bool {
        self.flags(key) & PERSISTENT != 0
    }

    // -
    // Listeners

    /// Listens for new and updated direct children.
    pub fn add_table_listener(
        &self,
        listener: Arc<dyn TableListener>,
    ) {
        self.add_table_listener_ex(listener, NotifyFlags::NEW | NotifyFlags::UPDATE);
    }

    /// Like [`Table::add_table_listener`], optionally reporting the current
    /// children right away.
    pub fn add_table_listener_immediate(
        &self,
        listener: Arc<dyn TableListener>,
        immediate_notify: bool,
    ) {
        self.add_table_listener_ex(listener, notify_flags(immediate_notify));
    }

    pub fn add_table_listener_ex(
        &self,
        listener: Arc<dyn TableListener>,
        flags: NotifyFlags,
    ) {
        self.listeners.add_table_listener(self, listener, flags);
    }

    /// Listens for new and updated values of one key.
    pub fn add_key_listener(
        &self,
        key: &str,
        listener: Arc<dyn TableListener>,
        immediate_notify: bool,
    ) {
        self.add_key_listener_ex(key, listener, notify_flags(immediate_notify));
    }

    pub fn add_key_listener_ex(
        &self,
        key: &str,
        listener: Arc<dyn TableListener>,
        flags: NotifyFlags,
    ) {
        self.listeners.add_key_listener(self, key, listener, flags);
    }

    /// Announces each child subtable once. Subtables created by this process
    /// are included only with `local_notify`.
    pub fn add_sub_table_listener(
        &self,
        listener: Arc<dyn TableListener>,
        local_notify: bool,
    ) {
        self.listeners.add_sub_table_listener(self, listener, local_notify);
    }

    /// Removes every registration made with `listener` on this table.
    pub fn remove_table_listener(
        &self,
        listener: &Arc<dyn TableListener>,
    ) {
        self.listeners.remove_table_listener(self, listener);
    }

    /// # Errors
    /// `IllegalState` if `listener` is already registered on this table.
    pub fn add_connection_listener(
        &self,
        listener: Arc<dyn ConnectionListener>,
        immediate_notify: bool,
    ) -> Result<()> {
        self.listeners.add_connection_listener(self, listener, immediate_notify)
    }

    pub fn remove_connection_listener(
        &self,
        listener: &Arc<dyn ConnectionListener>,
    ) {
        self.listeners.remove_connection_listener(self, listener);
    }

    pub fn is_connected(&self) -> bool {
        !self.engine.connections().is_empty()
    }

    #[cfg(test)]
    pub(crate) fn listeners(&self) -> &ListenerDispatcher {
        &self.listeners
    }
}

fn notify_flags(immediate_notify: bool) -> NotifyFlags {
    let mut flags = NotifyFlags::NEW | NotifyFlags::UPDATE;
    if immediate_notify {
        flags |= NotifyFlags::IMMEDIATE;
    }
    flags
}

impl PartialEq for Table {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.path == other.path
    }
}

impl Eq for Table {}

impl Hash for Table {
    fn hash<H: Hasher>(
        &self,
        state: &mut H,
    ) {
        self.path.hash(state);
    }
}

impl fmt::Debug for Table {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Table").field("path", &self.path).finish_non_exhaustive()
    }
}

impl fmt::Display for Table {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "Table: {}", self.path)
    }
}
