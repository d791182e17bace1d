use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use tracing::warn;

use super::adapters;
use super::ConnectionListener;
use super::TableListener;
use crate::engine::EntryCallback;
use crate::engine::SubscriptionId;
use crate::path;
use crate::IllegalStateError;
use crate::NotifyFlags;
use crate::Result;
use crate::Table;

/// Identity of a listener object: the address its `Arc` points to.
///
/// The registration keeps a clone of the `Arc`, so the address cannot be
/// reused by another listener while the key is in the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ListenerKey(usize);

impl ListenerKey {
    fn of<T: ?Sized>(listener: &Arc<T>) -> Self {
        ListenerKey(Arc::as_ptr(listener) as *const () as usize)
    }
}

struct TableRegistration {
    _listener: Arc<dyn TableListener>,
    /// Cleared before teardown; adapters drop late deliveries once unset
    active: Arc<AtomicBool>,
    subscriptions: Vec<SubscriptionId>,
}

struct ConnectionRegistration {
    _listener: Arc<dyn ConnectionListener>,
    active: Arc<AtomicBool>,
    subscription: Option<SubscriptionId>,
}

/// Per-table listener bookkeeping
pub(crate) struct ListenerDispatcher {
    table_listeners: Mutex<HashMap<ListenerKey, TableRegistration>>,
    connection_listeners: Mutex<HashMap<ListenerKey, ConnectionRegistration>>,
}

impl std::fmt::Debug for ListenerDispatcher {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ListenerDispatcher")
            .field("table_listeners", &self.table_listeners.lock().len())
            .field("connection_listeners", &self.connection_listeners.lock().len())
            .finish()
    }
}

impl ListenerDispatcher {
    pub(crate) fn new() -> Self {
        Self {
            table_listeners: Mutex::new(HashMap::new()),
            connection_listeners: Mutex::new(HashMap::new()),
        }
    }

    /// Table scope: direct children of `source`.
    pub(crate) fn add_table_listener(
        &self,
        source: &Table,
        listener: Arc<dyn TableListener>,
        flags: NotifyFlags,
    ) -> SubscriptionId {
        let active = self.begin_table_registration(&listener);
        let callback = adapters::table_scope(source.clone(), listener.clone(), active.clone());
        self.subscribe(source, &path::prefix(source.path()), flags, callback, &listener, &active)
    }

    /// Key scope: exactly `key` under `source`.
    pub(crate) fn add_key_listener(
        &self,
        source: &Table,
        key: &str,
        listener: Arc<dyn TableListener>,
        flags: NotifyFlags,
    ) -> SubscriptionId {
        let full_key = path::absolute(source.path(), key);
        let active = self.begin_table_registration(&listener);
        let callback = adapters::key_scope(
            source.clone(),
            key.to_string(),
            full_key.clone(),
            listener.clone(),
            active.clone(),
        );
        self.subscribe(source, &full_key, flags, callback, &listener, &active)
    }

    /// Subtable scope: first sighting of each child subtable.
    pub(crate) fn add_sub_table_listener(
        &self,
        source: &Table,
        listener: Arc<dyn TableListener>,
        local_notify: bool,
    ) -> SubscriptionId {
        let mut flags = NotifyFlags::NEW | NotifyFlags::IMMEDIATE;
        if local_notify {
            flags |= NotifyFlags::LOCAL;
        }
        let active = self.begin_table_registration(&listener);
        let callback = adapters::sub_table_scope(source.clone(), listener.clone(), active.clone());
        self.subscribe(source, &path::prefix(source.path()), flags, callback, &listener, &active)
    }

    /// Tears down every subscription made for `listener`. Unknown listeners
    /// are ignored.
    pub(crate) fn remove_table_listener(
        &self,
        source: &Table,
        listener: &Arc<dyn TableListener>,
    ) {
        let removed = self.table_listeners.lock().remove(&ListenerKey::of(listener));
        let Some(registration) = removed else {
            return;
        };
        registration.active.store(false, Ordering::Release);
        for id in &registration.subscriptions {
            source.engine().unsubscribe_entries(*id);
        }
        debug!(
            path = source.path(),
            subscriptions = ?registration.subscriptions,
            "table listener removed"
        );
    }

    pub(crate) fn add_connection_listener(
        &self,
        source: &Table,
        listener: Arc<dyn ConnectionListener>,
        immediate_notify: bool,
    ) -> Result<()> {
        let key = ListenerKey::of(&listener);
        let active = Arc::new(AtomicBool::new(true));
        {
            let mut registry = self.connection_listeners.lock();
            if registry.contains_key(&key) {
                warn!(path = source.path(), "connection listener added twice");
                return Err(IllegalStateError::ListenerAlreadyRegistered {
                    path: source.path().to_string(),
                }
                .into());
            }
            registry.insert(
                key,
                ConnectionRegistration {
                    _listener: listener.clone(),
                    active: active.clone(),
                    subscription: None,
                },
            );
        }

        let callback = adapters::connection_scope(source.clone(), listener, active.clone());
        let id = source.engine().subscribe_connections(callback, immediate_notify);

        let committed = match self.connection_listeners.lock().get_mut(&key) {
            Some(registration) if Arc::ptr_eq(&registration.active, &active) => {
                registration.subscription = Some(id);
                true
            }
            _ => false,
        };
        if committed {
            debug!(path = source.path(), ?id, "connection listener added");
        } else {
            source.engine().unsubscribe_connections(id);
        }
        Ok(())
    }

    pub(crate) fn remove_connection_listener(
        &self,
        source: &Table,
        listener: &Arc<dyn ConnectionListener>,
    ) {
        let removed = self.connection_listeners.lock().remove(&ListenerKey::of(listener));
        let Some(registration) = removed else {
            return;
        };
        registration.active.store(false, Ordering::Release);
        if let Some(id) = registration.subscription {
            source.engine().unsubscribe_connections(id);
        }
        debug!(path = source.path(), "connection listener removed");
    }

    /// Number of distinct table listener objects registered.
    #[cfg(test)]
    pub(crate) fn table_listener_count(&self) -> usize {
        self.table_listeners.lock().len()
    }

    /// Raw subscriptions held on behalf of `listener`.
    #[cfg(test)]
    pub(crate) fn subscription_count(
        &self,
        listener: &Arc<dyn TableListener>,
    ) -> usize {
        self.table_listeners
            .lock()
            .get(&ListenerKey::of(listener))
            .map(|r| r.subscriptions.len())
            .unwrap_or(0)
    }

    /// Finds or creates the registration for `listener` and returns its
    /// active flag.
    fn begin_table_registration(
        &self,
        listener: &Arc<dyn TableListener>,
    ) -> Arc<AtomicBool> {
        self.table_listeners
            .lock()
            .entry(ListenerKey::of(listener))
            .or_insert_with(|| TableRegistration {
                _listener: listener.clone(),
                active: Arc::new(AtomicBool::new(true)),
                subscriptions: Vec::new(),
            })
            .active
            .clone()
    }

    /// Subscribes outside the lock, then records the id.
    ///
    /// If the registration was removed (or replaced) while the engine call
    /// was in flight, the fresh subscription is torn down again.
    fn subscribe(
        &self,
        source: &Table,
        key_or_prefix: &str,
        flags: NotifyFlags,
        callback: EntryCallback,
        listener: &Arc<dyn TableListener>,
        active: &Arc<AtomicBool>,
    ) -> SubscriptionId {
        let id = source.engine().subscribe_entries(key_or_prefix, flags, callback);

        let committed = match self.table_listeners.lock().get_mut(&ListenerKey::of(listener)) {
            Some(registration) if Arc::ptr_eq(&registration.active, active) => {
                registration.subscriptions.push(id);
                true
            }
            _ => false,
        };

        if committed {
            debug!(path = source.path(), key_or_prefix, ?flags, ?id, "table listener added");
        } else {
            debug!(path = source.path(), ?id, "listener removed during registration");
            source.engine().unsubscribe_entries(id);
        }
        id
    }
}
