use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::ConnectionListener;
use super::TableListener;
use crate::engine::ConnectionCallback;
use crate::engine::ConnectionNotification;
use crate::engine::EntryCallback;
use crate::engine::EntryNotification;
use crate::path;
use crate::Table;

/// Forwards events for direct children of `source`; deeper descendants are
/// dropped.
pub(super) fn table_scope(
    source: Table,
    listener: Arc<dyn TableListener>,
    active: Arc<AtomicBool>,
) -> EntryCallback {
    let prefix_len = path::prefix_len(source.path());
    Arc::new(move |event: &EntryNotification| {
        if !active.load(Ordering::Acquire) {
            return;
        }
        let Some(relative_key) = path::relative(&event.name, prefix_len) else {
            return;
        };
        if path::first_segment(relative_key).1 {
            trace!(key = %event.name, "dropping descendant event for table listener");
            return;
        }
        listener.value_changed(&source, relative_key, &event.value, event.flags);
    })
}

/// Forwards events for exactly `full_key`, reported as `relative_key`.
pub(super) fn key_scope(
    source: Table,
    relative_key: String,
    full_key: String,
    listener: Arc<dyn TableListener>,
    active: Arc<AtomicBool>,
) -> EntryCallback {
    Arc::new(move |event: &EntryNotification| {
        if !active.load(Ordering::Acquire) {
            return;
        }
        if event.name != full_key {
            trace!(key = %event.name, watched = %full_key, "dropping non-matching key event");
            return;
        }
        listener.value_changed(&source, &relative_key, &event.value, event.flags);
    })
}

/// Announces each subtable name once for the life of this registration.
pub(super) fn sub_table_scope(
    source: Table,
    listener: Arc<dyn TableListener>,
    active: Arc<AtomicBool>,
) -> EntryCallback {
    let prefix_len = path::prefix_len(source.path());
    let announced: Mutex<HashSet<String>> = Mutex::new(HashSet::new());
    Arc::new(move |event: &EntryNotification| {
        if !active.load(Ordering::Acquire) {
            return;
        }
        let Some(relative_key) = path::relative(&event.name, prefix_len) else {
            return;
        };
        let (name, nested) = path::first_segment(relative_key);
        if !nested {
            return;
        }
        // check and mark in one step so concurrent deliveries announce once
        if !announced.lock().insert(name.to_string()) {
            return;
        }
        let sub_table = source.sub_table(name);
        listener.sub_table_added(&source, name, &sub_table, event.flags);
    })
}

pub(super) fn connection_scope(
    source: Table,
    listener: Arc<dyn ConnectionListener>,
    active: Arc<AtomicBool>,
) -> ConnectionCallback {
    Arc::new(move |event: &ConnectionNotification| {
        if !active.load(Ordering::Acquire) {
            return;
        }
        if event.connected {
            listener.connected(&source, &event.info);
        } else {
            listener.disconnected(&source, &event.info);
        }
    })
}
