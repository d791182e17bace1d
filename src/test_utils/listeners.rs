use std::sync::Arc;

use parking_lot::Mutex;

use crate::listener::ConnectionListener;
use crate::listener::TableListener;
use crate::ConnectionInfo;
use crate::NotifyFlags;
use crate::Table;
use crate::Value;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Seen {
    Value {
        table: String,
        key: String,
        value: Value,
        flags: NotifyFlags,
    },
    SubTable {
        table: String,
        name: String,
        sub_table: String,
    },
}

/// Records every table listener callback in arrival order.
#[derive(Default)]
pub(crate) struct RecordingListener {
    seen: Mutex<Vec<Seen>>,
}

impl RecordingListener {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn seen(&self) -> Vec<Seen> {
        self.seen.lock().clone()
    }

    pub(crate) fn count(&self) -> usize {
        self.seen.lock().len()
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.seen
            .lock()
            .iter()
            .filter_map(|s| match s {
                Seen::Value { key, .. } => Some(key.clone()),
                Seen::SubTable { .. } => None,
            })
            .collect()
    }

    pub(crate) fn sub_table_names(&self) -> Vec<String> {
        self.seen
            .lock()
            .iter()
            .filter_map(|s| match s {
                Seen::SubTable { name, .. } => Some(name.clone()),
                Seen::Value { .. } => None,
            })
            .collect()
    }
}

impl TableListener for RecordingListener {
    fn value_changed(
        &self,
        source: &Table,
        key: &str,
        value: &Value,
        flags: NotifyFlags,
    ) {
        self.seen.lock().push(Seen::Value {
            table: source.path().to_string(),
            key: key.to_string(),
            value: value.clone(),
            flags,
        });
    }

    fn sub_table_added(
        &self,
        source: &Table,
        name: &str,
        sub_table: &Table,
        _flags: NotifyFlags,
    ) {
        self.seen.lock().push(Seen::SubTable {
            table: source.path().to_string(),
            name: name.to_string(),
            sub_table: sub_table.path().to_string(),
        });
    }
}

#[derive(Default)]
pub(crate) struct RecordingConnectionListener {
    events: Mutex<Vec<(bool, String)>>,
}

impl RecordingConnectionListener {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// `(connected, remote_id)` pairs in arrival order
    pub(crate) fn events(&self) -> Vec<(bool, String)> {
        self.events.lock().clone()
    }
}

impl ConnectionListener for RecordingConnectionListener {
    fn connected(
        &self,
        _source: &Table,
        info: &ConnectionInfo,
    ) {
        self.events.lock().push((true, info.remote_id.clone()));
    }

    fn disconnected(
        &self,
        _source: &Table,
        info: &ConnectionInfo,
    ) {
        self.events.lock().push((false, info.remote_id.clone()));
    }
}
