use std::sync::Arc;

use nettables::ConnectionInfo;
use nettables::MemoryEngine;
use nettables::NotifyFlags;
use nettables::Table;
use nettables::TableInstance;
use nettables::TableListener;
use nettables::TablesConfig;
use nettables::Value;
use parking_lot::Mutex;
use tempfile::TempDir;

/// Server instance whose persistent file lives in a private temp dir.
pub struct Harness {
    pub engine: Arc<MemoryEngine>,
    pub instance: TableInstance,
    _dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut config = TablesConfig::default();
        config.mode.persistent_filename = dir
            .path()
            .join("networktables.ini")
            .to_str()
            .expect("utf8 path")
            .to_string();
        let engine = Arc::new(MemoryEngine::new());
        let instance = TableInstance::new(engine.clone(), config);
        Self {
            engine,
            instance,
            _dir: dir,
        }
    }

    pub fn table(
        &self,
        name: &str,
    ) -> Table {
        self.instance.table(name).expect("table lookup")
    }

    pub fn persistent_file(&self) -> String {
        self.instance.config().persistent_filename
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Value(String, Value),
    SubTable(String, String),
}

#[derive(Default)]
pub struct Collector {
    events: Mutex<Vec<Event>>,
}

impl Collector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }
}

impl TableListener for Collector {
    fn value_changed(
        &self,
        _source: &Table,
        key: &str,
        value: &Value,
        _flags: NotifyFlags,
    ) {
        self.events.lock().push(Event::Value(key.to_string(), value.clone()));
    }

    fn sub_table_added(
        &self,
        _source: &Table,
        name: &str,
        sub_table: &Table,
        _flags: NotifyFlags,
    ) {
        self.events
            .lock()
            .push(Event::SubTable(name.to_string(), sub_table.path().to_string()));
    }
}

pub fn peer(id: &str) -> ConnectionInfo {
    ConnectionInfo {
        remote_id: id.to_string(),
        remote_ip: "10.0.0.2".to_string(),
        remote_port: 1735,
        ..Default::default()
    }
}
