//! Listener doubles and fixtures shared by the unit tests.
mod listeners;

pub(crate) use listeners::*;

use std::sync::Arc;

use crate::engine::Engine;
use crate::engine::MemoryEngine;
use crate::ConnectionInfo;

pub(crate) fn memory_engine() -> (Arc<MemoryEngine>, Arc<dyn Engine>) {
    let engine = Arc::new(MemoryEngine::new());
    let dyn_engine: Arc<dyn Engine> = engine.clone();
    (engine, dyn_engine)
}

pub(crate) fn peer(id: &str) -> ConnectionInfo {
    ConnectionInfo {
        remote_id: id.to_string(),
        remote_ip: "10.0.0.2".to_string(),
        remote_port: 1735,
        last_update: 0,
        protocol_version: 0x0300,
    }
}
