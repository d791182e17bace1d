use nettables::Error;
use nettables::IllegalStateError;
use nettables::MemoryEngine;
use nettables::Role;
use nettables::TableInstance;
use nettables::TablesConfig;
use nettables::Value;
use std::sync::Arc;

use crate::commons::Harness;

#[test]
fn test_table_paths_from_instance() {
    let h = Harness::new();

    assert_eq!(h.table("").path(), "");
    let robot = h.table("Robot");
    assert_eq!(robot.path(), "/Robot");
    assert_eq!(robot.sub_table("Arm").path(), "/Robot/Arm");
    assert!(h.instance.is_running());
}

#[test]
fn test_number_array_defaults() {
    let h = Harness::new();
    let x = h.table("X");

    assert_eq!(x.get_number_array("pos", &[0.0]), vec![0.0]);
    x.put_number_array("pos", &[1.0, 2.0]);
    assert_eq!(x.get_number_array("pos", &[0.0]), vec![1.0, 2.0]);
}

#[test]
fn test_settings_are_frozen_while_running() {
    let h = Harness::new();
    h.instance.set_port(5800).unwrap();
    h.instance.initialize().unwrap();

    h.instance.set_port(5800).unwrap();
    h.instance.set_port(5800).unwrap();
    let err = h.instance.set_port(5801).unwrap_err();
    assert!(matches!(
        err,
        Error::IllegalState(IllegalStateError::AlreadyInitialized { setting: "port" })
    ));

    h.instance.shutdown();
    h.instance.shutdown();
    h.instance.set_port(5801).unwrap();
    assert_eq!(h.instance.config().port, 5801);
}

#[test]
fn test_client_mode_with_team() {
    let engine = Arc::new(MemoryEngine::new());
    let instance = TableInstance::new(engine.clone(), TablesConfig::default());
    instance.set_client_mode().unwrap();
    instance.set_team(1234).unwrap();

    instance.initialize().unwrap();

    assert!(!instance.is_server());
    assert_eq!(engine.running_role(), Some(Role::Client));
    assert_eq!(
        engine.endpoint(),
        Some(("roboRIO-1234-FRC.local".to_string(), 1735))
    );
}

#[test]
fn test_persistent_values_survive_restart() {
    let h = Harness::new();
    let x = h.table("X");
    x.put_value("name", "robot").unwrap();
    x.set_persistent("name");
    x.put_value("scratch", 1.0_f64).unwrap();
    h.instance.save_persistent(&h.persistent_file()).unwrap();
    h.instance.shutdown();

    // a fresh server reading the same file
    let engine = Arc::new(MemoryEngine::new());
    let instance = TableInstance::new(engine.clone(), TablesConfig::default());
    instance.set_persistent_filename(&h.persistent_file()).unwrap();
    let x = instance.table("X").unwrap();

    assert_eq!(x.get_value("name", Value::Boolean(false)), Value::String("robot".into()));
    assert!(x.is_persistent("name"));
    assert!(!x.contains_key("scratch"));
}
