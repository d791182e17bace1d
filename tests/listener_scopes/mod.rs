use std::sync::Arc;
use std::time::Duration;

use nettables::ConnectionInfo;
use nettables::ConnectionListener;
use nettables::Error;
use nettables::NotifyFlags;
use nettables::Table;
use nettables::TableListener;
use nettables::Value;
use parking_lot::Mutex;

use crate::commons::peer;
use crate::commons::Collector;
use crate::commons::Event;
use crate::commons::Harness;

#[test]
fn test_table_listener_sees_direct_children_only() {
    let h = Harness::new();
    let x = h.table("X");
    let collector = Collector::new();
    x.add_table_listener(collector.clone());

    h.engine.ingest_remote_update("/X/a", Value::Double(1.0));
    h.engine.ingest_remote_update("/X/Y/z", Value::Double(2.0));
    h.engine.ingest_remote_update("/XY/a", Value::Double(3.0));
    h.engine.ingest_remote_update("/X/a", Value::Double(4.0));

    assert_eq!(
        collector.events(),
        vec![
            Event::Value("a".to_string(), Value::Double(1.0)),
            Event::Value("a".to_string(), Value::Double(4.0)),
        ]
    );
}

#[test]
fn test_nested_entry_announces_sub_table_without_table_event() {
    let h = Harness::new();
    let x = h.table("X");
    let table_scope = Collector::new();
    let sub_table_scope = Collector::new();
    x.add_table_listener(table_scope.clone());
    x.add_sub_table_listener(sub_table_scope.clone(), false);

    h.engine.ingest_remote_update("/X/Y/z", Value::Boolean(true));

    assert_eq!(table_scope.len(), 0);
    assert_eq!(
        sub_table_scope.events(),
        vec![Event::SubTable("Y".to_string(), "/X/Y".to_string())]
    );
}

#[test]
fn test_sub_table_listener_counts_distinct_names() {
    let h = Harness::new();
    let x = h.table("X");
    let collector = Collector::new();
    x.add_sub_table_listener(collector.clone(), false);

    let keys = [
        "/X/B/1", "/X/A/1", "/X/B/2", "/X/plain", "/X/C/x/y", "/X/A/3", "/X/B/1",
    ];
    for (i, key) in keys.iter().enumerate() {
        h.engine.ingest_remote_update(key, Value::Double(i as f64));
    }

    let names: Vec<Event> = collector.events();
    assert_eq!(
        names,
        vec![
            Event::SubTable("B".to_string(), "/X/B".to_string()),
            Event::SubTable("A".to_string(), "/X/A".to_string()),
            Event::SubTable("C".to_string(), "/X/C".to_string()),
        ]
    );
}

#[test]
fn test_key_listener_ignores_longer_keys() {
    let h = Harness::new();
    let root = h.table("");
    let collector = Collector::new();
    root.add_key_listener("a/b", collector.clone(), false);

    h.engine.ingest_remote_update("/a/b/c", Value::Double(1.0));
    h.engine.ingest_remote_update("/a/bc", Value::Double(1.0));
    assert_eq!(collector.len(), 0);

    h.engine.ingest_remote_update("/a/b", Value::Double(1.0));
    assert_eq!(
        collector.events(),
        vec![Event::Value("a/b".to_string(), Value::Double(1.0))]
    );
}

#[test]
fn test_removed_listener_gets_no_further_callbacks() {
    let h = Harness::new();
    let x = h.table("X");
    let collector = Collector::new();
    let listener: Arc<dyn TableListener> = collector.clone();
    x.add_table_listener(listener.clone());
    x.add_key_listener("k", listener.clone(), false);
    x.add_sub_table_listener(listener.clone(), false);

    x.remove_table_listener(&listener);
    for i in 0..20 {
        h.engine.ingest_remote_update("/X/k", Value::Double(i as f64));
        h.engine.ingest_remote_update(&format!("/X/S{}/v", i), Value::Double(0.0));
    }

    assert_eq!(collector.len(), 0);
    assert_eq!(h.engine.entry_subscription_count(), 0);
}

#[test]
fn test_delete_and_flag_events_reach_listeners_that_ask() {
    let h = Harness::new();
    let x = h.table("X");
    let collector = Collector::new();
    x.add_table_listener_ex(
        collector.clone(),
        NotifyFlags::DELETE | NotifyFlags::FLAGS | NotifyFlags::LOCAL,
    );

    x.put_number("a", 1.0);
    x.set_persistent("a");
    x.delete("a");

    assert_eq!(
        collector.events(),
        vec![
            Event::Value("a".to_string(), Value::Double(1.0)),
            Event::Value("a".to_string(), Value::Double(1.0)),
        ]
    );
}

struct Tracker {
    events: Mutex<Vec<String>>,
}

impl ConnectionListener for Tracker {
    fn connected(
        &self,
        source: &Table,
        info: &ConnectionInfo,
    ) {
        self.events
            .lock()
            .push(format!("{} connected {}", source.path(), info.remote_id));
    }

    fn disconnected(
        &self,
        source: &Table,
        info: &ConnectionInfo,
    ) {
        self.events
            .lock()
            .push(format!("{} disconnected {}", source.path(), info.remote_id));
    }
}

#[test]
fn test_connection_listener_lifecycle() {
    let h = Harness::new();
    let x = h.table("X");
    let tracker = Arc::new(Tracker {
        events: Mutex::new(Vec::new()),
    });
    let listener: Arc<dyn ConnectionListener> = tracker.clone();

    x.add_connection_listener(listener.clone(), false).unwrap();
    assert!(matches!(
        x.add_connection_listener(listener.clone(), false),
        Err(Error::IllegalState(_))
    ));

    h.engine.peer_connected(peer("dashboard"));
    assert!(x.is_connected());
    h.instance.shutdown();
    assert!(!x.is_connected());

    x.remove_connection_listener(&listener);
    h.engine.peer_connected(peer("late"));

    assert_eq!(
        *tracker.events.lock(),
        vec![
            "/X connected dashboard".to_string(),
            "/X disconnected dashboard".to_string(),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_announce_each_sub_table_once() {
    let h = Harness::new();
    let x = h.table("X");
    let collector = Collector::new();
    x.add_sub_table_listener(collector.clone(), false);

    let engine = h.engine.clone();
    let mut handles = Vec::new();
    for writer in 0..4 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..25 {
                engine.ingest_remote_update(&format!("/X/T{}/w{}", i % 5, writer), Value::Double(i as f64));
                if i % 10 == 0 {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut names: Vec<String> = collector
        .events()
        .into_iter()
        .map(|e| match e {
            Event::SubTable(name, _) => name,
            Event::Value(key, _) => panic!("unexpected value event for {}", key),
        })
        .collect();
    names.sort();
    assert_eq!(names, vec!["T0", "T1", "T2", "T3", "T4"]);
}
