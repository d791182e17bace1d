use std::sync::Arc;
use std::time::Duration;

use nettables::ConnectionInfo;
use nettables::ConnectionListener;
use nettables::MemoryEngine;
use nettables::NotifyFlags;
use nettables::Result;
use nettables::Table;
use nettables::TableInstance;
use nettables::TableListener;
use nettables::TablesConfig;
use nettables::Value;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    init_observability();

    let config = TablesConfig::new()?.validate()?;
    let instance = TableInstance::new(Arc::new(MemoryEngine::new()), config);

    // Initializing Shutdown Signal
    let (graceful_tx, graceful_rx) = watch::channel(());

    let root = instance.table("")?;
    root.add_connection_listener(Arc::new(ConnectionLogger), true)?;

    tokio::spawn(graceful_shutdown(graceful_tx));
    info!("Application started. Waiting for CTRL+C signal...");

    if instance.is_server() {
        run_server(&root, graceful_rx).await;
    } else {
        run_client(&root, graceful_rx).await;
    }

    instance.shutdown();
    println!("Exiting program.");
    Ok(())
}

/// Publishes a persistent `/foo` and a ticking `/foo2` counter.
async fn run_server(
    root: &Table,
    mut shutdown: watch::Receiver<()>,
) {
    root.put_number("foo", 0.5);
    root.set_persistent("foo");

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut counter = 0.0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                root.put_number("foo2", counter);
                counter += 1.0;
            }
            _ = shutdown.changed() => break,
        }
    }
}

/// Logs every entry change and lists the root keys once per second.
async fn run_client(
    root: &Table,
    mut shutdown: watch::Receiver<()>,
) {
    root.add_table_listener_ex(
        Arc::new(EntryLogger),
        NotifyFlags::NEW | NotifyFlags::UPDATE | NotifyFlags::DELETE | NotifyFlags::IMMEDIATE,
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let keys: Vec<String> = root.keys(0).into_iter().collect();
                info!(connected = root.is_connected(), ?keys, "root entries");
            }
            _ = shutdown.changed() => break,
        }
    }
}

async fn graceful_shutdown(graceful_tx: watch::Sender<()>) {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            error!("Failed to listen for SIGTERM: {:?}", e);
            return;
        }
    };
    tokio::select! {
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    if let Err(e) = graceful_tx.send(()) {
        error!("Failed to send shutdown signal: {}", e);
    }
}

fn init_observability() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

struct EntryLogger;

impl TableListener for EntryLogger {
    fn value_changed(
        &self,
        source: &Table,
        key: &str,
        value: &Value,
        flags: NotifyFlags,
    ) {
        info!(table = source.path(), key, ?value, ?flags, "entry changed");
    }
}

struct ConnectionLogger;

impl ConnectionListener for ConnectionLogger {
    fn connected(
        &self,
        _source: &Table,
        info: &ConnectionInfo,
    ) {
        info!(remote_id = %info.remote_id, remote_ip = %info.remote_ip, "connected");
    }

    fn disconnected(
        &self,
        _source: &Table,
        info: &ConnectionInfo,
    ) {
        info!(remote_id = %info.remote_id, "disconnected");
    }
}
