//! Shared fakes for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use account_service::config::{MysqlConfig, ServiceConfig};
use account_service::database::{DatabasePool, DbError, PoolCache, PoolFactory, ProbeRunner};
use account_service::health::{HealthMonitor, HealthReport};
use account_service::http::HttpServer;
use account_service::lifecycle::{ProcessExit, Shutdown, ShutdownCoordinator};
use account_service::observability::logging::{LogTag, StatusSink};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Level;

/// Database whose reachability is toggled by the test.
#[derive(Clone, Default)]
pub struct FakeDatabase {
    pub down: Arc<AtomicBool>,
    pub pings: Arc<AtomicUsize>,
    pub created: Arc<AtomicUsize>,
    pub closed: Arc<AtomicBool>,
}

pub struct FakePool {
    db: FakeDatabase,
}

impl DatabasePool for FakePool {
    fn ping(&self) -> impl Future<Output = Result<(), DbError>> + Send {
        self.db.pings.fetch_add(1, Ordering::SeqCst);
        let result = if self.db.down.load(Ordering::SeqCst) {
            Err(DbError::Connection("Database connection was refused.".into()))
        } else {
            Ok(())
        };
        async move { result }
    }

    fn close(&self) -> impl Future<Output = ()> + Send {
        self.db.closed.store(true, Ordering::SeqCst);
        async {}
    }
}

impl PoolFactory for FakeDatabase {
    type Pool = FakePool;

    fn create(&self, _config: &MysqlConfig) -> Result<FakePool, DbError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(FakePool { db: self.clone() })
    }
}

/// Records status lines and exit calls instead of acting on them.
#[derive(Default)]
pub struct Recorder {
    pub lines: Mutex<Vec<(LogTag, String)>>,
    pub exits: AtomicUsize,
}

impl Recorder {
    pub fn messages(&self) -> Vec<String> {
        self.lines.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
    }
}

impl StatusSink for Recorder {
    fn record(&self, _level: Level, tag: LogTag, message: &str) {
        self.lines.lock().unwrap().push((tag, message.to_string()));
    }
}

impl ProcessExit for Recorder {
    fn exit(&self, _code: i32) {
        self.exits.fetch_add(1, Ordering::SeqCst);
    }
}

/// A fully wired service running against a [`FakeDatabase`].
pub struct TestService {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub recorder: Arc<Recorder>,
    pub pools: Arc<PoolCache<FakeDatabase>>,
    pub server: JoinHandle<std::io::Result<()>>,
    pub monitor: JoinHandle<()>,
}

/// Start the HTTP server and health monitor on an ephemeral port.
pub async fn start_service(db: FakeDatabase, mut config: ServiceConfig) -> TestService {
    config.listener.bind_address = "127.0.0.1:0".into();

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let recorder = Arc::new(Recorder::default());
    let pools = Arc::new(PoolCache::new(db));
    let shutdown = Shutdown::new();
    let report = HealthReport::new();

    let (closed_tx, closed_rx) = watch::channel(false);
    let coordinator = Arc::new(ShutdownCoordinator::new(
        shutdown.clone(),
        closed_rx,
        pools.clone(),
        recorder.clone(),
        recorder.clone(),
        config.shutdown.drain_timeout(),
    ));

    let monitor = HealthMonitor::new(
        ProbeRunner::new(pools.clone(), config.health_check.probe_timeout()),
        config.mysql.clone(),
        config.health_check.clone(),
        recorder.clone(),
        coordinator,
        report.clone(),
    );

    let server = HttpServer::new(&config, report);
    let server_shutdown = shutdown.subscribe();
    let server = tokio::spawn(async move { server.run(listener, server_shutdown, closed_tx).await });
    let monitor = tokio::spawn(monitor.run(shutdown.subscribe()));

    TestService {
        addr,
        shutdown,
        recorder,
        pools,
        server,
        monitor,
    }
}

/// Config with short timings so escalation happens within a test.
pub fn fast_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.health_check.interval_secs = 60;
    config.health_check.retry_interval_ms = 50;
    config.health_check.probe_timeout_ms = 500;
    config.health_check.max_retries = 3;
    config.shutdown.drain_timeout_secs = 2;
    config
}
