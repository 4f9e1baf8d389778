//! Behavioural tests covering daemon process supervision and lifecycle files.

use std::cell::RefCell;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;

use whiteboard_config::RuntimePaths;

use crate::bootstrap::ConfigLoader;
use crate::health::HealthReporter;
use crate::observer::TracingBrokerObserver;
use crate::process::LaunchError;
use crate::process::daemonizer::{DaemonizeError, Daemonizer};
use crate::process::launch::{LaunchMode, LaunchPlan, ProcessControl, ServiceDeps, run_daemon_with};
use crate::process::shutdown::{ShutdownCause, ShutdownError, ShutdownSignal};

use super::support::{HealthEvent, RecordingHealthReporter, TestConfigLoader};

const WAIT_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(25);

type StepResult = Result<(), String>;

#[fixture]
fn world() -> RefCell<ProcessWorld> {
    RefCell::new(ProcessWorld::new())
}

#[given("a fresh daemon process world")]
fn given_world(world: &RefCell<ProcessWorld>) {
    let _ = world;
}

#[given("runtime files abandoned by a dead daemon")]
fn given_stale_runtime(world: &RefCell<ProcessWorld>) -> StepResult {
    world.borrow().write_stale_runtime()
}

#[when("the daemon starts in background mode")]
fn when_daemon_starts_background(world: &RefCell<ProcessWorld>) -> StepResult {
    world.borrow_mut().start_background()?;
    world.borrow().wait_for_ready()
}

#[when("shutdown is triggered")]
fn when_shutdown_triggered(world: &RefCell<ProcessWorld>) {
    world.borrow().shutdown.trigger();
}

#[when("the daemon run completes")]
fn when_daemon_completes(world: &RefCell<ProcessWorld>) -> StepResult {
    world.borrow_mut().join_background()
}

#[then("daemonisation was requested")]
fn then_daemonisation_requested(world: &RefCell<ProcessWorld>) {
    assert_eq!(world.borrow().daemonizer.calls(), 1);
}

#[then("the daemon wrote the lock file")]
fn then_lock_file_exists(world: &RefCell<ProcessWorld>) {
    assert!(
        world.borrow().paths().lock_path().exists(),
        "lock file should exist whilst the daemon is running"
    );
}

#[then("the daemon wrote the pid file")]
fn then_pid_file_exists(world: &RefCell<ProcessWorld>) {
    let path = world.borrow().paths().pid_path().to_path_buf();
    let content = fs::read_to_string(&path).expect("pid file should be readable");
    let pid: u32 = content
        .trim()
        .parse()
        .expect("pid file should contain an integer");
    assert_eq!(pid, std::process::id());
}

#[then("the daemon wrote the ready health snapshot")]
fn then_health_ready(world: &RefCell<ProcessWorld>) {
    let snapshot = world
        .borrow()
        .read_health()
        .expect("health snapshot should parse");
    assert_eq!(snapshot_status(&snapshot), Some("ready"));
}

#[then("the reporter saw the broker become ready")]
fn then_reporter_ready(world: &RefCell<ProcessWorld>) {
    let events = world.borrow().reporter.events();
    assert!(
        events
            .iter()
            .any(|event| matches!(event, HealthEvent::BrokerReady(_))),
        "broker ready event missing: {events:?}"
    );
}

#[then("the reporter saw the broker stop")]
fn then_reporter_stopped(world: &RefCell<ProcessWorld>) {
    let events = world.borrow().reporter.events();
    assert_eq!(events.last(), Some(&HealthEvent::BrokerStopped));
}

#[then("starting the daemon again fails with already running")]
fn then_duplicate_start_fails(world: &RefCell<ProcessWorld>) {
    let result = world.borrow().run_foreground();
    match result {
        Err(LaunchError::AlreadyRunning { pid }) => assert_eq!(pid, std::process::id()),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[then("the daemon run succeeds")]
fn then_daemon_succeeds(world: &RefCell<ProcessWorld>) {
    let world = world.borrow();
    let result = world.result.as_ref().expect("daemon result missing");
    assert!(result.is_ok(), "daemon run should succeed: {result:?}");
}

#[then("the runtime artefacts are removed")]
fn then_runtime_removed(world: &RefCell<ProcessWorld>) {
    let world = world.borrow();
    let paths = world.paths();
    assert!(!paths.lock_path().exists(), "lock file left behind");
    assert!(!paths.pid_path().exists(), "pid file left behind");
    assert!(!paths.health_path().exists(), "health file left behind");
}

fn snapshot_status(snapshot: &Value) -> Option<&str> {
    snapshot.get("status").and_then(Value::as_str)
}

struct ProcessWorld {
    loader: TestConfigLoader,
    reporter: Arc<RecordingHealthReporter>,
    daemonizer: TestDaemonizer,
    shutdown: TestShutdownSignal,
    handle: Option<thread::JoinHandle<Result<(), LaunchError>>>,
    result: Option<Result<(), LaunchError>>,
}

impl ProcessWorld {
    fn new() -> Self {
        Self {
            loader: TestConfigLoader::new(),
            reporter: Arc::new(RecordingHealthReporter::default()),
            daemonizer: TestDaemonizer::default(),
            shutdown: TestShutdownSignal::new(),
            handle: None,
            result: None,
        }
    }

    fn plan(
        &self,
        mode: LaunchMode,
        shutdown: TestShutdownSignal,
    ) -> LaunchPlan<TestConfigLoader, TestDaemonizer, TestShutdownSignal> {
        let reporter: Arc<dyn HealthReporter> = self.reporter.clone();
        LaunchPlan {
            process: ProcessControl {
                mode,
                daemonizer: self.daemonizer.clone(),
                shutdown,
            },
            services: ServiceDeps {
                loader: self.loader.clone(),
                reporter,
                observer: Arc::new(TracingBrokerObserver::new()),
            },
        }
    }

    fn start_background(&mut self) -> StepResult {
        if self.handle.is_some() {
            return Err("daemon already running".to_owned());
        }
        let plan = self.plan(LaunchMode::Background, self.shutdown.clone());
        self.handle = Some(thread::spawn(move || run_daemon_with(plan)));
        Ok(())
    }

    fn run_foreground(&self) -> Result<(), LaunchError> {
        let shutdown = TestShutdownSignal::new();
        shutdown.trigger();
        run_daemon_with(self.plan(LaunchMode::Foreground, shutdown))
    }

    fn wait_for_ready(&self) -> StepResult {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        while Instant::now() < deadline {
            let ready = self
                .read_health()
                .is_ok_and(|snapshot| snapshot_status(&snapshot) == Some("ready"));
            if ready {
                return Ok(());
            }
            thread::sleep(POLL_INTERVAL);
        }
        Err("daemon did not publish a ready health snapshot".to_owned())
    }

    fn join_background(&mut self) -> StepResult {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| "daemon not running".to_owned())?;
        let result = handle
            .join()
            .map_err(|_| "daemon thread panicked".to_owned())?;
        self.result = Some(result);
        Ok(())
    }

    fn paths(&self) -> RuntimePaths {
        let config = self.loader.load().expect("test configuration loads");
        RuntimePaths::from_config(&config).expect("runtime paths resolve")
    }

    fn read_health(&self) -> Result<Value, String> {
        let content =
            fs::read_to_string(self.paths().health_path()).map_err(|error| error.to_string())?;
        serde_json::from_str(&content).map_err(|error| error.to_string())
    }

    fn write_stale_runtime(&self) -> StepResult {
        let paths = self.paths();
        fs::write(paths.lock_path(), b"").map_err(|error| error.to_string())?;
        fs::write(paths.pid_path(), format!("{}\n", i32::MAX)).map_err(|error| error.to_string())?;
        fs::write(paths.health_path(), br#"{"status":"stopping"}"#)
            .map_err(|error| error.to_string())?;
        Ok(())
    }
}

#[derive(Clone, Default)]
struct TestDaemonizer {
    calls: Arc<AtomicUsize>,
}

impl TestDaemonizer {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Daemonizer for TestDaemonizer {
    fn daemonize(&self, _paths: &RuntimePaths) -> Result<(), DaemonizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone)]
struct TestShutdownSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl TestShutdownSignal {
    fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    fn trigger(&self) {
        let (lock, cvar) = &*self.inner;
        let mut triggered = lock.lock().expect("shutdown mutex poisoned");
        *triggered = true;
        cvar.notify_all();
    }
}

impl ShutdownSignal for TestShutdownSignal {
    fn wait(&self) -> Result<ShutdownCause, ShutdownError> {
        let (lock, cvar) = &*self.inner;
        let mut triggered = lock.lock().expect("shutdown mutex poisoned");
        while !*triggered {
            triggered = cvar
                .wait(triggered)
                .expect("shutdown mutex poisoned during wait");
        }
        Ok(ShutdownCause::Requested)
    }
}

#[scenario(path = "tests/features/daemon_process.feature")]
fn daemon_process(#[from(world)] world: RefCell<ProcessWorld>) {
    drop(world);
}

#[scenario(path = "tests/features/daemon_stale_runtime.feature")]
fn daemon_stale_runtime(#[from(world)] world: RefCell<ProcessWorld>) {
    drop(world);
}
