//! Shared doubles and clients for the server test suites.

use std::io::{self, Cursor, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use slim_config::{Config, ConfigError, ListenAddress};
use slim_fixtures::{ConverterRegistry, FixtureCatalog};
use slim_protocol::response::BYE;
use slim_protocol::{Item, pack, read_message, unpack, write_message};

use crate::bootstrap::{BootstrapError, ConfigLoader};
use crate::dispatch::Executor;
use crate::fixtures::register_builtin_fixtures;
use crate::health::HealthReporter;
use crate::process::{ShutdownError, ShutdownSignal, StopReason};
use crate::session::{SessionError, SessionSummary};

pub(crate) const WAIT_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(20);
const MAX_REPLY_BYTES: usize = 1024 * 1024;

/// Executor over the built-in fixtures and default converters.
pub(crate) fn test_executor() -> Executor {
    let catalog = FixtureCatalog::new();
    register_builtin_fixtures(&catalog);
    Executor::new(
        Arc::new(catalog),
        Arc::new(ConverterRegistry::with_defaults()),
    )
}

/// Configuration bound to an ephemeral loopback port.
pub(crate) fn loopback_config(keepalive: bool) -> Config {
    Config {
        listen: ListenAddress::new("127.0.0.1", 0),
        keepalive,
        ..Config::default()
    }
}

/// Builds instruction rows with generated ids `1`, `2`, ...
///
/// Each instruction is written as whitespace-separated words and
/// instructions are separated by `;`.
pub(crate) fn script_rows(script: &str) -> Vec<Vec<String>> {
    script
        .split(';')
        .map(str::trim)
        .filter(|instruction| !instruction.is_empty())
        .enumerate()
        .map(|(index, instruction)| {
            std::iter::once((index + 1).to_string())
                .chain(instruction.split_whitespace().map(str::to_owned))
                .collect()
        })
        .collect()
}

/// Packs rows into a request document.
pub(crate) fn request_document<S: AsRef<str>>(rows: &[Vec<S>]) -> String {
    let entries: Vec<Item> = rows
        .iter()
        .map(|row| Item::List(row.iter().map(|field| Item::from(field.as_ref())).collect()))
        .collect();
    pack(&entries)
}

/// Frames `payload` the way a harness would.
pub(crate) fn frame(payload: &str) -> Vec<u8> {
    let mut framed = Vec::new();
    write_message(&mut framed, payload.as_bytes()).expect("frame into memory");
    framed
}

/// Splits a response document into `(id, result)` pairs.
pub(crate) fn response_pairs(document: &str) -> Vec<(String, Item)> {
    unpack(document)
        .expect("response is a packed list")
        .into_iter()
        .map(|entry| match entry {
            Item::List(pair) => match pair.as_slice() {
                [Item::Text(id), result] => (id.clone(), result.clone()),
                other => panic!("response entry is not a pair: {other:?}"),
            },
            Item::Text(text) => panic!("response entry is not a list: {text}"),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Streams and clients
// ---------------------------------------------------------------------------

/// In-memory duplex stream: reads from a fixed script, records writes.
pub(crate) struct MemoryStream {
    input: Cursor<Vec<u8>>,
    pub(crate) output: Vec<u8>,
}

impl MemoryStream {
    pub(crate) fn new(input: Vec<u8>) -> Self {
        Self {
            input: Cursor::new(input),
            output: Vec::new(),
        }
    }
}

impl Read for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for MemoryStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A harness-side connection speaking UTF-8.
pub(crate) struct SlimClient {
    stream: TcpStream,
    greeting: String,
}

impl SlimClient {
    pub(crate) fn connect(addr: SocketAddr) -> Self {
        let mut stream = TcpStream::connect(addr).expect("connect to server");
        stream
            .set_read_timeout(Some(WAIT_TIMEOUT))
            .expect("set read timeout");
        let greeting = read_greeting(&mut stream);
        Self { stream, greeting }
    }

    pub(crate) fn greeting(&self) -> &str {
        &self.greeting
    }

    /// Sends one batch and returns the `(id, result)` pairs of the reply.
    pub(crate) fn send<S: AsRef<str>>(&mut self, rows: &[Vec<S>]) -> Vec<(String, Item)> {
        self.send_raw(&request_document(rows))
    }

    pub(crate) fn send_raw(&mut self, document: &str) -> Vec<(String, Item)> {
        write_message(&mut self.stream, document.as_bytes()).expect("write request");
        self.receive()
    }

    /// Writes one batch without waiting for its reply.
    pub(crate) fn submit<S: AsRef<str>>(&mut self, rows: &[Vec<S>]) {
        write_message(&mut self.stream, request_document(rows).as_bytes())
            .expect("write request");
    }

    /// Reads the reply to the batch sent last.
    pub(crate) fn receive(&mut self) -> Vec<(String, Item)> {
        let reply = read_message(&mut self.stream, MAX_REPLY_BYTES).expect("read reply");
        response_pairs(&String::from_utf8(reply).expect("reply is UTF-8"))
    }

    /// Ends the session and waits for the server to close the connection.
    pub(crate) fn bye(mut self) {
        write_message(&mut self.stream, BYE.as_bytes()).expect("write bye");
        let mut rest = Vec::new();
        self.stream
            .read_to_end(&mut rest)
            .expect("server closes after bye");
        assert!(rest.is_empty(), "no reply is sent after bye");
    }
}

fn read_greeting(stream: &mut TcpStream) -> String {
    let mut greeting = Vec::new();
    let mut byte = [0_u8; 1];
    while greeting.last() != Some(&b'\n') {
        stream.read_exact(&mut byte).expect("read greeting");
        greeting.push(byte[0]);
    }
    String::from_utf8(greeting).expect("greeting is UTF-8")
}

// ---------------------------------------------------------------------------
// Collaborator doubles
// ---------------------------------------------------------------------------

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ListenerReady(SocketAddr),
    SessionStarted,
    SessionFinished(SessionSummary),
    SessionFailed(String),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub(crate) struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    pub(crate) fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }

    /// Waits until an event satisfies `predicate`.
    pub(crate) fn wait_for<T>(&self, mut predicate: impl FnMut(&HealthEvent) -> Option<T>) -> T {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        while Instant::now() < deadline {
            if let Some(found) = self.events().iter().find_map(&mut predicate) {
                return found;
            }
            thread::sleep(POLL_INTERVAL);
        }
        panic!("timed out waiting for health event; saw {:?}", self.events());
    }

    pub(crate) fn listener_addr(&self) -> SocketAddr {
        self.wait_for(|event| match event {
            HealthEvent::ListenerReady(addr) => Some(*addr),
            _ => None,
        })
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn listener_ready(&self, addr: SocketAddr) {
        self.record(HealthEvent::ListenerReady(addr));
    }

    fn session_started(&self, _peer: Option<SocketAddr>) {
        self.record(HealthEvent::SessionStarted);
    }

    fn session_finished(&self, summary: &SessionSummary) {
        self.record(HealthEvent::SessionFinished(*summary));
    }

    fn session_failed(&self, error: &SessionError) {
        self.record(HealthEvent::SessionFailed(error.to_string()));
    }
}

/// Loader that returns a fixed configuration.
#[derive(Debug, Clone)]
pub(crate) struct TestConfigLoader {
    config: Config,
}

impl TestConfigLoader {
    pub(crate) const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(self.config.clone())
    }
}

/// Loader that fails by passing invalid arguments.
#[derive(Debug, Default)]
pub(crate) struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load_from_iter(["slimd", "--port", "not-a-port"])
    }
}

/// Shutdown signal released by the test.
#[derive(Clone)]
pub(crate) struct TestShutdownSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl TestShutdownSignal {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    pub(crate) fn trigger(&self) {
        let (lock, cvar) = &*self.inner;
        let mut triggered = lock.lock().expect("shutdown mutex poisoned");
        *triggered = true;
        cvar.notify_all();
    }
}

impl ShutdownSignal for TestShutdownSignal {
    fn wait(&self) -> Result<StopReason, ShutdownError> {
        let (lock, cvar) = &*self.inner;
        let mut triggered = lock.lock().expect("shutdown mutex poisoned");
        while !*triggered {
            triggered = cvar
                .wait(triggered)
                .expect("shutdown mutex poisoned during wait");
        }
        Ok(StopReason::Requested)
    }
}
