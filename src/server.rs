//! Lidar server: supervises the scanner process and its reader thread
//!
//! `start()` spawns the external scanner, takes its stdout, and launches
//! a dedicated reader thread that decodes each line and forwards valid
//! points to the consumer. `stop()` forcibly terminates the scanner,
//! which closes the pipe and unblocks the reader, then waits for the
//! thread with a bounded timeout.
//!
//! The reader never calls `stop()` itself. When it detects a disconnect
//! it emits [`ServerEvent::Disconnected`] on the event channel and
//! exits; the context that owns the server performs the actual stop.

use crate::clock::MonotonicClock;
use crate::config::LidarConfig;
use crate::connectivity::ConnectivityChecker;
use crate::error::{Error, Result};
use crate::protocol;
use crate::sink::PointSink;
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Lifecycle state, guarded by a single mutex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerState {
    Idle,
    Running,
    Stopping,
}

/// Event emitted by the reader thread to whoever owns the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerEvent {
    /// The scanner stream failed and the device is gone; the owner
    /// should call stop() to tear the session down
    Disconnected,
}

struct ReaderHandle {
    handle: JoinHandle<()>,
    /// Closed when the reader thread exits; lets stop() wait with a timeout
    done_rx: Receiver<()>,
}

/// Supervises one scanner process and streams its points to a sink
pub struct LidarServer {
    config: LidarConfig,
    checker: ConnectivityChecker,
    sink: Arc<dyn PointSink>,
    clock: Arc<MonotonicClock>,
    state: Arc<Mutex<ServerState>>,
    child: Mutex<Option<Child>>,
    reader: Option<ReaderHandle>,
    event_tx: Sender<ServerEvent>,
    event_rx: Receiver<ServerEvent>,
    delivered: Arc<AtomicU64>,
    discarded: Arc<AtomicU64>,
}

impl LidarServer {
    /// Create a server for the given configuration and consumer
    pub fn new(config: LidarConfig, sink: Arc<dyn PointSink>) -> Self {
        let checker = ConnectivityChecker::new(
            config.device.list_command.clone(),
            config.device.id.clone(),
        );
        let (event_tx, event_rx) = unbounded();
        Self {
            config,
            checker,
            sink,
            clock: Arc::new(MonotonicClock::new()),
            state: Arc::new(Mutex::new(ServerState::Idle)),
            child: Mutex::new(None),
            reader: None,
            event_tx,
            event_rx,
            delivered: Arc::new(AtomicU64::new(0)),
            discarded: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Check whether the lidar device is present on the host
    pub fn is_connected(&self) -> bool {
        self.checker.is_connected()
    }

    /// Whether a session is active
    pub fn is_running(&self) -> bool {
        *self.state.lock() == ServerState::Running
    }

    /// Whether a stop() is currently winding a session down
    pub fn is_ending(&self) -> bool {
        *self.state.lock() == ServerState::Stopping
    }

    /// Points delivered and lines discarded since the server was created
    pub fn stats(&self) -> (u64, u64) {
        (
            self.delivered.load(Ordering::Relaxed),
            self.discarded.load(Ordering::Relaxed),
        )
    }

    /// Events from the reader thread, most importantly
    /// [`ServerEvent::Disconnected`]
    pub fn events(&self) -> &Receiver<ServerEvent> {
        &self.event_rx
    }

    /// Start the scanner process and its reader thread.
    ///
    /// Returns once the reader thread is launched, not once it has
    /// produced data. The transition to running is provisional: any
    /// spawn failure rolls the state back to idle.
    pub fn start(&mut self) -> Result<()> {
        if !self.checker.is_connected() {
            warn!("Cannot start lidar server: device not connected");
            return Err(Error::NotConnected);
        }

        {
            let mut state = self.state.lock();
            match *state {
                ServerState::Running => {
                    warn!("Cannot start lidar server: already running");
                    return Err(Error::AlreadyRunning);
                }
                ServerState::Stopping => {
                    warn!("Cannot start lidar server: stop in progress");
                    return Err(Error::StopInProgress);
                }
                ServerState::Idle => *state = ServerState::Running,
            }
        }

        info!("Starting lidar scanner: {:?}", self.config.process.command);
        match self.spawn_reader() {
            Ok(()) => Ok(()),
            Err(e) => {
                *self.state.lock() = ServerState::Idle;
                error!("Failed to start lidar scanner: {}", e);
                Err(e)
            }
        }
    }

    fn spawn_reader(&mut self) -> Result<()> {
        let (program, args) = self
            .config
            .process
            .command
            .split_first()
            .ok_or_else(|| Error::Config("scanner command is empty".to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Spawn(format!("{}: {}", program, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Spawn("scanner stdout was not captured".to_string()))?;

        let (done_tx, done_rx) = bounded::<()>(1);
        let ctx = ReaderContext {
            state: Arc::clone(&self.state),
            checker: self.checker.clone(),
            sink: Arc::clone(&self.sink),
            clock: Arc::clone(&self.clock),
            events: self.event_tx.clone(),
            delivered: Arc::clone(&self.delivered),
            discarded: Arc::clone(&self.discarded),
        };

        let handle = thread::Builder::new()
            .name("lidar-reader".to_string())
            .spawn(move || {
                // Held for the thread's lifetime; dropping it on exit
                // wakes the bounded join in stop()
                let _done_tx = done_tx;
                reader_loop(stdout, ctx);
            })
            .map_err(|e| {
                let _ = child.kill();
                let _ = child.wait();
                Error::Spawn(format!("reader thread: {}", e))
            })?;

        *self.child.lock() = Some(child);
        self.reader = Some(ReaderHandle { handle, done_rx });
        Ok(())
    }

    /// Stop the scanner process and wait for the reader thread.
    ///
    /// Termination is forced, with no drain of in-flight lines. The
    /// reader join is bounded by `server.stop_timeout_ms`; on timeout
    /// the state reverts to running and the caller should retry.
    pub fn stop(&mut self) -> Result<()> {
        {
            let mut state = self.state.lock();
            if *state != ServerState::Running {
                warn!("Cannot stop lidar server: not running");
                return Err(Error::NotRunning);
            }
            *state = ServerState::Stopping;
        }

        info!("Stopping lidar scanner...");

        // Killing the scanner closes the pipe, which is what unblocks
        // the reader's line read
        if let Some(mut child) = self.child.lock().take() {
            if let Err(e) = child.kill() {
                debug!("Scanner process already gone: {}", e);
            }
            if let Err(e) = child.wait() {
                warn!("Failed to reap scanner process: {}", e);
            }
        }

        let timeout = Duration::from_millis(self.config.server.stop_timeout_ms);
        if let Some(reader) = self.reader.take() {
            match reader.done_rx.recv_timeout(timeout) {
                Err(RecvTimeoutError::Timeout) => {
                    // Reader is stuck somewhere; hand the session back to
                    // the caller so a retried stop() can finish the job
                    self.reader = Some(reader);
                    *self.state.lock() = ServerState::Running;
                    error!("Lidar reader thread did not exit within {:?}", timeout);
                    return Err(Error::StopTimeout(timeout));
                }
                _ => {
                    if reader.handle.join().is_err() {
                        warn!("Lidar reader thread panicked");
                    }
                }
            }
        }

        *self.state.lock() = ServerState::Idle;
        info!("Lidar scanner stopped");
        Ok(())
    }
}

impl Drop for LidarServer {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.stop();
        }
    }
}

/// Everything the reader thread needs, cloned out of the server
struct ReaderContext {
    state: Arc<Mutex<ServerState>>,
    checker: ConnectivityChecker,
    sink: Arc<dyn PointSink>,
    clock: Arc<MonotonicClock>,
    events: Sender<ServerEvent>,
    delivered: Arc<AtomicU64>,
    discarded: Arc<AtomicU64>,
}

impl ReaderContext {
    fn handle_line(&self, line: &str) {
        match protocol::decode_line(line, self.clock.now()) {
            Some((point, new_scan)) => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
                self.sink.add_point(point, new_scan);
            }
            None => {
                self.discarded.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Handle EOF or a read error; returns true when the loop should exit
    fn handle_stream_failure(&self, cause: &str) -> bool {
        if *self.state.lock() != ServerState::Running {
            // stop() is tearing the session down; the failure is expected
            return true;
        }
        if self.checker.is_connected() {
            // Device still present: a transient hiccup, or the scanner
            // died on its own. Keep retrying until the state changes.
            debug!("Scanner stream failure ({}), device still present", cause);
            thread::sleep(Duration::from_millis(10));
            return false;
        }
        error!("Lidar disconnected: {}", cause);
        let _ = self.events.send(ServerEvent::Disconnected);
        true
    }
}

fn reader_loop(stdout: ChildStdout, ctx: ReaderContext) {
    let mut reader = BufReader::new(stdout);
    let mut line = String::new();

    loop {
        if *ctx.state.lock() != ServerState::Running {
            break;
        }

        line.clear();
        match reader.read_line(&mut line) {
            // EOF: the pipe closed, either because stop() killed the
            // scanner or because it exited on its own
            Ok(0) => {
                if ctx.handle_stream_failure("end of scanner output stream") {
                    break;
                }
            }
            Ok(_) => ctx.handle_line(&line),
            Err(e) => {
                if ctx.handle_stream_failure(&e.to_string()) {
                    break;
                }
            }
        }
    }

    debug!("Lidar reader thread exiting");
}
